//! Plain-text tables printed by the training and evaluation entry points.
use std::fmt::Write;

use crate::evaluation::{ClassMetrics, EvaluationReport, PrecisionRecallSummary};

fn label_width(metrics: &[ClassMetrics], min: usize) -> usize {
    metrics
        .iter()
        .map(|m| m.class.as_str().len())
        .max()
        .unwrap_or(0)
        .max(min)
}

/// Per-class precision, recall, f1-score and support followed by the
/// accuracy, macro avg and weighted avg rows.
pub fn format_classification_report(metrics: &[ClassMetrics], accuracy: f64) -> String {
    let width = label_width(metrics, "weighted avg".len());
    let total: usize = metrics.iter().map(|m| m.support).sum();
    let mut out = String::new();

    let _ = writeln!(
        out,
        "{:>width$} {:>9} {:>9} {:>9} {:>9}",
        "", "precision", "recall", "f1-score", "support",
        width = width
    );
    let _ = writeln!(out);
    for m in metrics {
        let _ = writeln!(
            out,
            "{:>width$} {:>9.2} {:>9.2} {:>9.2} {:>9}",
            m.class.as_str(),
            m.precision,
            m.recall,
            m.f1,
            m.support,
            width = width
        );
    }
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "{:>width$} {:>9} {:>9} {:>9.2} {:>9}",
        "accuracy", "", "", accuracy, total,
        width = width
    );

    let n = metrics.len().max(1) as f64;
    let mean = |f: fn(&ClassMetrics) -> f64| metrics.iter().map(f).sum::<f64>() / n;
    let weighted = |f: fn(&ClassMetrics) -> f64| {
        if total == 0 {
            0.0
        } else {
            metrics.iter().map(|m| f(m) * m.support as f64).sum::<f64>() / total as f64
        }
    };
    let _ = writeln!(
        out,
        "{:>width$} {:>9.2} {:>9.2} {:>9.2} {:>9}",
        "macro avg",
        mean(|m| m.precision),
        mean(|m| m.recall),
        mean(|m| m.f1),
        total,
        width = width
    );
    let _ = writeln!(
        out,
        "{:>width$} {:>9.2} {:>9.2} {:>9.2} {:>9}",
        "weighted avg",
        weighted(|m| m.precision),
        weighted(|m| m.recall),
        weighted(|m| m.f1),
        total,
        width = width
    );
    out
}

/// The Class/Precision/Recall table, Overall row included.
pub fn format_summary_table(summary: &PrecisionRecallSummary) -> String {
    let width = summary
        .rows
        .iter()
        .map(|r| r.class.len())
        .max()
        .unwrap_or(0)
        .max("Class".len());
    let mut out = String::new();
    let _ = writeln!(out, "{:<width$}  {:>9}  {:>9}", "Class", "Precision", "Recall", width = width);
    for row in &summary.rows {
        let _ = writeln!(
            out,
            "{:<width$}  {:>9.4}  {:>9.4}",
            row.class,
            row.precision,
            row.recall,
            width = width
        );
    }
    out
}

/// Console summary for an evaluation run.
pub fn format_evaluation_summary(report: &EvaluationReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Precision and recall by class:");
    out.push_str(&format_summary_table(&report.summary));
    let _ = writeln!(out);

    let correct = report.correct();
    let _ = writeln!(out, "Total samples: {}", report.total());
    let _ = writeln!(out, "Correct predictions: {}", correct);
    let _ = writeln!(out, "Incorrect predictions: {}", report.total() - correct);
    let _ = writeln!(out, "Accuracy: {:.4}", report.accuracy);

    let misclassified: Vec<_> = report.misclassified().collect();
    if !misclassified.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Misclassified samples:");
        for (row, record) in misclassified {
            let _ = writeln!(
                out,
                "  row {:>4}: actual {:<4} predicted {:<4} probability {:.4}",
                row + 1,
                record.actual,
                record.predicted,
                record.probability
            );
        }
    }
    out
}
