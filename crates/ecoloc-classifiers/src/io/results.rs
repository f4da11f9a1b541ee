//! Writers for the per-sample results table and the precision/recall summary.
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::Result;
use crate::evaluation::{EvaluationRecord, PrecisionRecallSummary};
use crate::io::delimiter_for;

const RESULT_HEADERS: [&str; 11] = [
    "MCG",
    "GVH",
    "LIP",
    "CHG",
    "AAC",
    "ALM1",
    "ALM2",
    "Actual_Class",
    "Predicted_Class",
    "Prediction_Probability",
    "Prediction_Match",
];

const SUMMARY_HEADERS: [&str; 3] = ["Class", "Precision", "Recall"];

fn writer_for(path: &Path) -> Result<csv::Writer<BufWriter<File>>> {
    let file = File::create(path)?;
    Ok(csv::WriterBuilder::new()
        .delimiter(delimiter_for(path))
        .from_writer(BufWriter::new(file)))
}

/// Write one row per evaluated sample. Delimiter follows the file extension.
pub fn write_results<P: AsRef<Path>>(path: P, records: &[EvaluationRecord]) -> Result<()> {
    let path = path.as_ref();
    let mut writer = writer_for(path)?;
    write_results_to(&mut writer, records)?;
    writer.flush()?;
    log::info!("Wrote {} evaluation rows to {:?}", records.len(), path);
    Ok(())
}

fn write_results_to<W: Write>(writer: &mut csv::Writer<W>, records: &[EvaluationRecord]) -> Result<()> {
    writer.write_record(RESULT_HEADERS)?;
    for record in records {
        let mut row: Vec<String> = record
            .features
            .as_slice()
            .iter()
            .map(|v| v.to_string())
            .collect();
        row.push(record.actual.to_string());
        row.push(record.predicted.to_string());
        row.push(format!("{:.6}", record.probability));
        row.push(record.is_match.to_string());
        writer.write_record(&row)?;
    }
    Ok(())
}

/// Write the Class/Precision/Recall table, including the trailing Overall row.
pub fn write_summary<P: AsRef<Path>>(path: P, summary: &PrecisionRecallSummary) -> Result<()> {
    let path = path.as_ref();
    let mut writer = writer_for(path)?;
    write_summary_to(&mut writer, summary)?;
    writer.flush()?;
    log::info!("Wrote precision/recall summary to {:?}", path);
    Ok(())
}

fn write_summary_to<W: Write>(writer: &mut csv::Writer<W>, summary: &PrecisionRecallSummary) -> Result<()> {
    writer.write_record(SUMMARY_HEADERS)?;
    for row in &summary.rows {
        writer.write_record([
            row.class.clone(),
            format!("{:.6}", row.precision),
            format!("{:.6}", row.recall),
        ])?;
    }
    Ok(())
}
