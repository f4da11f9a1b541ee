use anyhow::{Context, Result};
use clap::ArgMatches;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use ecoloc_classifiers::io::{load_pipeline, read_dataset, write_results, write_summary};
use ecoloc_classifiers::report::format_evaluation_summary;
use ecoloc_classifiers::{EvaluationReport, Evaluator};

use crate::util::{load_json_config, print_default_config, validate_tsv_or_csv_file};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluateConfig {
    pub data: String,
    pub model_path: String,
    pub results_file: String,
    pub summary_file: String,
}

impl Default for EvaluateConfig {
    fn default() -> Self {
        EvaluateConfig {
            data: String::from("ecoli.csv"),
            model_path: String::from("ecoli.model.json"),
            results_file: String::from("pr.csv"),
            summary_file: String::from("pr_summary.csv"),
        }
    }
}

impl EvaluateConfig {
    pub fn from_arguments(config_path: Option<&PathBuf>, matches: &ArgMatches) -> Result<Self> {
        let mut config: EvaluateConfig = match config_path {
            Some(path) => load_json_config(path)?,
            None => EvaluateConfig::default(),
        };

        if let Some(data) = matches.get_one::<String>("data") {
            config.data = data.clone();
        }
        if let Some(model_path) = matches.get_one::<String>("model_path") {
            config.model_path = model_path.clone();
        }
        if let Some(results_file) = matches.get_one::<String>("results_file") {
            config.results_file = results_file.clone();
        }
        if let Some(summary_file) = matches.get_one::<String>("summary_file") {
            config.summary_file = summary_file.clone();
        }

        if config_path.is_none() {
            print_default_config("evaluate", &config);
        }

        validate_tsv_or_csv_file(&config.data)?;
        Ok(config)
    }
}

pub fn run_evaluation(config: &EvaluateConfig) -> Result<EvaluationReport> {
    let pipeline = load_pipeline(&config.model_path)?;
    let dataset = read_dataset(&config.data)
        .with_context(|| format!("Failed to read evaluation data: {}", config.data))?;
    dataset.log_input_data_summary();

    let report = Evaluator::new(&pipeline).evaluate(&dataset)?;

    write_results(&config.results_file, &report.records)
        .with_context(|| format!("Failed to write results: {}", config.results_file))?;
    write_summary(&config.summary_file, &report.summary)
        .with_context(|| format!("Failed to write summary: {}", config.summary_file))?;

    print!("{}", format_evaluation_summary(&report));
    Ok(report)
}
