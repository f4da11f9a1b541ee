use anyhow::{Context, Result};
use clap::ArgMatches;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use ecoloc_classifiers::io::{read_dataset, save_pipeline};
use ecoloc_classifiers::report::format_classification_report;
use ecoloc_classifiers::{EnsembleConfig, EvaluationReport, Evaluator, TrainedPipeline};

use crate::util::{load_json_config, print_default_config, validate_tsv_or_csv_file};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    pub train_data: String,
    pub output_file: String,
    pub test_size: f64,
    pub seed: u64,
    pub model: EnsembleConfig,
}

impl Default for TrainConfig {
    fn default() -> Self {
        TrainConfig {
            train_data: String::from("ecoli.csv"),
            output_file: String::from("ecoli.model.json"),
            test_size: 0.2,
            seed: 42,
            model: EnsembleConfig::default(),
        }
    }
}

impl TrainConfig {
    pub fn from_arguments(config_path: Option<&PathBuf>, matches: &ArgMatches) -> Result<Self> {
        let mut config: TrainConfig = match config_path {
            Some(path) => load_json_config(path)?,
            None => TrainConfig::default(),
        };

        // Apply CLI overrides
        if let Some(train_data) = matches.get_one::<String>("train_data") {
            config.train_data = train_data.clone();
        }
        if let Some(output_file) = matches.get_one::<String>("output_file") {
            config.output_file = output_file.clone();
        }
        if let Some(seed) = matches.get_one::<u64>("seed") {
            config.seed = *seed;
        }
        if let Some(test_size) = matches.get_one::<f64>("test_size") {
            config.test_size = *test_size;
        }

        if config_path.is_none() {
            print_default_config("train", &config);
        }

        validate_tsv_or_csv_file(&config.train_data)?;
        config
            .model
            .validate()
            .context("Invalid model configuration")?;
        Ok(config)
    }
}

pub struct TrainingOutcome {
    pub pipeline: TrainedPipeline,
    /// Scores on the held-out split; `None` when `test_size` leaves it empty.
    pub report: Option<EvaluationReport>,
}

pub fn run_training(config: &TrainConfig) -> Result<TrainingOutcome> {
    let dataset = read_dataset(&config.train_data)
        .with_context(|| format!("Failed to read training data: {}", config.train_data))?;
    dataset.log_input_data_summary();

    let (train, test) = dataset
        .train_test_split(config.test_size, config.seed)
        .context("Failed to split training data")?;
    log::info!(
        "Training on {} samples, holding out {} for testing",
        train.len(),
        test.len()
    );

    let pipeline = TrainedPipeline::fit(&train, &config.model)?;

    let report = if test.is_empty() {
        log::warn!("test_size {} leaves no held-out samples; skipping report", config.test_size);
        None
    } else {
        let report = Evaluator::new(&pipeline).evaluate(&test)?;
        println!("Accuracy: {:.4}", report.accuracy);
        println!();
        println!("Classification Report:");
        print!("{}", format_classification_report(&report.metrics, report.accuracy));
        Some(report)
    };

    save_pipeline(&config.output_file, &pipeline)
        .with_context(|| format!("Failed to write model artifact: {}", config.output_file))?;
    log::info!("Saved trained pipeline to {}", config.output_file);

    Ok(TrainingOutcome { pipeline, report })
}
