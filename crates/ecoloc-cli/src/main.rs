use anyhow::Result;
use log::LevelFilter;
use std::path::PathBuf;

use ecoloc_cli::cli::{build_cli, expected_classes_from_matches, feature_vector_from_matches};
use ecoloc_cli::commands::evaluate::{run_evaluation, EvaluateConfig};
use ecoloc_cli::commands::predict::{format_prediction, run_prediction};
use ecoloc_cli::commands::train::{run_training, TrainConfig};

fn main() -> Result<()> {
    env_logger::Builder::default()
        .filter_level(LevelFilter::Error)
        .parse_env(env_logger::Env::default().filter_or("ECOLOC_LOG", "error,ecoloc=info"))
        .init();

    let matches = build_cli().get_matches();

    match matches.subcommand() {
        Some(("train", train_matches)) => {
            let config_path: Option<&PathBuf> = train_matches.get_one("config");
            log::info!("[ecoloc::train] Training with config: {:?}", config_path);

            let params = TrainConfig::from_arguments(config_path, train_matches)?;
            match run_training(&params) {
                Ok(_) => Ok(()),
                Err(e) => {
                    log::error!("Training failed: {:#}", e);
                    std::process::exit(1)
                }
            }
        }
        Some(("evaluate", eval_matches)) => {
            let config_path: Option<&PathBuf> = eval_matches.get_one("config");
            log::info!("[ecoloc::evaluate] Evaluating with config: {:?}", config_path);

            let params = EvaluateConfig::from_arguments(config_path, eval_matches)?;
            match run_evaluation(&params) {
                Ok(_) => Ok(()),
                Err(e) => {
                    log::error!("Evaluation failed: {:#}", e);
                    std::process::exit(1)
                }
            }
        }
        Some(("predict", predict_matches)) => {
            let model_path = predict_matches
                .get_one::<PathBuf>("model_path")
                .cloned()
                .unwrap_or_else(|| PathBuf::from("ecoli.model.json"));
            let features = feature_vector_from_matches(predict_matches);
            let expected_classes = expected_classes_from_matches(predict_matches);

            match run_prediction(&model_path, &features, expected_classes) {
                Ok(prediction) => {
                    print!("{}", format_prediction(&prediction));
                    Ok(())
                }
                Err(e) => {
                    log::error!("Prediction failed: {:#}", e);
                    log::error!(
                        "Make sure the model artifact {:?} exists and is valid.",
                        model_path
                    );
                    std::process::exit(1)
                }
            }
        }
        _ => unreachable!("Subcommand is required by CLI configuration"),
    }
}
