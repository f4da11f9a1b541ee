use clap::{Arg, Command, ValueHint};
use std::path::PathBuf;

use ecoloc_classifiers::{ClassSet, FeatureVector, Label, FEATURE_NAMES, N_FEATURES};

/// Feature flags for `predict`: (name, help, default).
const FEATURE_ARGS: [(&str, &str, &str); N_FEATURES] = [
    ("mcg", "McGeoch's signal sequence recognition score", "0.5"),
    ("gvh", "von Heijne's signal sequence recognition score", "0.5"),
    ("lip", "von Heijne's signal peptidase II consensus score", "0.48"),
    ("chg", "Presence of charge on the N-terminus of predicted lipoproteins", "0.5"),
    ("aac", "Score of discriminant analysis of amino acid content", "0.5"),
    ("alm1", "Score of the ALOM membrane spanning region program", "0.5"),
    ("alm2", "ALOM score after excluding putative cleavable signal regions", "0.5"),
];

fn config_arg() -> Arg {
    Arg::new("config")
        .help("Path to a JSON configuration file")
        .required(false)
        .value_parser(clap::value_parser!(PathBuf))
        .value_hint(ValueHint::FilePath)
}

fn path_arg(id: &'static str, short: Option<char>, long: &'static str, help: &'static str) -> Arg {
    let arg = Arg::new(id)
        .long(long)
        .help(help)
        .value_parser(clap::builder::NonEmptyStringValueParser::new())
        .value_hint(ValueHint::FilePath);
    match short {
        Some(c) => arg.short(c),
        None => arg,
    }
}

pub fn build_cli() -> Command {
    let mut predict = Command::new("predict")
        .about("Predict the localization site of a single protein")
        .arg(
            Arg::new("model_path")
                .short('m')
                .long("model")
                .help("Path to the trained pipeline artifact")
                .default_value("ecoli.model.json")
                .value_parser(clap::value_parser!(PathBuf))
                .value_hint(ValueHint::FilePath),
        )
        .arg(
            Arg::new("expect_classes")
                .long("expect-classes")
                .help("Comma separated sites the model must have been trained on, e.g. cp,im,pp")
                .value_delimiter(',')
                .value_parser(clap::builder::NonEmptyStringValueParser::new()),
        );
    for (name, help, default) in FEATURE_ARGS {
        predict = predict.arg(
            Arg::new(name)
                .long(name)
                .help(help)
                .default_value(default)
                .allow_negative_numbers(true)
                .value_parser(clap::value_parser!(f64)),
        );
    }

    Command::new("ecoloc")
        .version(clap::crate_version!())
        .author("Justin Sing <justincsing@gmail.com>")
        .about("E. coli protein localization site classifier")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("train")
                .about("Train the decision tree / gradient boosting voting ensemble")
                .arg(config_arg())
                .arg(path_arg(
                    "train_data",
                    Some('d'),
                    "train_data",
                    "Path to the labeled dataset (*.csv or *.tsv). Overrides the configuration file.",
                ))
                .arg(path_arg(
                    "output_file",
                    Some('o'),
                    "output_file",
                    "File the trained pipeline artifact is written to. Overrides the configuration file.",
                ))
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .help("Seed for the train/test split")
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(
                    Arg::new("test_size")
                        .long("test-size")
                        .help("Fraction of samples held out for testing, in [0, 1)")
                        .value_parser(clap::value_parser!(f64)),
                ),
        )
        .subcommand(
            Command::new("evaluate")
                .about("Score a trained pipeline against a labeled dataset")
                .arg(config_arg())
                .arg(path_arg(
                    "data",
                    Some('d'),
                    "data",
                    "Path to the labeled dataset (*.csv or *.tsv)",
                ))
                .arg(path_arg(
                    "model_path",
                    Some('m'),
                    "model",
                    "Path to the trained pipeline artifact",
                ))
                .arg(path_arg(
                    "results_file",
                    None,
                    "results",
                    "Per-sample results table to write",
                ))
                .arg(path_arg(
                    "summary_file",
                    None,
                    "summary",
                    "Precision/recall summary table to write",
                )),
        )
        .subcommand(predict)
        .help_template(
            "{usage-heading} {usage}\n\n\
             {about-with-newline}\n\
             Written by {author-with-newline}Version {version}\n\n\
             {all-args}{after-help}",
        )
}

/// Collect the seven `predict` feature flags in model order.
pub fn feature_vector_from_matches(matches: &clap::ArgMatches) -> FeatureVector {
    let mut values = [0.0; N_FEATURES];
    for (slot, name) in values.iter_mut().zip(FEATURE_NAMES) {
        if let Some(v) = matches.get_one::<f64>(name) {
            *slot = *v;
        }
    }
    FeatureVector::new(values)
}

/// The `--expect-classes` sites as a class set, if given.
pub fn expected_classes_from_matches(matches: &clap::ArgMatches) -> Option<ClassSet> {
    let labels: Vec<Label> = matches
        .get_many::<String>("expect_classes")?
        .map(|c| Label::new(c.trim()))
        .collect();
    Some(ClassSet::from_labels(labels.iter()))
}
