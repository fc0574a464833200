//! Developer utility to fit the Iris classifier offline and report held-out accuracy.

use std::path::PathBuf;

use irisd::config;
use irisd::dataset::load_dataset;
use irisd::ml::logreg::{TrainOptions, fit};
use irisd::ml::metrics::{accuracy, evaluate, mean_confidence, precision_recall_by_class};
use irisd::model_store::save_model;
use irisd::species::Species;

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let defaults = config::load_or_default().map_err(|err| err.to_string())?;
    let options = parse_args(std::env::args().skip(1).collect(), &defaults)?;
    let dataset = load_dataset(&options.dataset).map_err(|err| {
        format!("Failed to load {}: {err}", options.dataset.display())
    })?;
    println!("loaded {} rows from {}", dataset.len(), options.dataset.display());

    if options.holdout > 0.0 {
        let (train, holdout) = dataset.split_holdout(options.holdout, options.seed);
        let model = fit(&train, &options.train).map_err(|err| err.to_string())?;
        let cm = evaluate(&model, &holdout);
        println!("holdout rows: {}", holdout.len());
        println!("holdout accuracy: {:.4}", accuracy(&cm));
        println!("mean confidence: {:.4}", mean_confidence(&model, &holdout));
        for stats in precision_recall_by_class(&cm) {
            println!(
                "{:<16}  precision={:.3}  recall={:.3}  f1={:.3}  support={}",
                stats.species.label(),
                stats.precision,
                stats.recall,
                stats.f1(),
                stats.support
            );
        }
        println!("confusion matrix (rows=true, cols=pred):");
        for truth in Species::ALL {
            let row: String = Species::ALL
                .iter()
                .map(|&pred| format!("{:6}", cm.get(truth, pred)))
                .collect();
            println!("{row}");
        }
    }

    let model = fit(&dataset, &options.train).map_err(|err| err.to_string())?;
    save_model(&model, &options.model_out).map_err(|err| err.to_string())?;
    println!("model written to {}", options.model_out.display());
    Ok(())
}

#[derive(Debug, Clone)]
struct CliOptions {
    dataset: PathBuf,
    model_out: PathBuf,
    train: TrainOptions,
    holdout: f64,
    seed: u64,
}

fn parse_args(args: Vec<String>, defaults: &config::ServiceConfig) -> Result<CliOptions, String> {
    let mut options = CliOptions {
        dataset: defaults.paths.dataset.clone(),
        model_out: defaults.paths.model.clone(),
        train: defaults.training.options(),
        holdout: 0.2,
        seed: 42,
    };

    let mut idx = 0usize;
    while idx < args.len() {
        let flag = args[idx].as_str();
        if matches!(flag, "-h" | "--help") {
            return Err(help_text());
        }
        idx += 1;
        let value = args
            .get(idx)
            .ok_or_else(|| format!("{flag} requires a value"))?;
        match flag {
            "--dataset" => options.dataset = PathBuf::from(value),
            "--out" => options.model_out = PathBuf::from(value),
            "--alpha" => options.train.alpha = parse_value(flag, value)?,
            "--max-iterations" => options.train.max_iterations = parse_value(flag, value)?,
            "--holdout" => {
                let holdout: f64 = parse_value(flag, value)?;
                if !(0.0..1.0).contains(&holdout) {
                    return Err(format!("--holdout must be in [0, 1): {value}"));
                }
                options.holdout = holdout;
            }
            "--seed" => options.seed = parse_value(flag, value)?,
            unknown => return Err(format!("Unknown argument: {unknown}\n\n{}", help_text())),
        }
        idx += 1;
    }
    Ok(options)
}

fn parse_value<T: std::str::FromStr>(flag: &str, value: &str) -> Result<T, String> {
    value
        .parse::<T>()
        .map_err(|_| format!("Invalid {flag} value: {value}"))
}

fn help_text() -> String {
    [
        "irisd-train",
        "",
        "Fits the multinomial logistic regression used by irisd and writes the model file.",
        "",
        "Usage:",
        "  irisd-train [--dataset iris.csv] [--out model.json] [options]",
        "",
        "Options:",
        "  --dataset <file>        Labeled CSV (default: configured dataset path).",
        "  --out <file>            Output model path (default: configured model path).",
        "  --alpha <f64>           L2 regularization strength (default: 1.0).",
        "  --max-iterations <n>    Solver iteration limit (default: 100).",
        "  --holdout <f64>         Fraction held out for the accuracy report; 0 disables (default: 0.2).",
        "  --seed <u64>            Shuffle seed for the holdout split (default: 42).",
    ]
    .join("\n")
}
