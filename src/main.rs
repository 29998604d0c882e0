use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use triage_data::{DatasetReader, LabelCodec, train_test_split};
use triage_forest::{Forest, ForestConfig};
use triage_service::DiagnosisService;

#[derive(Parser)]
#[command(name = "triage")]
#[command(about = "Symptom-to-diagnosis classification with a Random Forest")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// RNG seed for the train/test split and tree training
    #[arg(long, default_value_t = 42, global = true)]
    seed: u64,

    /// Enable verbose (debug-level) logging
    #[arg(long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Number of threads for parallel computation (defaults to all cores)
    #[arg(long, global = true)]
    threads: Option<usize>,
}

#[derive(Subcommand)]
enum Command {
    /// Train a classifier on a symptom dataset and save the model
    Train {
        /// Path to the training CSV file
        #[arg(long)]
        data: PathBuf,

        /// Path to write the trained model binary
        #[arg(long)]
        model: PathBuf,

        /// Number of trees in the Random Forest
        #[arg(long, default_value_t = 200)]
        n_trees: usize,

        /// Maximum tree depth
        #[arg(long, default_value_t = 20)]
        max_depth: usize,

        /// Fraction of rows held out for evaluation
        #[arg(long, default_value_t = 0.2)]
        test_fraction: f64,
    },

    /// Evaluate a saved model on the held-out partition of a dataset
    Evaluate {
        /// Path to the training CSV file
        #[arg(long)]
        data: PathBuf,

        /// Path to the trained model binary
        #[arg(long)]
        model: PathBuf,

        /// Fraction of rows held out for evaluation
        #[arg(long, default_value_t = 0.2)]
        test_fraction: f64,
    },

    /// Diagnose from a list of symptom names using a saved model
    Diagnose {
        /// Path to the training CSV file (defines the vocabulary and labels)
        #[arg(long)]
        data: PathBuf,

        /// Path to the trained model binary (trained if missing)
        #[arg(long)]
        model: PathBuf,

        /// Symptom names, e.g. --symptoms fever cough
        #[arg(long, num_args = 1.., required = true)]
        symptoms: Vec<String>,
    },

    /// List the symptom vocabulary and diagnosis labels of a dataset
    Symptoms {
        /// Path to the training CSV file
        #[arg(long)]
        data: PathBuf,
    },
}

// --- JSON stdout output structs ---

#[derive(Serialize)]
struct TrainOutput {
    n_samples: usize,
    n_train: usize,
    n_test: usize,
    n_symptoms: usize,
    n_classes: usize,
    n_trees: usize,
    training_accuracy: f64,
    holdout_accuracy: f64,
    model: PathBuf,
}

#[derive(Serialize)]
struct EvaluateOutput {
    n_test: usize,
    accuracy: f64,
    macro_f1: f64,
    classes: Vec<ClassMetricsOutput>,
}

#[derive(Serialize)]
struct ClassMetricsOutput {
    diagnosis: String,
    precision: f64,
    recall: f64,
    f1: f64,
    support: usize,
}

#[derive(Serialize)]
struct DiagnoseOutput {
    diagnosis: String,
    symptoms: Vec<String>,
}

#[derive(Serialize)]
struct SymptomsOutput {
    symptoms: Vec<String>,
    diagnoses: Vec<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match (cli.verbose, cli.quiet) {
        (true, _) => "debug",
        (_, true) => "error",
        _ => "info",
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Configure Rayon thread pool
    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("failed to configure thread pool")?;
        info!(threads, "thread pool configured");
    }

    match cli.command {
        Command::Train {
            data,
            model,
            n_trees,
            max_depth,
            test_fraction,
        } => {
            // Read dataset and encode labels
            let dataset = DatasetReader::new(&data)
                .read()
                .context("failed to read training CSV")?;
            let codec = LabelCodec::fit(dataset.labels());
            let labels = dataset
                .labels()
                .iter()
                .map(|l| codec.encode(l))
                .collect::<Result<Vec<_>, _>>()?;
            info!(
                n_samples = dataset.n_samples(),
                n_symptoms = dataset.vocabulary().len(),
                n_classes = codec.len(),
                "dataset loaded"
            );

            // Split, train, save
            let split = train_test_split(dataset.features(), &labels, test_fraction, cli.seed)?;

            let config = ForestConfig::new(n_trees)?
                .with_max_depth(Some(max_depth))
                .with_seed(cli.seed);
            let report = config
                .fit(&split.train_features, &split.train_labels)
                .context("training failed")?;
            info!(
                training_accuracy = report.training_accuracy(),
                "training complete"
            );

            report.forest().save(&model).context("failed to save model")?;

            // Evaluate on the held-out partition
            let evaluation = report
                .forest()
                .evaluate(&split.test_features, &split.test_labels)
                .context("evaluation failed")?;

            let output = TrainOutput {
                n_samples: dataset.n_samples(),
                n_train: split.n_train(),
                n_test: split.n_test(),
                n_symptoms: dataset.vocabulary().len(),
                n_classes: codec.len(),
                n_trees,
                training_accuracy: report.training_accuracy(),
                holdout_accuracy: evaluation.accuracy,
                model,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Evaluate {
            data,
            model,
            test_fraction,
        } => {
            // Re-derive the same held-out partition the model was trained
            // against (same dataset, fraction, and seed).
            let dataset = DatasetReader::new(&data)
                .read()
                .context("failed to read training CSV")?;
            let codec = LabelCodec::fit(dataset.labels());
            let labels = dataset
                .labels()
                .iter()
                .map(|l| codec.encode(l))
                .collect::<Result<Vec<_>, _>>()?;
            let split = train_test_split(dataset.features(), &labels, test_fraction, cli.seed)?;

            let forest = Forest::load(&model).context("failed to load model")?;
            let evaluation = forest
                .evaluate(&split.test_features, &split.test_labels)
                .context("evaluation failed")?;
            info!(accuracy = evaluation.accuracy, "evaluation complete");

            let classes = evaluation
                .class_report
                .iter()
                .map(|m| {
                    Ok(ClassMetricsOutput {
                        diagnosis: codec.decode(m.class)?.to_string(),
                        precision: m.precision,
                        recall: m.recall,
                        f1: m.f1,
                        support: m.support,
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            let output = EvaluateOutput {
                n_test: split.n_test(),
                accuracy: evaluation.accuracy,
                macro_f1: evaluation.confusion.macro_f1(),
                classes,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Diagnose {
            data,
            model,
            symptoms,
        } => {
            let config = ForestConfig::default().with_seed(cli.seed);
            let (service, _) = DiagnosisService::bootstrap(&data, &model, &config)
                .context("failed to bring up the diagnosis service")?;

            let diagnosis = service
                .diagnose(&symptoms)
                .context("failed to produce a diagnosis")?;

            let output = DiagnoseOutput {
                diagnosis: diagnosis.diagnosis,
                symptoms: diagnosis.symptoms,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Symptoms { data } => {
            let dataset = DatasetReader::new(&data)
                .read()
                .context("failed to read training CSV")?;
            let codec = LabelCodec::fit(dataset.labels());

            let output = SymptomsOutput {
                symptoms: dataset.vocabulary().names().to_vec(),
                diagnoses: codec.classes().to_vec(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
