//! Score the configured classifier on a labelled `text;label` file.

use clap::Parser;
use sentio::SentioConfig;
use sentio::evaluation::{evaluate, load_labelled};
use sentio_model::{Backend, EmotionClassifier};
use std::path::PathBuf;
use tracing::info;

/// Evaluate a sentio emotion model.
#[derive(Parser)]
#[command(name = "sentio-eval", version, about)]
struct Cli {
    /// Labelled test file, one `text;label` per line.
    test_file: PathBuf,

    /// Path to TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the classifier backend.
    #[arg(short, long)]
    backend: Option<Backend>,

    /// Also write the report as JSON.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = SentioConfig::load_or_default(cli.config.as_deref())?;
    if let Some(backend) = cli.backend {
        config.classifier.backend = backend;
    }
    let _log_guard = sentio::logging::init(&config.logging)?;

    let samples = load_labelled(&cli.test_file)?;
    let mut classifier = EmotionClassifier::new(config.classifier.clone())?;
    info!(
        backend = config.classifier.backend.name(),
        examples = samples.len(),
        "evaluating"
    );

    let report = evaluate(&mut classifier, &samples)?;
    if !classifier.is_loaded() {
        anyhow::bail!(
            "no {} model found under {}; every prediction was the neutral fallback",
            config.classifier.backend.name(),
            config.classifier.model_dir.display()
        );
    }
    println!("{report}");

    if let Some(path) = cli.output {
        std::fs::write(&path, serde_json::to_string_pretty(&report)?)?;
        println!("Report written to {}", path.display());
    }
    Ok(())
}
