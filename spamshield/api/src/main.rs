use std::{path::PathBuf, sync::Arc};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use shared_logging::{LogLevel, Telemetry};
use spamshield_api::{AppContext, ConfigOverrides, ServiceConfig};
use spamshield_learning::SpamClassifier;
use spamshield_nlp::{Dataset, DatasetStats};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "spamshield", version, about = "SMS spam detection service")]
struct Cli {
    /// TOML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Listen address override.
    #[arg(long, global = true)]
    bind: Option<String>,
    /// Dataset path override.
    #[arg(long, global = true)]
    dataset: Option<PathBuf>,
    /// Model directory override.
    #[arg(long, global = true)]
    model_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Runs the HTTP API (default).
    Serve,
    /// Trains on the configured dataset and saves the model.
    Train,
    /// Classifies one message with the saved model.
    Predict {
        /// Message text.
        message: String,
    },
    /// Prints dataset statistics.
    Stats {
        /// Also lists messages containing this keyword.
        #[arg(long)]
        search: Option<String>,
        /// Maximum search hits.
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = ServiceConfig::load_or_default(cli.config.as_deref())?.with_overrides(ConfigOverrides {
        bind: cli.bind,
        dataset_path: cli.dataset,
        model_dir: cli.model_dir,
    });
    let telemetry = match &config.log_path {
        Some(path) => Telemetry::builder("spamshield")
            .log_path(path)
            .build()
            .with_context(|| format!("opening log file {}", path.display()))?,
        None => Telemetry::console("spamshield"),
    };

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            let ctx = Arc::new(AppContext::bootstrap(config, telemetry.scoped("spamshield.api")));
            spamshield_api::serve(ctx).await
        }
        Commands::Train => handle_train(&config, &telemetry),
        Commands::Predict { message } => handle_predict(&config, &message),
        Commands::Stats { search, limit } => handle_stats(&config, search.as_deref(), limit),
    }
}

fn handle_train(config: &ServiceConfig, telemetry: &Telemetry) -> Result<()> {
    let mut classifier = SpamClassifier::with_settings(config.training.clone())
        .with_telemetry(telemetry.scoped("spamshield.classifier"));
    let report = classifier
        .train_report(&config.dataset_path)
        .with_context(|| format!("training on {}", config.dataset_path.display()))?;
    classifier
        .save(&config.model_dir)
        .with_context(|| format!("saving model to {}", config.model_dir.display()))?;
    let _ = telemetry.log(
        LogLevel::Info,
        "cli.train.completed",
        json!({ "accuracy": report.accuracy, "model_dir": config.model_dir.display().to_string() }),
    );
    println!("{}", report.summary());
    Ok(())
}

fn handle_predict(config: &ServiceConfig, message: &str) -> Result<()> {
    let mut classifier = SpamClassifier::with_settings(config.training.clone());
    if !classifier
        .load(&config.model_dir)
        .with_context(|| format!("loading model from {}", config.model_dir.display()))?
    {
        bail!("Model not trained yet. Please train the model first.");
    }
    let message = message.trim();
    if message.is_empty() {
        bail!("Message cannot be empty");
    }
    let result = classifier.predict(message)?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn handle_stats(config: &ServiceConfig, search: Option<&str>, limit: usize) -> Result<()> {
    let dataset = Dataset::load(&config.dataset_path)
        .with_context(|| format!("loading dataset {}", config.dataset_path.display()))?;
    let stats = DatasetStats::new(dataset);
    println!("{}", serde_json::to_string_pretty(stats.summary())?);
    if let Some(keyword) = search {
        for hit in stats.search(keyword, limit) {
            println!("{} | {}", hit.label, hit.message);
        }
    }
    Ok(())
}
