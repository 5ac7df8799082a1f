use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod answerer;
mod model;
mod service;

use answerer::HttpAnswerer;
use model::Config;
use service::{BatchRunner, CheckpointStore, RunOptions, RunOutcome};

#[derive(Parser)]
#[command(
    name = "crystal-verify",
    version,
    about = "Cross-validates crystallization image captions against a vision-language model"
)]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Run batch verification over the caption corpus
    Verify {
        /// Captions corpus file (overrides configuration)
        #[arg(long)]
        captions: Option<PathBuf>,
        /// Verify a random sample instead of the full corpus
        #[arg(long)]
        sample: Option<usize>,
        /// Ignore an existing checkpoint and start fresh
        #[arg(long)]
        no_resume: bool,
    },
    /// Re-validate and re-score the persisted result set
    Reprocess,
    /// Recompute statistics and the needs-review set from stored results
    Stats,
    /// Render the prompt battery for every corpus record without the model
    Prompts {
        /// Captions corpus file (overrides configuration)
        #[arg(long)]
        captions: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (ignore if missing)
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_env();

    match cli.cmd {
        Cmd::Verify {
            captions,
            sample,
            no_resume,
        } => {
            if let Some(path) = captions {
                config.captions_file = path;
            }

            let cancel = Arc::new(AtomicBool::new(false));
            {
                let cancel = Arc::clone(&cancel);
                tokio::spawn(async move {
                    if tokio::signal::ctrl_c().await.is_ok() {
                        tracing::info!("Interrupt received, pausing after the current image");
                        cancel.store(true, Ordering::Relaxed);
                    }
                });
            }

            let answerer = Arc::new(HttpAnswerer::new(&config.answerer));
            let options = RunOptions {
                sample_size: sample,
                resume: !no_resume,
            };
            let mut runner = BatchRunner::new(answerer, config, options, cancel)?;

            match runner.run().await? {
                RunOutcome::Completed(statistics) => {
                    tracing::info!(
                        total = statistics.total_processed,
                        needs_review = statistics.needs_review_count,
                        phase_match_rate = statistics.phase_match_rate,
                        "Run completed"
                    );
                }
                RunOutcome::Paused {
                    processed,
                    remaining,
                } => {
                    tracing::info!(
                        processed,
                        remaining,
                        "Run paused; re-run the same command to resume"
                    );
                }
                RunOutcome::Empty => {
                    tracing::warn!("No images could be located; nothing verified");
                }
            }
        }
        Cmd::Reprocess => {
            let store = CheckpointStore::new(&config.output_dir)?;
            let statistics = service::reprocess::reprocess_results(&store)?;
            tracing::info!(
                total = statistics.total_processed,
                needs_review = statistics.needs_review_count,
                "Result set re-scored"
            );
        }
        Cmd::Stats => {
            let store = CheckpointStore::new(&config.output_dir)?;
            let results = store.load_results()?;
            let statistics = service::stats::compute_statistics(&results);
            let review = service::stats::needs_review(&results);
            store.write_statistics(&statistics)?;
            store.write_needs_review(&review)?;
            tracing::info!(
                total = statistics.total_processed,
                needs_review = statistics.needs_review_count,
                "Statistics recomputed"
            );
        }
        Cmd::Prompts { captions } => {
            if let Some(path) = captions {
                config.captions_file = path;
            }
            let records = service::corpus::load_corpus(&config.captions_file)?;
            let output = config.output_dir.join("verification_prompts_prepared.json");
            let count = service::catalog::export_prompts(&records, &output)?;
            tracing::info!(images = count, path = %output.display(), "Prompt battery prepared");
        }
    }

    Ok(())
}
