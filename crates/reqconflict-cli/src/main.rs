//! reqconflict: pairwise requirement conflict classification.
//!
//! Usage:
//!     reqconflict --mode train --training-data labeled.csv --iterations 3
//!     reqconflict --mode predict --input requirements.csv --output conflict_results
//!     reqconflict --mode both --training-data labeled.csv --input requirements.csv

mod display;
mod interactive;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, bail};
use clap::{Parser, ValueEnum};
use reqconflict_ai::http::{DEFAULT_API_URL, HttpBackend};
use reqconflict_ai::{
    CachedInference, Corpus, FixedIntervalGate, InferenceClient, LabeledDataset, PairingEngine,
    RefinementConfig, Refiner,
};
use reqconflict_core::{CategoryWeights, DedupPolicy};
use reqconflict_store::{ResultSink, read_table, read_weights};
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

use crate::interactive::{Session, spawn_stdin_reader};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Refine category weights against a labeled corpus.
    Train,
    /// Classify a requirements corpus.
    Predict,
    /// Train, then predict with the refined weights.
    Both,
}

impl Mode {
    fn trains(self) -> bool {
        matches!(self, Self::Train | Self::Both)
    }

    fn predicts(self) -> bool {
        matches!(self, Self::Predict | Self::Both)
    }
}

#[derive(Parser, Debug)]
#[command(name = "reqconflict")]
#[command(about = "Classify pairwise conflicts between requirements with an LLM")]
#[command(version)]
struct Args {
    /// What to run
    #[arg(long, value_enum, default_value = "predict")]
    mode: Mode,

    /// Requirements corpus to classify (CSV or Parquet)
    #[arg(long)]
    input: Option<PathBuf>,

    /// Labeled pairs for refinement (Requirement_1, Requirement_2, Conflict_Type)
    #[arg(long)]
    training_data: Option<PathBuf>,

    /// Base name for output artifacts
    #[arg(long, default_value = "conflict_results")]
    output: String,

    /// Directory for output artifacts
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// Refinement rounds
    #[arg(long, default_value_t = 3)]
    iterations: usize,

    /// Stop refinement once a round reaches this accuracy (0.0 to 1.0)
    #[arg(long)]
    stop_at_accuracy: Option<f64>,

    /// Category weights saved by an earlier training run
    #[arg(long)]
    weights: Option<PathBuf>,

    /// Text-generation endpoint
    #[arg(long, env = "REQCONFLICT_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Bearer token for the endpoint
    #[arg(long, env = "HF_API_TOKEN", hide_env_values = true)]
    api_token: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 10)]
    request_timeout_secs: u64,

    /// Pause after each successful call in seconds
    #[arg(long, default_value_t = 4)]
    call_delay_secs: u64,

    /// Maximum cached prompts
    #[arg(long, default_value_t = 4096)]
    cache_capacity: usize,

    /// Seconds to wait for each interactive entry
    #[arg(long, default_value_t = 30)]
    input_timeout_secs: u64,

    /// Skip the interactive session after a bulk run
    #[arg(long)]
    no_interactive: bool,

    /// Treat (A, B) and (B, A) as the same pair
    #[arg(long)]
    symmetric_dedup: bool,

    /// Log level (debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let log_level = match args.log_level.as_str() {
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    info!("reqconflict v{}", env!("CARGO_PKG_VERSION"));

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    // Every input is loaded and validated before the first inference call.
    let dataset = if args.mode.trains() {
        let Some(path) = &args.training_data else {
            bail!("--training-data is required for --mode {:?}", args.mode);
        };
        let table = read_table(path).with_context(|| format!("reading {}", path.display()))?;
        let dataset = LabeledDataset::from_batches(&table.schema, &table.batches)
            .with_context(|| format!("loading labeled pairs from {}", path.display()))?;
        Some(dataset)
    } else {
        None
    };

    let corpus = if args.mode.predicts() {
        let Some(path) = &args.input else {
            bail!("--input is required for --mode {:?}", args.mode);
        };
        let table = read_table(path).with_context(|| format!("reading {}", path.display()))?;
        let corpus = Corpus::from_batches(&table.schema, &table.batches)
            .with_context(|| format!("loading requirements from {}", path.display()))?;
        Some(corpus)
    } else {
        None
    };

    let mut weights: Option<CategoryWeights> = match &args.weights {
        Some(path) => Some(
            read_weights(path).with_context(|| format!("reading weights {}", path.display()))?,
        ),
        None => None,
    };

    if args.api_token.is_none() {
        warn!("no API token configured; requests are sent unauthenticated");
    }
    let backend = HttpBackend::new(
        args.api_url.clone(),
        args.api_token.clone(),
        Duration::from_secs(args.request_timeout_secs),
    )
    .context("building HTTP client")?;
    let client = InferenceClient::with_gate(
        backend,
        Box::new(FixedIntervalGate::new(Duration::from_secs(args.call_delay_secs))),
    );
    let mut inference = CachedInference::with_capacity(client, args.cache_capacity);
    let sink = ResultSink::new(&args.output_dir);

    if let Some(dataset) = &dataset {
        display::print_label_summary(&dataset.summary());

        let config = RefinementConfig {
            iterations: args.iterations,
            stop_at_accuracy: args.stop_at_accuracy,
            ..RefinementConfig::default()
        };
        let refiner = match weights.take() {
            Some(initial) => Refiner::with_weights(config, initial),
            None => Refiner::new(config),
        };
        let outcome = refiner.run(&mut inference, dataset).await;
        display::print_refinement(&outcome);

        sink.write_csv_named(&args.output, "training", &outcome.results())
            .context("writing training predictions")?;
        sink.write_weights(&args.output, &outcome.weights)
            .context("writing category weights")?;
        weights = Some(outcome.weights);
    }

    let Some(corpus) = corpus else {
        display::print_inference_stats(inference.stats(), inference.inner().stats());
        return Ok(());
    };

    let policy = if args.symmetric_dedup {
        DedupPolicy::Symmetric
    } else {
        DedupPolicy::Ordered
    };
    let mut engine = PairingEngine::new(inference, weights, policy);

    let results = match &corpus {
        Corpus::Requirements(requirements) => engine.analyze_corpus(requirements).await,
        Corpus::Pairs(pairs) => engine.analyze_pairs(pairs).await,
    };
    let paths = sink
        .write_results(&args.output, &results)
        .await
        .context("writing results")?;
    display::print_bulk_summary(&results, engine.stats())?;
    println!("  Saved to {} and {}", paths.csv.display(), paths.xlsx.display());

    if !args.no_interactive {
        let session = Session {
            sink: &sink,
            output: &args.output,
            timeout: Duration::from_secs(args.input_timeout_secs),
        };
        let mut existing = corpus.requirements();
        let mut input = spawn_stdin_reader();
        let shutdown = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
        };
        session
            .run(&mut engine, &mut existing, &mut input, shutdown)
            .await;
    }

    let inference = engine.into_inner();
    display::print_inference_stats(inference.stats(), inference.inner().stats());
    Ok(())
}
