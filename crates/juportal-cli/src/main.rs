//! Juportal CLI.
//!
//! Usage:
//!   juportal run --input <dir> --output <dir> [--mapping table.csv] [--config config.json]
//!   juportal revalidate --output <dir>

mod summary;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use juportal_llm::{ChatClient, DEFAULT_BASE_URL, DEFAULT_MODEL};
use juportal_pipeline::{Pipeline, PipelineConfig};
use tracing::{Level, info};

#[derive(Parser)]
#[command(
    name = "juportal",
    version,
    about = "Flatten, deduplicate and language-validate Juportal decisions"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// JSON config file; flags override its values
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Transform every document of the input directory and write the results
    Run {
        /// Directory of raw Juportal JSON files
        #[arg(long, env = "JUPORTAL_INPUT")]
        input: PathBuf,
        /// Output directory (created if missing)
        #[arg(long, env = "JUPORTAL_OUTPUT")]
        output: PathBuf,
        /// CSV label table (field,legend1,legend2,...)
        #[arg(long, env = "JUPORTAL_MAPPING")]
        mapping: Option<PathBuf>,
        /// Stage-1 worker threads
        #[arg(long)]
        workers: Option<usize>,
        #[command(flatten)]
        stage2: Stage2Args,
    },
    /// Rerun stage-2 validation over the uncertain records of a previous run
    Revalidate {
        /// Output directory of the previous run
        #[arg(long, env = "JUPORTAL_OUTPUT")]
        output: PathBuf,
        #[command(flatten)]
        stage2: Stage2Args,
    },
}

#[derive(Args)]
struct Stage2Args {
    /// API key for the classification service; stage 2 is skipped without one
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
    /// Chat-completions base URL
    #[arg(long, env = "JUPORTAL_LLM_BASE_URL", default_value = DEFAULT_BASE_URL)]
    llm_base_url: String,
    #[arg(long, env = "JUPORTAL_LLM_MODEL", default_value = DEFAULT_MODEL)]
    llm_model: String,
    /// Records per classification request
    #[arg(long)]
    batch_size: Option<usize>,
    /// Concurrent classification requests
    #[arg(long)]
    concurrency: Option<usize>,
    /// Leave uncertain records unresolved instead of calling the service
    #[arg(long)]
    no_llm: bool,
}

impl Stage2Args {
    fn apply(&self, config: &mut PipelineConfig) {
        if let Some(n) = self.batch_size {
            config.batch_size = n;
        }
        if let Some(n) = self.concurrency {
            config.max_concurrency = n;
        }
    }

    fn client(&self, config: &PipelineConfig) -> ChatClient {
        let key = if self.no_llm { None } else { self.api_key.clone() };
        ChatClient::new(
            &self.llm_base_url,
            key,
            &self.llm_model,
            Duration::from_secs(config.request_timeout_secs),
        )
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<PipelineConfig> {
    match path {
        Some(path) => PipelineConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(PipelineConfig::default()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
    info!("juportal v{}", env!("CARGO_PKG_VERSION"));

    let mut config = load_config(cli.config.as_deref())?;
    let start = Instant::now();

    let stats = match cli.command {
        Commands::Run {
            input,
            output,
            mapping,
            workers,
            stage2,
        } => {
            if mapping.is_some() {
                config.mapping_table = mapping;
            }
            if workers.is_some() {
                config.workers = workers;
            }
            stage2.apply(&mut config);
            let client = stage2.client(&config);
            let pipeline = Pipeline::new(config, Arc::new(client)).context("starting pipeline")?;
            pipeline
                .run(&input, &output)
                .await
                .with_context(|| format!("processing {}", input.display()))?
        }
        Commands::Revalidate { output, stage2 } => {
            stage2.apply(&mut config);
            let client = stage2.client(&config);
            let pipeline = Pipeline::new(config, Arc::new(client)).context("starting pipeline")?;
            pipeline
                .revalidate(&output)
                .await
                .with_context(|| format!("revalidating {}", output.display()))?
        }
    };

    summary::print_summary(&stats, start.elapsed());
    Ok(())
}
