use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use bandwagon_nb_export::config::{self, AppConfig, FileConfig};
use bandwagon_nb_export::materializer::Materializer;
use bandwagon_nb_export::pipeline::{ExportPipeline, PipelineSettings};
use bandwagon_nb_export::GroveClient;

/// Export Bandwagon tracks into the national library archival format:
/// one audio file and one metadata XML document per track, grouped by year.
#[derive(Parser, Debug)]
struct CliArgs {
    /// Years to export (e.g. 2012 2013).
    #[clap(required = true)]
    pub years: Vec<u16>,

    /// Path to TOML configuration file. Values in the file override CLI arguments.
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// Directory the archival package is written to, one subdirectory per year.
    #[clap(long, default_value = "./out")]
    pub out_dir: PathBuf,

    /// Directory for the write-once local copies of remote audio assets.
    #[clap(long, default_value = "./cache")]
    pub cache_dir: PathBuf,

    /// Base URL of the grove content services.
    #[clap(long, default_value = config::DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Page size for catalog queries.
    #[clap(long, default_value_t = config::DEFAULT_PAGE_LIMIT)]
    pub page_limit: u32,

    /// Stop after this many pages per year (for partial runs).
    #[clap(long)]
    pub max_pages: Option<u32>,

    /// Timeout in seconds for remote requests and downloads.
    #[clap(long, default_value_t = config::DEFAULT_TIMEOUT_SEC)]
    pub timeout_sec: u64,

    /// Number of records processed concurrently.
    #[clap(long, default_value_t = config::DEFAULT_IN_FLIGHT)]
    pub in_flight: usize,
}

/// Convert CLI args to CliConfig for config resolution
impl From<&CliArgs> for config::CliConfig {
    fn from(args: &CliArgs) -> Self {
        config::CliConfig {
            out_dir: args.out_dir.clone(),
            cache_dir: args.cache_dir.clone(),
            base_url: args.base_url.clone(),
            page_limit: args.page_limit,
            max_pages: args.max_pages,
            timeout_sec: args.timeout_sec,
            in_flight: args.in_flight,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let file_config = match &args.config {
        Some(path) => Some(FileConfig::load(path)?),
        None => None,
    };
    let config = AppConfig::resolve(&(&args).into(), file_config)?;

    info!(
        years = ?args.years,
        out_dir = %config.out_dir.display(),
        cache_dir = %config.cache_dir.display(),
        base_url = %config.base_url,
        "Starting export"
    );

    tokio::fs::create_dir_all(&config.out_dir).await?;

    let gateway = Arc::new(GroveClient::new(&config.base_url, config.timeout_sec)?);
    let materializer = Materializer::new(config.timeout_sec)?;
    let settings = PipelineSettings {
        cache_dir: config.cache_dir.clone(),
        out_dir: config.out_dir.clone(),
        page_limit: config.page_limit,
        max_pages: config.max_pages,
        in_flight: config.in_flight,
    };

    let pipeline = ExportPipeline::new(gateway, materializer, settings);
    let summary = pipeline.run(&args.years).await?;

    if summary.has_failures() {
        info!("Export finished with failures; see the log lines above");
    } else {
        info!("Export finished");
    }
    Ok(())
}
