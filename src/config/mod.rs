mod file_config;

pub use file_config::FileConfig;

use anyhow::Result;
use std::path::PathBuf;

pub const DEFAULT_BASE_URL: &str = "http://pebbles.o5.no";
pub const DEFAULT_PAGE_LIMIT: u32 = 25;
pub const DEFAULT_TIMEOUT_SEC: u64 = 300;
pub const DEFAULT_IN_FLIGHT: usize = 4;

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub out_dir: PathBuf,
    pub cache_dir: PathBuf,
    pub base_url: String,
    pub page_limit: u32,
    pub max_pages: Option<u32>,
    pub timeout_sec: u64,
    pub in_flight: usize,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from("./out"),
            cache_dir: PathBuf::from("./cache"),
            base_url: DEFAULT_BASE_URL.to_string(),
            page_limit: DEFAULT_PAGE_LIMIT,
            max_pages: None,
            timeout_sec: DEFAULT_TIMEOUT_SEC,
            in_flight: DEFAULT_IN_FLIGHT,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub out_dir: PathBuf,
    pub cache_dir: PathBuf,
    pub base_url: String,
    pub page_limit: u32,
    pub max_pages: Option<u32>,
    pub timeout_sec: u64,
    pub in_flight: usize,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let out_dir = file
            .out_dir
            .map(PathBuf::from)
            .unwrap_or_else(|| cli.out_dir.clone());
        let cache_dir = file
            .cache_dir
            .map(PathBuf::from)
            .unwrap_or_else(|| cli.cache_dir.clone());
        let base_url = file.base_url.unwrap_or_else(|| cli.base_url.clone());
        let page_limit = file.page_limit.unwrap_or(cli.page_limit);
        let max_pages = file.max_pages.or(cli.max_pages);
        let timeout_sec = file.timeout_sec.unwrap_or(cli.timeout_sec);
        let in_flight = file.in_flight.unwrap_or(cli.in_flight).max(1);

        Ok(Self {
            out_dir,
            cache_dir,
            base_url,
            page_limit,
            max_pages,
            timeout_sec,
            in_flight,
        })
    }
}
