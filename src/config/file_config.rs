//! Optional TOML file configuration.
//!
//! Every field is optional; values present in the file override the CLI.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    pub out_dir: Option<String>,
    pub cache_dir: Option<String>,
    pub base_url: Option<String>,
    pub page_limit: Option<u32>,
    pub max_pages: Option<u32>,
    pub timeout_sec: Option<u64>,
    pub in_flight: Option<usize>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file {:?}", path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "out_dir = \"/exports\"\npage_limit = 50").unwrap();

        let config = FileConfig::load(file.path()).unwrap();
        assert_eq!(config.out_dir.as_deref(), Some("/exports"));
        assert_eq!(config.page_limit, Some(50));
        assert_eq!(config.base_url, None);
    }

    #[test]
    fn test_load_rejects_bad_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "out_dir = [not toml").unwrap();
        assert!(FileConfig::load(file.path()).is_err());
    }
}
