use folio_sync::SessionConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_NAME: &str = "folio.config.json";

/// Folio configuration file format
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Layout catalog used when a command gets no `--catalog`
    #[serde(default)]
    pub catalog: Option<String>,

    /// Fixed seed for layout picks, for reproducible corrections
    #[serde(default)]
    pub seed: Option<u64>,

    #[serde(default)]
    pub session: SessionConfig,
}

impl Config {
    /// Load config from a directory
    pub fn load(cwd: &Path) -> anyhow::Result<Self> {
        let config_path = cwd.join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            tracing::debug!(path = %config_path.display(), "Loaded config");
            Ok(config)
        } else {
            // Return default config if none exists
            Ok(Config::default())
        }
    }

    /// Catalog path: the command line wins over the config file
    pub fn catalog_path(&self, cwd: &Path, arg: Option<&Path>) -> Option<PathBuf> {
        match arg {
            Some(path) => Some(path.to_path_buf()),
            None => self.catalog.as_ref().map(|path| cwd.join(path)),
        }
    }

    pub fn seed(&self, arg: Option<u64>) -> Option<u64> {
        arg.or(self.seed)
    }
}
