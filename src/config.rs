use crate::automation::EmailAutomation;
use crate::currency::{Currency, reference_currencies};
use crate::template::EmailTemplate;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct NotifierConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ProvidersConfig {
    /// HTTP notification backend. When absent, sends run against the
    /// in-process simulated backend.
    pub notifier: Option<NotifierConfig>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    #[serde(default = "reference_currencies")]
    pub currencies: Vec<Currency>,
    #[serde(default)]
    pub templates: Vec<EmailTemplate>,
    #[serde(default)]
    pub automations: Vec<EmailAutomation>,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default = "default_admin_email")]
    pub admin_email: String,
    /// Overrides the data directory used for the email log.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

fn default_admin_email() -> String {
    "admin@agency.com".to_string()
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("io", "flowdesk", "flowdesk")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn default_data_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("io", "flowdesk", "flowdesk")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    /// Directory holding the email log, configurable for tests.
    pub fn data_path(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => Self::default_data_path(),
        }
    }
}
