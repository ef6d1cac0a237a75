// Settings layer
//
// Sources, lowest to highest precedence: built-in defaults, optional TOML file, then
// `AZSQL_DEPLOY_*` environment variables (`__` separates nested keys, e.g.
// `AZSQL_DEPLOY_MANAGEMENT__TIMEOUT_SECS=10`).

use ::config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::DeployResult;
use crate::models::azure::Tenant;

pub const ENV_PREFIX: &str = "AZSQL_DEPLOY";

pub const DEFAULT_MANAGEMENT_ENDPOINT: &str = "https://management.azure.com";
pub const DEFAULT_SUBSCRIPTIONS_API_VERSION: &str = "2020-01-01";
pub const DEFAULT_SQL_API_VERSION: &str = "2019-06-01-preview";
pub const DEFAULT_DATABASES_API_VERSION: &str = "2017-10-01-preview";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub management: ManagementSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
    #[serde(default)]
    pub notebook: NotebookSettings,
    /// Accounts the static credential provider hands out.
    #[serde(default)]
    pub accounts: Vec<AccountConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ManagementSettings {
    pub endpoint: String,
    pub subscriptions_api_version: String,
    pub sql_api_version: String,
    pub databases_api_version: String,
    pub timeout_secs: u64,
}

impl Default for ManagementSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_MANAGEMENT_ENDPOINT.to_string(),
            subscriptions_api_version: DEFAULT_SUBSCRIPTIONS_API_VERSION.to_string(),
            sql_api_version: DEFAULT_SQL_API_VERSION.to_string(),
            databases_api_version: DEFAULT_DATABASES_API_VERSION.to_string(),
            timeout_secs: 30,
        }
    }
}

impl ManagementSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    /// `error` | `warn` | `info` | `debug` | `trace`
    pub level: String,
    pub stdout: bool,
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "debug".to_string(),
            stdout: true,
            directory: None,
        }
    }
}

impl LoggingSettings {
    pub fn level_filter(&self) -> log::LevelFilter {
        self.level
            .trim()
            .parse::<log::LevelFilter>()
            .unwrap_or(log::LevelFilter::Debug)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotebookSettings {
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    pub kernel_name: String,
}

impl Default for NotebookSettings {
    fn default() -> Self {
        Self {
            output_dir: None,
            kernel_name: "python3".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccountConfig {
    pub id: String,
    pub display_name: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub tenants: Vec<Tenant>,
    /// Inline bearer token. Prefer `access_token_env`.
    #[serde(default)]
    pub access_token: Option<String>,
    /// Name of an environment variable holding the bearer token.
    #[serde(default)]
    pub access_token_env: Option<String>,
    #[serde(default)]
    pub is_stale: bool,
}

impl Settings {
    /// Load settings from an optional TOML file plus environment overrides.
    pub fn load(path: Option<&Path>) -> DeployResult<Self> {
        let mut builder = Self::defaults_builder()?;
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(true));
        }
        let cfg = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        Ok(cfg.try_deserialize()?)
    }

    /// Parse settings from TOML text only (no environment).
    pub fn from_toml_str(raw: &str) -> DeployResult<Self> {
        let cfg = Self::defaults_builder()?
            .add_source(File::from_str(raw, FileFormat::Toml))
            .build()?;
        Ok(cfg.try_deserialize()?)
    }

    fn defaults_builder() -> DeployResult<::config::ConfigBuilder<::config::builder::DefaultState>>
    {
        let m = ManagementSettings::default();
        let l = LoggingSettings::default();
        let n = NotebookSettings::default();
        Ok(Config::builder()
            .set_default("management.endpoint", m.endpoint)?
            .set_default("management.subscriptions_api_version", m.subscriptions_api_version)?
            .set_default("management.sql_api_version", m.sql_api_version)?
            .set_default("management.databases_api_version", m.databases_api_version)?
            .set_default("management.timeout_secs", m.timeout_secs)?
            .set_default("logging.level", l.level)?
            .set_default("logging.stdout", l.stdout)?
            .set_default("notebook.kernel_name", n.kernel_name)?)
    }
}
