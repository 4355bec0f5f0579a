// ABOUTME: Record-store configuration loaded once at startup from AIRTABLE_* environment variables.
// ABOUTME: Missing or empty required values produce a ConfigError naming every absent variable.

use config::{Config, Environment};

use crate::error::ConfigError;

/// Environment variable prefix for store settings.
pub const ENV_PREFIX: &str = "AIRTABLE";

/// Default Airtable REST endpoint.
pub const DEFAULT_API_URL: &str = "https://api.airtable.com/v0";

/// Credentials and location of the destination table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub token: String,
    pub base: String,
    pub table: String,
    pub api_url: String,
}

impl StoreConfig {
    /// Reads `AIRTABLE_TOKEN`, `AIRTABLE_BASE`, `AIRTABLE_TABLE` and the
    /// optional `AIRTABLE_API_URL` from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(Environment::with_prefix(ENV_PREFIX))
    }

    /// Same as [`StoreConfig::from_env`] but over an explicit variable map.
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map: config::Map<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self::load(Environment::with_prefix(ENV_PREFIX).source(Some(map)))
    }

    fn load(env: Environment) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(env)
            .build()
            .map_err(|e| ConfigError::Load(e.to_string()))?;

        let lookup = |key: &str| {
            settings
                .get_string(key)
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let token = lookup("token");
        let base = lookup("base");
        let table = lookup("table");

        let missing: Vec<String> = [("TOKEN", &token), ("BASE", &base), ("TABLE", &table)]
            .iter()
            .filter(|(_, v)| v.is_none())
            .map(|(name, _)| format!("{}_{}", ENV_PREFIX, name))
            .collect();

        match (token, base, table) {
            (Some(token), Some(base), Some(table)) => Ok(Self {
                token,
                base,
                table,
                api_url: lookup("api_url").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            }),
            _ => Err(ConfigError::Missing(missing)),
        }
    }
}
