use anyhow::Context;
use serde::Deserialize;
use std::path::Path;

use crate::access_log::MAX_CAPACITY;

pub const CONFIG_FILE: &str = "routerwatch.toml";
pub const ADMIN_PASSWORD_ENV: &str = "ADMIN_PASSWORD";

pub const DEFAULT_CONFIG: &str = r#"
[server]
host = "0.0.0.0"
port = 3000

[access_log]
capacity = 1000
excluded_prefixes = ["/_next", "/favicon"]

[admin]
# password = "change-me"
"#;

#[derive(Deserialize, Clone, Debug, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub access_log: AccessLogConfig,
    #[serde(default)]
    pub admin: AdminConfig,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct AccessLogConfig {
    #[serde(default = "default_capacity")]
    pub capacity: usize,
    /// Requests whose path starts with one of these are not recorded.
    #[serde(default = "default_excluded_prefixes")]
    pub excluded_prefixes: Vec<String>,
}

impl Default for AccessLogConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            excluded_prefixes: default_excluded_prefixes(),
        }
    }
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct AdminConfig {
    /// Shared secret for the admin API. No secret means the API refuses everyone.
    pub password: Option<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_capacity() -> usize {
    MAX_CAPACITY
}

fn default_excluded_prefixes() -> Vec<String> {
    vec!["/_next".to_string(), "/favicon".to_string()]
}

impl Config {
    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        toml::from_str(raw).context("invalid configuration")
    }

    /// Read the config file, writing the defaults first if it is missing, then
    /// apply environment overrides.
    pub async fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = match tokio::fs::read_to_string(path).await {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(path = %path.display(), "configuration file not found, creating default");
                tokio::fs::write(path, DEFAULT_CONFIG)
                    .await
                    .with_context(|| format!("failed to write {}", path.display()))?;
                DEFAULT_CONFIG.to_string()
            }
            Err(e) => {
                return Err(e).with_context(|| format!("failed to read {}", path.display()));
            }
        };

        let mut config = Self::parse(&raw).with_context(|| format!("failed to parse {}", path.display()))?;
        config.apply_env_overrides(std::env::var(ADMIN_PASSWORD_ENV).ok());
        Ok(config)
    }

    fn apply_env_overrides(&mut self, admin_password: Option<String>) {
        if let Some(password) = admin_password.filter(|p| !p.is_empty()) {
            self.admin.password = Some(password);
        }
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
