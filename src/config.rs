use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use snafu::ResultExt as _;
use url::Url;

use crate::database::DatabaseConfig;
use crate::error::{ApplicationError, ConfigLoadSnafu};
use crate::quote::DEFAULT_QUOTE_API;

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
}

/// Load the configuration from the environment. Call [dotenvy::dotenv] first to pick up a `.env` file.
pub fn load() -> Result<Config, ApplicationError> {
    let server = envy::from_env::<ServerConfig>().context(ConfigLoadSnafu)?;
    let database = envy::from_env::<DatabaseConfig>().context(ConfigLoadSnafu)?;

    Ok(Config { server, database })
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(rename = "host_address", default = "default_host")]
    pub host: SocketAddr,
    /// Overrides the port of `host_address`, for platforms that only hand out `PORT`.
    pub port: Option<u16>,
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
    #[serde(default = "default_public_dir")]
    pub public_dir: PathBuf,
    #[serde(default = "default_views_dir")]
    pub views_dir: PathBuf,
    #[serde(default = "default_quote_api")]
    pub quote_api: Url,
    #[serde(default)]
    pub trust_proxy: bool,
    #[serde(default = "default_rate_limit_max")]
    pub rate_limit_max: u32,
    #[serde(rename = "rate_limit_window_secs", default = "default_rate_limit_window")]
    pub rate_limit_window: u64,
}

impl ServerConfig {
    pub fn address(&self) -> SocketAddr {
        let mut address = self.host;
        if let Some(port) = self.port {
            address.set_port(port);
        }
        address
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window)
    }
}

fn default_host() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 3000))
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_public_dir() -> PathBuf {
    PathBuf::from("public")
}

fn default_views_dir() -> PathBuf {
    PathBuf::from("views")
}

fn default_quote_api() -> Url {
    Url::parse(DEFAULT_QUOTE_API).expect("default quote api is a valid url")
}

fn default_rate_limit_max() -> u32 {
    100
}

fn default_rate_limit_window() -> u64 {
    15 * 60
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn defaults_apply_on_empty_environment() {
        let config: ServerConfig = envy::from_iter(vars(&[])).unwrap();

        assert_eq!(config.address(), default_host());
        assert_eq!(config.quote_api.as_str(), DEFAULT_QUOTE_API);
        assert!(!config.trust_proxy);
        assert_eq!(config.rate_limit_max, 100);
        assert_eq!(config.rate_limit_window(), Duration::from_secs(900));
    }

    #[test]
    fn port_overrides_host_address() {
        let config: ServerConfig =
            envy::from_iter(vars(&[("HOST_ADDRESS", "127.0.0.1:8000"), ("PORT", "4000")]))
                .unwrap();

        assert_eq!(config.address(), SocketAddr::from(([127, 0, 0, 1], 4000)));
    }

    #[test]
    fn read_overrides() {
        let config: ServerConfig = envy::from_iter(vars(&[
            ("TRUST_PROXY", "true"),
            ("RATE_LIMIT_MAX", "5"),
            ("RATE_LIMIT_WINDOW_SECS", "60"),
            ("QUOTE_API", "http://localhost:9000/"),
        ]))
        .unwrap();

        assert!(config.trust_proxy);
        assert_eq!(config.rate_limit_max, 5);
        assert_eq!(config.rate_limit_window(), Duration::from_secs(60));
        assert_eq!(config.quote_api.as_str(), "http://localhost:9000/");
    }

    #[test]
    fn database_defaults_to_memory() {
        let config: DatabaseConfig = envy::from_iter(vars(&[])).unwrap();

        assert_eq!(config.url.as_str(), "mem://");
        assert_eq!(config.namespace, "stock_checker");
        assert!(config.username.is_none());
    }

    #[test]
    fn reject_malformed_port() {
        let result = envy::from_iter::<_, ServerConfig>(vars(&[("PORT", "not-a-port")]));
        assert!(result.is_err());
    }
}
