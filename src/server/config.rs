use crate::external::ExternalConfig;
use crate::reactive::DEFAULT_MAX_CONCURRENCY;
use crate::service::Flavor;
use crate::store::IN_MEMORY;
use serde::{Deserialize, Serialize};
use std::fs;

/// Product server configuration; every section and field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub external: ExternalConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub execution: ExecutionConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    // eg: 0.0.0.0:8081, falls back to the flavor's default port
    #[serde(default)]
    pub listen_addr: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    // file path, or ":memory:"
    #[serde(default = "default_database_path")]
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    // pooled flavor: upper bound of concurrently served requests
    #[serde(default = "default_request_threads")]
    pub request_threads: usize,

    // pooled flavor: fan-out pool size, 0 means two per CPU
    #[serde(default)]
    pub fanout_threads: usize,

    // reactive flavor: aggregations in flight per batch request
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
}

fn default_database_path() -> String {
    IN_MEMORY.to_string()
}

fn default_request_threads() -> usize {
    200
}

fn default_max_concurrency() -> usize {
    DEFAULT_MAX_CONCURRENCY
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            request_threads: default_request_threads(),
            fanout_threads: 0,
            max_concurrency: default_max_concurrency(),
        }
    }
}

impl Config {
    pub fn listen_addr(&self, flavor: Flavor) -> String {
        self.server
            .listen_addr
            .clone()
            .unwrap_or_else(|| format!("0.0.0.0:{}", flavor.default_port()))
    }
}

pub fn load(path: &str) -> anyhow::Result<Config> {
    let content = fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.listen_addr(Flavor::Pooled), "0.0.0.0:8081");
        assert_eq!(config.listen_addr(Flavor::Threaded), "0.0.0.0:8083");
        assert_eq!(config.database.path, ":memory:");
        assert_eq!(config.execution.request_threads, 200);
        assert_eq!(config.execution.fanout_threads, 0);
        assert_eq!(config.execution.max_concurrency, 100);
        assert_eq!(config.external.base_url, "http://localhost:8090");
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[server]
listen_addr = "127.0.0.1:9001"

[external]
base_url = "http://mock:8090"

[execution]
fanout_threads = 16
"#
        )
        .unwrap();

        let config = load(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.listen_addr(Flavor::Reactive), "127.0.0.1:9001");
        assert_eq!(config.external.base_url, "http://mock:8090");
        assert_eq!(config.external.timeout_ms, 5000);
        assert_eq!(config.execution.fanout_threads, 16);
        assert_eq!(config.execution.request_threads, 200);
        assert_eq!(config.database.path, ":memory:");
    }

    #[test]
    fn test_load_missing_file() {
        assert!(load("/definitely/not/here.toml").is_err());
    }
}
