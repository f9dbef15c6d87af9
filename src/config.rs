//! Configuration management

use anyhow::Result;
use serde::Deserialize;

use crate::data::fetch::source_location;
use crate::data::Metric;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub source: SourceConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub http_port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// URL prefix (or local directory) holding the three time-series files
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Extra attempts per file after a failed fetch (0 = fail on first error)
    #[serde(default)]
    pub retries: u32,
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_retry_backoff_ms() -> u64 {
    2000
}

impl SourceConfig {
    pub fn location(&self, metric: Metric) -> String {
        source_location(&self.base_url, metric.source_file())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DashboardConfig {
    #[serde(default = "default_country")]
    pub default_country: String,
    #[serde(default = "default_metrics")]
    pub default_metrics: Vec<String>,
}

fn default_country() -> String {
    "Italy".to_string()
}

fn default_metrics() -> Vec<String> {
    vec!["Confirmed".to_string(), "Deaths".to_string()]
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            default_country: default_country(),
            default_metrics: default_metrics(),
        }
    }
}

impl DashboardConfig {
    /// Parsed default metrics; names are checked by `Config::validate`.
    pub fn metrics(&self) -> Vec<Metric> {
        self.default_metrics
            .iter()
            .filter_map(|m| m.parse().ok())
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = "config.toml";

        let builder = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(config::Environment::with_prefix("CASEHISTORY").separator("__"));

        let settings = builder.build()?;
        let config: Config = settings.try_deserialize()?;

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.server.http_port == 0 {
            anyhow::bail!("Invalid http_port: 0 is not allowed");
        }
        if self.server.host.is_empty() {
            anyhow::bail!("Server host cannot be empty");
        }

        if self.source.base_url.is_empty() {
            anyhow::bail!("Source base_url cannot be empty");
        }
        if self.source.timeout_secs == 0 {
            anyhow::bail!("Source timeout_secs must be at least 1");
        }
        if self.source.retries > 10 {
            anyhow::bail!("Source retries must be at most 10 (got {})", self.source.retries);
        }

        if self.dashboard.default_country.is_empty() {
            anyhow::bail!("Dashboard default_country cannot be empty");
        }
        for name in &self.dashboard.default_metrics {
            if let Err(e) = name.parse::<Metric>() {
                anyhow::bail!("Invalid dashboard default_metrics entry: {}", e);
            }
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            anyhow::bail!(
                "Invalid logging level '{}'. Must be one of: {:?}",
                self.logging.level,
                valid_levels
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[server]
host = "127.0.0.1"
http_port = 8050

[source]
base_url = "https://example.org/series/"

[logging]
level = "info"
"#;

    fn sample() -> Config {
        config::Config::builder()
            .add_source(config::File::from_str(SAMPLE, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn fills_defaults() {
        let config = sample();
        config.validate().unwrap();
        assert_eq!(config.source.timeout_secs, 30);
        assert_eq!(config.source.retries, 0);
        assert_eq!(config.dashboard.default_country, "Italy");
        assert_eq!(config.dashboard.metrics(), [Metric::Confirmed, Metric::Deaths]);
    }

    #[test]
    fn builds_metric_locations() {
        let config = sample();
        assert_eq!(
            config.source.location(Metric::Recovered),
            "https://example.org/series/time_series_covid19_recovered_global.csv"
        );
    }

    #[test]
    fn rejects_bad_values() {
        let mut config = sample();
        config.server.http_port = 0;
        assert!(config.validate().is_err());

        let mut config = sample();
        config.logging.level = "loud".into();
        assert!(config.validate().is_err());

        let mut config = sample();
        config.dashboard.default_metrics = vec!["Active".into()];
        assert!(config.validate().is_err());

        let mut config = sample();
        config.source.retries = 50;
        assert!(config.validate().is_err());
    }
}
