use serde::Deserialize;
use shared::http::DEFAULT_TIMEOUT;
use std::fs::File;
use std::time::Duration;

#[derive(Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Deserialize, Debug, Default, PartialEq)]
pub struct LoggingConfig {
    pub sentry_dsn: Option<String>,
    #[serde(default)]
    pub format: LogFormat,
}

#[derive(Deserialize, Debug, PartialEq)]
pub struct MetricsConfig {
    pub statsd_host: String,
    #[serde(default = "default_statsd_port")]
    pub statsd_port: u16,
    #[serde(default = "default_metrics_prefix")]
    pub prefix: String,
}

fn default_statsd_port() -> u16 {
    8125
}

fn default_metrics_prefix() -> String {
    "pvs_scale".into()
}

#[derive(Deserialize, Debug, PartialEq)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT.as_secs()
}

impl Default for HttpConfig {
    fn default() -> Self {
        HttpConfig {
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Process-level settings shared by both functions. Workflow inputs come
/// from the environment instead.
#[derive(Deserialize, Debug, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    pub metrics: Option<MetricsConfig>,
    #[serde(default)]
    pub http: HttpConfig,
}

impl Config {
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        let data: Config = serde_yaml::from_reader(file)?;

        if data.http.timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout);
        }

        Ok(data)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("could not load config from file: {0}")]
    LoadError(#[from] std::io::Error),
    #[error("could not parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),
    #[error("http.timeout_secs must be greater than 0")]
    InvalidTimeout,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_tmp_file(s: &str) -> tempfile::NamedTempFile {
        let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
        write!(tmp, "{}", s).expect("write yaml");

        tmp
    }

    #[test]
    fn full_config() {
        let yaml = r#"
            logging:
                sentry_dsn: https://key@sentry.example.com/1
                format: json
            metrics:
                statsd_host: 127.0.0.1
            http:
                timeout_secs: 10
            "#;
        let tmp = write_tmp_file(yaml);
        let config = Config::from_file(tmp.path()).expect("load config");

        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(
            config.logging.sentry_dsn.as_deref(),
            Some("https://key@sentry.example.com/1")
        );
        let metrics = config.metrics.expect("metrics config");
        assert_eq!(metrics.statsd_port, 8125);
        assert_eq!(metrics.prefix, "pvs_scale");
        assert_eq!(config.http.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn empty_sections_use_defaults() {
        let tmp = write_tmp_file("logging: {}\n");
        let config = Config::from_file(tmp.path()).expect("load config");

        assert_eq!(config, Config::default());
        assert_eq!(config.http.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let tmp = write_tmp_file("http:\n    timeout_secs: 0\n");
        assert!(matches!(
            Config::from_file(tmp.path()),
            Err(ConfigError::InvalidTimeout)
        ));
    }

    #[test]
    fn missing_file() {
        let result = Config::from_file(std::path::Path::new("/nonexistent/pvs-scale.yaml"));
        assert!(matches!(result, Err(ConfigError::LoadError(_))));
    }
}
