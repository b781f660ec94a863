//! Configuration management for Lineage.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Default path segment that redacted recordings are published under.
pub const DEFAULT_REDACTED_SEGMENT: &str = "Analysis/Voice/Redacted";

/// Default key segment marking unprocessed trace-record batches.
pub const DEFAULT_ORIGINAL_SEGMENT: &str = "original";

/// Main configuration shared by the replication planner and the redactor.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Logging configuration.
    pub logging: LoggingConfig,
    /// Trace-record redactor configuration.
    pub redactor: RedactorConfig,
    /// AWS client configuration.
    pub aws: AwsConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(crate::Error::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the string cannot be parsed.
    pub fn parse(content: &str) -> crate::Result<Self> {
        toml::from_str(content).map_err(|e| crate::Error::Config(e.to_string()))
    }

    /// Load configuration from an optional file, then apply process environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> crate::Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Apply environment overrides using the variables the deployed handlers receive.
    ///
    /// - `PREFIX`: deployment prefix
    /// - `STORAGE_BUCKET`: bucket holding the source recordings
    /// - `LOGGING_LEVEL`: log level
    /// - `SERVICE_NAME`: service name attached to log output
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(prefix) = lookup("PREFIX").filter(|v| !v.is_empty()) {
            self.redactor.prefix = prefix;
        }
        if let Some(bucket) = lookup("STORAGE_BUCKET").filter(|v| !v.is_empty()) {
            self.redactor.storage_bucket = Some(bucket);
        }
        if let Some(level) = lookup("LOGGING_LEVEL").filter(|v| !v.is_empty()) {
            self.logging.level = level.to_lowercase();
        }
        if let Some(service) = lookup("SERVICE_NAME").filter(|v| !v.is_empty()) {
            self.logging.service_name = service;
        }
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the redactor cannot build its substitution strings.
    pub fn validate(&self) -> crate::Result<()> {
        self.redactor.validate()
    }
}

/// Trace-record redactor configuration.
///
/// The substitution strings are derived from the deployment prefix unless
/// overridden explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedactorConfig {
    /// Deployment prefix (e.g. `acme-dev`).
    pub prefix: String,
    /// Bucket holding the source recordings. When set, the source segment is
    /// anchored to this bucket.
    pub storage_bucket: Option<String>,
    /// Bucket that the redacted segment is anchored to. Defaults to `storage_bucket`.
    pub redacted_bucket: Option<String>,
    /// Explicit source segment, overriding the prefix-derived one.
    pub source_segment: Option<String>,
    /// Segment that replaces the source segment in recording locations.
    pub redacted_segment: String,
    /// Key segment removed from input keys to form the published key.
    pub original_segment: String,
}

impl Default for RedactorConfig {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            storage_bucket: None,
            redacted_bucket: None,
            source_segment: None,
            redacted_segment: DEFAULT_REDACTED_SEGMENT.to_string(),
            original_segment: DEFAULT_ORIGINAL_SEGMENT.to_string(),
        }
    }
}

impl RedactorConfig {
    /// Creates a redactor configuration for a deployment prefix with default segments.
    #[must_use]
    pub fn for_prefix(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into(), ..Default::default() }
    }

    /// Returns the literal segment searched for in recording locations.
    ///
    /// `connect/<prefix>/<prefix>-recordings`, optionally preceded by `<storage_bucket>/`.
    #[must_use]
    pub fn source_segment(&self) -> String {
        let segment = match &self.source_segment {
            Some(segment) => segment.clone(),
            None => format!("connect/{0}/{0}-recordings", self.prefix),
        };
        match &self.storage_bucket {
            Some(bucket) => format!("{bucket}/{segment}"),
            None => segment,
        }
    }

    /// Returns the literal segment written in place of the source segment.
    #[must_use]
    pub fn redacted_segment(&self) -> String {
        match self.redacted_bucket.as_ref().or(self.storage_bucket.as_ref()) {
            Some(bucket) => format!("{bucket}/{}", self.redacted_segment),
            None => self.redacted_segment.clone(),
        }
    }

    /// Validate the redactor configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if no source segment can be built or a segment is empty.
    pub fn validate(&self) -> crate::Result<()> {
        if self.source_segment.is_none() && self.prefix.is_empty() {
            return Err(crate::Error::config(
                "redactor.prefix is required when redactor.source_segment is not set",
            ));
        }
        if self.source_segment.as_deref() == Some("") {
            return Err(crate::Error::config("redactor.source_segment must not be empty"));
        }
        if self.redacted_segment.is_empty() {
            return Err(crate::Error::config("redactor.redacted_segment must not be empty"));
        }
        if self.original_segment.is_empty() || self.original_segment.contains('/') {
            return Err(crate::Error::config(
                "redactor.original_segment must be a single non-empty path segment",
            ));
        }
        Ok(())
    }
}

/// AWS client configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AwsConfig {
    /// Region override. Falls back to the default provider chain.
    pub region: Option<String>,
    /// Custom S3 endpoint (e.g. a local S3-compatible server).
    pub endpoint_url: Option<String>,
    /// Use path-style addressing.
    pub force_path_style: bool,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable format.
    #[default]
    Pretty,
    /// JSON format.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    pub level: String,
    /// Log output format.
    pub format: LogFormat,
    /// Service name attached to log output.
    pub service_name: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            service_name: "lineage".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert_eq!(config.redactor.redacted_segment, DEFAULT_REDACTED_SEGMENT);
        assert_eq!(config.redactor.original_segment, DEFAULT_ORIGINAL_SEGMENT);
        assert!(config.validate().is_err()); // no prefix yet
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[logging]
level = "debug"
format = "json"

[redactor]
prefix = "acme-dev"
storage_bucket = "acme-dev-storage"

[aws]
region = "us-west-2"
force_path_style = true
"#;
        let config = Config::parse(toml).unwrap();
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.redactor.prefix, "acme-dev");
        assert_eq!(config.aws.region.as_deref(), Some("us-west-2"));
        assert!(config.aws.force_path_style);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_invalid_config() {
        let result = Config::parse("[logging\nlevel = 1");
        assert!(matches!(result, Err(crate::Error::Config(_))));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[redactor]\nprefix = \"acme-prod\"").unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.redactor.prefix, "acme-prod");
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("PREFIX", "acme-dev"),
            ("STORAGE_BUCKET", "acme-dev-storage"),
            ("LOGGING_LEVEL", "DEBUG"),
            ("SERVICE_NAME", "ctrProcessor-acme-dev"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_env(|name| env.get(name).map(|v| (*v).to_string()));

        assert_eq!(config.redactor.prefix, "acme-dev");
        assert_eq!(config.redactor.storage_bucket.as_deref(), Some("acme-dev-storage"));
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.service_name, "ctrProcessor-acme-dev");
    }

    #[test]
    fn test_empty_env_values_are_ignored() {
        let mut config = Config::default();
        config.redactor.prefix = "acme-dev".to_string();
        config.apply_env(|_| Some(String::new()));
        assert_eq!(config.redactor.prefix, "acme-dev");
        assert_eq!(config.redactor.storage_bucket, None);
    }

    #[test]
    fn test_source_segment_from_prefix() {
        let config = RedactorConfig::for_prefix("acme-dev");
        assert_eq!(config.source_segment(), "connect/acme-dev/acme-dev-recordings");
        assert_eq!(config.redacted_segment(), "Analysis/Voice/Redacted");
    }

    #[test]
    fn test_segments_anchored_to_bucket() {
        let config = RedactorConfig {
            storage_bucket: Some("acme-dev-storage".to_string()),
            ..RedactorConfig::for_prefix("acme-dev")
        };
        assert_eq!(
            config.source_segment(),
            "acme-dev-storage/connect/acme-dev/acme-dev-recordings"
        );
        assert_eq!(config.redacted_segment(), "acme-dev-storage/Analysis/Voice/Redacted");

        let config = RedactorConfig { redacted_bucket: Some("analytics".to_string()), ..config };
        assert_eq!(config.redacted_segment(), "analytics/Analysis/Voice/Redacted");
    }

    #[test]
    fn test_explicit_source_segment() {
        let config = RedactorConfig {
            source_segment: Some("recordings/raw".to_string()),
            ..RedactorConfig::default()
        };
        assert!(config.validate().is_ok());
        assert_eq!(config.source_segment(), "recordings/raw");
    }

    #[test]
    fn test_invalid_original_segment() {
        let config = RedactorConfig {
            original_segment: "a/b".to_string(),
            ..RedactorConfig::for_prefix("acme-dev")
        };
        assert!(config.validate().is_err());
    }
}
