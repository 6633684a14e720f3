use std::{fs::read_to_string, io, path::Path};

use anyhow::{Error, anyhow};
use serde::Deserialize;
use toml::from_str;

use crate::logger::{debug, info};

/// A direct representation of the configuration file, for easy deserialization.
#[derive(Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    pub network: RawNetworkConfig,
    #[serde(default)]
    pub pipeline: RawPipelineConfig,
}

impl Default for RawConfig {
    fn default() -> Self {
        Self {
            network: RawNetworkConfig::default(),
            pipeline: RawPipelineConfig::default(),
        }
    }
}

fn default_contact_email() -> String {
    "your.email@example.com".to_owned()
}

fn default_source_delay() -> f64 {
    1.0
}

fn default_arxiv_delay() -> f64 {
    5.0
}

fn default_request_timeout() -> u64 {
    10
}

/// The `[network]` section: contact details and per-source request pacing.
#[derive(Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
struct RawNetworkConfig {
    #[serde(default = "default_contact_email")]
    pub contact_email: String,
    #[serde(default = "default_source_delay")]
    pub source_delay_secs: f64,
    #[serde(default = "default_arxiv_delay")]
    pub arxiv_delay_secs: f64,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for RawNetworkConfig {
    fn default() -> Self {
        Self {
            contact_email: default_contact_email(),
            source_delay_secs: default_source_delay(),
            arxiv_delay_secs: default_arxiv_delay(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_parallelism() -> usize {
    30
}

/// The `[pipeline]` section: worker-pool sizing.
#[derive(Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
struct RawPipelineConfig {
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
}

impl Default for RawPipelineConfig {
    fn default() -> Self {
        Self {
            parallelism: default_parallelism(),
        }
    }
}

impl RawConfig {
    /// Load configuration by deserializing a toml file at the provided path, returning the
    /// default if `missing_ok` is true and the file is absent.
    fn load<P: AsRef<Path>>(path: P, missing_ok: bool) -> Result<Self, Error> {
        match read_to_string(&path) {
            Ok(st) => {
                info!(
                    "Loading configuration at path '{}'",
                    path.as_ref().display()
                );
                let config = from_str(&st)?;
                debug!("Using configuration:\n{config:?}");
                Ok(config)
            }
            Err(err) => {
                if missing_ok && err.kind() == io::ErrorKind::NotFound {
                    info!(
                        "Configuration file not found at path '{}'; using default configuration",
                        path.as_ref().display()
                    );
                    Ok(Self::default())
                } else {
                    Err(anyhow!("Failed to load configuration file: {err}"))
                }
            }
        }
    }
}

/// The fully resolved configuration used throughout the pipeline.
#[derive(Debug, Clone)]
pub struct Config {
    pub contact_email: String,
    pub source_delay_secs: f64,
    pub arxiv_delay_secs: f64,
    pub request_timeout_secs: u64,
    pub parallelism: usize,
}

#[cold]
pub fn write_default<W: ?Sized + io::Write>(writer: &mut W) -> Result<(), io::Error> {
    writer
        .write(include_str!("config/default_config.toml").as_bytes())
        .map(|_| ())
}

/// Attempt to load the configuration file from the provided path.
///
/// If `missing_ok` is true and the file is not found, this returns the default configuration.
pub fn load<P: AsRef<Path>>(path: P, missing_ok: bool) -> Result<Config, Error> {
    let RawConfig { network, pipeline } = RawConfig::load(path, missing_ok)?;

    Ok(Config {
        contact_email: network.contact_email,
        source_delay_secs: network.source_delay_secs,
        arxiv_delay_secs: network.arxiv_delay_secs,
        request_timeout_secs: network.request_timeout_secs,
        parallelism: pipeline.parallelism,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let mut default_config_bytes = Vec::new();
        write_default(&mut default_config_bytes).unwrap();
        let st = String::from_utf8(default_config_bytes).unwrap();
        let cfg: RawConfig = from_str(&st).unwrap();

        assert_eq!(cfg, RawConfig::default());
    }

    #[test]
    fn missing_file_falls_back_to_default() {
        let config = load("/nonexistent/path/refval.toml", true).unwrap();
        assert_eq!(config.parallelism, 30);
        assert_eq!(config.source_delay_secs, 1.0);
        assert_eq!(config.arxiv_delay_secs, 5.0);
    }
}
