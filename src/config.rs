//! Configuration module for the portsweep scanner

use crate::output::OutputFormat;
use crate::scanner::{PortSelection, ScanRequest, DEFAULT_MAX_WORKERS};
use anyhow::Context;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_FILE_NAME: &str = ".portsweep.toml";

/// Scan settings loaded from a config file and overridden by the CLI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Port specification or list name; `None` scans the default list
    pub ports: Option<String>,

    /// Per-probe timeout in seconds
    pub timeout: f64,

    /// Maximum number of probes in flight
    pub max_workers: usize,

    /// Echo every probed port as it completes
    pub verbose: bool,

    pub output_format: OutputFormat,

    /// Include closed ports in the text report
    pub show_closed: bool,

    pub colored: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            ports: None,
            timeout: 1.0,
            max_workers: DEFAULT_MAX_WORKERS,
            verbose: false,
            output_format: OutputFormat::Text,
            show_closed: true,
            colored: true,
        }
    }
}

impl ScanConfig {
    /// Set the port specification
    pub fn with_ports(mut self, ports: impl Into<String>) -> Self {
        self.ports = Some(ports.into());
        self
    }

    /// Set the timeout in seconds
    pub fn with_timeout(mut self, timeout: f64) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Get timeout as Duration
    pub fn timeout_duration(&self) -> crate::Result<Duration> {
        self.scan_request("").timeout()
    }

    /// Load configuration from TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let config: ScanConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML in {}", path.display()))?;

        Ok(config)
    }

    /// Path of the per-user config file, if a home directory is known
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(CONFIG_FILE_NAME))
    }

    /// Load configuration from `~/.portsweep.toml`, falling back to defaults
    pub fn load_default_config() -> Self {
        let Some(path) = Self::default_path() else {
            return Self::default();
        };

        if !path.exists() {
            return Self::default();
        }

        match Self::from_toml_file(&path) {
            Ok(config) => {
                debug!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                warn!("Ignoring config file: {:#}", e);
                Self::default()
            }
        }
    }

    /// Validate the configuration
    pub fn validate(&mut self) -> crate::Result<()> {
        self.timeout_duration()?;

        if self.max_workers == 0 {
            warn!("max_workers must be at least 1, using 1");
            self.max_workers = 1;
        }

        Ok(())
    }

    /// Build the scan request for `target`
    pub fn scan_request(&self, target: &str) -> ScanRequest {
        let ports = match &self.ports {
            Some(spec) => PortSelection::Spec(spec.clone()),
            None => PortSelection::Spec("default".to_string()),
        };

        ScanRequest::new(target, ports)
            .with_timeout(self.timeout)
            .with_max_workers(self.max_workers)
    }
}
