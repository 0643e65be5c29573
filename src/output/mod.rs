//! Output formatting and management
//!
//! Rendering lives outside the scanning core: renderers take a finished
//! [`ScanReport`] plus a [`ServiceTable`] and never influence scan results.

pub mod services;

use crate::network::PortResult;
use crate::scanner::{ScanProgress, ScanReport};
use anyhow::Context;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

pub use services::{ServiceTable, UNKNOWN_SERVICE};

const RULE_WIDTH: usize = 50;
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Output format options
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub file: Option<PathBuf>,
    pub colored: bool,
    pub show_closed: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Text,
            file: None,
            colored: true,
            show_closed: true,
        }
    }
}

/// JSON shape consumed by history stores and HTTP front ends
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonReport {
    pub url: String,
    pub ip_address: String,
    pub open_ports: Vec<u16>,
    pub closed_ports: Vec<u16>,
    pub timestamp: String,
}

impl JsonReport {
    pub fn new(report: &ScanReport, timestamp: impl Into<String>) -> Self {
        Self {
            url: report.target.clone(),
            ip_address: report.resolved_address.to_string(),
            open_ports: report.open_ports(),
            closed_ports: report.closed_ports(),
            timestamp: timestamp.into(),
        }
    }

    /// Stamp the report with the current local time
    pub fn from_report(report: &ScanReport) -> Self {
        Self::new(report, chrono::Local::now().format(TIMESTAMP_FORMAT).to_string())
    }
}

/// Main output manager
pub struct OutputManager {
    config: OutputConfig,
    services: ServiceTable,
}

impl OutputManager {
    pub fn new(config: OutputConfig, services: ServiceTable) -> Self {
        Self { config, services }
    }

    /// Render `report` in the configured format
    pub fn render(&self, report: &ScanReport) -> anyhow::Result<String> {
        match self.config.format {
            OutputFormat::Text => Ok(self.format_text(report)),
            OutputFormat::Json => {
                let json = serde_json::to_string_pretty(&JsonReport::from_report(report))
                    .context("Failed to serialize scan report")?;
                Ok(json + "\n")
            }
        }
    }

    /// Write the rendered report to the configured file, or stdout
    pub fn write_report(&self, report: &ScanReport) -> anyhow::Result<()> {
        let output = self.render(report)?;

        match &self.config.file {
            Some(path) => {
                let mut file = File::create(path)
                    .with_context(|| format!("Failed to create {}", path.display()))?;
                file.write_all(output.as_bytes())
                    .with_context(|| format!("Failed to write {}", path.display()))?;
            }
            None => print!("{}", output),
        }

        Ok(())
    }

    /// Format results as a table, open ports first
    fn format_text(&self, report: &ScanReport) -> String {
        let heavy = "=".repeat(RULE_WIDTH);
        let light = "-".repeat(RULE_WIDTH);
        let mut output = String::new();

        output.push_str(&format!("\n{}\n", heavy));
        output.push_str(&format!("Target: {}\n", report.target));
        output.push_str(&format!("IP Address Resolved: {}\n", report.resolved_address));
        output.push_str(&format!("{}\n", heavy));
        output.push_str("\nScan Results:\n");
        output.push_str(&format!("{}\n", light));

        for result in report.grouped() {
            if result.open || self.config.show_closed {
                output.push_str(&self.format_row(&result));
            }
        }

        output.push_str(&format!("{}\n", light));
        output.push_str("\nScan Complete.\n");
        output.push_str(&format!(
            "Summary: {} open, {} closed/filtered\n\n",
            report.open_ports().len(),
            report.closed_ports().len()
        ));

        output
    }

    fn format_row(&self, result: &PortResult) -> String {
        let state = format!("{:<8}", result.state().to_string());
        let state = match (self.config.colored, result.open) {
            (false, _) => state,
            (true, true) => state.bright_green().bold().to_string(),
            (true, false) => state.red().to_string(),
        };
        format!(
            "Port {:<5} | {} | ({})\n",
            result.port,
            state,
            self.services.name(result.port)
        )
    }
}

/// Live feedback while probes complete
pub struct ProgressDisplay {
    bar: Option<ProgressBar>,
    verbose: bool,
}

impl ProgressDisplay {
    /// A verbose display echoes every port; otherwise a progress bar is drawn.
    pub fn new(total_ports: usize, verbose: bool) -> Self {
        let bar = if verbose {
            None
        } else {
            let bar = ProgressBar::new(total_ports as u64);
            if let Ok(style) = ProgressStyle::with_template(
                "{spinner:.cyan} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ports",
            ) {
                bar.set_style(style.progress_chars("=>-"));
            }
            Some(bar)
        };

        Self { bar, verbose }
    }

    pub fn update(&self, progress: &ScanProgress) {
        if self.verbose {
            println!("Checking port {}... {}", progress.port, progress.state);
        }
        if let Some(bar) = &self.bar {
            bar.set_position(progress.completed as u64);
        }
    }

    pub fn finish(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }
}
