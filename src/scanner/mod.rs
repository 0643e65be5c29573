//! Scanner module containing the scan coordinator and its data model

pub mod engine;

use crate::error::ScanError;
use crate::network::{PortResult, PortState};
use crate::port_lists::PortListType;
use crate::ports::PortSpec;
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use std::time::Duration;

pub use engine::{scan, ScanEngine, DEFAULT_MAX_WORKERS};

/// Which ports a request covers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PortSelection {
    /// Textual specification, e.g. `"22,80-85"`, or a built-in list name.
    Spec(String),
    /// Explicit list of port numbers.
    List(Vec<u16>),
}

impl PortSelection {
    /// Turn the selection into a validated port set.
    ///
    /// A spec that names a built-in list (`"default"`, `"important"`) expands
    /// to that list.
    pub fn to_port_spec(&self) -> crate::Result<PortSpec> {
        match self {
            PortSelection::Spec(spec) => match PortListType::from_name(spec) {
                Some(list) => Ok(list.port_spec()),
                None => PortSpec::parse(spec),
            },
            PortSelection::List(ports) => PortSpec::from_ports(ports.iter().copied()),
        }
    }
}

impl From<&str> for PortSelection {
    fn from(spec: &str) -> Self {
        PortSelection::Spec(spec.to_string())
    }
}

impl From<Vec<u16>> for PortSelection {
    fn from(ports: Vec<u16>) -> Self {
        PortSelection::List(ports)
    }
}

/// Everything needed to run one scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanRequest {
    pub target: String,
    pub ports: PortSelection,
    pub timeout_secs: f64,
    pub max_workers: usize,
}

impl ScanRequest {
    pub fn new(target: impl Into<String>, ports: impl Into<PortSelection>) -> Self {
        Self {
            target: target.into(),
            ports: ports.into(),
            timeout_secs: 1.0,
            max_workers: DEFAULT_MAX_WORKERS,
        }
    }

    pub fn with_timeout(mut self, timeout_secs: f64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers;
        self
    }

    /// Per-probe timeout; must be positive and finite.
    pub fn timeout(&self) -> crate::Result<Duration> {
        if self.timeout_secs.is_nan() || self.timeout_secs <= 0.0 {
            return Err(ScanError::InvalidTimeout(self.timeout_secs));
        }
        Duration::try_from_secs_f64(self.timeout_secs)
            .map_err(|_| ScanError::InvalidTimeout(self.timeout_secs))
    }

    /// Check every input precondition without touching the network.
    pub fn validate(&self) -> crate::Result<(PortSpec, Duration)> {
        let timeout = self.timeout()?;
        let ports = self.ports.to_port_spec()?;
        Ok((ports, timeout))
    }
}

/// Complete, ordered result of one scan.
///
/// `results` holds exactly one entry per requested port, ascending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanReport {
    pub target: String,
    pub resolved_address: Ipv4Addr,
    pub results: Vec<PortResult>,
    #[serde(skip)]
    pub duration: Duration,
}

impl ScanReport {
    pub fn new(
        target: String,
        resolved_address: Ipv4Addr,
        mut results: Vec<PortResult>,
        duration: Duration,
    ) -> Self {
        results.sort_by_key(|r| r.port);
        Self {
            target,
            resolved_address,
            results,
            duration,
        }
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn ports(&self) -> Vec<u16> {
        self.results.iter().map(|r| r.port).collect()
    }

    pub fn state_of(&self, port: u16) -> Option<PortState> {
        self.results
            .binary_search_by_key(&port, |r| r.port)
            .ok()
            .map(|idx| self.results[idx].state())
    }

    pub fn open_ports(&self) -> Vec<u16> {
        self.results.iter().filter(|r| r.open).map(|r| r.port).collect()
    }

    pub fn closed_ports(&self) -> Vec<u16> {
        self.results.iter().filter(|r| !r.open).map(|r| r.port).collect()
    }

    /// Open ports first, then closed, each group ascending.
    pub fn grouped(&self) -> Vec<PortResult> {
        let (mut open, closed): (Vec<_>, Vec<_>) = self.results.iter().partition(|r| r.open);
        open.extend(closed);
        open
    }
}

/// One completed probe, sent on the optional progress channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanProgress {
    pub port: u16,
    pub state: PortState,
    pub completed: usize,
    pub total: usize,
}

impl ScanProgress {
    /// Get completion percentage
    pub fn percentage(&self) -> f64 {
        if self.total > 0 {
            (self.completed as f64 / self.total as f64) * 100.0
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> ScanReport {
        let results = vec![
            PortResult::new(443, PortState::Open),
            PortResult::new(21, PortState::Closed),
            PortResult::new(80, PortState::Open),
            PortResult::new(22, PortState::Closed),
        ];
        ScanReport::new(
            "example.com".to_string(),
            Ipv4Addr::new(93, 184, 216, 34),
            results,
            Duration::from_millis(5),
        )
    }

    #[test]
    fn report_is_sorted_by_port() {
        assert_eq!(report().ports(), vec![21, 22, 80, 443]);
    }

    #[test]
    fn report_splits_open_and_closed() {
        let report = report();
        assert_eq!(report.open_ports(), vec![80, 443]);
        assert_eq!(report.closed_ports(), vec![21, 22]);
        assert_eq!(report.state_of(80), Some(PortState::Open));
        assert_eq!(report.state_of(8080), None);

        let grouped: Vec<u16> = report.grouped().iter().map(|r| r.port).collect();
        assert_eq!(grouped, vec![80, 443, 21, 22]);
    }

    #[test]
    fn request_rejects_bad_timeouts() {
        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let request = ScanRequest::new("127.0.0.1", "80").with_timeout(bad);
            assert!(matches!(request.validate(), Err(ScanError::InvalidTimeout(_))));
        }
    }

    #[test]
    fn request_expands_named_lists() {
        let (ports, timeout) = ScanRequest::new("127.0.0.1", "default").validate().unwrap();
        assert_eq!(ports.ports(), &[21, 22, 80, 443]);
        assert_eq!(timeout, Duration::from_secs(1));
    }

    #[test]
    fn request_accepts_explicit_lists() {
        let request = ScanRequest::new("127.0.0.1", vec![8080u16, 22]).with_timeout(0.25);
        let (ports, timeout) = request.validate().unwrap();
        assert_eq!(ports.ports(), &[22, 8080]);
        assert_eq!(timeout, Duration::from_millis(250));
    }

    #[test]
    fn report_serializes_address_as_dotted_quad() {
        let json = serde_json::to_value(report()).unwrap();
        assert_eq!(json["resolved_address"], "93.184.216.34");
        assert_eq!(json["results"][0]["port"], 21);
        assert_eq!(json["results"][0]["open"], false);
    }
}
