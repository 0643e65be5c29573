//! Network module: target resolution and TCP connect probing

pub mod probe;
pub mod resolver;

use serde::{Deserialize, Serialize};

pub use probe::{Prober, TcpConnectProber};
pub use resolver::{extract_hostname, resolve_hostname, resolve_target, ResolvedTarget};

/// Outcome of a single connect probe.
///
/// Timeouts, refusals and unreachable networks all land on `Closed`; there
/// is no separate filtered state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortState {
    Open,
    Closed,
}

impl PortState {
    pub fn is_open(&self) -> bool {
        matches!(self, PortState::Open)
    }
}

impl From<bool> for PortState {
    fn from(open: bool) -> Self {
        if open {
            PortState::Open
        } else {
            PortState::Closed
        }
    }
}

impl std::fmt::Display for PortState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PortState::Open => write!(f, "OPEN"),
            PortState::Closed => write!(f, "CLOSED"),
        }
    }
}

/// Port number paired with its probe outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortResult {
    pub port: u16,
    pub open: bool,
}

impl PortResult {
    pub fn new(port: u16, state: PortState) -> Self {
        Self {
            port,
            open: state.is_open(),
        }
    }

    pub fn state(&self) -> PortState {
        PortState::from(self.open)
    }
}
