//! portsweep - TCP connect reachability scanner
//!
//! Resolves a URL or hostname to one IPv4 address and probes a set of TCP
//! ports with full-handshake connects under a fixed worker cap, returning a
//! deterministic open/closed report.

pub mod config;
pub mod error;
pub mod network;
pub mod output;
pub mod port_lists;
pub mod ports;
pub mod scanner;

// Re-export commonly used types
pub use config::ScanConfig;
pub use error::ScanError;
pub use network::{PortResult, PortState, Prober, TcpConnectProber};
pub use ports::PortSpec;
pub use scanner::{scan, PortSelection, ScanEngine, ScanProgress, ScanReport, ScanRequest};

pub type Result<T> = std::result::Result<T, ScanError>;
