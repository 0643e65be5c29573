//! Built-in port lists for common scanning scenarios

use crate::ports::PortSpec;
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Ports scanned by the CLI when no specification is given.
pub const DEFAULT_PORTS: &[u16] = &[21, 22, 80, 443];

/// Entry points worth checking on a typical internet-facing host.
pub const IMPORTANT_PORTS: &[u16] = &[
    21,   // FTP
    22,   // SSH
    23,   // Telnet
    25,   // SMTP
    53,   // DNS
    80,   // HTTP
    110,  // POP3
    143,  // IMAP
    443,  // HTTPS
    465,  // SMTPS
    587,  // SMTP submission
    993,  // IMAPS
    995,  // POP3S
    3306, // MySQL
    3389, // RDP
    5432, // PostgreSQL
    8080, // HTTP alternate
    8443, // HTTPS alternate
];

/// Port list types selectable by name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortListType {
    Default,
    Important,
}

/// Port list with metadata
#[derive(Debug, Clone)]
pub struct PortList {
    pub name: &'static str,
    pub description: &'static str,
    pub ports: &'static [u16],
}

static PORT_LISTS: Lazy<HashMap<PortListType, PortList>> = Lazy::new(|| {
    let mut lists = HashMap::new();

    lists.insert(
        PortListType::Default,
        PortList {
            name: "default",
            description: "FTP, SSH, HTTP and HTTPS",
            ports: DEFAULT_PORTS,
        },
    );

    lists.insert(
        PortListType::Important,
        PortList {
            name: "important",
            description: "Common web, mail, remote access and database ports",
            ports: IMPORTANT_PORTS,
        },
    );

    lists
});

impl PortListType {
    /// Look up a list by its name, case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "default" => Some(PortListType::Default),
            "important" => Some(PortListType::Important),
            _ => None,
        }
    }

    pub fn list(&self) -> &'static PortList {
        // Every variant is inserted above.
        &PORT_LISTS[self]
    }

    pub fn port_spec(&self) -> PortSpec {
        PortSpec::from_static(self.list().ports)
    }
}

/// All built-in lists, in a stable order.
pub fn all_port_lists() -> Vec<&'static PortList> {
    vec![PortListType::Default.list(), PortListType::Important.list()]
}
