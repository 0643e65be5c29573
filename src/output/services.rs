//! Static port to service-name table used when rendering reports

use once_cell::sync::Lazy;
use std::collections::HashMap;

pub const UNKNOWN_SERVICE: &str = "Unknown";

static WELL_KNOWN: Lazy<HashMap<u16, &'static str>> = Lazy::new(|| {
    HashMap::from([
        (21, "FTP"),
        (22, "SSH"),
        (23, "Telnet"),
        (25, "SMTP"),
        (53, "DNS"),
        (80, "HTTP"),
        (110, "POP3"),
        (143, "IMAP"),
        (443, "HTTPS"),
        (445, "SMB"),
        (465, "SMTPS"),
        (587, "SMTP"),
        (993, "IMAPS"),
        (995, "POP3S"),
        (3306, "MySQL"),
        (3389, "RDP"),
        (5432, "PostgreSQL"),
        (8080, "HTTP-Proxy"),
        (8443, "HTTPS-Alt"),
    ])
});

/// Read-only port to service-name lookup handed to renderers
#[derive(Debug, Clone)]
pub struct ServiceTable {
    services: HashMap<u16, &'static str>,
}

impl Default for ServiceTable {
    fn default() -> Self {
        Self::well_known()
    }
}

impl ServiceTable {
    /// Table of common internet-facing services
    pub fn well_known() -> Self {
        Self {
            services: WELL_KNOWN.clone(),
        }
    }

    pub fn empty() -> Self {
        Self {
            services: HashMap::new(),
        }
    }

    pub fn with_service(mut self, port: u16, name: &'static str) -> Self {
        self.services.insert(port, name);
        self
    }

    pub fn get(&self, port: u16) -> Option<&'static str> {
        self.services.get(&port).copied()
    }

    /// Service name, or `"Unknown"`
    pub fn name(&self, port: u16) -> &'static str {
        self.get(port).unwrap_or(UNKNOWN_SERVICE)
    }
}
