//! Port specification parsing
//!
//! A specification is a comma-separated list of single ports and inclusive
//! `start-end` ranges, e.g. `"22,80-82,443"`. Parsing is all-or-nothing: one
//! bad token rejects the whole specification.

use crate::error::ScanError;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

pub const MIN_PORT: u32 = 1;
pub const MAX_PORT: u32 = 65535;

/// A validated, de-duplicated set of ports kept in ascending order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortSpec {
    ports: Vec<u16>,
}

impl PortSpec {
    /// Parse a textual port specification.
    pub fn parse(spec: &str) -> crate::Result<Self> {
        if spec.trim().is_empty() {
            return Err(ScanError::InvalidPortSpec("empty port specification".to_string()));
        }

        let mut ports = BTreeSet::new();
        for token in spec.split(',') {
            let token = token.trim();
            match token.split_once('-') {
                Some((start, end)) => {
                    let start = parse_port(start.trim(), token)?;
                    let end = parse_port(end.trim(), token)?;
                    if start > end {
                        return Err(ScanError::InvalidPortSpec(format!(
                            "{} (start {} is greater than end {})",
                            token, start, end
                        )));
                    }
                    ports.extend(start..=end);
                }
                None => {
                    ports.insert(parse_port(token, token)?);
                }
            }
        }

        Ok(Self {
            ports: ports.into_iter().collect(),
        })
    }

    /// Build a spec from an explicit port list. Port 0 is rejected.
    pub fn from_ports<I>(ports: I) -> crate::Result<Self>
    where
        I: IntoIterator<Item = u16>,
    {
        let mut set = BTreeSet::new();
        for port in ports {
            if port == 0 {
                return Err(ScanError::InvalidPortSpec(
                    "0 (ports must be between 1-65535)".to_string(),
                ));
            }
            set.insert(port);
        }

        if set.is_empty() {
            return Err(ScanError::InvalidPortSpec("empty port list".to_string()));
        }

        Ok(Self {
            ports: set.into_iter().collect(),
        })
    }

    /// Build from a trusted built-in list; zeroes are dropped.
    pub(crate) fn from_static(ports: &[u16]) -> Self {
        let set: BTreeSet<u16> = ports.iter().copied().filter(|&p| p != 0).collect();
        Self {
            ports: set.into_iter().collect(),
        }
    }

    /// Ports in ascending order.
    pub fn ports(&self) -> &[u16] {
        &self.ports
    }

    pub fn iter(&self) -> impl Iterator<Item = u16> + '_ {
        self.ports.iter().copied()
    }

    pub fn contains(&self, port: u16) -> bool {
        self.ports.binary_search(&port).is_ok()
    }

    pub fn len(&self) -> usize {
        self.ports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }
}

fn parse_port(value: &str, token: &str) -> crate::Result<u16> {
    let port: u32 = value.parse().map_err(|_| {
        if token.is_empty() {
            ScanError::InvalidPortSpec("empty token".to_string())
        } else {
            ScanError::InvalidPortSpec(token.to_string())
        }
    })?;

    if !(MIN_PORT..=MAX_PORT).contains(&port) {
        return Err(ScanError::InvalidPortSpec(format!(
            "{} (ports must be between 1-65535)",
            token
        )));
    }

    Ok(port as u16)
}

impl FromStr for PortSpec {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PortSpec::parse(s)
    }
}

impl TryFrom<Vec<u16>> for PortSpec {
    type Error = ScanError;

    fn try_from(ports: Vec<u16>) -> Result<Self, Self::Error> {
        PortSpec::from_ports(ports)
    }
}

impl<'a> IntoIterator for &'a PortSpec {
    type Item = &'a u16;
    type IntoIter = std::slice::Iter<'a, u16>;

    fn into_iter(self) -> Self::IntoIter {
        self.ports.iter()
    }
}

impl fmt::Display for PortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<String> = self.ports.iter().map(|p| p.to_string()).collect();
        write!(f, "{}", joined.join(","))
    }
}
