//! Target resolution
//!
//! Turns a URL or bare hostname into exactly one IPv4 address. The first
//! IPv4 record returned by the system resolver is authoritative for the
//! whole scan; other records are ignored.

use crate::error::ScanError;
use log::debug;
use std::net::{IpAddr, Ipv4Addr};

const SCHEME_PREFIXES: [&str; 3] = ["http://", "https://", "//"];

/// A target string together with the address chosen to represent it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    pub target: String,
    pub hostname: String,
    pub address: Ipv4Addr,
}

/// Extract the host component from a URL or hostname.
///
/// `"https://example.com/path"`, `"example.com:8080"` and `"example.com"`
/// all yield `"example.com"`. Only `http://`, `https://` and `//` are
/// treated as scheme prefixes; anything else is read as host-only input.
pub fn extract_hostname(target: &str) -> crate::Result<String> {
    let trimmed = target.trim();
    let rest = strip_scheme(trimmed);

    let authority = rest
        .split(|c| c == '/' || c == '?' || c == '#')
        .next()
        .unwrap_or_default();
    let host_port = match authority.rsplit_once('@') {
        Some((_userinfo, host)) => host,
        None => authority,
    };
    let hostname = host_port.split(':').next().unwrap_or_default().trim();

    if hostname.is_empty() {
        return Err(ScanError::unresolvable(target, "invalid target URL or hostname"));
    }

    Ok(hostname.to_string())
}

fn strip_scheme(target: &str) -> &str {
    for prefix in SCHEME_PREFIXES {
        match target.get(..prefix.len()) {
            Some(head) if head.eq_ignore_ascii_case(prefix) => return &target[prefix.len()..],
            _ => {}
        }
    }
    target
}

/// Resolve a hostname to its first IPv4 address.
///
/// A literal IPv4 address is returned as-is without a lookup.
pub async fn resolve_hostname(hostname: &str) -> crate::Result<Ipv4Addr> {
    if let Ok(addr) = hostname.parse::<Ipv4Addr>() {
        return Ok(addr);
    }

    let addrs = tokio::net::lookup_host((hostname, 0))
        .await
        .map_err(|e| ScanError::unresolvable(hostname, e))?;

    let mut skipped = 0usize;
    for addr in addrs {
        match addr.ip() {
            IpAddr::V4(v4) => {
                debug!("{} resolved to {} ({} non-IPv4 records skipped)", hostname, v4, skipped);
                return Ok(v4);
            }
            IpAddr::V6(_) => skipped += 1,
        }
    }

    Err(ScanError::unresolvable(hostname, "no IPv4 address found"))
}

/// Extract the hostname from `target` and resolve it.
pub async fn resolve_target(target: &str) -> crate::Result<ResolvedTarget> {
    let hostname = extract_hostname(target)?;
    let address = resolve_hostname(&hostname).await?;

    Ok(ResolvedTarget {
        target: target.to_string(),
        hostname,
        address,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_host_from_urls() {
        assert_eq!(extract_hostname("https://example.com/path").unwrap(), "example.com");
        assert_eq!(extract_hostname("http://example.com:8080/a?b=c").unwrap(), "example.com");
        assert_eq!(extract_hostname("//example.com/x").unwrap(), "example.com");
        assert_eq!(extract_hostname("HTTPS://Example.com").unwrap(), "Example.com");
    }

    #[test]
    fn extracts_host_from_bare_names() {
        assert_eq!(extract_hostname("example.com:8080").unwrap(), "example.com");
        assert_eq!(extract_hostname("example.com").unwrap(), "example.com");
        assert_eq!(extract_hostname("  example.com/path  ").unwrap(), "example.com");
        assert_eq!(extract_hostname("user:pw@example.com:22").unwrap(), "example.com");
        assert_eq!(extract_hostname("93.184.216.34:443").unwrap(), "93.184.216.34");
    }

    #[test]
    fn rejects_empty_hosts() {
        for bad in ["", "   ", "https://", "http:///path", ":8080"] {
            assert!(
                matches!(extract_hostname(bad), Err(ScanError::UnresolvableHost { .. })),
                "expected {:?} to be rejected",
                bad
            );
        }
    }

    #[test]
    fn extracted_hosts_never_contain_separators() {
        for input in ["https://a.b:1/c", "a.b:1", "//a.b/c/d", "a.b?x=1"] {
            let host = extract_hostname(input).unwrap();
            assert!(!host.contains(':') && !host.contains('/'), "{}", host);
        }
    }

    #[test]
    fn literal_ipv4_is_identity() {
        let addr = tokio_test::block_on(resolve_hostname("93.184.216.34")).unwrap();
        assert_eq!(addr, Ipv4Addr::new(93, 184, 216, 34));
    }

    #[tokio::test]
    async fn resolve_target_keeps_the_original_input() {
        let resolved = resolve_target("http://127.0.0.1:8080/status").await.unwrap();
        assert_eq!(resolved.target, "http://127.0.0.1:8080/status");
        assert_eq!(resolved.hostname, "127.0.0.1");
        assert_eq!(resolved.address, Ipv4Addr::LOCALHOST);
    }
}
