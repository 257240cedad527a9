//! Host port proxy table

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;

/// Where a proxy rule listens on the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxySource {
    pub ip: String,
    pub port: u16,
}

/// Host forwarding rules keyed by destination ip, then destination port
///
/// Keyed by where traffic goes (the distribution) rather than where the
/// host listens, since that is what reconciliation diffs against.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProxyTable(BTreeMap<String, BTreeMap<u16, ProxySource>>);

impl ProxyTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, dest_ip: impl Into<String>, dest_port: u16, source: ProxySource) {
        self.0.entry(dest_ip.into()).or_default().insert(dest_port, source);
    }

    /// Rules forwarding to `dest_ip`, by destination port
    pub fn ports(&self, dest_ip: &str) -> Option<&BTreeMap<u16, ProxySource>> {
        self.0.get(dest_ip)
    }

    pub fn contains(&self, dest_ip: &str, dest_port: u16) -> bool {
        self.ports(dest_ip)
            .is_some_and(|ports| ports.contains_key(&dest_port))
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(BTreeMap::is_empty)
    }

    /// Number of rules
    pub fn len(&self) -> usize {
        self.0.values().map(BTreeMap::len).sum()
    }

    /// Every rule as (destination ip, destination port, source)
    pub fn rules(&self) -> impl Iterator<Item = (&str, u16, &ProxySource)> {
        self.0.iter().flat_map(|(ip, ports)| {
            ports
                .iter()
                .map(move |(port, source)| (ip.as_str(), *port, source))
        })
    }
}

/// Renders the layout of `netsh interface portproxy show all`
impl std::fmt::Display for ProxyTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return Ok(());
        }

        let mut out = String::new();
        out.push_str("\r\n");
        out.push_str("Listen on ipv4:             Connect to ipv4:\r\n");
        out.push_str("\r\n");
        out.push_str("Address         Port        Address         Port\r\n");
        out.push_str("--------------- ----------  --------------- ----------\r\n");
        for (dest_ip, dest_port, source) in self.rules() {
            writeln!(
                out,
                "{:<15} {:<11} {:<15} {}\r",
                source.ip, source.port, dest_ip, dest_port
            )?;
        }
        out.push_str("\r\n");
        f.write_str(&out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(port: u16) -> ProxySource {
        ProxySource {
            ip: "0.0.0.0".into(),
            port,
        }
    }

    #[test]
    fn test_insert_and_lookup() {
        let mut table = ProxyTable::new();
        table.insert("172.20.1.2", 80, source(80));
        table.insert("172.20.1.2", 443, source(443));
        table.insert("172.20.9.9", 22, source(2222));

        assert_eq!(table.len(), 3);
        assert!(table.contains("172.20.1.2", 443));
        assert!(!table.contains("172.20.9.9", 80));
        assert!(table.ports("10.0.0.1").is_none());
        assert_eq!(table.ports("172.20.9.9").unwrap()[&22].port, 2222);
    }

    #[test]
    fn test_render_layout() {
        let mut table = ProxyTable::new();
        table.insert("172.20.1.2", 80, source(80));

        let text = table.to_string();
        let lines: Vec<&str> = text.split("\r\n").collect();
        assert_eq!(lines.len(), 8);
        assert!(lines[1].starts_with("Listen on ipv4:"));
        assert!(lines[5].starts_with("0.0.0.0"));
        assert!(lines[5].ends_with("172.20.1.2      80"));
        assert_eq!(&lines[6..], &["", ""]);

        assert_eq!(ProxyTable::new().to_string(), "");
    }
}
