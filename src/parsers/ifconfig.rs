use super::malformed;
use crate::Result;
use regex::Regex;
use std::net::Ipv4Addr;
use std::sync::LazyLock;

static INET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"inet ([0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3})").expect("static inet pattern")
});

/// First IPv4 address in `ip addr show <iface>` output
pub fn parse_ip_address(raw: &str) -> Result<Ipv4Addr> {
    const WHAT: &str = "ip addr";

    let address = INET
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .ok_or_else(|| malformed(WHAT, "no IPv4 address on interface", raw))?;

    address
        .as_str()
        .parse()
        .map_err(|_| malformed(WHAT, format!("invalid IPv4 address {}", address.as_str()), raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sample() {
        let ip = parse_ip_address(include_str!("../../tests/fixtures/ip_addr_eth0.txt")).unwrap();
        assert_eq!(ip, Ipv4Addr::new(172, 29, 144, 58));
    }

    #[test]
    fn test_inline() {
        assert_eq!(
            parse_ip_address("inet 172.17.0.5/20 brd 172.17.15.255").unwrap(),
            Ipv4Addr::new(172, 17, 0, 5)
        );
    }

    #[test]
    fn test_no_address() {
        let raw = "4: eth0: <NO-CARRIER> mtu 1500\n    inet6 fe80::1/64 scope link\n";
        let err = parse_ip_address(raw).unwrap_err();
        assert!(err.is_malformed_output());
        assert!(err.to_string().contains("no IPv4 address"));
    }

    #[test]
    fn test_out_of_range_octet() {
        assert!(parse_ip_address("inet 300.1.1.1/8").is_err());
    }
}
