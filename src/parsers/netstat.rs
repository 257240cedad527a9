use super::{malformed, split_lines};
use crate::models::{ActivePort, Transport};
use crate::Result;

/// "Active Internet connections" banner and the column header
const HEADER_LINES: usize = 2;
/// Empty line after the final newline
const TRAILER_LINES: usize = 1;

const PROTO_FIELD: usize = 0;
const LOCAL_ADDRESS_FIELD: usize = 3;
const PROGRAM_FIELD: usize = 6;

/// Listeners bound here are unreachable through a host proxy
const LOOPBACK_PREFIXES: [&str; 2] = ["127.0.0.1", "::1:"];

/// Parse `netstat -lpnt` into the externally reachable TCP listeners
pub fn parse_netstat(raw: &str) -> Result<Vec<ActivePort>> {
    const WHAT: &str = "netstat";

    let lines = split_lines(raw);
    if lines.len() < HEADER_LINES + TRAILER_LINES {
        return Err(malformed(WHAT, "missing header", raw));
    }
    if !lines[HEADER_LINES - 1].starts_with("Proto") {
        return Err(malformed(WHAT, "missing Proto column header", raw));
    }

    let mut ports = Vec::new();
    for line in &lines[HEADER_LINES..lines.len() - TRAILER_LINES] {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() <= PROGRAM_FIELD {
            return Err(malformed(
                WHAT,
                format!("expected at least {} fields, found {}", PROGRAM_FIELD + 1, fields.len()),
                line,
            ));
        }

        let local_address = fields[LOCAL_ADDRESS_FIELD];
        if LOOPBACK_PREFIXES
            .iter()
            .any(|prefix| local_address.starts_with(prefix))
        {
            continue;
        }

        let transport = match fields[PROTO_FIELD] {
            "tcp" | "tcp4" => Transport::Tcp4,
            "tcp6" => Transport::Tcp6,
            other => {
                return Err(malformed(WHAT, format!("unexpected protocol {:?}", other), line));
            }
        };

        // Last segment covers both `0.0.0.0:22` and `:::22`
        let port = local_address
            .rsplit(':')
            .next()
            .and_then(|port| port.parse().ok())
            .ok_or_else(|| {
                malformed(WHAT, format!("no port in local address {:?}", local_address), line)
            })?;

        // `PID/Program name`, or a bare `-` for sockets without an owner
        let owner = fields[PROGRAM_FIELD];
        let program = owner
            .split_once('/')
            .map(|(_, program)| program)
            .unwrap_or(owner);

        ports.push(ActivePort {
            transport,
            port,
            program: program.to_string(),
            active: true,
        });
    }

    Ok(ports)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = include_str!("../../tests/fixtures/netstat_lpnt.txt");
    const HEADER: &str = "Active Internet connections (only servers)\nProto Recv-Q Send-Q Local Address           Foreign Address         State       PID/Program name\n";

    #[test]
    fn test_parse_sample() {
        let ports = parse_netstat(SAMPLE).unwrap();
        let summary: Vec<(Transport, u16, &str)> = ports
            .iter()
            .map(|p| (p.transport, p.port, p.program.as_str()))
            .collect();

        assert_eq!(
            summary,
            vec![
                (Transport::Tcp4, 80, "nginx:"),
                (Transport::Tcp4, 22, "sshd"),
                (Transport::Tcp6, 22, "sshd"),
                (Transport::Tcp6, 8080, "node"),
            ]
        );
        assert!(ports.iter().all(|p| p.active));
    }

    #[test]
    fn test_tcp6_row() {
        let raw = format!("{HEADER}tcp6 0 0 :::2222 :::* LISTEN 123/sshd\n");
        let ports = parse_netstat(&raw).unwrap();
        assert_eq!(
            ports,
            vec![ActivePort {
                transport: Transport::Tcp6,
                port: 2222,
                program: "sshd".into(),
                active: true,
            }]
        );
    }

    #[test]
    fn test_tcp6_explicit_address_uses_last_segment() {
        let raw = format!(
            "{HEADER}tcp6 0 0 2001:db8::5:9000 :::* LISTEN 77/api\ntcp6 0 0 fe80::1:8080 :::* LISTEN 78/web\n"
        );
        let ports: Vec<u16> = parse_netstat(&raw).unwrap().iter().map(|p| p.port).collect();
        assert_eq!(ports, vec![9000, 8080]);
    }

    #[test]
    fn test_loopback_excluded() {
        let raw = format!(
            "{HEADER}tcp 0 0 127.0.0.1:6379 0.0.0.0:* LISTEN 10/redis-server\ntcp6 0 0 ::1:631 :::* LISTEN 11/cupsd\n"
        );
        assert!(parse_netstat(&raw).unwrap().is_empty());
    }

    #[test]
    fn test_headers_only_is_empty() {
        assert!(parse_netstat(HEADER).unwrap().is_empty());
    }

    #[test]
    fn test_last_line_dropped() {
        let raw = format!("{HEADER}tcp 0 0 0.0.0.0:22 0.0.0.0:* LISTEN 1/sshd");
        assert!(parse_netstat(&raw).unwrap().is_empty());
    }

    #[test]
    fn test_ownerless_socket() {
        let raw = format!("{HEADER}tcp 0 0 0.0.0.0:2049 0.0.0.0:* LISTEN -\n");
        assert_eq!(parse_netstat(&raw).unwrap()[0].program, "-");
    }

    #[test]
    fn test_malformed() {
        assert!(parse_netstat("").is_err());
        assert!(parse_netstat("netstat: command not found\n").is_err());

        let raw = format!("{HEADER}tcp 0 0 0.0.0.0:22\n");
        assert!(parse_netstat(&raw).unwrap_err().is_malformed_output());

        let raw = format!("{HEADER}udp 0 0 0.0.0.0:53 0.0.0.0:* LISTEN 5/dnsmasq\n");
        assert!(parse_netstat(&raw).is_err());
    }
}
