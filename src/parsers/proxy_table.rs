use super::{malformed, split_lines};
use crate::models::{ProxySource, ProxyTable};
use crate::Result;

/// Blank line, "Listen on / Connect to" banner, blank line, column titles, dashes
const HEADER_LINES: usize = 5;
/// Blank line after the rows and the empty line after the final `\r\n`
const TRAILER_LINES: usize = 2;

/// Parse `netsh interface portproxy show all`
///
/// netsh prints nothing at all when no rules exist.
pub fn parse_proxy_table(raw: &str) -> Result<ProxyTable> {
    const WHAT: &str = "portproxy";

    let mut table = ProxyTable::new();
    if raw.trim().is_empty() {
        return Ok(table);
    }

    let lines = split_lines(raw);
    if lines.len() < HEADER_LINES + TRAILER_LINES {
        return Err(malformed(WHAT, "truncated table", raw));
    }
    if !lines[HEADER_LINES - 1].starts_with("---") {
        return Err(malformed(WHAT, "missing column separator", raw));
    }

    for line in &lines[HEADER_LINES..lines.len() - TRAILER_LINES] {
        let fields: Vec<&str> = line.split_whitespace().collect();
        let &[src_ip, src_port, dest_ip, dest_port] = fields.as_slice() else {
            return Err(malformed(
                WHAT,
                format!("expected 4 columns, found {}", fields.len()),
                line,
            ));
        };

        let src_port = parse_port(src_port, line)?;
        let dest_port = parse_port(dest_port, line)?;

        table.insert(
            dest_ip,
            dest_port,
            ProxySource {
                ip: src_ip.to_string(),
                port: src_port,
            },
        );
    }

    Ok(table)
}

fn parse_port(field: &str, line: &str) -> Result<u16> {
    field
        .parse()
        .map_err(|_| malformed("portproxy", format!("invalid port {:?}", field), line))
}
