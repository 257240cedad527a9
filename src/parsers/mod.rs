//! Parsers for the text printed by wsl.exe, netsh.exe and tools inside a
//! distribution.
//!
//! Every parser is a pure `&str -> Result<T>` function. The header and
//! trailer line counts they skip are tied to the exact output layout of the
//! tool version they were written against; the golden samples under
//! `tests/fixtures/` pin those layouts.

mod distro_list;
mod ifconfig;
mod issue;
mod netstat;
mod proxy_table;
mod services;

pub use distro_list::parse_distro_list;
pub use ifconfig::parse_ip_address;
pub use issue::parse_issue_file;
pub use netstat::parse_netstat;
pub use proxy_table::parse_proxy_table;
pub use services::parse_service_list;

use crate::{Error, Result};

const SAMPLE_LEN: usize = 120;

/// `uname -r` with its trailing newline removed
pub fn parse_kernel_version(raw: &str) -> Result<String> {
    let version = raw.strip_suffix('\n').unwrap_or(raw);
    let version = version.strip_suffix('\r').unwrap_or(version);
    if version.trim().is_empty() {
        return Err(malformed("uname", "empty kernel version", raw));
    }
    Ok(version.to_string())
}

/// Split tool output into lines, accepting both `\n` and `\r\n`
///
/// Unlike [`str::lines`] a trailing terminator yields a final empty line,
/// which the trailer counts below rely on.
fn split_lines(raw: &str) -> Vec<&str> {
    raw.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect()
}

fn malformed(what: &'static str, reason: impl Into<String>, raw: &str) -> Error {
    let sample: String = raw.chars().take(SAMPLE_LEN).collect();
    Error::Parse {
        what,
        reason: reason.into(),
        sample,
    }
}
