use super::{malformed, split_lines};
use crate::models::{DistroEntry, DistroState};
use crate::Result;

/// `NAME  STATE  VERSION` column header
const HEADER_LINES: usize = 1;
/// Empty line after the final `\r\n`
const TRAILER_LINES: usize = 1;
/// Width of the `* ` default-distribution marker column
const MARKER_WIDTH: usize = 2;
/// Docker Desktop's own distributions are infrastructure, never user-facing
const HIDDEN_PREFIX: &str = "docker-desktop";

/// Parse `wsl.exe --list -v`
pub fn parse_distro_list(raw: &str) -> Result<Vec<DistroEntry>> {
    const WHAT: &str = "distribution list";

    let lines = split_lines(raw);
    if lines.len() < HEADER_LINES + TRAILER_LINES {
        return Err(malformed(WHAT, "missing header", raw));
    }
    if !lines[0].contains("NAME") {
        return Err(malformed(WHAT, "missing NAME/STATE/VERSION header", raw));
    }

    let mut entries = Vec::new();
    for line in &lines[HEADER_LINES..lines.len() - TRAILER_LINES] {
        let fields = line
            .get(MARKER_WIDTH..)
            .ok_or_else(|| malformed(WHAT, "row shorter than marker column", line))?;

        let tokens: Vec<&str> = fields.split_whitespace().collect();
        let &[name, state, version, ..] = tokens.as_slice() else {
            return Err(malformed(
                WHAT,
                format!("expected name, state and version, found {} fields", tokens.len()),
                line,
            ));
        };

        if name.starts_with(HIDDEN_PREFIX) {
            continue;
        }

        let state = DistroState::from_label(state);
        let wsl_version = version
            .parse()
            .map_err(|_| malformed(WHAT, format!("invalid WSL version {:?}", version), line))?;

        entries.push(DistroEntry {
            name: name.to_string(),
            state,
            wsl_version,
        });
    }

    Ok(entries)
}
