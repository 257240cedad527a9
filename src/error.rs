//! Error types for portos

use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to launch {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{tool} {}` exited with {}: {}", .args.join(" "), exit_label(.code), .stderr.trim())]
    Command {
        tool: String,
        args: Vec<String>,
        code: Option<i32>,
        stderr: String,
    },

    #[error("`{tool} {}` timed out after {}s", .args.join(" "), .after.as_secs())]
    Timeout {
        tool: String,
        args: Vec<String>,
        after: Duration,
    },

    #[error("Malformed {what} output: {reason} (near {sample:?})")]
    Parse {
        what: &'static str,
        reason: String,
        sample: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Distribution not found: {0}")]
    DistributionNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("code {}", code),
        None => "signal".to_string(),
    }
}

impl Error {
    /// The named distribution does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::DistributionNotFound(_))
    }

    /// A tool could not be run to completion (missing, failed or hung)
    pub fn is_unreachable(&self) -> bool {
        matches!(
            self,
            Error::Spawn { .. } | Error::Command { .. } | Error::Timeout { .. }
        )
    }

    /// A tool ran but printed something we could not make sense of
    pub fn is_malformed_output(&self) -> bool {
        matches!(self, Error::Parse { .. })
    }

    /// Rewrite a wsl.exe failure that names a missing distribution
    pub(crate) fn for_distribution(self, name: &str) -> Self {
        match &self {
            Error::Command { stderr, .. }
                if stderr.contains("WSL_E_DISTRO_NOT_FOUND")
                    || stderr.contains("There is no distribution with the supplied name") =>
            {
                Error::DistributionNotFound(name.to_string())
            }
            _ => self,
        }
    }
}
