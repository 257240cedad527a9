//! External command execution
//!
//! Everything portos knows about a distribution or the host proxy table comes
//! from running `wsl.exe` / `netsh.exe` and reading stdout. [`CommandRunner`]
//! is the seam between the query/reconcile logic and the operating system.

use crate::{Error, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::process::Stdio;
use std::time::Duration;

/// Run a tool and hand back its stdout with NUL bytes removed
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, tool: &str, args: &[String]) -> Result<String>;
}

/// Runs tools as child processes on the host
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    timeout: Duration,
}

impl ProcessRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, tool: &str, args: &[String]) -> Result<String> {
        tracing::debug!(tool = %tool, args = %args.join(" "), "Running command");

        let mut command = tokio::process::Command::new(tool);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // CREATE_NO_WINDOW: no console flash when launched from a tray process
        #[cfg(windows)]
        command.creation_flags(0x0800_0000);

        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| Error::Timeout {
                tool: tool.to_string(),
                args: args.to_vec(),
                after: self.timeout,
            })?
            .map_err(|source| Error::Spawn {
                tool: tool.to_string(),
                source,
            })?;

        let stdout = strip_nul(&output.stdout);

        if !output.status.success() {
            let stderr = strip_nul(&output.stderr);
            // wsl.exe prints its own failures on stdout
            let stderr = if stderr.trim().is_empty() { stdout } else { stderr };
            return Err(Error::Command {
                tool: tool.to_string(),
                args: args.to_vec(),
                code: output.status.code(),
                stderr,
            });
        }

        Ok(stdout)
    }
}

/// Decode tool output, dropping the NULs left behind by wsl.exe's UTF-16 pipe
pub fn strip_nul(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).replace('\0', "")
}

/// In-memory runner answering from canned output, keyed by full command line
///
/// Each command line owns a queue of responses. Responses are consumed in
/// order and the last one repeats forever, so a table can be scripted to
/// change after a corrective action.
#[derive(Default)]
pub struct ScriptedRunner {
    responses: Mutex<HashMap<String, VecDeque<std::result::Result<String, String>>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue stdout for `command_line` (tool and args joined by single spaces)
    pub fn respond(self, command_line: impl Into<String>, stdout: impl Into<String>) -> Self {
        self.push(command_line.into(), Ok(stdout.into()));
        self
    }

    /// Queue a non-zero exit with `stderr` for `command_line`
    pub fn fail(self, command_line: impl Into<String>, stderr: impl Into<String>) -> Self {
        self.push(command_line.into(), Err(stderr.into()));
        self
    }

    fn push(&self, command_line: String, response: std::result::Result<String, String>) {
        self.responses
            .lock()
            .entry(command_line)
            .or_default()
            .push_back(response);
    }

    /// Every command line run so far, in call order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    /// Number of calls whose command line starts with `prefix`
    pub fn count(&self, prefix: &str) -> usize {
        self.calls.lock().iter().filter(|c| c.starts_with(prefix)).count()
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, tool: &str, args: &[String]) -> Result<String> {
        let command_line = std::iter::once(tool.to_string())
            .chain(args.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ");
        self.calls.lock().push(command_line.clone());

        let response = {
            let mut responses = self.responses.lock();
            match responses.get_mut(&command_line) {
                Some(queue) if queue.len() > 1 => queue.pop_front(),
                Some(queue) => queue.front().cloned(),
                None => None,
            }
        };

        match response {
            Some(Ok(stdout)) => Ok(stdout.replace('\0', "")),
            Some(Err(stderr)) => Err(Error::Command {
                tool: tool.to_string(),
                args: args.to_vec(),
                code: Some(1),
                stderr,
            }),
            None => Err(Error::Command {
                tool: tool.to_string(),
                args: args.to_vec(),
                code: Some(127),
                stderr: format!("no scripted response for `{}`", command_line),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_strip_nul() {
        let utf16ish = b"U\0b\0u\0n\0t\0u\0\r\0\n\0";
        assert_eq!(strip_nul(utf16ish), "Ubuntu\r\n");
        assert_eq!(strip_nul(b"plain"), "plain");
    }

    #[tokio::test]
    async fn test_scripted_runner_queue() {
        let runner = ScriptedRunner::new()
            .respond("wsl.exe --list -v", "first")
            .respond("wsl.exe --list -v", "second");

        let a = args(&["--list", "-v"]);
        assert_eq!(runner.run("wsl.exe", &a).await.unwrap(), "first");
        assert_eq!(runner.run("wsl.exe", &a).await.unwrap(), "second");
        assert_eq!(runner.run("wsl.exe", &a).await.unwrap(), "second");
        assert_eq!(runner.count("wsl.exe --list"), 3);
    }

    #[tokio::test]
    async fn test_scripted_runner_failures() {
        let runner = ScriptedRunner::new().fail("netsh.exe interface portproxy show all", "denied");

        let err = runner
            .run("netsh.exe", &args(&["interface", "portproxy", "show", "all"]))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Command { ref stderr, .. } if stderr == "denied"));

        let err = runner.run("wsl.exe", &args(&["-t", "x"])).await.unwrap_err();
        assert!(err.is_unreachable());
    }

    #[tokio::test]
    async fn test_process_runner_missing_tool() {
        let runner = ProcessRunner::new(Duration::from_secs(5));
        let err = runner
            .run("portos-definitely-not-a-real-tool", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Spawn { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_process_runner_exit_code() {
        let runner = ProcessRunner::default();
        let err = runner
            .run("sh", &args(&["-c", "echo nope >&2; exit 3"]))
            .await
            .unwrap_err();
        match err {
            Error::Command { code, stderr, .. } => {
                assert_eq!(code, Some(3));
                assert_eq!(stderr.trim(), "nope");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_process_runner_timeout() {
        let runner = ProcessRunner::new(Duration::from_millis(100));
        let err = runner.run("sleep", &args(&["5"])).await.unwrap_err();
        assert!(matches!(err, Error::Timeout { .. }));
    }
}
