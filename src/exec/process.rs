// src/exec/process.rs

//! One-shot subprocesses run through the platform shell.

use std::path::Path;
use std::process::Stdio;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::errors::{PipedagError, Result};

/// Captured result of a finished subprocess.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    pub command: String,
    /// `None` when the process was terminated by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Treat a non-zero exit as a [`PipedagError::SubprocessError`].
    pub fn into_result(self) -> Result<Self> {
        if self.success() {
            return Ok(self);
        }
        let status = match self.code {
            Some(code) => format!("exit code {code}"),
            None => "terminated by signal".to_string(),
        };
        let reason = match self.stderr.lines().last() {
            Some(last) if !last.trim().is_empty() => format!("{status}: {}", last.trim()),
            _ => status,
        };
        Err(PipedagError::SubprocessError {
            command: self.command,
            reason,
        })
    }
}

/// Build a shell command appropriate for the platform.
pub(crate) fn shell_command(command: &str, cwd: &Path) -> Command {
    let mut cmd = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(command);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(command);
        c
    };
    cmd.current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    cmd
}

/// Run `command` in `cwd` and wait for it.
///
/// Both streams are logged line by line whatever the exit code; a non-zero
/// exit is returned in [`ProcessOutput`], not as an error.
pub async fn run_subprocess(command: &str, cwd: &Path) -> Result<ProcessOutput> {
    info!(cmd = %command, "running subprocess");

    let mut child = shell_command(command, cwd)
        .spawn()
        .map_err(|e| PipedagError::SubprocessError {
            command: command.to_string(),
            reason: format!("failed to spawn: {e}"),
        })?;

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let (stdout, stderr, status) = tokio::join!(
        collect_lines(stdout, command, "stdout"),
        collect_lines(stderr, command, "stderr"),
        child.wait(),
    );

    let status = status.map_err(|e| PipedagError::SubprocessError {
        command: command.to_string(),
        reason: format!("failed to wait: {e}"),
    })?;

    let output = ProcessOutput {
        command: command.to_string(),
        code: status.code(),
        stdout,
        stderr,
    };

    info!(
        cmd = %command,
        exit_code = output.code.unwrap_or(-1),
        success = output.success(),
        "subprocess exited"
    );

    Ok(output)
}

async fn collect_lines<R>(stream: Option<R>, command: &str, stream_name: &str) -> String
where
    R: AsyncRead + Unpin,
{
    let Some(stream) = stream else {
        return String::new();
    };
    let mut reader = BufReader::new(stream);
    let mut buf = Vec::new();
    let mut collected = String::new();

    while let Some(line) = next_lossy_line(&mut reader, &mut buf).await {
        info!(target: "pipedag::subprocess", cmd = %command, "{stream_name}: {line}");
        collected.push_str(&line);
        collected.push('\n');
    }

    debug!(cmd = %command, stream = stream_name, "stream closed");
    collected
}

/// Next line of `reader` without its terminator, with invalid UTF-8
/// replaced. `None` at end of stream or on a read error.
pub(crate) async fn next_lossy_line<R>(reader: &mut R, buf: &mut Vec<u8>) -> Option<String>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    match reader.read_until(b'\n', buf).await {
        Ok(0) => None,
        Ok(_) => {
            if buf.last() == Some(&b'\n') {
                buf.pop();
                if buf.last() == Some(&b'\r') {
                    buf.pop();
                }
            }
            Some(String::from_utf8_lossy(buf).into_owned())
        }
        Err(e) => {
            warn!(error = %e, "failed to read subprocess output");
            None
        }
    }
}
