// src/exec/long_lived.rs

//! Long-running processes (the dev server) whose output is streamed to the
//! log for as long as they run.

use std::path::Path;

use tokio::io::{AsyncRead, BufReader};
use tokio::process::Child;
use tracing::{debug, info, warn};

use crate::errors::{PipedagError, Result};
use crate::exec::process::{next_lossy_line, shell_command};

/// Spawn `command` without waiting for it.
///
/// Output is forwarded line by line by background tasks. The returned child
/// is killed when dropped.
pub fn spawn_long_lived(name: &str, command: &str, cwd: &Path) -> Result<Child> {
    info!(server = %name, cmd = %command, "starting long-lived process");

    let mut child = shell_command(command, cwd)
        .spawn()
        .map_err(|e| PipedagError::SubprocessError {
            command: command.to_string(),
            reason: format!("failed to spawn: {e}"),
        })?;

    match child.stdout.take() {
        Some(stdout) => forward_output(name, "stdout", stdout),
        None => warn!(server = %name, "no stdout pipe available"),
    }
    if let Some(stderr) = child.stderr.take() {
        forward_output(name, "stderr", stderr);
    }

    Ok(child)
}

/// Consume a stream so OS buffers never fill, logging every line.
fn forward_output<R>(name: &str, stream_name: &'static str, stream: R)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let name = name.to_string();
    tokio::spawn(async move {
        let mut reader = BufReader::new(stream);
        let mut buf = Vec::new();
        while let Some(line) = next_lossy_line(&mut reader, &mut buf).await {
            info!(target: "pipedag::subprocess", server = %name, "{stream_name}: {line}");
        }
        debug!(server = %name, stream = stream_name, "output stream ended");
    });
}
