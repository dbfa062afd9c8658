// src/exec/bridge.rs

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::errors::Result;
use crate::exec::long_lived::spawn_long_lived;
use crate::exec::process::{run_subprocess, ProcessOutput};

/// Exit report of a long-running server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerExit {
    pub name: String,
    pub code: Option<i32>,
}

/// Monitor task owning a server child. Aborting it drops the child, which
/// kills the process.
struct ServerHandle {
    monitor: JoinHandle<()>,
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        self.monitor.abort();
    }
}

/// Runs external commands from the project root and keeps track of
/// long-running servers.
///
/// Cheap to clone; clones share the server registry.
#[derive(Clone)]
pub struct ProcessBridge {
    root: PathBuf,
    servers: Arc<Mutex<HashMap<String, ServerHandle>>>,
    exit_tx: mpsc::UnboundedSender<ServerExit>,
    exit_rx: Arc<Mutex<mpsc::UnboundedReceiver<ServerExit>>>,
}

impl std::fmt::Debug for ProcessBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessBridge")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

impl ProcessBridge {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let (exit_tx, exit_rx) = mpsc::unbounded_channel();
        Self {
            root: root.into(),
            servers: Arc::new(Mutex::new(HashMap::new())),
            exit_tx,
            exit_rx: Arc::new(Mutex::new(exit_rx)),
        }
    }

    /// Run a one-shot command from the project root.
    pub async fn run(&self, command: &str) -> Result<ProcessOutput> {
        run_subprocess(command, &self.root).await
    }

    /// Start `command` as server `name` unless it is already running.
    pub async fn ensure_server(&self, name: &str, command: &str) -> Result<()> {
        let mut servers = self.servers.lock().await;

        if let Some(existing) = servers.get(name) {
            if !existing.monitor.is_finished() {
                debug!(server = %name, "already running");
                return Ok(());
            }
            debug!(server = %name, "previous instance exited; restarting");
        }

        let mut child = spawn_long_lived(name, command, &self.root)?;
        let exit_tx = self.exit_tx.clone();
        let server = name.to_string();

        let monitor = tokio::spawn(async move {
            let code = match child.wait().await {
                Ok(status) => status.code(),
                Err(e) => {
                    warn!(server = %server, error = %e, "failed to wait for server");
                    None
                }
            };
            info!(server = %server, exit_code = code.unwrap_or(-1), "server exited");
            let _ = exit_tx.send(ServerExit { name: server, code });
        });

        servers.insert(name.to_string(), ServerHandle { monitor });
        Ok(())
    }

    /// Number of servers currently running.
    pub async fn running_servers(&self) -> usize {
        self.servers
            .lock()
            .await
            .values()
            .filter(|h| !h.monitor.is_finished())
            .count()
    }

    /// Resolve when any server exits. An exit that already happened is
    /// reported first; returns `None` at once if no server is running.
    pub async fn wait_for_servers(&self) -> Option<ServerExit> {
        let mut exits = self.exit_rx.lock().await;
        // A monitor sends its exit report before it counts as finished, so
        // checking the count first cannot miss an exit.
        if self.running_servers().await == 0 {
            return exits.try_recv().ok();
        }
        exits.recv().await
    }

    /// Kill every running server.
    pub async fn shutdown(&self) {
        let mut servers = self.servers.lock().await;
        if !servers.is_empty() {
            info!(count = servers.len(), "stopping servers");
        }
        servers.clear();
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn second_ensure_is_a_noop_while_running() {
        let dir = tempfile::tempdir().unwrap();
        let bridge = ProcessBridge::new(dir.path());

        bridge.ensure_server("srv", "echo started >> log.txt; sleep 5").await.unwrap();
        bridge.ensure_server("srv", "echo started >> log.txt; sleep 5").await.unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;

        assert_eq!(bridge.running_servers().await, 1);
        let log = std::fs::read_to_string(dir.path().join("log.txt")).unwrap();
        assert_eq!(log.lines().count(), 1);
        bridge.shutdown().await;
    }

    #[tokio::test]
    async fn wait_reports_server_exit() {
        let dir = tempfile::tempdir().unwrap();
        let bridge = ProcessBridge::new(dir.path());

        bridge.ensure_server("short", "exit 4").await.unwrap();
        let exit = tokio::time::timeout(Duration::from_secs(5), bridge.wait_for_servers())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(
            exit,
            ServerExit {
                name: "short".into(),
                code: Some(4),
            }
        );
    }

    #[tokio::test]
    async fn exit_before_waiting_is_still_reported() {
        let dir = tempfile::tempdir().unwrap();
        let bridge = ProcessBridge::new(dir.path());

        bridge.ensure_server("crashy", "exit 7").await.unwrap();
        while bridge.running_servers().await > 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        let exit = bridge.wait_for_servers().await.unwrap();
        assert_eq!(exit.code, Some(7));
    }

    #[tokio::test]
    async fn wait_without_servers_returns_none() {
        let bridge = ProcessBridge::new(".");
        assert!(bridge.wait_for_servers().await.is_none());
    }
}
