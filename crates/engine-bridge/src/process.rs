//! Engine subprocess ownership: spawn, command writes, shutdown.

use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::time::{timeout, Duration};

use crate::BridgeError;
use log::{debug, warn};
use uci::GuiCommand;

/// Grace period between `quit` and a forced kill.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// A running engine subprocess with piped standard streams.
///
/// Owns the OS process for the lifetime of the session. The stdout half is
/// handed out once at spawn time so a dedicated reader task can consume it;
/// stdin stays here and is written only through [`send`](Self::send).
///
/// There is no automatic restart: once the process dies, every further
/// write fails and the caller decides whether to spawn a new session.
pub struct EngineProcess {
    child: Option<Child>,
    stdin: ChildStdin,
}

impl EngineProcess {
    /// Spawn the engine.
    ///
    /// `command` is split on whitespace into program and arguments; a bare
    /// program name is resolved via `PATH`. Stdout is returned separately
    /// for the reader task.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Spawn`] if the command is empty, the binary
    /// cannot be located, or the process fails to start.
    pub fn spawn(command: &str) -> Result<(Self, ChildStdout), BridgeError> {
        let parts: Vec<&str> = command.split_whitespace().collect();
        let (program, args) = parts.split_first().ok_or_else(|| {
            BridgeError::Spawn(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "empty engine command",
            ))
        })?;

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(BridgeError::Spawn)?;

        let stdin = child.stdin.take().ok_or_else(|| {
            BridgeError::Spawn(std::io::Error::other("engine stdin not captured"))
        })?;
        let stdout = child.stdout.take().ok_or_else(|| {
            BridgeError::Spawn(std::io::Error::other("engine stdout not captured"))
        })?;

        debug!("spawned engine process: {}", command);
        Ok((
            Self {
                child: Some(child),
                stdin,
            },
            stdout,
        ))
    }

    /// Write one line-terminated command and flush.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Write`] if the pipe is closed (the process
    /// exited). This is fatal for the session and is never retried here.
    pub async fn send(&mut self, line: &str) -> Result<(), BridgeError> {
        debug!("> {}", line);
        self.stdin
            .write_all(line.as_bytes())
            .await
            .map_err(BridgeError::Write)?;
        self.stdin.write_all(b"\n").await.map_err(BridgeError::Write)?;
        self.stdin.flush().await.map_err(BridgeError::Write)
    }

    /// Shut the process down: `quit`, a bounded wait, then a forced kill.
    ///
    /// Idempotent; a second call is a no-op.
    pub async fn shutdown(&mut self) {
        let Some(mut child) = self.child.take() else {
            return;
        };

        // The process may already be gone; a failed quit just means we
        // skip straight to waiting.
        let _ = self.send(&GuiCommand::Quit.to_uci()).await;

        match timeout(SHUTDOWN_GRACE, child.wait()).await {
            Ok(_) => debug!("engine exited after quit"),
            Err(_) => {
                warn!("engine did not exit within {:?}, killing", SHUTDOWN_GRACE);
                let _ = child.kill().await;
            }
        }
    }
}
