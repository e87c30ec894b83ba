//! Serialized best-move requests against a live engine session.

use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tokio::process::ChildStdout;
use tokio::sync::{mpsc, Mutex};
use tokio::time::{timeout_at, Duration, Instant};

use crate::{BridgeError, EngineProcess};
use log::{debug, info, warn};
use uci::{EngineMessage, GuiCommand, LineBuffer, MoveCommand, PositionId, ProtocolError};

/// Default bound on the initialization handshake.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Extra wait allowed beyond the engine's time budget for the result line.
const PROTOCOL_MARGIN: Duration = Duration::from_secs(2);

/// Handshake state of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    NotReady,
    Ready,
}

struct Session {
    process: EngineProcess,
    /// Classified lines from the reader task, with parse failures kept
    /// rather than dropped so a pending request can fail on them. Closed
    /// channel means the engine's stdout reached end-of-stream, i.e. the
    /// process is gone.
    messages: mpsc::Receiver<Result<EngineMessage, ProtocolError>>,
    state: SessionState,
    /// Engine name captured from `id name` during the handshake.
    name: Option<String>,
}

/// The public face of the engine: an awaitable "best move for this
/// position" operation with structurally enforced request serialization.
///
/// The engine computes one position at a time, so the first result line
/// observed after a request was sent belongs to that request. The bridge
/// preserves that guarantee by keeping the whole session (command writer
/// plus message receiver) behind one async mutex: a request holds the lock
/// for its full duration, and a second caller fails fast with
/// [`BridgeError::ConcurrentRequest`] before anything is written.
///
/// Cloning is cheap and shares the session.
#[derive(Clone)]
pub struct EngineBridge {
    session: Arc<Mutex<Session>>,
}

impl EngineBridge {
    /// Spawn the engine and start the stdout reader task.
    ///
    /// The session is not yet usable; call [`initialize`](Self::initialize)
    /// to perform the handshake.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Spawn`] if the process cannot be started.
    pub fn spawn(command: &str) -> Result<Self, BridgeError> {
        let (process, stdout) = EngineProcess::spawn(command)?;
        let (tx, rx) = mpsc::channel(64);
        tokio::spawn(read_engine_output(stdout, tx));

        Ok(Self {
            session: Arc::new(Mutex::new(Session {
                process,
                messages: rx,
                state: SessionState::NotReady,
                name: None,
            })),
        })
    }

    /// Perform the UCI handshake and wait for readiness.
    ///
    /// Sends `uci` and `isready`, then waits until the engine acknowledges
    /// with `readyok`, driven by the reader task rather than by polling.
    /// The engine's `id name` line is captured along the way.
    ///
    /// # Errors
    ///
    /// - [`BridgeError::HandshakeTimeout`] if no acknowledgment arrives
    ///   within `bound`
    /// - [`BridgeError::EngineTerminated`] if the process exits first
    /// - [`BridgeError::Write`] if the commands cannot be sent
    pub async fn initialize(&self, bound: Duration) -> Result<(), BridgeError> {
        let mut session = self.session.lock().await;

        session.process.send(&GuiCommand::Uci.to_uci()).await?;
        session.process.send(&GuiCommand::IsReady.to_uci()).await?;

        let deadline = Instant::now() + bound;
        loop {
            let received = timeout_at(deadline, session.messages.recv()).await;
            let msg = match received {
                Err(_) => return Err(BridgeError::HandshakeTimeout(bound)),
                Ok(None) => return Err(BridgeError::EngineTerminated),
                Ok(Some(Err(e))) => {
                    // No request is pending yet; a garbled line here can
                    // only be stale output.
                    warn!("ignoring malformed engine line: {}", e);
                    continue;
                }
                Ok(Some(Ok(msg))) => msg,
            };

            match msg {
                EngineMessage::ReadyOk => {
                    session.state = SessionState::Ready;
                    info!(
                        "engine ready: {}",
                        session.name.as_deref().unwrap_or("unknown")
                    );
                    return Ok(());
                }
                EngineMessage::UciOk => debug!("engine accepted uci"),
                EngineMessage::Id { name } => {
                    debug!("engine identified as {}", name);
                    session.name = Some(name);
                }
                EngineMessage::BestMove { mv, .. } => {
                    // A result during the handshake means a stale session.
                    warn!("unexpected bestmove {} during handshake", mv);
                }
                EngineMessage::Info(line) => debug!("engine: {}", line),
            }
        }
    }

    /// Request the best move for `position` with the given time budget.
    ///
    /// Sends `position fen <id>` followed by `go movetime <ms>` and
    /// suspends the caller until the engine's result line arrives. At most
    /// one request may be in flight; a concurrent call fails with
    /// [`BridgeError::ConcurrentRequest`] without sending anything.
    ///
    /// # Errors
    ///
    /// - [`BridgeError::NotReady`] before a successful handshake, or after
    ///   a timeout or termination made the session untrustworthy
    /// - [`BridgeError::EngineTerminated`] if the process exits before a
    ///   result arrives
    /// - [`BridgeError::EngineTimeout`] if no result arrives within
    ///   `time_budget` plus a small protocol margin
    /// - [`BridgeError::Protocol`] if the engine answers with a malformed
    ///   result line, such as `bestmove (none)` on a mated position
    pub async fn best_move(
        &self,
        position: &PositionId,
        time_budget: Duration,
    ) -> Result<MoveCommand, BridgeError> {
        let mut session = self
            .session
            .try_lock()
            .map_err(|_| BridgeError::ConcurrentRequest)?;

        if session.state != SessionState::Ready {
            return Err(BridgeError::NotReady);
        }

        session
            .process
            .send(&GuiCommand::Position(position.clone()).to_uci())
            .await?;
        session
            .process
            .send(
                &GuiCommand::Go {
                    movetime_ms: time_budget.as_millis() as u64,
                }
                .to_uci(),
            )
            .await?;

        let bound = time_budget + PROTOCOL_MARGIN;
        let deadline = Instant::now() + bound;
        loop {
            let received = timeout_at(deadline, session.messages.recv()).await;
            let msg = match received {
                Err(_) => {
                    // A late result could otherwise be mistaken for the
                    // answer to a future request.
                    session.state = SessionState::NotReady;
                    return Err(BridgeError::EngineTimeout(bound));
                }
                Ok(None) => {
                    session.state = SessionState::NotReady;
                    return Err(BridgeError::EngineTerminated);
                }
                Ok(Some(Err(e))) => {
                    // The garbled line was almost certainly meant as the
                    // answer to this request, so fail now rather than
                    // letting the caller run out the full time budget.
                    session.state = SessionState::NotReady;
                    return Err(BridgeError::Protocol(e));
                }
                Ok(Some(Ok(msg))) => msg,
            };

            match msg {
                EngineMessage::BestMove { mv, ponder } => {
                    if let Some(ponder) = ponder {
                        debug!("engine suggests pondering {}", ponder);
                    }
                    return Ok(mv);
                }
                EngineMessage::Info(line) => debug!("engine: {}", line),
                other => debug!("ignoring {:?} while awaiting result", other),
            }
        }
    }

    /// Engine name reported during the handshake, if any.
    pub async fn name(&self) -> Option<String> {
        self.session.lock().await.name.clone()
    }

    /// Gracefully shut the engine down.
    ///
    /// Waits for any in-flight request to complete first, so the session
    /// is never torn down mid-protocol. Idempotent.
    pub async fn shutdown(&self) {
        let mut session = self.session.lock().await;
        session.state = SessionState::NotReady;
        session.process.shutdown().await;
    }
}

/// Reader task: consume the engine's stdout until end-of-stream, feeding
/// classified lines to the session channel. Lines that fail to classify
/// are forwarded as errors; only the session knows whether a request is
/// pending on them. Dropping the sender closes the channel, which the
/// bridge observes as process termination.
async fn read_engine_output(
    mut stdout: ChildStdout,
    tx: mpsc::Sender<Result<EngineMessage, ProtocolError>>,
) {
    let mut lines = LineBuffer::new();
    let mut chunk = [0u8; 4096];

    loop {
        let n = match stdout.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => n,
        };

        for line in lines.feed(&chunk[..n]) {
            if tx.send(EngineMessage::parse(&line)).await.is_err() {
                return;
            }
        }
    }

    debug!("engine output stream closed");
}
