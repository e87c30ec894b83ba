//! Engine process supervision and serialized best-move requests.
//!
//! This crate owns the one failure-prone external dependency of the
//! system: a long-running UCI engine subprocess. [`EngineProcess`] handles
//! spawn, command writes, and deterministic shutdown; [`EngineBridge`]
//! layers the protocol on top: handshake, a single-in-flight best-move
//! request, and a dedicated reader task that turns the engine's stdout
//! into classified messages.
//!
//! The engine is never restarted automatically. Every fatal condition
//! (broken pipe, process exit, timeout) is surfaced to the caller, which
//! decides whether to recreate the session.

mod bridge;
mod process;

pub use bridge::{EngineBridge, DEFAULT_HANDSHAKE_TIMEOUT};
pub use process::EngineProcess;

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when supervising or talking to the engine.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// Failed to spawn the engine process (binary missing or unlaunchable).
    #[error("Failed to spawn engine process: {0}")]
    Spawn(#[source] std::io::Error),
    /// Writing a command failed; the process has exited or closed its stdin.
    #[error("Failed to write to engine: {0}")]
    Write(#[source] std::io::Error),
    /// No readiness acknowledgment arrived within the configured bound.
    #[error("Engine handshake timed out after {0:?}")]
    HandshakeTimeout(Duration),
    /// No result line arrived within the time budget plus protocol margin.
    #[error("Engine produced no move within {0:?}")]
    EngineTimeout(Duration),
    /// The engine process exited while a request was outstanding.
    #[error("Engine process terminated before producing a move")]
    EngineTerminated,
    /// The engine answered a request with a malformed result line, for
    /// example `bestmove (none)` on a position with no legal moves.
    #[error("Engine violated the protocol: {0}")]
    Protocol(#[source] uci::ProtocolError),
    /// A best-move request was issued while another was still in flight.
    /// This is a protocol-invariant violation, always a caller bug.
    #[error("A best-move request is already in flight")]
    ConcurrentRequest,
    /// The session is not (or no longer) ready to accept requests.
    #[error("Engine session is not ready")]
    NotReady,
}
