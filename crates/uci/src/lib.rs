//! UCI (Universal Chess Interface) protocol types, seen from the GUI side.
//!
//! This crate provides the pieces needed to talk *to* a UCI engine rather
//! than to be one: formatting for the commands a GUI sends, classification
//! of the lines an engine emits, and an incremental line buffer for
//! reassembling newline-delimited output that arrives in arbitrary chunks.
//!
//! # Outbound commands
//!
//! - `uci` - Initialize engine
//! - `isready` - Synchronization
//! - `position fen <fen>` - Set position
//! - `go movetime <ms>` - Start search with a time budget
//! - `quit` - Exit engine
//!
//! # Inbound lines
//!
//! - `id name <name>` - Engine identification
//! - `uciok` - UCI initialization complete
//! - `readyok` - Readiness acknowledgment
//! - `bestmove <move> [ponder <move>]` - Search result
//! - anything else - Informational, kept for diagnostics

mod command;
mod line;
mod message;

pub use command::GuiCommand;
pub use line::LineBuffer;
pub use message::EngineMessage;

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Malformed result line: {0}")]
    MalformedResult(String),
    #[error("Invalid move token: {0}")]
    InvalidMove(String),
}

/// Canonical identifier for a board position.
///
/// Carries the full board state (pieces, side to move, castling and
/// en-passant rights, move counters) as a FEN string. Opaque to everything
/// in this workspace: it is only ever compared for equality and interpolated
/// into `position fen` commands.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PositionId(String);

impl PositionId {
    pub fn new(fen: impl Into<String>) -> Self {
        Self(fen.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PositionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A coordinate move as announced by the engine (e.g. "e2e4", "e7e8q").
///
/// Four characters for source and destination square, plus an optional fifth
/// for the promotion piece. Produced only by parsing engine result lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveCommand(String);

impl MoveCommand {
    /// Parse and validate a move token.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidMove`] if the token is not a
    /// four-or-five character coordinate move. The null move `0000` is
    /// rejected as well: the bridge has no use for "no move".
    pub fn parse(token: &str) -> Result<Self, ProtocolError> {
        let bytes = token.as_bytes();
        let valid = matches!(bytes.len(), 4 | 5)
            && is_square(bytes[0], bytes[1])
            && is_square(bytes[2], bytes[3])
            && (bytes.len() == 4 || matches!(bytes[4], b'q' | b'r' | b'b' | b'n'));
        if valid {
            Ok(Self(token.to_string()))
        } else {
            Err(ProtocolError::InvalidMove(token.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Source square ("e2" in "e2e4").
    pub fn source(&self) -> &str {
        &self.0[..2]
    }

    /// Destination square ("e4" in "e2e4").
    pub fn destination(&self) -> &str {
        &self.0[2..4]
    }

    /// Promotion piece, if any ('q' in "e7e8q").
    pub fn promotion(&self) -> Option<char> {
        self.0.chars().nth(4)
    }
}

fn is_square(file: u8, rank: u8) -> bool {
    (b'a'..=b'h').contains(&file) && (b'1'..=b'8').contains(&rank)
}

impl fmt::Display for MoveCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
