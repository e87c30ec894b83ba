//! Classification of engine output lines.

use crate::{MoveCommand, ProtocolError};

/// Lines sent from engine to GUI, classified.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineMessage {
    /// Engine identification (`id name ...`).
    Id { name: String },
    /// UCI initialization complete.
    UciOk,
    /// Readiness acknowledgment.
    ReadyOk,
    /// Search result for the most recently set position.
    BestMove {
        mv: MoveCommand,
        ponder: Option<MoveCommand>,
    },
    /// Any other line (search info, option listings). Ignored by the
    /// bridge but kept for diagnostic logging.
    Info(String),
}

impl EngineMessage {
    /// Classify a single complete output line.
    ///
    /// Readiness and handshake acknowledgments must match their token
    /// exactly; a result line must start with `bestmove` followed by a
    /// valid move token. Everything else becomes [`EngineMessage::Info`].
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError`] for a `bestmove` line whose move token is
    /// missing or malformed (including `bestmove (none)`).
    pub fn parse(line: &str) -> Result<Self, ProtocolError> {
        let line = line.trim();

        match line {
            "uciok" => return Ok(EngineMessage::UciOk),
            "readyok" => return Ok(EngineMessage::ReadyOk),
            _ => {}
        }

        if let Some(name) = line.strip_prefix("id name ") {
            return Ok(EngineMessage::Id {
                name: name.to_string(),
            });
        }

        if line == "bestmove" {
            return Err(ProtocolError::MalformedResult(line.to_string()));
        }

        if let Some(rest) = line.strip_prefix("bestmove ") {
            let mut parts = rest.split_whitespace();
            let token = parts
                .next()
                .ok_or_else(|| ProtocolError::MalformedResult(line.to_string()))?;
            let mv = MoveCommand::parse(token)?;
            let ponder = match parts.next() {
                Some("ponder") => parts.next().and_then(|t| MoveCommand::parse(t).ok()),
                _ => None,
            };
            return Ok(EngineMessage::BestMove { mv, ponder });
        }

        Ok(EngineMessage::Info(line.to_string()))
    }
}
