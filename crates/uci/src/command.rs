//! Outbound GUI-to-engine command formatting.

use crate::PositionId;

/// Commands sent from GUI to engine.
#[derive(Debug, Clone, PartialEq)]
pub enum GuiCommand {
    /// Initialize UCI mode.
    Uci,
    /// Check if engine is ready.
    IsReady,
    /// Set up a position by its canonical identifier.
    Position(PositionId),
    /// Start calculating with a fixed time budget in milliseconds.
    Go { movetime_ms: u64 },
    /// Quit the engine.
    Quit,
}

impl GuiCommand {
    /// Format the command for the wire (no trailing newline).
    pub fn to_uci(&self) -> String {
        match self {
            GuiCommand::Uci => "uci".to_string(),
            GuiCommand::IsReady => "isready".to_string(),
            GuiCommand::Position(position) => format!("position fen {}", position),
            GuiCommand::Go { movetime_ms } => format!("go movetime {}", movetime_ms),
            GuiCommand::Quit => "quit".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_uci() {
        assert_eq!(GuiCommand::Uci.to_uci(), "uci");
    }

    #[test]
    fn format_isready() {
        assert_eq!(GuiCommand::IsReady.to_uci(), "isready");
    }

    #[test]
    fn format_position() {
        let cmd = GuiCommand::Position(PositionId::new(
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
        ));
        assert_eq!(
            cmd.to_uci(),
            "position fen rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"
        );
    }

    #[test]
    fn format_go_movetime() {
        assert_eq!(
            GuiCommand::Go { movetime_ms: 10000 }.to_uci(),
            "go movetime 10000"
        );
    }

    #[test]
    fn format_quit() {
        assert_eq!(GuiCommand::Quit.to_uci(), "quit");
    }
}
