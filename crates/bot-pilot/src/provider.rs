//! Board state providers: the collaborator-facing edge of the watcher.
//!
//! The DOM scraping itself lives outside this workspace. What lives here
//! are the adapters the watcher can actually be wired to: a file-backed
//! provider for driving the watcher from an external scraper process, and
//! a generic adapter that turns a scraped move list plus a move model into
//! position snapshots.

use std::path::PathBuf;

use log::info;
use uci::{MoveCommand, PositionId};

use crate::watch::{BoardStateProvider, MoveModel, ProviderError, SideToMove};

/// Board state read from a file an external scraper keeps current.
///
/// The scraper writes the FEN of each position it wants handled into the
/// file; chosen moves are printed to stdout for the scraper to replay.
/// The scraper must not write the position resulting from the bot's own
/// move back into the file - it only publishes positions to act on.
pub struct FenFileProvider {
    path: PathBuf,
}

impl FenFileProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl BoardStateProvider for FenFileProvider {
    async fn read_position(&mut self) -> Result<PositionId, ProviderError> {
        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            ProviderError::new(format!("cannot read {}: {}", self.path.display(), e))
        })?;

        let fen = content.trim();
        if fen.is_empty() {
            return Err(ProviderError::new(format!(
                "{} does not contain a position yet",
                self.path.display()
            )));
        }
        Ok(PositionId::new(fen))
    }

    async fn apply_move(
        &mut self,
        mv: &MoveCommand,
        side: SideToMove,
    ) -> Result<(), ProviderError> {
        info!("applying {} as {}", mv, side);
        println!("{}", mv);
        Ok(())
    }
}

/// Source of raw scraped move lists, e.g. the text of a web page's move
/// panel, already stripped of annotation glyphs by the scraper.
#[allow(async_fn_in_trait)]
pub trait MoveListSource {
    /// Read the moves played so far, in short algebraic notation.
    async fn read_move_list(&mut self) -> Result<Vec<String>, ProviderError>;

    /// Replay a move on the scraped surface (e.g. click two squares).
    async fn play_move(&mut self, mv: &MoveCommand, side: SideToMove)
        -> Result<(), ProviderError>;
}

/// Adapter from a scraped move list to position snapshots.
///
/// Reads the SAN move list from the source and normalizes it into a
/// canonical position through the move model, which is how the watcher
/// compares board states without understanding chess notation itself.
pub struct MoveListBoard<S, M> {
    source: S,
    model: M,
}

impl<S: MoveListSource, M: MoveModel> MoveListBoard<S, M> {
    pub fn new(source: S, model: M) -> Self {
        Self { source, model }
    }
}

impl<S: MoveListSource, M: MoveModel> BoardStateProvider for MoveListBoard<S, M> {
    async fn read_position(&mut self) -> Result<PositionId, ProviderError> {
        let moves = self.source.read_move_list().await?;
        self.model.apply_move_sequence(&moves)
    }

    async fn apply_move(
        &mut self,
        mv: &MoveCommand,
        side: SideToMove,
    ) -> Result<(), ProviderError> {
        self.source.play_move(mv, side).await
    }
}

/// Stand-in move model for the file-backed provider.
///
/// The scraper behind [`FenFileProvider`] never reflects the bot's own
/// move back into the file, so the predicted post-move position only has
/// to be distinct from every snapshot that can actually be observed. SAN
/// normalization needs real chess rules and is deliberately out of reach
/// here; deployments scraping move lists supply their own model.
pub struct FileScrapeModel;

impl MoveModel for FileScrapeModel {
    fn apply_move_sequence(&self, _moves: &[String]) -> Result<PositionId, ProviderError> {
        Err(ProviderError::new(
            "SAN normalization requires an external move model",
        ))
    }

    fn position_after(
        &self,
        position: &PositionId,
        mv: &MoveCommand,
    ) -> Result<PositionId, ProviderError> {
        Ok(PositionId::new(format!("{} after {}", position, mv)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fen_file_provider_reads_trimmed_position() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("board.fen");
        std::fs::write(&path, "  8/8/8/8/8/8/8/K6k w - - 0 1\n").unwrap();

        let mut provider = FenFileProvider::new(&path);
        let position = provider.read_position().await.unwrap();
        assert_eq!(position.as_str(), "8/8/8/8/8/8/8/K6k w - - 0 1");
    }

    #[tokio::test]
    async fn fen_file_provider_rejects_missing_or_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("board.fen");

        let mut provider = FenFileProvider::new(&path);
        assert!(provider.read_position().await.is_err());

        std::fs::write(&path, "\n").unwrap();
        assert!(provider.read_position().await.is_err());
    }

    struct StubSource {
        moves: Vec<String>,
        played: Vec<String>,
    }

    impl MoveListSource for StubSource {
        async fn read_move_list(&mut self) -> Result<Vec<String>, ProviderError> {
            Ok(self.moves.clone())
        }

        async fn play_move(
            &mut self,
            mv: &MoveCommand,
            _side: SideToMove,
        ) -> Result<(), ProviderError> {
            self.played.push(mv.as_str().to_string());
            Ok(())
        }
    }

    struct JoiningModel;

    impl MoveModel for JoiningModel {
        fn apply_move_sequence(&self, moves: &[String]) -> Result<PositionId, ProviderError> {
            Ok(PositionId::new(moves.join(" ")))
        }

        fn position_after(
            &self,
            position: &PositionId,
            mv: &MoveCommand,
        ) -> Result<PositionId, ProviderError> {
            Ok(PositionId::new(format!("{} {}", position, mv)))
        }
    }

    #[tokio::test]
    async fn move_list_board_normalizes_through_the_model() {
        let source = StubSource {
            moves: vec!["e4".to_string(), "e5".to_string(), "Nf3".to_string()],
            played: Vec::new(),
        };
        let mut board = MoveListBoard::new(source, JoiningModel);

        let position = board.read_position().await.unwrap();
        assert_eq!(position.as_str(), "e4 e5 Nf3");
    }

    #[test]
    fn file_scrape_model_predicts_a_distinct_position() {
        let model = FileScrapeModel;
        let before = PositionId::new("8/8/8/8/8/8/8/K6k w - - 0 1");
        let mv = MoveCommand::parse("a1a2").unwrap();
        let after = model.position_after(&before, &mv).unwrap();
        assert_ne!(before, after);
    }
}
