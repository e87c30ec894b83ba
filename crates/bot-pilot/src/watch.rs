//! The position change watcher: observe, detect change, request, apply.
//!
//! The watcher is the one logical worker of the system. It polls an
//! external board state provider, compares each snapshot against what it
//! already knows, and on a genuine change asks the engine bridge for a
//! move and replays it through the provider. Applying a move changes the
//! very surface being polled, so the watcher also predicts the position
//! its own move produces and treats the next snapshot matching that
//! prediction as "no new change".

use std::fmt;
use std::time::Duration;

use engine_bridge::{BridgeError, EngineBridge};
use log::{debug, info, warn};
use thiserror::Error;
use tokio::sync::watch;
use uci::{MoveCommand, PositionId};

/// Consecutive `read_position` failures tolerated before escalating.
const MAX_READ_FAILURES: u32 = 3;

/// Error reported by an external collaborator (board scraper or move
/// model). Opaque by design; the collaborators live outside this core.
#[derive(Error, Debug)]
#[error("{0}")]
pub struct ProviderError(String);

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Errors that terminate the watcher loop.
///
/// All of these are fatal: the loop never silently retries a broken
/// engine session or an unreadable board.
#[derive(Error, Debug)]
pub enum WatchError {
    /// The engine session failed while working on `position`.
    #[error("Engine failure at position '{position}': {source}")]
    Engine {
        position: PositionId,
        #[source]
        source: BridgeError,
    },
    /// The board surface stayed unreadable past the retry budget.
    #[error("Board state unreadable after {failures} consecutive attempts: {source}")]
    BoardUnreadable {
        failures: u32,
        #[source]
        source: ProviderError,
    },
    /// Replaying the chosen move on the external surface failed.
    #[error("Failed to apply move {mv}: {source}")]
    ApplyFailed {
        mv: MoveCommand,
        #[source]
        source: ProviderError,
    },
    /// The move model could not predict the position after `mv`.
    #[error("Move model failed after move {mv}: {source}")]
    Model {
        mv: MoveCommand,
        #[source]
        source: ProviderError,
    },
}

/// Which side a move belongs to, as far as the external surface cares
/// (board orientation when clicking squares).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SideToMove {
    White,
    Black,
}

impl fmt::Display for SideToMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SideToMove::White => f.write_str("white"),
            SideToMove::Black => f.write_str("black"),
        }
    }
}

/// Side hint read from the canonical position encoding (the second FEN
/// field). Defaults to white when the field is absent.
pub fn side_hint(position: &PositionId) -> SideToMove {
    match position.as_str().split_whitespace().nth(1) {
        Some("b") => SideToMove::Black,
        _ => SideToMove::White,
    }
}

/// External surface the watcher observes and acts on.
///
/// Implementations scrape a board from somewhere (a web page, a file kept
/// current by a scraper) and replay moves onto it. Errors are transient
/// from the watcher's point of view, up to its retry budget.
#[allow(async_fn_in_trait)]
pub trait BoardStateProvider {
    /// Read the current position snapshot.
    async fn read_position(&mut self) -> Result<PositionId, ProviderError>;

    /// Replay a move on the external surface.
    async fn apply_move(&mut self, mv: &MoveCommand, side: SideToMove)
        -> Result<(), ProviderError>;
}

/// Chess-rule knowledge the core itself refuses to have.
///
/// Normalizes scraped short-algebraic move lists into canonical positions
/// and predicts the position a coordinate move produces.
pub trait MoveModel {
    /// Replay a scraped SAN move sequence from the starting position and
    /// return the canonical identifier of the resulting position.
    fn apply_move_sequence(&self, moves: &[String]) -> Result<PositionId, ProviderError>;

    /// Predict the position after `mv` is played in `position`.
    fn position_after(
        &self,
        position: &PositionId,
        mv: &MoveCommand,
    ) -> Result<PositionId, ProviderError>;
}

/// How a fresh snapshot relates to what the watcher already knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Observation {
    /// Same as the last seen position.
    Unchanged,
    /// Exactly the position our own applied move was predicted to produce.
    OwnMove,
    /// A genuinely new position.
    Changed,
}

/// Change-detection state: the last seen position and, after we applied a
/// move, the position that move is expected to produce. Mutated only by
/// the owning watcher.
#[derive(Debug, Default)]
struct WatchState {
    last_seen: Option<PositionId>,
    expected: Option<PositionId>,
}

impl WatchState {
    fn classify(&self, observed: &PositionId) -> Observation {
        if self.expected.as_ref() == Some(observed) {
            Observation::OwnMove
        } else if self.last_seen.as_ref() == Some(observed) {
            Observation::Unchanged
        } else {
            Observation::Changed
        }
    }

    /// Our own move was reflected back; it becomes the new baseline.
    fn confirm_own_move(&mut self, observed: PositionId) {
        self.last_seen = Some(observed);
        self.expected = None;
    }

    /// A move was requested and applied for `observed`; remember both it
    /// and the predicted outcome.
    fn note_applied(&mut self, observed: PositionId, expected: PositionId) {
        self.last_seen = Some(observed);
        self.expected = Some(expected);
    }
}

/// Drives the observe / request / apply cycle indefinitely.
pub struct Watcher<B: BoardStateProvider, M: MoveModel> {
    board: B,
    model: M,
    bridge: EngineBridge,
    /// Time budget handed to the engine per request.
    time_budget: Duration,
    state: WatchState,
    read_failures: u32,
}

impl<B: BoardStateProvider, M: MoveModel> Watcher<B, M> {
    pub fn new(board: B, model: M, bridge: EngineBridge, time_budget: Duration) -> Self {
        Self {
            board,
            model,
            bridge,
            time_budget,
            state: WatchState::default(),
            read_failures: 0,
        }
    }

    /// Run the poll loop until cancelled or a fatal error occurs.
    ///
    /// Cancellation is checked between ticks, before the next
    /// `read_position` call; an in-flight engine request always completes
    /// first, so the session is never abandoned mid-protocol. The tick
    /// sleep races the shutdown signal to keep cancellation prompt. A
    /// dropped sender means no signal can ever arrive; the loop keeps
    /// polling at its normal cadence.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError`] on any fatal condition; see the enum for the
    /// taxonomy. Transient read failures are retried up to the budget.
    pub async fn run(
        &mut self,
        poll_interval: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<(), WatchError> {
        info!("watcher started, polling every {:?}", poll_interval);

        loop {
            if *shutdown.borrow() {
                info!("shutdown requested, watcher stopping");
                return Ok(());
            }

            let snapshot = self.board.read_position().await;
            match snapshot {
                Ok(observed) => {
                    self.read_failures = 0;
                    self.observe(observed).await?;
                }
                Err(source) => {
                    self.read_failures += 1;
                    warn!(
                        "read_position failed ({}/{}): {}",
                        self.read_failures, MAX_READ_FAILURES, source
                    );
                    if self.read_failures >= MAX_READ_FAILURES {
                        return Err(WatchError::BoardUnreadable {
                            failures: self.read_failures,
                            source,
                        });
                    }
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(poll_interval) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        // Sender dropped: no signal can arrive anymore,
                        // and `changed()` now resolves instantly every
                        // call. The plain sleep keeps the tick cadence.
                        tokio::time::sleep(poll_interval).await;
                    }
                }
            }
        }
    }

    async fn observe(&mut self, observed: PositionId) -> Result<(), WatchError> {
        match self.state.classify(&observed) {
            Observation::Unchanged => {
                debug!("no change");
                Ok(())
            }
            Observation::OwnMove => {
                debug!("own move reflected back, not a new change");
                self.state.confirm_own_move(observed);
                Ok(())
            }
            Observation::Changed => self.handle_change(observed).await,
        }
    }

    async fn handle_change(&mut self, observed: PositionId) -> Result<(), WatchError> {
        info!("position changed: {}", observed);

        let mv = self
            .bridge
            .best_move(&observed, self.time_budget)
            .await
            .map_err(|source| WatchError::Engine {
                position: observed.clone(),
                source,
            })?;

        let side = side_hint(&observed);
        info!("engine chose {} for {}", mv, side);

        self.board
            .apply_move(&mv, side)
            .await
            .map_err(|source| WatchError::ApplyFailed {
                mv: mv.clone(),
                source,
            })?;

        let expected =
            self.model
                .position_after(&observed, &mv)
                .map_err(|source| WatchError::Model {
                    mv: mv.clone(),
                    source,
                })?;

        self.state.note_applied(observed, expected);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(s: &str) -> PositionId {
        PositionId::new(s)
    }

    #[test]
    fn first_observation_is_a_change() {
        let state = WatchState::default();
        assert_eq!(state.classify(&pos("a w")), Observation::Changed);
    }

    #[test]
    fn repeated_observation_is_unchanged() {
        let mut state = WatchState::default();
        state.confirm_own_move(pos("a w"));
        assert_eq!(state.classify(&pos("a w")), Observation::Unchanged);
        assert_eq!(state.classify(&pos("b b")), Observation::Changed);
    }

    #[test]
    fn predicted_position_reads_as_own_move() {
        let mut state = WatchState::default();
        state.note_applied(pos("a w"), pos("a-after w"));

        // The pre-move position is still the baseline until confirmation.
        assert_eq!(state.classify(&pos("a w")), Observation::Unchanged);
        assert_eq!(state.classify(&pos("a-after w")), Observation::OwnMove);

        state.confirm_own_move(pos("a-after w"));
        assert_eq!(state.classify(&pos("a-after w")), Observation::Unchanged);
        // The prediction is consumed; nothing matches OwnMove any more.
        assert_eq!(state.classify(&pos("a w")), Observation::Changed);
    }

    #[test]
    fn side_hint_reads_the_second_field() {
        assert_eq!(
            side_hint(&pos(
                "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"
            )),
            SideToMove::White
        );
        assert_eq!(
            side_hint(&pos(
                "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1"
            )),
            SideToMove::Black
        );
        assert_eq!(side_hint(&pos("garbage")), SideToMove::White);
    }
}
