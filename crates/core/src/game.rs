use std::fmt;

use crate::{Cancel, Decision, Hand};

/// A single move of a puzzle.
///
/// Moves are opaque to the engine: it only needs their score contribution
/// and their size, and a rendering for replay output.
pub trait Move: Clone + Send + Sync + fmt::Display + 'static {
    /// Score contributed by playing this move.
    fn score(&self) -> f64;

    /// Number of blocks the move removes.
    fn len(&self) -> usize;
}

/// How often a rollout policy wants to be consulted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PolicyMode {
    /// Consult the policy once, at the start of a playout.
    PerSampling,

    /// Consult the policy again before every move of a playout.
    PerMove,
}

/// A puzzle position the engine can search.
///
/// Implementations must be value types: `play` returns the successor
/// position and leaves the receiver observably untouched, and `clone`
/// yields a memory-independent copy.
pub trait GameState: Clone + Send + Sync + fmt::Display + 'static {
    /// The move type of this puzzle.
    type Move: Move;

    /// The rollout policy consulted during simulations.
    ///
    /// The policy is defined by the puzzle itself; the engine only carries
    /// it from the caller to [`GameState::sample`].
    type Policy: Clone + Send + Sync + 'static;

    /// All legal moves from this position. May be empty.
    fn legal_moves(&self) -> Hand<Self::Move>;

    /// The position reached by playing `mv`.
    fn play(&self, mv: &Self::Move) -> Self;

    /// Static score of this position.
    fn score(&self) -> f64;

    /// Plays random moves to a terminal position, accumulating move scores
    /// and finally the static score.
    ///
    /// When `cancel` becomes observable mid-playout the partial
    /// accumulation is returned immediately.
    fn sample(&self, cancel: &Cancel, policy: &Self::Policy) -> Decision<Self::Move>;
}
