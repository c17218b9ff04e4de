use std::fmt;

use crate::{Move, MoveSequence};

/// A recorded trajectory and its aggregate score.
///
/// Decisions are formed during selection and expansion, completed by a
/// simulation, and back-propagated through the tree. The `solved` field is
/// reserved for a termination proof that is not implemented; it is carried
/// through `clone` and `join` but stays 0.
#[derive(Clone, Debug)]
pub struct Decision<M> {
    moves: MoveSequence<M>,
    score: f64,
    solved: f64,
}

impl<M: Move> Decision<M> {
    /// An empty decision with no moves and score 0.
    pub fn new() -> Self {
        Decision {
            moves: MoveSequence::new(),
            score: 0.0,
            solved: 0.0,
        }
    }

    /// A decision with no moves carrying a static score.
    pub fn with_score(score: f64) -> Self {
        Decision {
            moves: MoveSequence::new(),
            score,
            solved: 0.0,
        }
    }

    /// A partial decision from a walked prefix.
    pub fn from_moves(moves: MoveSequence<M>, score: f64) -> Self {
        Decision {
            moves,
            score,
            solved: 0.0,
        }
    }

    /// Splices `other` onto this decision: moves are appended and scores
    /// added.
    pub fn join(mut self, other: Decision<M>) -> Decision<M> {
        self.moves.join(other.moves);
        self.score += other.score;
        self.solved += other.solved;
        self
    }

    /// The recorded moves, in play order.
    pub fn moves(&self) -> &MoveSequence<M> {
        &self.moves
    }

    /// The aggregate score.
    pub fn score(&self) -> f64 {
        self.score
    }

    /// Reserved, always 0.
    pub fn solved(&self) -> f64 {
        self.solved
    }
}

impl<M: Move> Default for Decision<M> {
    fn default() -> Self {
        Decision::new()
    }
}

impl<M: Move> fmt::Display for Decision<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "score: {}, moves: {}", self.score, self.moves.len())?;
        for (i, mv) in self.moves.iter().enumerate() {
            write!(f, "{:2}: {}\t", i, mv)?;
            if (i + 1) % 6 == 0 {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}
