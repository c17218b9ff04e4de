//! Tilefall core - game abstractions and shared search types
//!
//! This crate defines the contract between the Monte-Carlo search engine and
//! a puzzle implementation, together with the small value types that travel
//! through the search pipeline.
//!
//! # Types
//!
//! - [`GameState`] - trait a puzzle must implement to be searchable
//! - [`Move`] - trait for a single scorable move
//! - [`Hand`] - multiset of legal moves awaiting expansion
//! - [`MoveSequence`] - ordered, append-only list of moves
//! - [`Decision`] - a recorded trajectory and its aggregate score
//! - [`Cancel`] - broadcast cancellation observed by every search worker

mod cancel;
mod decision;
mod game;
mod hand;
mod sequence;

pub use cancel::{cancel_pair, Cancel, CancelSource};
pub use decision::Decision;
pub use game::{GameState, Move, PolicyMode};
pub use hand::Hand;
pub use sequence::MoveSequence;
