//! Concurrent Monte-Carlo tree search for single-player puzzles.
//!
//! This crate answers one question under a hard wall-clock budget: given
//! an initial position, which move sequence maximises the terminal score?
//! The moment the budget expires it returns the best legal answer found.
//!
//! Three strategies share one tree:
//!
//! - [`confident_search`] - classical synchronous UCT
//! - [`concurrent_search`] - a pipeline of walker, sampler and updater
//!   pools decoupled by bounded channels, so simulations run while the
//!   tree keeps growing
//! - [`meta_search`] - time-sliced concurrent searches over fresh root
//!   clones, keeping the best result
//!
//! The engine is generic over [`tilefall_core::GameState`], so any puzzle
//! exposing clone, legal moves, play, scoring and random rollouts can be
//! searched.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use tilefall_board::Board;
//! use tilefall_mcts as mcts;
//! use tilefall_samegame::{taboo_color, ColorPolicy, SameBoard};
//!
//! let board = Board::parse("3 3\nRRG\nRRG\nRRG\n").unwrap();
//! let state = SameBoard::from_board(board);
//!
//! let root = mcts::new_root(state, 0.03, 40.0, 0.0);
//! let policies: Vec<ColorPolicy> = vec![taboo_color];
//! let best = mcts::concurrent_search(&root, &policies, Duration::from_secs(1));
//!
//! println!("score {} in {} moves", best.score(), best.moves().len());
//! ```

pub mod config;
mod node;
mod pipeline;
mod search;
mod spin;
mod ucb;

pub use config::{
    CMCT_EXPLORATION, DEFAULT_BEST_WEIGHT, DEFAULT_EPSILON, SLOT, UCT_EXPLORATION,
    VISIT_THRESHOLD, WorkerPools,
};
pub use node::{clone_root, grow_tree, new_root, node_count, node_count_reset, Node, Status};
pub use pipeline::concurrent_search;
pub use search::{confident_search, meta_search, plan_cycles};
pub use spin::{SpinGuard, SpinLock};
pub use ucb::{select_ucb, selected_ucb, UcbFormula};
