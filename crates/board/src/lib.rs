//! Tilefall board - puzzle mechanics shared by SameGame and Clickomania
//!
//! Both puzzles play on the same physics: a rectangular grid of coloured
//! blocks, moves that remove a connected same-coloured tile, gravity that
//! drops the survivors and collapses empty columns. This crate owns that
//! machinery so the game crates only differ in scoring and policies.
//!
//! # Types
//!
//! - [`Color`] - block colours, parsed from `R G Y B V I O -`
//! - [`Board`] - the grid, with removal physics and file parsing
//! - [`Tile`] - a connected group of same-coloured cells
//! - [`TileSet`] - tiles grouped by colour, with taboo-aware random picks
//! - [`Histogram`] - per-colour block counts

mod color;
mod grid;
mod histogram;
mod tile;

pub use color::Color;
pub use grid::{Board, BoardError};
pub use histogram::Histogram;
pub use tile::{Cell, Tile, TileSet};
