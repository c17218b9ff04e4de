//! Clickomania adapter for the tilefall search engine.
//!
//! Clickomania only cares about clearing: moves are worth nothing and the
//! static score is the fraction of the board that is gone. A fully cleared
//! board scores 1, an untouched one 0.

use std::fmt;

use rand::Rng;

use tilefall_board::{Board, Color, Histogram, Tile};
use tilefall_core::{Cancel, Decision, GameState, Hand, MoveSequence, PolicyMode};

/// A Clickomania move: the tile to remove. Moves carry no score of their
/// own.
#[derive(Clone, Debug, PartialEq)]
pub struct Move(pub Tile);

impl Move {
    /// The tile this move removes.
    pub fn tile(&self) -> &Tile {
        &self.0
    }
}

impl tilefall_core::Move for Move {
    fn score(&self) -> f64 {
        0.0
    }

    fn len(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A rollout policy: recommends a taboo colour and how often to re-ask.
pub type ColorPolicy = fn(&ClickBoard) -> (Color, PolicyMode);

/// Disables taboo selection.
pub fn no_taboo(_board: &ClickBoard) -> (Color, PolicyMode) {
    (Color::Empty, PolicyMode::PerSampling)
}

/// Keeps the most frequent colour for the endgame.
pub fn taboo_color(board: &ClickBoard) -> (Color, PolicyMode) {
    (board.histogram().most_common(), PolicyMode::PerSampling)
}

/// A Clickomania position: a board with an incrementally maintained block
/// histogram.
#[derive(Clone, Debug, PartialEq)]
pub struct ClickBoard {
    board: Board,
    histogram: Histogram,
}

impl ClickBoard {
    /// Wraps a board, computing its histogram once.
    pub fn from_board(board: Board) -> Self {
        let histogram = board.histogram();
        ClickBoard { board, histogram }
    }

    /// An empty board of the given dimensions.
    pub fn new(h: usize, w: usize) -> Self {
        ClickBoard::from_board(Board::new(h, w))
    }

    /// Fills the board from a colour palette and recounts the histogram.
    pub fn randomize<R: Rng>(&mut self, palette: &[Color], rng: &mut R) {
        self.board.randomize(palette, rng);
        self.histogram = self.board.histogram();
    }

    /// The underlying board.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Block counts by colour.
    pub fn histogram(&self) -> &Histogram {
        &self.histogram
    }

    /// Removes a tile, updating the histogram incrementally.
    pub fn remove(&self, tile: &Tile) -> ClickBoard {
        let color = self.board.tile_color(tile);
        let mut histogram = self.histogram.clone();
        histogram.remove(color, tile.len() as f64);

        ClickBoard {
            board: self.board.remove(tile),
            histogram,
        }
    }
}

impl GameState for ClickBoard {
    type Move = Move;
    type Policy = ColorPolicy;

    fn legal_moves(&self) -> Hand<Move> {
        self.board.tiles().into_iter().map(Move).collect()
    }

    fn play(&self, mv: &Move) -> Self {
        self.remove(&mv.0)
    }

    /// `1 - Σ nᵢ / capacity`: the cleared fraction of the board.
    fn score(&self) -> f64 {
        let cap = self.board.capacity() as f64;
        1.0 - self.histogram.total() / cap
    }

    fn sample(&self, cancel: &Cancel, policy: &ColorPolicy) -> Decision<Move> {
        let mut rng = rand::thread_rng();
        let mut board = self.clone();
        let mut tiles = board.board.color_tiles();

        let mut taboo = Color::Empty;
        if let (c, PolicyMode::PerSampling) = policy(&board) {
            taboo = c;
        }

        let mut moves = MoveSequence::new();
        let mut score = 0.0;

        while !tiles.is_empty() {
            if cancel.is_cancelled() {
                return Decision::from_moves(moves, score);
            }

            if let (c, PolicyMode::PerMove) = policy(&board) {
                taboo = c;
            }

            let tile = tiles
                .random_tile(taboo, &mut rng)
                .expect("non-empty tile set yields a tile")
                .clone();

            board = board.remove(&tile);
            tiles = board.board.color_tiles();

            let mv = Move(tile);
            score += tilefall_core::Move::score(&mv);
            moves.enqueue(mv);
        }

        score += board.score();
        Decision::from_moves(moves, score)
    }
}

impl fmt::Display for ClickBoard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\n{}", self.board, self.histogram)
    }
}
