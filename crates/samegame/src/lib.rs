//! SameGame adapter for the tilefall search engine.
//!
//! SameGame rewards big removals: an `n`-block tile scores `(n-2)²`, and
//! clearing the whole board earns a 1000 point bonus. Leftover blocks are
//! punished quadratically per colour, so rollout policies hoard the most
//! frequent colour for one final sweep.

use std::fmt;

use rand::Rng;

use tilefall_board::{Board, Color, Histogram, Tile};
use tilefall_core::{Cancel, Decision, GameState, Hand, MoveSequence, PolicyMode};

/// Bonus for clearing the board completely.
const CLEAR_BONUS: f64 = 1000.0;

/// A SameGame move: the tile to remove.
#[derive(Clone, Debug, PartialEq)]
pub struct Move(pub Tile);

impl Move {
    /// The tile this move removes.
    pub fn tile(&self) -> &Tile {
        &self.0
    }
}

impl tilefall_core::Move for Move {
    /// An `n`-block removal scores `(n-2)²`.
    fn score(&self) -> f64 {
        let n = self.0.len();
        if n < 2 {
            return 0.0;
        }
        let n = n as f64;
        (n - 2.0) * (n - 2.0)
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
pub type ColorPolicy = fn(&SameBoard) -> (Color, PolicyMode);

/// Disables taboo selection.
pub fn no_taboo(_board: &SameBoard) -> (Color, PolicyMode) {
    (Color::Empty, PolicyMode::PerSampling)
}

/// Keeps the most frequent colour off-limits until nothing else is left,
/// hoarding it for one massive final removal.
pub fn taboo_color(board: &SameBoard) -> (Color, PolicyMode) {
    (board.histogram().most_common(), PolicyMode::PerSampling)
}

/// A SameGame position: a board with an incrementally maintained block
/// histogram, so scoring stays cheap inside rollout inner loops.
#[derive(Clone, Debug, PartialEq)]
pub struct SameBoard {
    board: Board,
    histogram: Histogram,
}

impl SameBoard {
    /// Wraps a board, computing its histogram once.
    pub fn from_board(board: Board) -> Self {
        let histogram = board.histogram();
        SameBoard { board, histogram }
    }

    /// An empty board of the given dimensions.
    pub fn new(h: usize, w: usize) -> Self {
        SameBoard::from_board(Board::new(h, w))
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

    /// Block counts by colour, maintained in constant time per removal.
    pub fn histogram(&self) -> &Histogram {
        &self.histogram
    }

    /// Removes a tile, updating the histogram incrementally.
    pub fn remove(&self, tile: &Tile) -> SameBoard {
        let color = self.board.tile_color(tile);
        let mut histogram = self.histogram.clone();
        histogram.remove(color, tile.len() as f64);

        SameBoard {
            board: self.board.remove(tile),
            histogram,
        }
    }
}

impl GameState for SameBoard {
    type Move = Move;
    type Policy = ColorPolicy;

    fn legal_moves(&self) -> Hand<Move> {
        self.board.tiles().into_iter().map(Move).collect()
    }

    fn play(&self, mv: &Move) -> Self {
        self.remove(&mv.0)
    }

    /// `bonus - Σ nᵢ²` over the colour histogram, `bonus = 1000` only when
    /// the board has been cleared.
    fn score(&self) -> f64 {
        let mut penalty = 0.0;
        for (_, n) in self.histogram.iter() {
            penalty += n * n;
        }
        let bonus = if penalty == 0.0 { CLEAR_BONUS } else { 0.0 };
        bonus - penalty
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

impl fmt::Display for SameBoard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\n{}", self.board, self.histogram)
    }
}
