use std::fmt;

use rand::Rng;

use crate::{Board, Color};

/// A single board cell, addressed row first from the top-left corner.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.row, self.col)
    }
}

/// A connected group of same-coloured cells.
///
/// Only tiles of two or more cells are playable: a lone block can never be
/// removed.
#[derive(Clone, Debug, PartialEq)]
pub struct Tile {
    cells: Vec<Cell>,
}

impl Tile {
    pub(crate) fn new(cells: Vec<Cell>) -> Self {
        Tile { cells }
    }

    /// The cells of this tile, in row-major discovery order.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// True for the degenerate empty tile.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.cells.first() {
            Some(cell) => write!(f, "{}{{{}}}", cell, self.cells.len()),
            None => write!(f, "(){{}}"),
        }
    }
}

/// Union-find over cell indices, with path halving and union by size.
struct Dsu {
    parent: Vec<usize>,
    size: Vec<usize>,
}

impl Dsu {
    fn new(n: usize) -> Self {
        Dsu {
            parent: (0..n).collect(),
            size: vec![1; n],
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let (mut ra, mut rb) = (self.find(a), self.find(b));
        if ra == rb {
            return;
        }
        if self.size[ra] < self.size[rb] {
            std::mem::swap(&mut ra, &mut rb);
        }
        self.parent[rb] = ra;
        self.size[ra] += self.size[rb];
    }
}

/// Extracts every playable tile of the board by flooding labels from the
/// north and west neighbours and unifying conflicting labels.
pub(crate) fn extract_tiles(board: &Board) -> Vec<Tile> {
    let (h, w) = board.dims();
    if h * w == 0 {
        return Vec::new();
    }

    let index = |r: usize, c: usize| r * w + c;
    let mut dsu = Dsu::new(h * w);

    for r in 0..h {
        for c in 0..w {
            let color = board.cell(r, c);
            if color == Color::Empty {
                continue;
            }
            if r > 0 && board.cell(r - 1, c) == color {
                dsu.union(index(r - 1, c), index(r, c));
            }
            if c > 0 && board.cell(r, c - 1) == color {
                dsu.union(index(r, c - 1), index(r, c));
            }
        }
    }

    // Group cells by representative, preserving row-major discovery order.
    let mut slot = vec![usize::MAX; h * w];
    let mut groups: Vec<Vec<Cell>> = Vec::new();

    for r in 0..h {
        for c in 0..w {
            if board.cell(r, c) == Color::Empty {
                continue;
            }
            let root = dsu.find(index(r, c));
            if slot[root] == usize::MAX {
                slot[root] = groups.len();
                groups.push(Vec::new());
            }
            groups[slot[root]].push(Cell { row: r, col: c });
        }
    }

    groups
        .into_iter()
        .filter(|cells| cells.len() >= 2)
        .map(Tile::new)
        .collect()
}

/// Playable tiles grouped by colour.
///
/// Rollouts pick from it colour first: a random non-taboo colour, then a
/// random tile of that colour. The taboo colour is only played when it is
/// the last colour standing.
#[derive(Clone, Debug, Default)]
pub struct TileSet {
    buckets: [Vec<Tile>; 8],
}

impl TileSet {
    pub(crate) fn from_tiles(board: &Board, tiles: Vec<Tile>) -> Self {
        let mut buckets: [Vec<Tile>; 8] = Default::default();
        for tile in tiles {
            let color = board.tile_color(&tile);
            buckets[color.index()].push(tile);
        }
        TileSet { buckets }
    }

    /// Total number of tiles across every colour.
    pub fn len(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }

    /// True when no playable tile remains.
    pub fn is_empty(&self) -> bool {
        self.buckets.iter().all(Vec::is_empty)
    }

    /// Every tile, colour groups flattened.
    pub fn all(self) -> Vec<Tile> {
        self.buckets.into_iter().flatten().collect()
    }

    /// Iterates over every tile.
    pub fn iter(&self) -> impl Iterator<Item = &Tile> {
        self.buckets.iter().flatten()
    }

    /// A random tile that is not of the taboo colour, unless taboo tiles
    /// are all that is left. `Color::Empty` disables the taboo.
    pub fn random_tile<R: Rng>(&self, taboo: Color, rng: &mut R) -> Option<&Tile> {
        let candidates: Vec<usize> = (1..self.buckets.len())
            .filter(|&i| !self.buckets[i].is_empty() && Color::from_index(i) != taboo)
            .collect();

        let bucket = if candidates.is_empty() {
            if self.buckets[taboo.index()].is_empty() {
                return None;
            }
            taboo.index()
        } else {
            candidates[rng.gen_range(0..candidates.len())]
        };

        let tiles = &self.buckets[bucket];
        Some(&tiles[rng.gen_range(0..tiles.len())])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn board(input: &str) -> Board {
        Board::parse(input).unwrap()
    }

    #[test]
    fn test_extract_two_colour_board() {
        let b = board("3 3\nRRG\nRRG\nRRG\n");
        let tiles = b.tiles();

        assert_eq!(tiles.len(), 2);
        let mut sizes: Vec<usize> = tiles.iter().map(Tile::len).collect();
        sizes.sort_unstable();
        assert_eq!(sizes, vec![3, 6]);
    }

    #[test]
    fn test_singletons_are_not_playable() {
        let b = board("2 2\nRG\nGR\n");
        assert!(b.tiles().is_empty());
    }

    #[test]
    fn test_diagonal_does_not_connect() {
        let b = board("2 2\nRG\nGR\n");
        assert_eq!(b.tiles().len(), 0);

        let b = board("2 2\nRR\nGR\n");
        let tiles = b.tiles();
        assert_eq!(tiles.len(), 1);
        assert_eq!(tiles[0].len(), 3);
    }

    #[test]
    fn test_random_tile_avoids_taboo() {
        let b = board("3 3\nRRG\nRRG\nRRG\n");
        let set = b.color_tiles();
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        for _ in 0..32 {
            let tile = set.random_tile(Color::Red, &mut rng).unwrap();
            assert_eq!(b.tile_color(tile), Color::Green);
        }
    }

    #[test]
    fn test_random_tile_plays_taboo_when_forced() {
        let b = board("2 2\nRR\nRR\n");
        let set = b.color_tiles();
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        let tile = set.random_tile(Color::Red, &mut rng).unwrap();
        assert_eq!(tile.len(), 4);
    }
}
