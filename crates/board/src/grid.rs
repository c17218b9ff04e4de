use std::fmt;

use rand::Rng;
use thiserror::Error;

use crate::tile::extract_tiles;
use crate::{Color, Histogram, Tile, TileSet};

/// Errors raised while parsing a board file.
#[derive(Debug, Error)]
pub enum BoardError {
    #[error("missing header line")]
    MissingHeader,

    #[error("invalid dimensions {0:?}: expected two positive integers")]
    BadDimensions(String),

    #[error("expected {want} rows, got {got}")]
    MissingRows { want: usize, got: usize },

    #[error("line {line}: expected {want} cells, got {got}")]
    BadRow { line: usize, want: usize, got: usize },

    #[error("line {line}: unknown colour {ch:?}")]
    UnknownColor { line: usize, ch: char },
}

/// A rectangular grid of coloured blocks.
///
/// Boards shrink as tiles are removed: gravity drops blocks to the bottom
/// of their column, empty columns collapse leftwards and empty top rows are
/// trimmed. The capacity of the original allocation is kept around because
/// Clickomania scores against it.
#[derive(Clone, Debug, PartialEq)]
pub struct Board {
    rows: Vec<Vec<Color>>,
    cap: usize,
}

impl Board {
    /// An empty board of the given dimensions.
    pub fn new(h: usize, w: usize) -> Self {
        Board {
            rows: vec![vec![Color::Empty; w]; h],
            cap: h * w,
        }
    }

    /// Parses the plain-text board format: a `H W` header line followed by
    /// `H` rows of exactly `W` letters from `R G Y B V I O -`.
    pub fn parse(input: &str) -> Result<Board, BoardError> {
        let mut lines = input.lines();

        let header = lines.next().ok_or(BoardError::MissingHeader)?;
        let mut fields = header.split_whitespace();
        let (h, w) = match (
            fields.next().and_then(|s| s.parse::<usize>().ok()),
            fields.next().and_then(|s| s.parse::<usize>().ok()),
        ) {
            (Some(h), Some(w)) if h > 0 && w > 0 => (h, w),
            _ => return Err(BoardError::BadDimensions(header.to_string())),
        };

        let mut rows = Vec::with_capacity(h);
        for (i, line) in lines.take(h).enumerate() {
            let mut row = Vec::with_capacity(w);
            for ch in line.chars() {
                let color = Color::from_letter(ch)
                    .ok_or(BoardError::UnknownColor { line: i + 2, ch })?;
                row.push(color);
            }
            if row.len() != w {
                return Err(BoardError::BadRow {
                    line: i + 2,
                    want: w,
                    got: row.len(),
                });
            }
            rows.push(row);
        }
        if rows.len() != h {
            return Err(BoardError::MissingRows {
                want: h,
                got: rows.len(),
            });
        }

        Ok(Board { rows, cap: h * w })
    }

    /// Fills every cell with a colour drawn from `palette`.
    pub fn randomize<R: Rng>(&mut self, palette: &[Color], rng: &mut R) {
        for row in &mut self.rows {
            for cell in row {
                *cell = palette[rng.gen_range(0..palette.len())];
            }
        }
    }

    /// Current height and width.
    pub fn dims(&self) -> (usize, usize) {
        let h = self.rows.len();
        let w = self.rows.first().map_or(0, Vec::len);
        (h, w)
    }

    /// Number of cells the board was allocated with.
    pub fn capacity(&self) -> usize {
        self.cap
    }

    /// Number of cells currently held.
    pub fn len(&self) -> usize {
        let (h, w) = self.dims();
        h * w
    }

    /// True once every block has been removed.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The colour at `(row, col)`.
    ///
    /// # Panics
    /// Panics when the coordinates are off the current board.
    pub fn cell(&self, row: usize, col: usize) -> Color {
        self.rows[row][col]
    }

    /// Counts the remaining blocks by colour.
    pub fn histogram(&self) -> Histogram {
        let mut h = Histogram::new();
        for row in &self.rows {
            for &cell in row {
                h.add(cell, 1.0);
            }
        }
        h
    }

    /// Every playable tile, in row-major discovery order.
    pub fn tiles(&self) -> Vec<Tile> {
        extract_tiles(self)
    }

    /// Playable tiles grouped by colour.
    pub fn color_tiles(&self) -> TileSet {
        TileSet::from_tiles(self, extract_tiles(self))
    }

    /// The colour of a tile, read from its first cell.
    pub fn tile_color(&self, tile: &Tile) -> Color {
        match tile.cells().first() {
            Some(cell) => self.cell(cell.row, cell.col),
            None => Color::Empty,
        }
    }

    /// Removes a tile: its cells are emptied, survivors fall to the bottom
    /// of their column, empty columns collapse leftwards and empty top rows
    /// are trimmed. The returned board shares nothing with the receiver.
    pub fn remove(&self, tile: &Tile) -> Board {
        let (h, w) = self.dims();
        let mut cells = self.rows.clone();
        for cell in tile.cells() {
            cells[cell.row][cell.col] = Color::Empty;
        }

        // Surviving blocks, column by column, top to bottom.
        let mut columns: Vec<Vec<Color>> = Vec::with_capacity(w);
        for c in 0..w {
            let column: Vec<Color> = (0..h)
                .map(|r| cells[r][c])
                .filter(|&x| x != Color::Empty)
                .collect();
            if !column.is_empty() {
                columns.push(column);
            }
        }

        let height = columns.iter().map(Vec::len).max().unwrap_or(0);
        let width = columns.len();
        let mut rows = vec![vec![Color::Empty; width]; height];
        for (c, column) in columns.iter().enumerate() {
            let pad = height - column.len();
            for (r, &color) in column.iter().enumerate() {
                rows[pad + r][c] = color;
            }
        }

        Board {
            rows,
            cap: self.cap,
        }
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "empty");
        }
        for (i, row) in self.rows.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{:3}: ", i)?;
            for &cell in row {
                write!(f, "{}", cell)?;
            }
        }
        Ok(())
    }
}
