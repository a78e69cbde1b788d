//! Rectangular letter grid with `.` as the block/empty sentinel.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Marks a cell that carries no letter. During generation this is an empty
/// cell; in a finished puzzle every remaining `.` is a block.
pub const BLOCK: char = '.';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    width: usize,
    height: usize,
    cells: Vec<char>,
}

#[derive(Debug, thiserror::Error)]
pub enum GridError {
    #[error("grid has no rows")]
    Empty,
    #[error("grid rows must all have the same width")]
    Ragged,
}

impl Grid {
    /// A grid of the given dimensions with every cell set to [`BLOCK`].
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![BLOCK; width * height],
        }
    }

    /// Build a grid from row-major rows. Whitespace cells are normalized to
    /// [`BLOCK`]; letters are uppercased.
    pub fn from_rows(rows: &[Vec<char>]) -> Result<Self, GridError> {
        let height = rows.len();
        if height == 0 {
            return Err(GridError::Empty);
        }
        let width = rows[0].len();
        if width == 0 || rows.iter().any(|r| r.len() != width) {
            return Err(GridError::Ragged);
        }

        let cells = rows
            .iter()
            .flatten()
            .map(|&c| {
                if c == ' ' || c == BLOCK {
                    BLOCK
                } else {
                    c.to_ascii_uppercase()
                }
            })
            .collect();

        Ok(Self {
            width,
            height,
            cells,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && (x as usize) < self.width && y >= 0 && (y as usize) < self.height
    }

    pub fn get(&self, x: usize, y: usize) -> Option<char> {
        if x < self.width && y < self.height {
            Some(self.cells[y * self.width + x])
        } else {
            None
        }
    }

    /// The cell at `(x, y)`, or [`BLOCK`] when out of bounds.
    pub fn at(&self, x: usize, y: usize) -> char {
        self.get(x, y).unwrap_or(BLOCK)
    }

    pub fn set(&mut self, x: usize, y: usize, c: char) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = c;
        }
    }

    pub fn is_letter(&self, x: usize, y: usize) -> bool {
        self.get(x, y).is_some_and(|c| c != BLOCK)
    }

    /// Fraction of non-block cells.
    pub fn density(&self) -> f64 {
        let filled = self.cells.iter().filter(|&&c| c != BLOCK).count();
        filled as f64 / (self.width * self.height) as f64
    }

    pub fn rows(&self) -> impl Iterator<Item = &[char]> {
        self.cells.chunks(self.width)
    }

    pub fn to_rows(&self) -> Vec<Vec<char>> {
        self.rows().map(|r| r.to_vec()).collect()
    }

    /// Content key used for state identity in the solvers.
    pub fn content_key(&self) -> String {
        self.cells.iter().collect()
    }
}

impl std::fmt::Display for Grid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for row in self.rows() {
            for (i, c) in row.iter().enumerate() {
                if i > 0 {
                    write!(f, " ")?;
                }
                write!(f, "{}", c)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl Serialize for Grid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_rows().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Grid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let rows = Vec::<Vec<char>>::deserialize(deserializer)?;
        Grid::from_rows(&rows).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rows_normalizes() {
        let grid = Grid::from_rows(&[vec!['c', ' ', '.'], vec!['a', 't', 's']]).unwrap();
        assert_eq!(grid.at(0, 0), 'C');
        assert_eq!(grid.at(1, 0), BLOCK);
        assert_eq!(grid.at(2, 0), BLOCK);
        assert_eq!(grid.at(2, 1), 'S');
    }

    #[test]
    fn test_from_rows_rejects_ragged() {
        assert!(matches!(
            Grid::from_rows(&[vec!['A', 'B'], vec!['C']]),
            Err(GridError::Ragged)
        ));
        assert!(matches!(Grid::from_rows(&[]), Err(GridError::Empty)));
    }

    #[test]
    fn test_density() {
        let mut grid = Grid::new(2, 2);
        assert_eq!(grid.density(), 0.0);
        grid.set(0, 0, 'A');
        grid.set(1, 1, 'B');
        assert_eq!(grid.density(), 0.5);
    }

    #[test]
    fn test_serde_round_trip() {
        let grid = Grid::from_rows(&[vec!['C', 'A', 'T'], vec!['.', '.', '.']]).unwrap();
        let json = serde_json::to_string(&grid).unwrap();
        assert_eq!(json, r#"[["C","A","T"],[".",".","."]]"#);
        let back: Grid = serde_json::from_str(&json).unwrap();
        assert_eq!(back, grid);
    }
}
