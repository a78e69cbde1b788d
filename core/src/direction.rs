use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Across,
    Down,
}

impl Direction {
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Across => (1, 0),
            Direction::Down => (0, 1),
        }
    }

    /// Cell `i` steps along this direction from `(x, y)`.
    pub fn offset(self, x: usize, y: usize, i: usize) -> (usize, usize) {
        match self {
            Direction::Across => (x + i, y),
            Direction::Down => (x, y + i),
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Across => write!(f, "across"),
            Direction::Down => write!(f, "down"),
        }
    }
}
