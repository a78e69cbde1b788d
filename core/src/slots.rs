//! Word slots, the intersection graph between them, and the constraint
//! checks the solvers share.

use std::collections::{HashMap, HashSet};

use log::warn;

use crate::clue::ClueList;
use crate::direction::Direction;
use crate::grid::{BLOCK, Grid};

/// Slots are identified by `(clue number, direction)` throughout the engine.
pub type SlotKey = (u32, Direction);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordSlot {
    pub number: u32,
    pub direction: Direction,
    pub x: usize,
    pub y: usize,
    pub length: usize,
    /// Current word, empty when not yet known.
    pub word: String,
    /// Clue text, empty when not yet known.
    pub clue: String,
    pub answer: Option<String>,
}

impl WordSlot {
    pub fn key(&self) -> SlotKey {
        (self.number, self.direction)
    }

    /// Cell `i` steps into the slot.
    pub fn cell(&self, i: usize) -> (usize, usize) {
        self.direction.offset(self.x, self.y, i)
    }

    pub fn cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..self.length).map(|i| self.cell(i))
    }

    /// The slot's span read from the grid, `.` where still empty.
    pub fn pattern(&self, grid: &Grid) -> String {
        self.cells().map(|(x, y)| grid.at(x, y)).collect()
    }

    /// Whether every cell of the span carries a letter.
    pub fn is_filled(&self, grid: &Grid) -> bool {
        self.cells().all(|(x, y)| grid.is_letter(x, y))
    }
}

/// Scan a filled grid row-major, numbering every cell that begins an across
/// or down run, and collect the runs of length >= 2 as slots. The slot
/// `word` fields carry the grid content; clues are left for the caller.
pub fn extract_slots(grid: &Grid) -> (Vec<WordSlot>, Vec<WordSlot>) {
    let (width, height) = (grid.width(), grid.height());
    let mut numbered: Vec<(usize, usize, u32)> = Vec::new();
    let mut number = 1;

    for y in 0..height {
        for x in 0..width {
            if !grid.is_letter(x, y) {
                continue;
            }
            let begins_across = (x == 0 || !grid.is_letter(x - 1, y))
                && x + 1 < width
                && grid.is_letter(x + 1, y);
            let begins_down = (y == 0 || !grid.is_letter(x, y - 1))
                && y + 1 < height
                && grid.is_letter(x, y + 1);
            if begins_across || begins_down {
                numbered.push((x, y, number));
                number += 1;
            }
        }
    }

    let mut across = Vec::new();
    let mut down = Vec::new();

    for &(x, y, number) in &numbered {
        if x == 0 || !grid.is_letter(x - 1, y) {
            let mut length = 0;
            while x + length < width && grid.is_letter(x + length, y) {
                length += 1;
            }
            if length > 1 {
                across.push(WordSlot {
                    number,
                    direction: Direction::Across,
                    x,
                    y,
                    length,
                    word: (0..length).map(|i| grid.at(x + i, y)).collect(),
                    clue: String::new(),
                    answer: None,
                });
            }
        }
        if y == 0 || !grid.is_letter(x, y - 1) {
            let mut length = 0;
            while y + length < height && grid.is_letter(x, y + length) {
                length += 1;
            }
            if length > 1 {
                down.push(WordSlot {
                    number,
                    direction: Direction::Down,
                    x,
                    y,
                    length,
                    word: (0..length).map(|i| grid.at(x, y + i)).collect(),
                    clue: String::new(),
                    answer: None,
                });
            }
        }
    }

    (across, down)
}

/// Turn a clue list into solver slots, keeping only slots that still have at
/// least one unfilled cell in the grid.
pub fn slots_from_clues(grid: &Grid, clues: &ClueList) -> Vec<WordSlot> {
    let mut slots = Vec::new();

    let mut push = |clue: &crate::clue::Clue, direction: Direction| {
        let slot = WordSlot {
            number: clue.number,
            direction,
            x: clue.x,
            y: clue.y,
            length: clue.length,
            word: String::new(),
            clue: clue.clue.clone(),
            answer: clue.answer.clone(),
        };
        if let Some((x, y)) = slot.cells().last() {
            if !grid.in_bounds(x as i32, y as i32) {
                warn!(
                    "clue {} {} extends beyond the grid, skipping",
                    clue.number, direction
                );
                return;
            }
        }
        if slot.is_filled(grid) {
            return;
        }
        slots.push(slot);
    };

    for clue in &clues.across {
        push(clue, Direction::Across);
    }
    for clue in &clues.down {
        push(clue, Direction::Down);
    }

    slots
}

/// Undirected intersection graph over slots. Vertices are slot keys; an edge
/// connects any two slots covering a common cell.
#[derive(Debug, Default)]
pub struct SlotGraph {
    edges: HashMap<SlotKey, HashSet<SlotKey>>,
    index: HashMap<SlotKey, usize>,
}

impl SlotGraph {
    pub fn build(slots: &[WordSlot]) -> Self {
        let mut position_map: HashMap<(usize, usize), Vec<SlotKey>> = HashMap::new();
        let mut index = HashMap::new();

        for (i, slot) in slots.iter().enumerate() {
            index.insert(slot.key(), i);
            for cell in slot.cells() {
                position_map.entry(cell).or_default().push(slot.key());
            }
        }

        let mut edges: HashMap<SlotKey, HashSet<SlotKey>> = HashMap::new();
        for keys in position_map.values() {
            if keys.len() < 2 {
                continue;
            }
            for &a in keys {
                for &b in keys {
                    if a != b {
                        edges.entry(a).or_default().insert(b);
                        edges.entry(b).or_default().insert(a);
                    }
                }
            }
        }

        Self { edges, index }
    }

    /// Number of slots this slot intersects.
    pub fn degree(&self, key: SlotKey) -> usize {
        self.edges.get(&key).map_or(0, HashSet::len)
    }

    pub fn neighbors(&self, key: SlotKey) -> impl Iterator<Item = SlotKey> + '_ {
        self.edges.get(&key).into_iter().flatten().copied()
    }

    /// Index of a slot in the slice the graph was built from.
    pub fn slot_index(&self, key: SlotKey) -> Option<usize> {
        self.index.get(&key).copied()
    }
}

/// Shared cell of two perpendicular slots, with the position of that cell
/// within each: `(x, y, pos_in_a, pos_in_b)`.
pub fn intersection(a: &WordSlot, b: &WordSlot) -> Option<(usize, usize, usize, usize)> {
    match (a.direction, b.direction) {
        (Direction::Across, Direction::Down) => {
            let (x, y) = (b.x, a.y);
            if x >= a.x && x < a.x + a.length && y >= b.y && y < b.y + b.length {
                Some((x, y, x - a.x, y - b.y))
            } else {
                None
            }
        }
        (Direction::Down, Direction::Across) => {
            intersection(b, a).map(|(x, y, pos_b, pos_a)| (x, y, pos_a, pos_b))
        }
        _ => None,
    }
}

/// Placement legality checks shared by the solvers.
pub struct ConstraintChecker<'a> {
    slots: &'a [WordSlot],
    graph: &'a SlotGraph,
}

impl<'a> ConstraintChecker<'a> {
    pub fn new(slots: &'a [WordSlot], graph: &'a SlotGraph) -> Self {
        Self { slots, graph }
    }

    /// A word fits a slot when lengths match, every committed cell in the
    /// span agrees with the word, and the cells just before and after the
    /// span carry no letter.
    pub fn fits(&self, slot: &WordSlot, word: &str, grid: &Grid) -> bool {
        if word.len() != slot.length {
            return false;
        }

        for (i, ch) in word.chars().enumerate() {
            let (x, y) = slot.cell(i);
            if !grid.in_bounds(x as i32, y as i32) {
                return false;
            }
            let cell = grid.at(x, y);
            if cell != BLOCK && cell != ch {
                return false;
            }
        }

        let (dx, dy) = slot.direction.delta();
        let before = (slot.x as i32 - dx, slot.y as i32 - dy);
        let after = (
            slot.x as i32 + dx * slot.length as i32,
            slot.y as i32 + dy * slot.length as i32,
        );
        for (x, y) in [before, after] {
            if grid.in_bounds(x, y) && grid.is_letter(x as usize, y as usize) {
                return false;
            }
        }

        true
    }

    /// At every intersection with a neighboring slot, a committed letter in
    /// the grid must equal the candidate's letter at that position.
    pub fn perpendicular_ok(&self, slot: &WordSlot, word: &str, grid: &Grid) -> bool {
        let word_bytes = word.as_bytes();
        for key in self.graph.neighbors(slot.key()) {
            let Some(other_idx) = self.graph.slot_index(key) else {
                continue;
            };
            let Some((x, y, pos, _)) = intersection(slot, &self.slots[other_idx]) else {
                continue;
            };
            let committed = grid.at(x, y);
            if committed != BLOCK && pos < word_bytes.len() && word_bytes[pos] as char != committed
            {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clue::Clue;

    fn cross_grid() -> Grid {
        // .C.
        // CAR
        // .T.
        Grid::from_rows(&[
            vec!['.', 'C', '.'],
            vec!['C', 'A', 'R'],
            vec!['.', 'T', '.'],
        ])
        .unwrap()
    }

    #[test]
    fn test_extract_slots_numbering() {
        let (across, down) = extract_slots(&cross_grid());
        assert_eq!(across.len(), 1);
        assert_eq!(down.len(), 1);

        // Row-major scan: the down run at (1, 0) is numbered before the
        // across run at (0, 1).
        assert_eq!(down[0].number, 1);
        assert_eq!(down[0].word, "CAT");
        assert_eq!(across[0].number, 2);
        assert_eq!(across[0].word, "CAR");
    }

    #[test]
    fn test_extract_slots_min_length() {
        let grid = Grid::from_rows(&[vec!['A', '.'], vec!['.', 'B']]).unwrap();
        let (across, down) = extract_slots(&grid);
        assert!(across.is_empty());
        assert!(down.is_empty());

        let solved = cross_grid();
        let (across, down) = extract_slots(&solved);
        for slot in across.iter().chain(&down) {
            assert!(slot.length >= 2);
        }
    }

    fn cross_clues() -> ClueList {
        ClueList {
            across: vec![Clue {
                number: 2,
                x: 0,
                y: 1,
                length: 3,
                clue: "Road vehicle".into(),
                answer: None,
            }],
            down: vec![Clue {
                number: 1,
                x: 1,
                y: 0,
                length: 3,
                clue: "Feline pet".into(),
                answer: None,
            }],
        }
    }

    #[test]
    fn test_slots_from_clues_skips_solved() {
        let empty = Grid::new(3, 3);
        assert_eq!(slots_from_clues(&empty, &cross_clues()).len(), 2);

        // Once the across span is fully committed only the down slot remains.
        let mut grid = Grid::new(3, 3);
        for (i, c) in "CAR".chars().enumerate() {
            grid.set(i, 1, c);
        }
        let slots = slots_from_clues(&grid, &cross_clues());
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].direction, Direction::Down);

        // Fully solved grid: nothing left to fill.
        assert!(slots_from_clues(&cross_grid(), &cross_clues()).is_empty());
    }

    #[test]
    fn test_slot_graph_edges() {
        let slots = slots_from_clues(&Grid::new(3, 3), &cross_clues());
        let graph = SlotGraph::build(&slots);

        let across_key = (2, Direction::Across);
        let down_key = (1, Direction::Down);
        assert_eq!(graph.degree(across_key), 1);
        assert_eq!(graph.degree(down_key), 1);
        assert_eq!(graph.neighbors(across_key).next(), Some(down_key));

        // The edge corresponds to exactly one shared cell.
        let (x, y, pos_a, pos_b) = intersection(&slots[0], &slots[1]).unwrap();
        assert_eq!((x, y), (1, 1));
        assert_eq!(pos_a, 1);
        assert_eq!(pos_b, 1);
    }

    #[test]
    fn test_fits_and_perpendicular() {
        let slots = slots_from_clues(&Grid::new(3, 3), &cross_clues());
        let graph = SlotGraph::build(&slots);
        let checker = ConstraintChecker::new(&slots, &graph);
        let across = slots.iter().find(|s| s.direction == Direction::Across).unwrap();
        let down = slots.iter().find(|s| s.direction == Direction::Down).unwrap();

        let grid = Grid::new(3, 3);
        assert!(checker.fits(across, "CAR", &grid));
        assert!(!checker.fits(across, "CARS", &grid));

        // Commit the down word; the across candidate must now agree at the
        // shared cell.
        let mut grid = Grid::new(3, 3);
        for (i, c) in "CAT".chars().enumerate() {
            grid.set(1, i, c);
        }
        assert!(checker.fits(across, "CAR", &grid));
        assert!(checker.perpendicular_ok(across, "CAR", &grid));
        assert!(!checker.perpendicular_ok(across, "COG", &grid));
        assert!(!checker.fits(across, "COG", &grid));
    }
}
