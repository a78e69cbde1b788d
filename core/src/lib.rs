pub mod clue;
pub mod direction;
pub mod generator;
pub mod grid;
pub mod lexicon;
pub mod slots;
pub mod solver;

pub use clue::{Clue, ClueList};
pub use direction::Direction;
pub use generator::{CrosswordGenerator, Puzzle, RankedWord};
pub use grid::{BLOCK, Grid, GridError};
pub use lexicon::{Lexicon, LexiconEntry, LexiconError, word_score};
pub use slots::{ConstraintChecker, SlotGraph, SlotKey, WordSlot, extract_slots, slots_from_clues};
pub use solver::{Algorithm, SolveOutcome, SolveStatus, solve};
