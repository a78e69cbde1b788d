//! Incremental crossword grid generation.
//!
//! The generator grows a grid outward from a centered seed word, repeatedly
//! choosing the best-scoring legal placement for each candidate word. Grids
//! are functional: every placement produces a fresh copy, so speculative
//! branches never invalidate their parent.

use std::collections::HashSet;

use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

use crate::clue::{Clue, ClueList};
use crate::grid::{BLOCK, Grid};
use crate::lexicon::{Lexicon, LexiconEntry};
use crate::slots::{WordSlot, extract_slots};

/// A candidate word with its precomputed lexicon score.
#[derive(Debug, Clone)]
pub struct RankedWord {
    pub word: String,
    pub score: i32,
}

impl From<&LexiconEntry> for RankedWord {
    fn from(entry: &LexiconEntry) -> Self {
        Self {
            word: entry.word.clone(),
            score: entry.score,
        }
    }
}

/// A generated puzzle: the solved grid and the words placed into it.
#[derive(Debug, Clone)]
pub struct Puzzle {
    pub grid: Grid,
    pub words: HashSet<String>,
}

impl Puzzle {
    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    pub fn density(&self) -> f64 {
        self.grid.density()
    }

    /// Numbered clue lists for the puzzle, answers included. Clue texts come
    /// from the lexicon, with synthetic stubs for unknown words.
    pub fn clues(&self, lexicon: &Lexicon) -> ClueList {
        let (across, down) = extract_slots(&self.grid);
        let to_clue = |slot: &WordSlot| {
            let entry = lexicon.clue_for_word(&slot.word);
            Clue {
                number: slot.number,
                x: slot.x,
                y: slot.y,
                length: slot.length,
                clue: entry.clue,
                answer: Some(slot.word.clone()),
            }
        };
        ClueList {
            across: across.iter().map(to_clue).collect(),
            down: down.iter().map(to_clue).collect(),
        }
    }
}

pub struct CrosswordGenerator<'a, R: Rng> {
    lexicon: &'a Lexicon,
    width: usize,
    height: usize,
    rng: R,
    used_seed_letters: HashSet<char>,
}

impl<'a> CrosswordGenerator<'a, StdRng> {
    pub fn new(lexicon: &'a Lexicon, width: usize, height: usize) -> Self {
        Self::with_rng(lexicon, width, height, StdRng::from_entropy())
    }
}

impl<'a, R: Rng> CrosswordGenerator<'a, R> {
    /// Generator with an injected RNG, so callers and tests can pin seeds.
    pub fn with_rng(lexicon: &'a Lexicon, width: usize, height: usize, rng: R) -> Self {
        Self {
            lexicon,
            width,
            height,
            rng,
            used_seed_letters: HashSet::new(),
        }
    }

    /// Run up to `max_attempts` expansion rounds, each from a fresh seed
    /// word, and keep the puzzle with the most words. Returns `None` when no
    /// attempt places more than the seed.
    pub fn generate(
        &mut self,
        initial_word: Option<&str>,
        word_list: Option<Vec<RankedWord>>,
        max_attempts: usize,
    ) -> Option<Puzzle> {
        let mut word_list = match word_list {
            Some(list) if list.is_empty() => return None,
            Some(list) => list,
            None => self.optimized_word_list(self.width),
        };

        let mut best: Option<Puzzle> = None;
        let mut seed = initial_word.map(str::to_ascii_uppercase);

        for _ in 0..max_attempts {
            if word_list.is_empty() {
                word_list = self.optimized_word_list(self.width);
            }
            let seed_word = match seed.take() {
                Some(word) => word,
                None => match self.select_seed(&word_list) {
                    Some(word) => word,
                    None => break,
                },
            };

            for vertical in [false, true] {
                let Some(start) = self.place_seed(&seed_word, vertical) else {
                    continue;
                };
                let finalized = self.expand_until_stable(start, &mut word_list, 100);
                if finalized.word_count() > 1
                    && best
                        .as_ref()
                        .is_none_or(|b| finalized.word_count() > b.word_count())
                {
                    best = Some(finalized);
                }
            }

            if word_list.is_empty() {
                break;
            }
            if let Some(first) = seed_word.chars().next() {
                self.used_seed_letters.insert(first.to_ascii_lowercase());
            }
            let top = word_list.len().min(10);
            seed = Some(word_list[self.rng.gen_range(0..top)].word.clone());
        }

        self.used_seed_letters.clear();
        best
    }

    /// Words of suitable lengths with diverse first letters, sorted by
    /// descending score with a random tiebreak.
    pub fn optimized_word_list(&mut self, max_length: usize) -> Vec<RankedWord> {
        let lo = 3.max(max_length.saturating_sub(2));
        let hi = 12.min(max_length + 2);

        let mut words: Vec<RankedWord> = Vec::new();
        for length in lo..=hi {
            words.extend(
                self.lexicon
                    .by_length(length, Some(20))
                    .into_iter()
                    .map(RankedWord::from),
            );
        }

        let mut keyed: Vec<(u32, RankedWord)> =
            words.into_iter().map(|w| (self.rng.next_u32(), w)).collect();
        keyed.sort_by(|a, b| b.1.score.cmp(&a.1.score).then(a.0.cmp(&b.0)));
        keyed.into_iter().map(|(_, w)| w).collect()
    }

    /// Prefer a seed whose first letter has not started a previous attempt.
    fn select_seed(&mut self, word_list: &[RankedWord]) -> Option<String> {
        if word_list.is_empty() {
            return None;
        }

        let unused: Vec<&RankedWord> = word_list
            .iter()
            .filter(|w| {
                w.word
                    .chars()
                    .next()
                    .is_some_and(|c| !self.used_seed_letters.contains(&c.to_ascii_lowercase()))
            })
            .collect();

        if unused.is_empty() {
            let top = word_list.len().min(10);
            Some(word_list[self.rng.gen_range(0..top)].word.clone())
        } else {
            let top = unused.len().min(5);
            Some(unused[self.rng.gen_range(0..top)].word.clone())
        }
    }

    /// Place the seed word centered in an empty grid.
    fn place_seed(&self, word: &str, vertical: bool) -> Option<Puzzle> {
        let len = word.len();
        let mut grid = Grid::new(self.width, self.height);

        if vertical {
            if len > self.height {
                return None;
            }
            let x = self.width / 2;
            let y = (self.height - len) / 2;
            for (i, c) in word.chars().enumerate() {
                grid.set(x, y + i, c);
            }
        } else {
            if len > self.width {
                return None;
            }
            let x = (self.width - len) / 2;
            let y = self.height / 2;
            for (i, c) in word.chars().enumerate() {
                grid.set(x + i, y, c);
            }
        }

        Some(Puzzle {
            grid,
            words: HashSet::from([word.to_string()]),
        })
    }

    /// Expand repeatedly until the word count stops growing.
    fn expand_until_stable(
        &mut self,
        start: Puzzle,
        word_list: &mut Vec<RankedWord>,
        max_attempts: usize,
    ) -> Puzzle {
        let mut previous = start.word_count();
        let mut current = self.expand(start, word_list, max_attempts);

        let mut iterations = 0;
        while current.word_count() > previous {
            iterations += 1;
            if iterations > 50 {
                debug!("breaking expansion loop after {iterations} iterations");
                break;
            }
            previous = current.word_count();
            current = self.expand(current, word_list, max_attempts);
        }

        current
    }

    /// One expansion pass: take words off the queue, commit the best legal
    /// placement for each. Words that fit nowhere rotate into a retry queue
    /// that is swapped in once when the main list empties.
    fn expand(
        &mut self,
        start: Puzzle,
        word_list: &mut Vec<RankedWord>,
        max_attempts: usize,
    ) -> Puzzle {
        let mut current = start;
        let mut tried: Vec<RankedWord> = Vec::new();
        let mut retry_queue: Vec<RankedWord> = Vec::new();
        let mut swapped = false;

        for _ in 0..max_attempts {
            let next = if !swapped {
                if !word_list.is_empty() {
                    Some(word_list.remove(0))
                } else if !tried.is_empty() {
                    retry_queue = std::mem::take(&mut tried);
                    swapped = true;
                    Some(retry_queue.remove(0))
                } else {
                    None
                }
            } else if !retry_queue.is_empty() {
                Some(retry_queue.remove(0))
            } else {
                None
            };

            let Some(ranked) = next else { break };
            if current.words.contains(&ranked.word) {
                continue;
            }

            match self.best_placement(&current, &ranked) {
                Some(next_puzzle) => {
                    current = next_puzzle;
                    tried.clear();
                }
                None => tried.push(ranked),
            }
        }

        current
    }

    /// Enumerate every legal placement of a word (both orientations, anchored
    /// at each matching letter already on the grid) and return the
    /// best-scoring one.
    fn best_placement(&self, puzzle: &Puzzle, ranked: &RankedWord) -> Option<Puzzle> {
        let word: Vec<char> = ranked.word.chars().collect();
        let mut best: Option<(i32, Puzzle)> = None;

        for (i, &ch) in word.iter().enumerate() {
            for y in 0..self.height {
                for x in 0..self.width {
                    if puzzle.grid.at(x, y) != ch {
                        continue;
                    }
                    for vertical in [false, true] {
                        let (ox, oy) = if vertical {
                            (x as i32, y as i32 - i as i32)
                        } else {
                            (x as i32 - i as i32, y as i32)
                        };
                        if !self.fits(&puzzle.grid, &word, vertical, ox, oy) {
                            continue;
                        }
                        let (ox, oy) = (ox as usize, oy as usize);
                        let candidate = self.apply_word(puzzle, &word, &ranked.word, vertical, ox, oy);
                        let score = ranked.score
                            + self.placement_potential(
                                &puzzle.grid,
                                &candidate.grid,
                                ox,
                                oy,
                                vertical,
                                &word,
                            );
                        if best.as_ref().is_none_or(|(s, _)| score > *s) {
                            best = Some((score, candidate));
                        }
                    }
                }
            }
        }

        best.map(|(_, puzzle)| puzzle)
    }

    /// A placement fits when it stays in bounds, agrees with every letter it
    /// covers, crosses at least one existing word, and never runs flush
    /// against a parallel word.
    fn fits(&self, grid: &Grid, word: &[char], vertical: bool, x: i32, y: i32) -> bool {
        let (w, h) = (self.width as i32, self.height as i32);
        let mut connect = false;

        for (i, &ch) in word.iter().enumerate() {
            let (cx, cy) = if vertical {
                (x, y + i as i32)
            } else {
                (x + i as i32, y)
            };
            if cx < 0 || cx >= w || cy < 0 || cy >= h {
                return false;
            }
            let (cx, cy) = (cx as usize, cy as usize);

            let existing = grid.at(cx, cy);
            if existing != BLOCK {
                if existing == ch {
                    // Valid intersection; adjacency does not apply here.
                    connect = true;
                    continue;
                }
                return false;
            }

            let side_contact = if vertical {
                (cx > 0 && grid.is_letter(cx - 1, cy))
                    || (cx + 1 < self.width && grid.is_letter(cx + 1, cy))
            } else {
                (cy > 0 && grid.is_letter(cx, cy - 1))
                    || (cy + 1 < self.height && grid.is_letter(cx, cy + 1))
            };
            if side_contact {
                return false;
            }
        }

        if !connect {
            return false;
        }

        // The cells just beyond both ends must stay empty.
        let (x, y) = (x as usize, y as usize);
        if vertical {
            if y > 0 && grid.is_letter(x, y - 1) {
                return false;
            }
            if y + word.len() < self.height && grid.is_letter(x, y + word.len()) {
                return false;
            }
        } else {
            if x > 0 && grid.is_letter(x - 1, y) {
                return false;
            }
            if x + word.len() < self.width && grid.is_letter(x + word.len(), y) {
                return false;
            }
        }

        true
    }

    fn apply_word(
        &self,
        puzzle: &Puzzle,
        word: &[char],
        word_str: &str,
        vertical: bool,
        x: usize,
        y: usize,
    ) -> Puzzle {
        let mut grid = puzzle.grid.clone();
        for (i, &ch) in word.iter().enumerate() {
            let (cx, cy) = if vertical { (x, y + i) } else { (x + i, y) };
            grid.set(cx, cy, ch);
        }
        let mut words = puzzle.words.clone();
        words.insert(word_str.to_string());
        Puzzle { grid, words }
    }

    /// Score a committed placement: open perpendicular sides along the new
    /// word, closeness to the grid center, and how many of the word's
    /// letters were already on the board.
    fn placement_potential(
        &self,
        before: &Grid,
        after: &Grid,
        x: usize,
        y: usize,
        vertical: bool,
        word: &[char],
    ) -> i32 {
        let mut potential = 0i32;

        for i in 0..word.len() {
            let (cx, cy) = if vertical { (x, y + i) } else { (x + i, y) };
            let open_side = if vertical {
                (cx > 0 && !after.is_letter(cx - 1, cy))
                    || (cx + 1 < self.width && !after.is_letter(cx + 1, cy))
            } else {
                (cy > 0 && !after.is_letter(cx, cy - 1))
                    || (cy + 1 < self.height && !after.is_letter(cx, cy + 1))
            };
            if open_side {
                potential += 1;
            }
        }

        let distance = (self.width / 2).abs_diff(x) + (self.height / 2).abs_diff(y);
        potential += (10 - distance as i32).max(0) / 2;

        let present: HashSet<char> = before
            .rows()
            .flatten()
            .copied()
            .filter(|&c| c != BLOCK)
            .collect();
        potential += 2 * word.iter().filter(|c| present.contains(c)).count() as i32;

        potential
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn lexicon() -> Lexicon {
        Lexicon::from_entries([
            ("HELLO", "A greeting"),
            ("EEL", "Slippery fish"),
            ("LOOP", "Closed circuit"),
            ("OBOE", "Woodwind instrument"),
        ])
    }

    fn ranked(words: &[&str]) -> Vec<RankedWord> {
        words
            .iter()
            .map(|w| RankedWord {
                word: w.to_string(),
                score: crate::lexicon::word_score(w),
            })
            .collect()
    }

    fn generator(lexicon: &Lexicon, size: usize) -> CrosswordGenerator<'_, StdRng> {
        CrosswordGenerator::with_rng(lexicon, size, size, StdRng::seed_from_u64(7))
    }

    #[test]
    fn test_seed_placement_centered() {
        let lexicon = lexicon();
        let generator = generator(&lexicon, 5);

        let horizontal = generator.place_seed("HELLO", false).unwrap();
        assert_eq!(horizontal.grid.at(0, 2), 'H');
        assert_eq!(horizontal.grid.at(4, 2), 'O');

        let vertical = generator.place_seed("EEL", true).unwrap();
        assert_eq!(vertical.grid.at(2, 1), 'E');
        assert_eq!(vertical.grid.at(2, 3), 'L');

        // Too long for the grid.
        assert!(generator.place_seed("HELLOHELLO", false).is_none());
    }

    #[test]
    fn test_fits_requires_intersection_and_clearance() {
        let lexicon = lexicon();
        let generator = generator(&lexicon, 5);
        let puzzle = generator.place_seed("HELLO", false).unwrap();

        let eel: Vec<char> = "EEL".chars().collect();
        // Crossing HELLO's first E from above.
        assert!(generator.fits(&puzzle.grid, &eel, true, 1, 1));
        // Floating placement with no intersection.
        assert!(!generator.fits(&puzzle.grid, &eel, true, 0, 0));
        // Parallel and flush against the seed word.
        let loop_word: Vec<char> = "LOOP".chars().collect();
        assert!(!generator.fits(&puzzle.grid, &loop_word, false, 0, 1));
        // Conflicting letter on the covered cell.
        assert!(!generator.fits(&puzzle.grid, &eel, false, 1, 2));
    }

    #[test]
    fn test_generate_from_seed_word() {
        let lexicon = lexicon();
        let mut generator = generator(&lexicon, 5);

        let puzzle = generator
            .generate(Some("HELLO"), Some(ranked(&["EEL"])), 1)
            .expect("expansion from HELLO should place a crossing word");

        assert!(puzzle.words.contains("HELLO"));
        assert!(puzzle.word_count() >= 2);
        assert!(puzzle.density() >= 0.24);

        // Every placed word shows up as an extracted slot, across or down.
        let (across, down) = extract_slots(&puzzle.grid);
        let extracted: HashSet<String> = across
            .iter()
            .chain(&down)
            .map(|s| s.word.clone())
            .collect();
        assert_eq!(extracted, puzzle.words);
    }

    #[test]
    fn test_generate_empty_word_list() {
        let lexicon = lexicon();
        let mut generator = generator(&lexicon, 5);
        assert!(generator.generate(Some("HELLO"), Some(Vec::new()), 3).is_none());
    }

    #[test]
    fn test_numbering_is_monotonic_row_major() {
        let lexicon = lexicon();
        let mut generator = generator(&lexicon, 5);
        let puzzle = generator
            .generate(None, None, 3)
            .expect("small lexicon should still interlock");

        let clues = puzzle.clues(&lexicon);
        let mut slots: Vec<&Clue> = clues.across.iter().chain(&clues.down).collect();
        slots.sort_by_key(|c| (c.y, c.x, c.number));
        let numbers: Vec<u32> = slots.iter().map(|c| c.number).collect();
        let mut sorted = numbers.clone();
        sorted.sort();
        sorted.dedup();
        // Distinct origins get distinct numbers in row-major order; shared
        // origins (across + down) share one.
        assert!(numbers.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(sorted.first(), Some(&1));
    }

    #[test]
    fn test_clues_carry_lexicon_text() {
        let lexicon = lexicon();
        let mut generator = generator(&lexicon, 5);
        let puzzle = generator
            .generate(Some("HELLO"), Some(ranked(&["EEL"])), 1)
            .unwrap();

        let clues = puzzle.clues(&lexicon);
        let hello = clues
            .across
            .iter()
            .chain(&clues.down)
            .find(|c| c.answer.as_deref() == Some("HELLO"))
            .unwrap();
        assert_eq!(hello.clue, "A greeting");
        assert_eq!(hello.length, 5);
    }
}
