//! The solver trio and everything they share: the outcome shape, slot
//! preparation, the candidate-fetching protocol with its fallback cascade,
//! and in-context candidate scoring.
//!
//! Search failure is never an error. A solver that exhausts its search
//! returns a `partial` outcome carrying whatever it committed.

pub mod astar;
pub mod dfs;
pub mod hybrid;
pub mod metrics;

use std::cmp::Reverse;
use std::collections::HashSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::clue::ClueList;
use crate::grid::{BLOCK, Grid};
use crate::lexicon::Lexicon;
use crate::slots::{ConstraintChecker, SlotGraph, WordSlot, intersection, slots_from_clues};

pub use metrics::{HybridCounters, PerfTracker, SolveMetrics, SpaceComplexity, TimeComplexity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolveStatus {
    Success,
    Partial,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Algorithm {
    #[serde(rename = "DFS")]
    Dfs,
    #[serde(rename = "A*")]
    AStar,
    #[serde(rename = "HYBRID")]
    Hybrid,
}

impl FromStr for Algorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "DFS" => Ok(Algorithm::Dfs),
            "A*" => Ok(Algorithm::AStar),
            "HYBRID" => Ok(Algorithm::Hybrid),
            other => Err(other.to_string()),
        }
    }
}

impl std::fmt::Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Algorithm::Dfs => write!(f, "DFS"),
            Algorithm::AStar => write!(f, "A*"),
            Algorithm::Hybrid => write!(f, "HYBRID"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SolveOutcome {
    pub status: SolveStatus,
    pub grid: Grid,
    pub words_placed: usize,
    pub total_words: usize,
    pub metrics: SolveMetrics,
}

impl SolveOutcome {
    pub fn success(&self) -> bool {
        self.status == SolveStatus::Success
    }
}

/// Run the requested solver over a grid and clue list.
pub fn solve(
    lexicon: &Lexicon,
    algorithm: Algorithm,
    grid: Grid,
    clues: &ClueList,
    profiling: bool,
) -> SolveOutcome {
    match algorithm {
        Algorithm::Dfs => dfs::DfsSolver::new(lexicon, grid, clues, profiling).solve(),
        Algorithm::AStar => astar::AStarSolver::new(lexicon, grid, clues, profiling).solve(),
        Algorithm::Hybrid => hybrid::HybridSolver::new(lexicon, grid, clues, profiling).solve(),
    }
}

/// Per-variant constants of the shared candidate protocol.
#[derive(Debug, Clone, Copy)]
pub(crate) struct CandidateProfile {
    pub primary_limit: usize,
    pub exact_clue_bonus: i32,
    pub entry_value_bias: bool,
    /// Score candidates in context and sort best-first; the DFS solver keeps
    /// plain insertion order instead.
    pub scored: bool,
}

pub(crate) const DFS_PROFILE: CandidateProfile = CandidateProfile {
    primary_limit: 1000,
    exact_clue_bonus: 0,
    entry_value_bias: false,
    scored: false,
};

pub(crate) const ASTAR_PROFILE: CandidateProfile = CandidateProfile {
    primary_limit: 500,
    exact_clue_bonus: 4,
    entry_value_bias: true,
    scored: true,
};

pub(crate) const HYBRID_PROFILE: CandidateProfile = CandidateProfile {
    primary_limit: 200,
    exact_clue_bonus: 5,
    entry_value_bias: false,
    scored: true,
};

const BROAD_LIMIT: usize = 5000;
const HEURISTIC_KEEP: usize = 200;

/// State common to all three solvers: the working grid, the slot list, the
/// intersection graph and the instrumentation.
pub(crate) struct SolverBase<'a> {
    pub lexicon: &'a Lexicon,
    pub grid: Grid,
    pub slots: Vec<WordSlot>,
    pub graph: SlotGraph,
    pub tracker: PerfTracker,
}

impl<'a> SolverBase<'a> {
    pub fn new(lexicon: &'a Lexicon, grid: Grid, clues: &ClueList, profiling: bool) -> Self {
        let slots = slots_from_clues(&grid, clues);
        let graph = SlotGraph::build(&slots);
        let mut base = Self {
            lexicon,
            grid,
            slots,
            graph,
            tracker: PerfTracker::new(profiling),
        };
        let bytes = base.grid_bytes();
        base.tracker.record_memory("start", bytes);
        base
    }

    pub fn checker(&self) -> ConstraintChecker<'_> {
        ConstraintChecker::new(&self.slots, &self.graph)
    }

    pub fn grid_bytes(&self) -> usize {
        self.grid.width() * self.grid.height() * std::mem::size_of::<char>()
    }

    /// Slots whose whole span is committed in the working grid.
    pub fn count_filled(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.is_filled(&self.grid))
            .count()
    }

    pub fn outcome(&self, status: SolveStatus, words_placed: usize) -> SolveOutcome {
        SolveOutcome {
            status,
            grid: self.grid.clone(),
            words_placed,
            total_words: self.slots.len(),
            metrics: self.tracker.finish(),
        }
    }

    /// Commit a word into the working grid, writing only cells that were
    /// empty. Returns exactly the positions written so the caller can unwind
    /// them and nothing else.
    pub fn place_word(&mut self, slot_idx: usize, word: &str) -> Vec<(usize, usize)> {
        let cells: Vec<(usize, usize)> = self.slots[slot_idx].cells().collect();
        let mut written = Vec::new();
        for ((x, y), ch) in cells.into_iter().zip(word.chars()) {
            if self.grid.at(x, y) == BLOCK {
                self.grid.set(x, y, ch);
                written.push((x, y));
            }
        }
        self.tracker.complexity.increment(written.len() as u64);
        written
    }

    pub fn remove_word(&mut self, written: &[(usize, usize)]) {
        for &(x, y) in written {
            self.grid.set(x, y, BLOCK);
        }
        self.tracker.complexity.increment(written.len() as u64);
    }

    /// Candidates for a slot under `grid`, falling back through the cascade
    /// when the primary clue query comes up empty.
    pub fn candidates(
        &mut self,
        slot_idx: usize,
        grid: &Grid,
        profile: CandidateProfile,
    ) -> Vec<(String, i32)> {
        self.tracker.complexity.increment(1);
        let (list, fallback_used) =
            fetch_candidates(self.lexicon, &self.slots, slot_idx, &self.graph, grid, profile);
        if fallback_used {
            self.tracker.note_fallback();
        }
        list
    }
}

/// The shared candidate protocol. Returns the candidate list (scored and
/// sorted when the profile asks for it) and whether the fallback cascade was
/// engaged.
fn fetch_candidates(
    lexicon: &Lexicon,
    slots: &[WordSlot],
    slot_idx: usize,
    graph: &SlotGraph,
    grid: &Grid,
    profile: CandidateProfile,
) -> (Vec<(String, i32)>, bool) {
    let slot = &slots[slot_idx];
    let checker = ConstraintChecker::new(slots, graph);
    let length = slot.length;

    let mut seen: HashSet<String> = HashSet::new();
    let mut words: Vec<String> = Vec::new();

    // Primary: the clue query, constrained to the slot length.
    for entry in lexicon.possible_words(&slot.clue, profile.primary_limit, Some((length, length))) {
        if entry.length == length
            && checker.fits(slot, &entry.word, grid)
            && seen.insert(entry.word.clone())
        {
            words.push(entry.word.clone());
        }
    }

    // A provided answer whose stored clue agrees with the slot's clue is
    // admitted ahead of the cascade.
    if words.is_empty() {
        if let Some(answer) = &slot.answer {
            let answer = answer.to_ascii_uppercase();
            if answer.len() == length {
                let stored = lexicon.clue_for_word(&answer);
                if stored.clue.eq_ignore_ascii_case(&slot.clue)
                    && checker.fits(slot, &answer, grid)
                    && seen.insert(answer.clone())
                {
                    words.push(answer);
                }
            }
        }
    }

    let fallback_used = words.is_empty();
    if fallback_used {
        // Tier 1: fuzzy clue variants.
        for entry in lexicon.alternative_spellings(&slot.clue, length, 20) {
            if entry.length == length
                && checker.fits(slot, &entry.word, grid)
                && seen.insert(entry.word.clone())
            {
                words.push(entry.word.clone());
            }
        }

        // Tier 2: whatever matches the committed letters of the span.
        if words.is_empty() {
            let pattern = slot.pattern(grid);
            for entry in lexicon.by_pattern(&pattern, None, 100) {
                if checker.fits(slot, &entry.word, grid) && seen.insert(entry.word.clone()) {
                    words.push(entry.word.clone());
                }
            }
        }

        // Tier 3: any word of the right length, best first.
        if words.is_empty() {
            let mut by_length = lexicon.by_length(length, Some(100));
            by_length.sort_by_key(|e| Reverse(e.score));
            for entry in by_length {
                if checker.fits(slot, &entry.word, grid) && seen.insert(entry.word.clone()) {
                    words.push(entry.word.clone());
                }
            }
        }

        // Tier 4: broad candidates ranked by agreement with the fixed cells.
        if words.is_empty() {
            let pattern: Vec<char> = slot.pattern(grid).chars().collect();
            let fixed: Vec<usize> = pattern
                .iter()
                .enumerate()
                .filter(|&(_, &c)| c != BLOCK)
                .map(|(i, _)| i)
                .collect();
            let mut ranked: Vec<(usize, String)> = Vec::new();
            for entry in lexicon.possible_words(&slot.clue, BROAD_LIMIT, Some((length, length))) {
                if entry.length != length {
                    continue;
                }
                let bytes = entry.word.as_bytes();
                let matches = fixed
                    .iter()
                    .filter(|&&i| pattern[i] == bytes[i] as char)
                    .count();
                if matches > 0 {
                    ranked.push((matches, entry.word.clone()));
                }
            }
            ranked.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
            for (_, word) in ranked.into_iter().take(HEURISTIC_KEEP) {
                if checker.fits(slot, &word, grid) && seen.insert(word.clone()) {
                    words.push(word);
                }
            }
        }
    }

    let mut out: Vec<(String, i32)> = words
        .into_iter()
        .map(|word| {
            let score = if profile.scored {
                score_candidate(lexicon, slots, slot_idx, graph, grid, &word, profile)
            } else {
                0
            };
            (word, score)
        })
        .collect();

    if profile.scored {
        out.sort_by_key(|&(_, score)| Reverse(score));
    }

    (out, fallback_used)
}

/// Score a candidate in the context of the current grid: agreement with
/// committed letters in the span, agreement at every graph intersection, the
/// exact-clue bonus, and (for A*) a bias toward high-value words. Floored at
/// zero.
fn score_candidate(
    lexicon: &Lexicon,
    slots: &[WordSlot],
    slot_idx: usize,
    graph: &SlotGraph,
    grid: &Grid,
    word: &str,
    profile: CandidateProfile,
) -> i32 {
    let slot = &slots[slot_idx];
    let bytes = word.as_bytes();
    let mut score = 0;

    for (i, (x, y)) in slot.cells().enumerate() {
        let cell = grid.at(x, y);
        if cell != BLOCK && i < bytes.len() {
            if cell == bytes[i] as char {
                score += 3;
            } else {
                score -= 5;
            }
        }
    }

    for key in graph.neighbors(slot.key()) {
        let Some(idx) = graph.slot_index(key) else {
            continue;
        };
        let Some((x, y, pos, _)) = intersection(slot, &slots[idx]) else {
            continue;
        };
        let committed = grid.at(x, y);
        if committed != BLOCK && pos < bytes.len() {
            if bytes[pos] as char == committed {
                score += 3;
            } else {
                score -= 5;
            }
        }
    }

    if profile.exact_clue_bonus > 0
        && lexicon
            .exact_clue(&slot.clue)
            .is_some_and(|entry| entry.word == word)
    {
        score += profile.exact_clue_bonus;
    }

    if profile.entry_value_bias {
        score += (lexicon.clue_for_word(word).score / 5).min(3);
    }

    score.max(0)
}

/// Min-heap entry for the best-first solvers: `BinaryHeap` pops the entry
/// with the lowest priority, FIFO among ties.
pub(crate) struct OpenEntry<T> {
    pub priority: i64,
    pub seq: u64,
    pub state: T,
}

impl<T> PartialEq for OpenEntry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.seq == other.seq
    }
}

impl<T> Eq for OpenEntry<T> {}

impl<T> PartialOrd for OpenEntry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for OpenEntry<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        other
            .priority
            .cmp(&self.priority)
            .then(other.seq.cmp(&self.seq))
    }
}
