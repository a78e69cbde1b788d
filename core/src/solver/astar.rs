//! Best-first search over whole-slot assignments.
//!
//! States are `(grid, filled slots, slot index)` triples ordered by
//! `cost + heuristic`; identity is a content hash over all three. The
//! `10 * remaining` term of the heuristic is not provably admissible; it
//! trades optimality guarantees for depth, which is what a bounded fill
//! search wants.

use std::collections::{BTreeSet, BinaryHeap, HashMap, HashSet};

use log::{debug, info};

use crate::clue::ClueList;
use crate::grid::{BLOCK, Grid};
use crate::lexicon::Lexicon;
use crate::slots::SlotKey;

use super::{ASTAR_PROFILE, OpenEntry, SolveOutcome, SolveStatus, SolverBase};

const MAX_ITERATIONS: usize = 5000;
const MAX_SUCCESSORS: usize = 20;
const MEMORY_SAMPLE_EVERY: usize = 500;

struct State {
    grid: Grid,
    filled: BTreeSet<SlotKey>,
    cost: u32,
    /// Position in the global slot ordering; the successor step fills the
    /// slot at this position.
    slot_index: usize,
    heuristic: i64,
    key: String,
}

impl State {
    fn new(grid: Grid, filled: BTreeSet<SlotKey>, cost: u32, slot_index: usize) -> Self {
        let filled_part: Vec<String> = filled
            .iter()
            .map(|(number, direction)| format!("{number}{direction}"))
            .collect();
        let key = format!("{}|{}|{}", grid.content_key(), filled_part.join(","), slot_index);
        Self {
            grid,
            filled,
            cost,
            slot_index,
            heuristic: 0,
            key,
        }
    }

    fn priority(&self) -> i64 {
        self.cost as i64 + self.heuristic
    }
}

pub struct AStarSolver<'a> {
    base: SolverBase<'a>,
    /// Slot indices, hardest first: high constraint degree and few expected
    /// candidates sort to the front.
    ordering: Vec<usize>,
    candidate_cache: HashMap<(SlotKey, String), Vec<(String, i32)>>,
}

impl<'a> AStarSolver<'a> {
    pub fn new(lexicon: &'a Lexicon, grid: Grid, clues: &ClueList, profiling: bool) -> Self {
        let base = SolverBase::new(lexicon, grid, clues, profiling);
        let ordering = Self::order_slots(&base);
        info!("A* solver initialized with {} slots", base.slots.len());
        Self {
            base,
            ordering,
            candidate_cache: HashMap::new(),
        }
    }

    fn order_slots(base: &SolverBase) -> Vec<usize> {
        let mut scored: Vec<(usize, i64)> = base
            .slots
            .iter()
            .enumerate()
            .map(|(idx, slot)| {
                let fixed = slot
                    .pattern(&base.grid)
                    .chars()
                    .filter(|&c| c != BLOCK)
                    .count();
                let estimate = (base.lexicon.count_by_length(slot.length) / (fixed * 5).max(1)).max(1);
                let score = base.graph.degree(slot.key()) as i64 * 10
                    + (50 - estimate as i64).max(0);
                (idx, score)
            })
            .collect();
        scored.sort_by_key(|&(_, score)| std::cmp::Reverse(score));
        scored.into_iter().map(|(idx, _)| idx).collect()
    }

    pub fn solve(mut self) -> SolveOutcome {
        if self.base.slots.is_empty() {
            return self.base.outcome(SolveStatus::Success, 0);
        }

        let mut initial = State::new(self.base.grid.clone(), BTreeSet::new(), 0, 0);
        initial.heuristic = self.heuristic_for(0);

        let mut open: BinaryHeap<OpenEntry<State>> = BinaryHeap::new();
        let mut closed: HashSet<String> = HashSet::new();
        let mut best_cost: HashMap<String, u32> = HashMap::new();
        best_cost.insert(initial.key.clone(), 0);
        open.push(OpenEntry {
            priority: initial.priority(),
            seq: 0,
            state: initial,
        });
        let mut seq: u64 = 1;

        let mut iterations = 0;
        while iterations < MAX_ITERATIONS {
            let Some(entry) = open.pop() else { break };
            let state = entry.state;
            iterations += 1;

            if state.slot_index >= self.ordering.len() {
                self.base.grid = state.grid;
                let sample = self.state_bytes(open.len() + closed.len() + 1);
                self.base.tracker.record_memory("end", sample);
                let total = self.base.slots.len();
                info!("A* reached a full assignment after {iterations} iterations");
                return self.base.outcome(SolveStatus::Success, total);
            }

            if !closed.insert(state.key.clone()) {
                continue;
            }

            let slot_idx = self.ordering[state.slot_index];
            let candidates = self.cached_candidates(slot_idx, &state.grid);

            for (word, _) in candidates.iter().take(MAX_SUCCESSORS) {
                let legal = {
                    let checker = self.base.checker();
                    checker.fits(&self.base.slots[slot_idx], word, &state.grid)
                };
                if !legal {
                    continue;
                }

                let mut grid = state.grid.clone();
                for (i, ch) in word.chars().enumerate() {
                    let (x, y) = self.base.slots[slot_idx].cell(i);
                    grid.set(x, y, ch);
                }
                let mut filled = state.filled.clone();
                filled.insert(self.base.slots[slot_idx].key());

                let mut next = State::new(grid, filled, state.cost + 1, state.slot_index + 1);
                next.heuristic = self.heuristic_for(next.slot_index);

                if closed.contains(&next.key) {
                    continue;
                }
                if best_cost.get(&next.key).is_some_and(|&cost| next.cost >= cost) {
                    continue;
                }
                best_cost.insert(next.key.clone(), next.cost);
                open.push(OpenEntry {
                    priority: next.priority(),
                    seq,
                    state: next,
                });
                seq += 1;
            }

            self.base.tracker.complexity.increment(1);
            if iterations % MEMORY_SAMPLE_EVERY == 0 {
                let sample = self.state_bytes(open.len() + closed.len());
                self.base.tracker.record_memory("expand", sample);
            }
        }

        // Iteration cap or exhaustion: surface the most promising open state.
        debug!("A* stopped after {iterations} iterations with {} open states", open.len());
        if let Some(entry) = open.iter().min_by_key(|e| e.state.heuristic) {
            self.base.grid = entry.state.grid.clone();
        }
        let sample = self.state_bytes(open.len() + closed.len());
        self.base.tracker.record_memory("end", sample);
        let filled = self.base.count_filled();
        self.base.outcome(SolveStatus::Partial, filled)
    }

    /// `10 * remaining` plus the constraint degrees of the next few slots.
    fn heuristic_for(&self, slot_index: usize) -> i64 {
        let remaining = self.ordering.len().saturating_sub(slot_index);
        if remaining == 0 {
            return 0;
        }

        let mut heuristic = remaining as i64 * 10;
        for &idx in self.ordering.iter().skip(slot_index).take(3) {
            heuristic += self.base.graph.degree(self.base.slots[idx].key()) as i64 * 5;
        }
        heuristic
    }

    fn cached_candidates(&mut self, slot_idx: usize, grid: &Grid) -> Vec<(String, i32)> {
        let cache_key = (self.base.slots[slot_idx].key(), grid.content_key());
        if let Some(cached) = self.candidate_cache.get(&cache_key) {
            return cached.clone();
        }
        let candidates = self.base.candidates(slot_idx, grid, ASTAR_PROFILE);
        self.candidate_cache.insert(cache_key, candidates.clone());
        candidates
    }

    fn state_bytes(&self, states: usize) -> usize {
        states * (self.base.grid_bytes() + 96)
    }
}
