//! Two-phase solver: bounded-beam best-first exploration, then guided
//! depth-first completion over whatever the beam left unfilled.

use std::collections::{BTreeSet, BinaryHeap};

use log::{debug, info};

use crate::clue::ClueList;
use crate::grid::Grid;
use crate::lexicon::Lexicon;
use crate::slots::SlotKey;

use super::metrics::HybridCounters;
use super::{HYBRID_PROFILE, OpenEntry, SolveOutcome, SolveStatus, SolverBase};

const DEFAULT_BEAM_WIDTH: usize = 5;
const DEFAULT_SWITCH_THRESHOLD: f64 = 0.7;
const MAX_SUCCESSORS: usize = 15;
const FORWARD_CHECK_HORIZON: usize = 2;

#[derive(Clone)]
struct BeamState {
    grid: Grid,
    filled: BTreeSet<SlotKey>,
    cost: u32,
    slot_index: usize,
    heuristic: i64,
}

impl BeamState {
    fn priority(&self) -> i64 {
        self.cost as i64 + self.heuristic
    }
}

pub struct HybridSolver<'a> {
    base: SolverBase<'a>,
    beam_width: usize,
    switch_threshold: f64,
    astar_expansions: u32,
    dfs_backtracks: u32,
    mode_switches: u32,
}

impl<'a> HybridSolver<'a> {
    pub fn new(lexicon: &'a Lexicon, grid: Grid, clues: &ClueList, profiling: bool) -> Self {
        Self::with_params(
            lexicon,
            grid,
            clues,
            profiling,
            DEFAULT_BEAM_WIDTH,
            DEFAULT_SWITCH_THRESHOLD,
        )
    }

    pub fn with_params(
        lexicon: &'a Lexicon,
        grid: Grid,
        clues: &ClueList,
        profiling: bool,
        beam_width: usize,
        switch_threshold: f64,
    ) -> Self {
        let base = SolverBase::new(lexicon, grid, clues, profiling);
        info!("hybrid solver initialized with {} slots", base.slots.len());
        Self {
            base,
            beam_width,
            switch_threshold,
            astar_expansions: 0,
            dfs_backtracks: 0,
            mode_switches: 0,
        }
    }

    pub fn solve(mut self) -> SolveOutcome {
        if self.base.slots.is_empty() {
            return self.finish(SolveStatus::Success, 0);
        }

        let (explored_fully, filled) = self.explore_with_beam();
        if explored_fully {
            let placed = self.base.count_filled();
            return self.finish(SolveStatus::Success, placed);
        }

        self.mode_switches += 1;
        info!(
            "beam search stalled at {}/{} slots, switching to guided DFS",
            filled.len(),
            self.base.slots.len()
        );

        let success = self.complete_with_dfs(&filled);
        let placed = self.base.count_filled();
        let status = if success {
            SolveStatus::Success
        } else {
            SolveStatus::Partial
        };
        self.finish(status, placed)
    }

    fn finish(&mut self, status: SolveStatus, placed: usize) -> SolveOutcome {
        let bytes = self.base.grid_bytes();
        self.base.tracker.record_memory("end", bytes);
        let mut outcome = self.base.outcome(status, placed);
        outcome.metrics.hybrid = Some(HybridCounters {
            astar_expansions: self.astar_expansions,
            dfs_backtracks: self.dfs_backtracks,
            mode_switches: self.mode_switches,
        });
        outcome
    }

    /// Phase 1: best-first search under a fixed-width beam. Returns whether
    /// a full assignment was reached, plus the slots the best state filled.
    fn explore_with_beam(&mut self) -> (bool, BTreeSet<SlotKey>) {
        let bytes = self.base.grid_bytes();
        self.base.tracker.record_memory("astar_start", bytes);

        let ordering = self.order_by_difficulty();
        let total = self.base.slots.len();

        let mut initial = BeamState {
            grid: self.base.grid.clone(),
            filled: BTreeSet::new(),
            cost: 0,
            slot_index: 0,
            heuristic: 0,
        };
        initial.heuristic = self.estimate_remaining(&ordering, 0);

        let mut best = initial.clone();
        let mut beam: BinaryHeap<OpenEntry<BeamState>> = BinaryHeap::new();
        beam.push(OpenEntry {
            priority: initial.priority(),
            seq: 0,
            state: initial,
        });
        let mut seq: u64 = 1;

        let max_expansions = 1000.min(50 * total) as u32;

        while self.astar_expansions < max_expansions {
            let Some(entry) = beam.pop() else { break };
            self.astar_expansions += 1;
            let state = entry.state;

            if state.slot_index >= ordering.len() {
                self.base.grid = state.grid;
                return (true, state.filled);
            }

            if state.filled.len() > best.filled.len() {
                best = state.clone();
            }

            for successor in self.successors(&ordering, &state) {
                beam.push(OpenEntry {
                    priority: successor.priority(),
                    seq,
                    state: successor,
                });
                seq += 1;
            }

            if beam.len() > self.beam_width {
                let mut states: Vec<OpenEntry<BeamState>> = beam.into_vec();
                states.sort_by_key(|e| (e.priority, e.seq));
                states.truncate(self.beam_width);
                beam = BinaryHeap::from(states);
            }

            // A nearly-complete collapsed beam is better finished by DFS.
            let progress = state.filled.len() as f64 / total as f64;
            if progress > self.switch_threshold && beam.len() == 1 {
                debug!("beam collapsed at progress {progress:.2}");
                self.base.grid = best.grid.clone();
                return (false, best.filled.clone());
            }
        }

        self.base.grid = best.grid.clone();
        (false, best.filled)
    }

    fn successors(&mut self, ordering: &[usize], state: &BeamState) -> Vec<BeamState> {
        let Some(&slot_idx) = ordering.get(state.slot_index) else {
            return Vec::new();
        };

        let candidates = self.base.candidates(slot_idx, &state.grid, HYBRID_PROFILE);
        let mut successors = Vec::new();

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

            let mut next = BeamState {
                grid,
                filled,
                cost: state.cost + 1,
                slot_index: state.slot_index + 1,
                heuristic: 0,
            };
            next.heuristic = self.estimate_remaining(ordering, next.slot_index);
            successors.push(next);
        }

        successors
    }

    /// Phase 1 slot order: high constraint degree and few expected
    /// candidates first.
    fn order_by_difficulty(&mut self) -> Vec<usize> {
        let mut scored: Vec<(usize, i64)> = (0..self.base.slots.len())
            .map(|idx| {
                let slot = &self.base.slots[idx];
                let estimate = self
                    .base
                    .lexicon
                    .possible_words(&slot.clue, 50, Some((slot.length, slot.length)))
                    .len()
                    .max(1);
                let degree = self.base.graph.degree(slot.key()) as i64;
                (idx, degree * 10 + (50 - (estimate as i64).min(50)))
            })
            .collect();
        scored.sort_by_key(|&(_, score)| std::cmp::Reverse(score));
        scored.into_iter().map(|(idx, _)| idx).collect()
    }

    fn estimate_remaining(&self, ordering: &[usize], slot_index: usize) -> i64 {
        let remaining = ordering.len().saturating_sub(slot_index);
        if remaining == 0 {
            return 0;
        }

        let mut heuristic = remaining as i64 * 5;
        for &idx in ordering.iter().skip(slot_index).take(3) {
            heuristic += self.base.graph.degree(self.base.slots[idx].key()) as i64 * 2;
        }
        heuristic
    }

    /// Phase 2: backtracking over the slots the beam left open, hardest
    /// first under the current grid, with a two-slot forward-check horizon.
    fn complete_with_dfs(&mut self, filled: &BTreeSet<SlotKey>) -> bool {
        let bytes = self.base.grid_bytes();
        self.base.tracker.record_memory("dfs_start", bytes);

        let remaining: Vec<usize> = (0..self.base.slots.len())
            .filter(|&idx| !filled.contains(&self.base.slots[idx].key()))
            .collect();
        if remaining.is_empty() {
            return true;
        }

        let snapshot = self.base.grid.clone();
        let mut scored: Vec<(usize, i64)> = remaining
            .into_iter()
            .map(|idx| {
                let count = self.base.candidates(idx, &snapshot, HYBRID_PROFILE).len() as i64;
                let degree = self.base.graph.degree(self.base.slots[idx].key()) as i64;
                (idx, degree * 10 + (20 - count).max(0))
            })
            .collect();
        scored.sort_by_key(|&(_, score)| std::cmp::Reverse(score));
        let order: Vec<usize> = scored.into_iter().map(|(idx, _)| idx).collect();

        self.guided_dfs(0, &order)
    }

    fn guided_dfs(&mut self, pos: usize, order: &[usize]) -> bool {
        if pos >= order.len() {
            return true;
        }

        let slot_idx = order[pos];
        let snapshot = self.base.grid.clone();
        let candidates = self.base.candidates(slot_idx, &snapshot, HYBRID_PROFILE);
        if candidates.is_empty() {
            self.dfs_backtracks += 1;
            return false;
        }

        for (word, _) in candidates {
            let legal = {
                let checker = self.base.checker();
                let slot = &self.base.slots[slot_idx];
                checker.fits(slot, &word, &self.base.grid)
                    && checker.perpendicular_ok(slot, &word, &self.base.grid)
            };
            if !legal {
                continue;
            }

            let written = self.base.place_word(slot_idx, &word);

            if !self.verify_future(pos + 1, order) {
                self.base.remove_word(&written);
                self.dfs_backtracks += 1;
                continue;
            }

            if self.guided_dfs(pos + 1, order) {
                return true;
            }

            self.base.remove_word(&written);
            self.dfs_backtracks += 1;
        }

        false
    }

    fn verify_future(&mut self, start: usize, order: &[usize]) -> bool {
        let snapshot = self.base.grid.clone();
        for &slot_idx in order.iter().skip(start).take(FORWARD_CHECK_HORIZON) {
            if self
                .base
                .candidates(slot_idx, &snapshot, HYBRID_PROFILE)
                .is_empty()
            {
                return false;
            }
        }
        true
    }
}
