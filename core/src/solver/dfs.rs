//! Chronological backtracking over a most-constrained-first slot order.
//!
//! One mutable grid with an exact undo log per placement: cells that already
//! carried a letter are neither overwritten nor logged, so unwinding
//! restores precisely the cells a placement wrote.

use std::collections::HashMap;

use log::{debug, info, warn};

use crate::clue::ClueList;
use crate::grid::Grid;
use crate::lexicon::Lexicon;
use crate::slots::SlotKey;

use super::{DFS_PROFILE, SolveOutcome, SolveStatus, SolverBase};

pub struct DfsSolver<'a> {
    base: SolverBase<'a>,
    /// Slot index paired with its precomputed candidates, in search order.
    order: Vec<(usize, Vec<String>)>,
    /// Position of each slot in `order`, for the forward check.
    order_pos: HashMap<SlotKey, usize>,
}

impl<'a> DfsSolver<'a> {
    pub fn new(lexicon: &'a Lexicon, grid: Grid, clues: &ClueList, profiling: bool) -> Self {
        let base = SolverBase::new(lexicon, grid, clues, profiling);
        info!("DFS solver initialized with {} slots", base.slots.len());
        Self {
            base,
            order: Vec::new(),
            order_pos: HashMap::new(),
        }
    }

    pub fn solve(mut self) -> SolveOutcome {
        if self.base.slots.is_empty() {
            return self.base.outcome(SolveStatus::Success, 0);
        }

        // Precompute every slot's candidate list once. A slot with nothing
        // even after the fallback cascade makes the puzzle unsatisfiable.
        let snapshot = self.base.grid.clone();
        let mut lists: Vec<(usize, Vec<String>)> = Vec::new();
        for idx in 0..self.base.slots.len() {
            let words: Vec<String> = self
                .base
                .candidates(idx, &snapshot, DFS_PROFILE)
                .into_iter()
                .map(|(word, _)| word)
                .collect();
            if words.is_empty() {
                let slot = &self.base.slots[idx];
                warn!(
                    "no candidates for slot {} {}, returning partial",
                    slot.number, slot.direction
                );
                let filled = self.base.count_filled();
                return self.base.outcome(SolveStatus::Partial, filled);
            }
            lists.push((idx, words));
        }

        // Most-constrained variable first; most-constraining as tiebreak.
        lists.sort_by(|a, b| {
            let degree_a = self.base.graph.degree(self.base.slots[a.0].key());
            let degree_b = self.base.graph.degree(self.base.slots[b.0].key());
            a.1.len().cmp(&b.1.len()).then(degree_b.cmp(&degree_a))
        });
        for (pos, (idx, words)) in lists.iter().enumerate() {
            let slot = &self.base.slots[*idx];
            debug!(
                "slot order {}: {} {} with {} candidates",
                pos + 1,
                slot.number,
                slot.direction,
                words.len()
            );
            self.order_pos.insert(slot.key(), pos);
        }
        self.order = lists;

        let success = self.search(0);
        if success {
            info!("DFS found a full assignment");
        } else {
            warn!("DFS exhausted its search");
        }

        let bytes = self.base.grid_bytes();
        self.base.tracker.record_memory("end", bytes);
        let filled = self.base.count_filled();
        let status = if success {
            SolveStatus::Success
        } else {
            SolveStatus::Partial
        };
        self.base.outcome(status, filled)
    }

    fn search(&mut self, pos: usize) -> bool {
        if pos >= self.order.len() {
            return true;
        }

        let (slot_idx, candidates) = self.order[pos].clone();
        for word in candidates {
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

            if self.forward_check(pos, slot_idx) && self.search(pos + 1) {
                return true;
            }

            self.base.remove_word(&written);
        }

        false
    }

    /// One-step look-ahead: every not-yet-assigned neighbor of the placed
    /// slot must keep at least one candidate that still fits the grid.
    fn forward_check(&self, pos: usize, slot_idx: usize) -> bool {
        let key = self.base.slots[slot_idx].key();
        let checker = self.base.checker();

        for neighbor in self.base.graph.neighbors(key) {
            let Some(&neighbor_pos) = self.order_pos.get(&neighbor) else {
                continue;
            };
            if neighbor_pos <= pos {
                continue;
            }
            let (idx, words) = &self.order[neighbor_pos];
            let slot = &self.base.slots[*idx];
            if !words.iter().any(|w| checker.fits(slot, w, &self.base.grid)) {
                debug!(
                    "forward check failed: slot {} {} has no remaining candidate",
                    slot.number, slot.direction
                );
                return false;
            }
        }

        true
    }
}
