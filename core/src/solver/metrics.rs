//! Performance and complexity instrumentation for the solvers.
//!
//! Memory numbers are estimates of solver-owned state (working grids, open
//! sets, caches) sampled at snapshot points, reported in KB. Sampling only
//! happens when profiling was requested; otherwise all memory fields stay
//! zero.

use std::time::Instant;

use log::debug;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct TimeComplexity {
    pub big_o: String,
    pub operations: u64,
    pub growth_rate: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SpaceComplexity {
    pub big_o: String,
    pub max_memory_kb: f64,
    pub growth_rate: f64,
}

/// Phase counters reported by the hybrid solver only.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct HybridCounters {
    pub astar_expansions: u32,
    pub dfs_backtracks: u32,
    pub mode_switches: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct SolveMetrics {
    pub execution_time: f64,
    pub memory_usage_kb: f64,
    pub min_memory_kb: f64,
    pub peak_memory_kb: f64,
    pub time_complexity: TimeComplexity,
    pub space_complexity: SpaceComplexity,
    pub fallback_usage_count: u32,
    pub memory_profiling_enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hybrid: Option<HybridCounters>,
}

/// Coarse operation counter with an order-of-growth classification.
#[derive(Debug)]
pub struct ComplexityTracker {
    operations: u64,
    start: Instant,
}

impl ComplexityTracker {
    fn new() -> Self {
        Self {
            operations: 0,
            start: Instant::now(),
        }
    }

    pub fn increment(&mut self, count: u64) {
        self.operations += count;
    }

    pub fn operations(&self) -> u64 {
        self.operations
    }

    fn time_complexity(&self) -> TimeComplexity {
        let elapsed = self.start.elapsed().as_secs_f64();
        let ops = self.operations;

        let big_o = if ops <= 1 {
            "O(1)"
        } else if (ops as f64) <= elapsed * 10.0 {
            "O(n)"
        } else if (ops as f64) <= elapsed * elapsed {
            "O(n^2)"
        } else {
            "O(n^3) or higher"
        };

        TimeComplexity {
            big_o: big_o.to_string(),
            operations: ops,
            growth_rate: if elapsed > 0.0 { ops as f64 / elapsed } else { 0.0 },
        }
    }
}

/// Per-solve tracker: wall time, memory samples, fallback usage, and the
/// operation counter. Owned by one solver instance and dies with it.
#[derive(Debug)]
pub struct PerfTracker {
    start: Instant,
    profiling: bool,
    samples: Vec<f64>,
    peak_kb: f64,
    fallback_count: u32,
    pub complexity: ComplexityTracker,
}

impl PerfTracker {
    pub fn new(profiling: bool) -> Self {
        Self {
            start: Instant::now(),
            profiling,
            samples: Vec::new(),
            peak_kb: 0.0,
            fallback_count: 0,
            complexity: ComplexityTracker::new(),
        }
    }

    pub fn profiling(&self) -> bool {
        self.profiling
    }

    /// Record an estimate of currently held solver state.
    pub fn record_memory(&mut self, label: &str, estimated_bytes: usize) {
        if !self.profiling {
            return;
        }
        let kb = estimated_bytes as f64 / 1024.0;
        self.samples.push(kb);
        if kb > self.peak_kb {
            self.peak_kb = kb;
        }
        debug!("[memory] {label}: current={kb:.2} KB, peak={:.2} KB", self.peak_kb);
    }

    pub fn note_fallback(&mut self) {
        self.fallback_count += 1;
    }

    pub fn fallback_count(&self) -> u32 {
        self.fallback_count
    }

    pub fn finish(&self) -> SolveMetrics {
        let (min_kb, avg_kb) = if self.samples.is_empty() {
            (0.0, 0.0)
        } else {
            let min = self.samples.iter().copied().fold(f64::INFINITY, f64::min);
            let avg = self.samples.iter().sum::<f64>() / self.samples.len() as f64;
            (min, avg)
        };

        let space_big_o = if self.peak_kb <= 100.0 {
            "O(1)"
        } else if self.peak_kb <= 1000.0 {
            "O(n)"
        } else {
            "O(n^2) or higher"
        };

        SolveMetrics {
            execution_time: self.start.elapsed().as_secs_f64(),
            memory_usage_kb: avg_kb,
            min_memory_kb: min_kb,
            peak_memory_kb: self.peak_kb,
            time_complexity: self.complexity.time_complexity(),
            space_complexity: SpaceComplexity {
                big_o: space_big_o.to_string(),
                max_memory_kb: self.peak_kb,
                growth_rate: if self.samples.is_empty() {
                    0.0
                } else {
                    self.peak_kb / self.samples.len() as f64
                },
            },
            fallback_usage_count: self.fallback_count,
            memory_profiling_enabled: self.profiling,
            hybrid: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_profiling_reports_zero_memory() {
        let mut tracker = PerfTracker::new(false);
        tracker.record_memory("start", 4096);
        let metrics = tracker.finish();
        assert_eq!(metrics.peak_memory_kb, 0.0);
        assert_eq!(metrics.memory_usage_kb, 0.0);
        assert!(!metrics.memory_profiling_enabled);
    }

    #[test]
    fn test_memory_samples_aggregate() {
        let mut tracker = PerfTracker::new(true);
        tracker.record_memory("start", 1024);
        tracker.record_memory("mid", 3072);
        tracker.record_memory("end", 2048);
        let metrics = tracker.finish();
        assert_eq!(metrics.min_memory_kb, 1.0);
        assert_eq!(metrics.peak_memory_kb, 3.0);
        assert_eq!(metrics.memory_usage_kb, 2.0);
    }

    #[test]
    fn test_fallback_and_operations_counters() {
        let mut tracker = PerfTracker::new(false);
        tracker.note_fallback();
        tracker.note_fallback();
        tracker.complexity.increment(5);
        assert_eq!(tracker.fallback_count(), 2);
        assert_eq!(tracker.complexity.operations(), 5);
        let metrics = tracker.finish();
        assert_eq!(metrics.fallback_usage_count, 2);
        assert_eq!(metrics.time_complexity.operations, 5);
    }
}
