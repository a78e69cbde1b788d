//! Solve request/response shapes and solver dispatch.

use log::info;
use serde::{Deserialize, Serialize};

use crosshatch_core::solver::{SpaceComplexity, TimeComplexity};
use crosshatch_core::{Algorithm, ClueList, Grid, Lexicon, SolveStatus};

use crate::error::ApiError;

#[derive(Debug, Clone, Deserialize)]
pub struct SolveRequest {
    pub grid: Option<Grid>,
    pub clues: Option<ClueList>,
    #[serde(default = "default_algorithm")]
    pub algorithm: String,
    #[serde(default)]
    pub enable_memory_profiling: bool,
}

fn default_algorithm() -> String {
    "HYBRID".to_string()
}

#[derive(Debug, Clone, Serialize)]
pub struct SolveResponse {
    pub method: String,
    pub success: bool,
    pub solution: Grid,
    pub metrics: SolveResponseMetrics,
    pub details: SolveDetails,
}

#[derive(Debug, Clone, Serialize)]
pub struct SolveResponseMetrics {
    pub execution_time: String,
    pub memory_usage_kb: f64,
    pub min_memory_kb: f64,
    pub peak_memory_kb: f64,
    pub memory_profiling_enabled: bool,
    /// `placed/total`, e.g. `"12/14"`.
    pub words_placed: String,
    pub time_complexity: TimeComplexity,
    pub space_complexity: SpaceComplexity,
    pub fallback_usage_count: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct SolveDetails {
    pub status: SolveStatus,
    pub algorithm: String,
}

/// Validate a solve request and run the requested solver against the shared
/// lexicon.
pub fn solve(lexicon: &Lexicon, request: SolveRequest) -> Result<SolveResponse, ApiError> {
    let grid = request.grid.ok_or(ApiError::MissingGrid)?;
    let clues = request.clues.ok_or(ApiError::MissingClues)?;
    let algorithm: Algorithm = request
        .algorithm
        .parse()
        .map_err(ApiError::UnknownAlgorithm)?;

    info!(
        "solve request: algorithm={algorithm}, grid {}x{}",
        grid.width(),
        grid.height()
    );

    let outcome = crosshatch_core::solve(
        lexicon,
        algorithm,
        grid,
        &clues,
        request.enable_memory_profiling,
    );

    info!(
        "solve completed: algorithm={algorithm}, success={}, time={:.4}s",
        outcome.success(),
        outcome.metrics.execution_time
    );

    Ok(SolveResponse {
        method: algorithm.to_string(),
        success: outcome.success(),
        solution: outcome.grid,
        metrics: SolveResponseMetrics {
            execution_time: format!("{:.4}s", outcome.metrics.execution_time),
            memory_usage_kb: outcome.metrics.memory_usage_kb,
            min_memory_kb: outcome.metrics.min_memory_kb,
            peak_memory_kb: outcome.metrics.peak_memory_kb,
            memory_profiling_enabled: outcome.metrics.memory_profiling_enabled,
            words_placed: format!("{}/{}", outcome.words_placed, outcome.total_words),
            time_complexity: outcome.metrics.time_complexity,
            space_complexity: outcome.metrics.space_complexity,
            fallback_usage_count: outcome.metrics.fallback_usage_count,
        },
        details: SolveDetails {
            status: outcome.status,
            algorithm: algorithm.to_string(),
        },
    })
}
