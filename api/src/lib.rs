//! Interface layer over the crossword engine: the JSON request/response
//! shapes of the external surface, input validation, and the
//! generate/solve/suggest entry points an HTTP handler would call.

pub mod error;
pub mod generate;
pub mod solve;
pub mod suggest;

pub use error::ApiError;
pub use generate::{
    Difficulty, GenerateRequest, GenerateResponse, GenerateStats, generate, generate_with_rng,
};
pub use solve::{SolveDetails, SolveRequest, SolveResponse, SolveResponseMetrics, solve};
pub use suggest::{by_pattern, exact_clue, suggest};
