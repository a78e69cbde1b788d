use thiserror::Error;

/// Failures surfaced to the caller. Bad inputs fail immediately; search
/// exhaustion never lands here, it comes back as a `partial` solve response.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("missing grid")]
    MissingGrid,
    #[error("missing clues")]
    MissingClues,
    #[error("size must be between {min} and {max}, got {got}")]
    SizeOutOfRange { min: usize, max: usize, got: usize },
    #[error("invalid algorithm: {0}")]
    UnknownAlgorithm(String),
    #[error("difficulty must be easy, medium, or hard, got {0:?}")]
    UnknownDifficulty(String),
    #[error("no suitable initial words of length {0}")]
    NoSeed(usize),
    #[error("failed to generate any valid puzzle")]
    GenerationFailed,
}
