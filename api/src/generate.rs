//! Generation orchestration: difficulty calibration, the retry loop with
//! density-band selection, and response assembly.

use std::str::FromStr;

use log::{info, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crosshatch_core::{
    ClueList, CrosswordGenerator, Grid, Lexicon, Puzzle, RankedWord, extract_slots,
};

use crate::error::ApiError;

pub const MIN_SIZE: usize = 7;
pub const MAX_SIZE: usize = 21;
const GENERATION_TRIES: usize = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(other.to_string()),
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "easy"),
            Difficulty::Medium => write!(f, "medium"),
            Difficulty::Hard => write!(f, "hard"),
        }
    }
}

/// Per-difficulty tuning: target density band, word length window, per-try
/// expansion attempts, and the word-count multiplier over `size * 1.5`.
#[derive(Debug, Clone, Copy)]
struct Calibration {
    density: (f64, f64),
    min_word_length: usize,
    max_word_length: usize,
    max_attempts: usize,
    word_count_multiplier: f64,
}

fn calibration(difficulty: Difficulty, size: usize) -> Calibration {
    match difficulty {
        Difficulty::Easy => Calibration {
            density: (0.35, 0.50),
            min_word_length: 3.max(size / 3),
            max_word_length: 12.min(size),
            max_attempts: 3,
            word_count_multiplier: 0.7,
        },
        Difficulty::Medium => Calibration {
            density: (0.60, 0.69),
            min_word_length: 3.max(size / 4),
            max_word_length: 10.min(size),
            max_attempts: 4,
            word_count_multiplier: 1.0,
        },
        Difficulty::Hard => Calibration {
            density: (0.80, 1.00),
            min_word_length: 3,
            max_word_length: size,
            max_attempts: 5,
            word_count_multiplier: 1.3,
        },
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerateRequest {
    #[serde(default = "default_size")]
    pub size: usize,
    #[serde(default = "default_difficulty")]
    pub difficulty: String,
}

fn default_size() -> usize {
    15
}

fn default_difficulty() -> String {
    "medium".to_string()
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerateResponse {
    pub success: bool,
    pub grid: Grid,
    /// Display grid: letters erased, slot origin cells carrying their clue
    /// number as a string.
    pub empty_grid: Vec<Vec<String>>,
    pub clues: ClueList,
    pub stats: GenerateStats,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerateStats {
    pub word_count: usize,
    pub difficulty: Difficulty,
    pub size: usize,
    pub density: f64,
    pub used_fallback: bool,
}

/// Generate a puzzle with a fresh entropy-seeded RNG.
pub fn generate(lexicon: &Lexicon, request: GenerateRequest) -> Result<GenerateResponse, ApiError> {
    generate_with_rng(lexicon, request, StdRng::from_entropy())
}

/// Generate with an injected RNG so callers and tests can pin seeds.
///
/// Runs up to 15 tries, each with a freshly sampled word list and seed word,
/// and keeps the densest puzzle seen. A try whose density lands inside the
/// difficulty band wins immediately; otherwise the densest attempt is
/// returned with `used_fallback` set.
pub fn generate_with_rng<R: Rng>(
    lexicon: &Lexicon,
    request: GenerateRequest,
    mut rng: R,
) -> Result<GenerateResponse, ApiError> {
    let size = request.size;
    if !(MIN_SIZE..=MAX_SIZE).contains(&size) {
        return Err(ApiError::SizeOutOfRange {
            min: MIN_SIZE,
            max: MAX_SIZE,
            got: size,
        });
    }
    let difficulty: Difficulty = request
        .difficulty
        .parse()
        .map_err(ApiError::UnknownDifficulty)?;
    let tuning = calibration(difficulty, size);

    let target_word_count = (size as f64 * 1.5 * tuning.word_count_multiplier) as usize;

    let seed_length = rng.gen_range(tuning.min_word_length..=tuning.max_word_length.min(size / 2));
    let seed_words: Vec<RankedWord> = lexicon
        .by_length(seed_length, Some(100))
        .into_iter()
        .map(RankedWord::from)
        .collect();
    if seed_words.is_empty() {
        return Err(ApiError::NoSeed(seed_length));
    }

    let (min_density, max_density) = tuning.density;
    let mut best: Option<Puzzle> = None;
    let mut best_density = 0.0;
    let mut in_band: Option<Puzzle> = None;

    for attempt in 0..GENERATION_TRIES {
        info!(
            "generation attempt {}/{GENERATION_TRIES} [difficulty={difficulty}]",
            attempt + 1
        );

        let mut word_list: Vec<RankedWord> = Vec::new();
        let dynamic_max = tuning.max_word_length + attempt % 2;
        for length in tuning.min_word_length..=dynamic_max {
            let budget = target_word_count / 2 + rng.gen_range(0..=20);
            word_list.extend(
                lexicon
                    .by_length(length, Some(budget))
                    .into_iter()
                    .map(RankedWord::from),
            );
        }
        word_list.shuffle(&mut rng);

        let seed = seed_words[rng.gen_range(0..seed_words.len())].word.clone();

        let mut generator = CrosswordGenerator::with_rng(lexicon, size, size, &mut rng);
        let Some(puzzle) = generator.generate(Some(&seed), Some(word_list), tuning.max_attempts)
        else {
            continue;
        };

        let density = puzzle.density();
        if density > best_density {
            best_density = density;
            best = Some(puzzle.clone());
        }
        if (min_density..=max_density).contains(&density) {
            in_band = Some(puzzle);
            break;
        }
    }

    let used_fallback = in_band.is_none();
    let puzzle = in_band.or(best).ok_or(ApiError::GenerationFailed)?;
    let density = puzzle.density();

    if used_fallback {
        warn!(
            "using fallback puzzle with density {density:.2} (target {min_density:.2}-{max_density:.2})"
        );
    }
    info!(
        "generation successful: {} words, density {density:.2}",
        puzzle.word_count()
    );

    Ok(GenerateResponse {
        success: true,
        empty_grid: paint_numbers(&puzzle.grid),
        clues: puzzle.clues(lexicon),
        stats: GenerateStats {
            word_count: puzzle.word_count(),
            difficulty,
            size,
            density,
            used_fallback,
        },
        grid: puzzle.grid,
    })
}

/// The display grid, built as a fresh value: everything erased to `.`, slot
/// origin cells replaced by their clue number.
fn paint_numbers(grid: &Grid) -> Vec<Vec<String>> {
    let (across, down) = extract_slots(grid);
    let mut rows = vec![vec![".".to_string(); grid.width()]; grid.height()];
    for slot in across.iter().chain(&down) {
        rows[slot.y][slot.x] = slot.number.to_string();
    }
    rows
}
