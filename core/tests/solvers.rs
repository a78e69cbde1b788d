//! End-to-end solver scenarios shared by all three algorithms.

use crosshatch_core::solver::{astar::AStarSolver, dfs::DfsSolver, hybrid::HybridSolver};
use crosshatch_core::{Algorithm, Clue, ClueList, Grid, Lexicon, SolveStatus, solve};

fn grid(rows: &[&str]) -> Grid {
    let rows: Vec<Vec<char>> = rows.iter().map(|r| r.chars().collect()).collect();
    Grid::from_rows(&rows).unwrap()
}

fn clue(number: u32, x: usize, y: usize, length: usize, text: &str) -> Clue {
    Clue {
        number,
        x,
        y,
        length,
        clue: text.into(),
        answer: None,
    }
}

fn lexicon() -> Lexicon {
    Lexicon::from_entries([
        ("CAT", "Feline pet"),
        ("CAR", "Road vehicle"),
        ("CUT", "Make an incision"),
        ("DOG", "Canine pet"),
        ("TEA", "Brewed drink"),
    ])
}

#[test]
fn test_single_slot_exact_clue_all_algorithms() {
    let lexicon = lexicon();
    let clues = ClueList {
        across: vec![clue(1, 0, 0, 3, "Feline pet")],
        down: vec![],
    };

    for algorithm in [Algorithm::Dfs, Algorithm::AStar, Algorithm::Hybrid] {
        let outcome = solve(&lexicon, algorithm, grid(&["..."]), &clues, false);
        assert_eq!(outcome.status, SolveStatus::Success, "{algorithm} failed");
        assert_eq!(outcome.words_placed, 1);
        assert_eq!(outcome.total_words, 1);
        let row: String = outcome.grid.rows().next().unwrap().iter().collect();
        assert_eq!(row, "CAT", "{algorithm} placed the wrong word");
    }
}

fn cross_clues() -> ClueList {
    ClueList {
        across: vec![clue(2, 0, 1, 3, "Road vehicle")],
        down: vec![clue(1, 1, 0, 3, "Feline pet")],
    }
}

#[test]
fn test_dfs_fills_cross_consistently() {
    let lexicon = lexicon();
    let outcome = DfsSolver::new(&lexicon, grid(&["...", "...", "..."]), &cross_clues(), false)
        .solve();

    assert_eq!(outcome.status, SolveStatus::Success);
    assert_eq!(outcome.words_placed, 2);

    // CAR across, CAT down, sharing the A at (1, 1).
    assert_eq!(outcome.grid.at(0, 1), 'C');
    assert_eq!(outcome.grid.at(1, 1), 'A');
    assert_eq!(outcome.grid.at(2, 1), 'R');
    assert_eq!(outcome.grid.at(1, 0), 'C');
    assert_eq!(outcome.grid.at(1, 2), 'T');
}

#[test]
fn test_all_algorithms_agree_on_totals() {
    let lexicon = lexicon();
    let input = grid(&["...", "...", "..."]);
    let clues = cross_clues();

    let outcomes = [
        solve(&lexicon, Algorithm::Dfs, input.clone(), &clues, false),
        solve(&lexicon, Algorithm::AStar, input.clone(), &clues, false),
        solve(&lexicon, Algorithm::Hybrid, input.clone(), &clues, false),
    ];

    for outcome in &outcomes {
        assert_eq!(outcome.total_words, 2);
        assert_eq!(outcome.status, SolveStatus::Success);
        // Intersection consistency at the shared cell.
        assert_eq!(outcome.grid.at(1, 1), 'A');
    }
}

#[test]
fn test_prefilled_letters_are_respected() {
    let lexicon = lexicon();
    let clues = ClueList {
        across: vec![clue(1, 0, 0, 3, "Feline pet")],
        down: vec![],
    };
    let outcome = DfsSolver::new(&lexicon, grid(&["C.."]), &clues, false).solve();

    assert_eq!(outcome.status, SolveStatus::Success);
    let row: String = outcome.grid.rows().next().unwrap().iter().collect();
    assert_eq!(row, "CAT");
}

#[test]
fn test_unsatisfiable_slot_returns_partial() {
    // No four-letter word exists in this lexicon and the clue matches
    // nothing, so every fallback tier comes up dry.
    let lexicon = lexicon();
    let clues = ClueList {
        across: vec![clue(1, 0, 0, 4, "qqfxzj wvvk")],
        down: vec![],
    };

    for algorithm in [Algorithm::Dfs, Algorithm::AStar, Algorithm::Hybrid] {
        let outcome = solve(&lexicon, algorithm, grid(&["...."]), &clues, false);
        assert_eq!(outcome.status, SolveStatus::Partial, "{algorithm}");
        assert!(outcome.words_placed < outcome.total_words);
        assert!(
            outcome.metrics.fallback_usage_count >= 1,
            "{algorithm} never engaged the fallback cascade"
        );
        // Nothing was committed, so the emitted grid is still empty.
        assert_eq!(outcome.grid.at(0, 0), '.');
    }
}

#[test]
fn test_hybrid_counters() {
    let lexicon = lexicon();

    // Straightforward solve: phase 1 finishes, no mode switch.
    let solved = HybridSolver::new(
        &lexicon,
        grid(&["...", "...", "..."]),
        &cross_clues(),
        false,
    )
    .solve();
    let counters = solved.metrics.hybrid.expect("hybrid counters");
    assert_eq!(counters.mode_switches, 0);
    assert!(counters.astar_expansions >= 1);

    // Unsatisfiable: the beam stalls and DFS takes over.
    let clues = ClueList {
        across: vec![clue(1, 0, 0, 4, "qqfxzj wvvk")],
        down: vec![],
    };
    let stuck = HybridSolver::new(&lexicon, grid(&["...."]), &clues, false).solve();
    let counters = stuck.metrics.hybrid.expect("hybrid counters");
    assert_eq!(counters.mode_switches, 1);
    assert!(counters.dfs_backtracks >= 1);
}

#[test]
fn test_already_solved_grid_is_success() {
    let lexicon = lexicon();
    let outcome = solve(
        &lexicon,
        Algorithm::Dfs,
        grid(&["CAT"]),
        &ClueList {
            across: vec![clue(1, 0, 0, 3, "Feline pet")],
            down: vec![],
        },
        false,
    );
    // The slot is fully committed, so there is nothing left to search.
    assert_eq!(outcome.status, SolveStatus::Success);
    assert_eq!(outcome.total_words, 0);
}

#[test]
fn test_memory_profiling_metrics() {
    let lexicon = lexicon();
    let outcome = AStarSolver::new(
        &lexicon,
        grid(&["...", "...", "..."]),
        &cross_clues(),
        true,
    )
    .solve();

    assert!(outcome.metrics.memory_profiling_enabled);
    assert!(outcome.metrics.peak_memory_kb >= outcome.metrics.min_memory_kb);
    assert!(outcome.metrics.execution_time >= 0.0);

    let unprofiled = AStarSolver::new(
        &lexicon,
        grid(&["...", "...", "..."]),
        &cross_clues(),
        false,
    )
    .solve();
    assert_eq!(unprofiled.metrics.peak_memory_kb, 0.0);
}

#[test]
fn test_algorithm_parsing() {
    use std::str::FromStr;

    assert_eq!(Algorithm::from_str("dfs").unwrap(), Algorithm::Dfs);
    assert_eq!(Algorithm::from_str("A*").unwrap(), Algorithm::AStar);
    assert_eq!(Algorithm::from_str("Hybrid").unwrap(), Algorithm::Hybrid);
    assert!(Algorithm::from_str("BFS").is_err());
    assert_eq!(Algorithm::Hybrid.to_string(), "HYBRID");
}
