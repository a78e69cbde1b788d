//! Run the three solvers against a tiny cross and print their JSON
//! responses.
//!
//! ```sh
//! RUST_LOG=debug cargo run -p crosshatch-api --example solve_demo
//! ```

use crosshatch_api::{SolveRequest, solve};
use crosshatch_core::Lexicon;
use serde_json::json;

fn main() {
    env_logger::init();

    let lexicon = Lexicon::from_entries([
        ("CAT", "Feline pet"),
        ("CAR", "Road vehicle"),
        ("DOG", "Canine pet"),
        ("TEA", "Brewed drink"),
    ]);

    for algorithm in ["DFS", "A*", "HYBRID"] {
        let request: SolveRequest = serde_json::from_value(json!({
            "grid": [[".", ".", "."], [".", ".", "."], [".", ".", "."]],
            "clues": {
                "across": [{"number": 2, "x": 0, "y": 1, "length": 3, "clue": "Road vehicle"}],
                "down": [{"number": 1, "x": 1, "y": 0, "length": 3, "clue": "Feline pet"}]
            },
            "algorithm": algorithm
        }))
        .expect("request shape is valid");

        match solve(&lexicon, request) {
            Ok(response) => {
                println!("{}", serde_json::to_string_pretty(&response).expect("serializable"));
            }
            Err(err) => eprintln!("{algorithm} failed: {err}"),
        }
    }
}
