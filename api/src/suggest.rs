//! Query-surface mirrors: suggestions by clue, exact-clue lookup, and
//! pattern search.

use crosshatch_core::{Lexicon, LexiconEntry};

/// Words whose clue matches the given text, exact hit first.
pub fn suggest(lexicon: &Lexicon, clue: &str, max_words: usize) -> Vec<LexiconEntry> {
    lexicon
        .possible_words(clue, max_words, None)
        .into_iter()
        .cloned()
        .collect()
}

pub fn exact_clue(lexicon: &Lexicon, clue: &str) -> Option<LexiconEntry> {
    lexicon.exact_clue(clue).cloned()
}

/// Pattern search where `.` is a wildcard, e.g. `"C.T"`.
pub fn by_pattern(
    lexicon: &Lexicon,
    pattern: &str,
    clue: Option<&str>,
    max_words: usize,
) -> Vec<LexiconEntry> {
    lexicon
        .by_pattern(pattern, clue, max_words)
        .into_iter()
        .cloned()
        .collect()
}
