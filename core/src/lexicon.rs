//! Clued word list with length/letter/pattern/fuzzy lookup.
//!
//! The lexicon is built once at startup, indexed three ways (by length, by
//! first letter, by word) and read-only afterwards, so it can be shared
//! freely between the generator and the solvers.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

/// Shortest word admitted into the lexicon.
pub const MIN_WORD_LEN: usize = 2;
/// Longest word admitted into the lexicon.
pub const MAX_WORD_LEN: usize = 15;

/// Scrabble-style per-letter weights, A..Z.
const LETTER_SCORES: [i32; 26] = [
    1, 3, 3, 2, 1, 4, 2, 4, 1, 8, 5, 1, 3, 1, 1, 3, 10, 1, 1, 1, 1, 4, 4, 8, 4, 10,
];

/// English letter frequency (percent), A..Z.
const LETTER_FREQUENCY: [f64; 26] = [
    8.2, 1.5, 2.8, 4.3, 12.7, 2.2, 2.0, 6.1, 7.0, 0.15, 0.77, 4.0, 2.4, 6.7, 7.5, 1.9, 0.095,
    6.0, 6.3, 9.1, 2.8, 0.98, 2.4, 0.15, 2.0, 0.074,
];

/// A normalized dictionary entry: uppercase word, its primary clue, the
/// aggregate of all definitions, and a precomputed quality score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LexiconEntry {
    pub word: String,
    pub clue: String,
    pub definition: String,
    pub length: usize,
    pub score: i32,
}

#[derive(Debug, thiserror::Error)]
pub enum LexiconError {
    #[error("failed to read corpus directory: {0}")]
    Io(#[from] std::io::Error),
}

/// Raw corpus record shape; unknown fields are ignored, missing ones
/// tolerated. Normalization happens once at load time.
#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(default)]
    word: Option<String>,
    #[serde(default)]
    meanings: Option<Vec<RawMeaning>>,
}

#[derive(Debug, Deserialize)]
struct RawMeaning {
    #[serde(default)]
    def: Option<String>,
}

#[derive(Debug, Default)]
pub struct Lexicon {
    entries: Vec<LexiconEntry>,
    by_length: HashMap<usize, Vec<usize>>,
    by_first: HashMap<char, Vec<usize>>,
    by_word: HashMap<String, usize>,
    /// Lowercased clue -> first entry carrying it, for exact-clue lookup.
    by_clue: HashMap<String, usize>,
}

/// Deterministic word quality score: letter weights, +2 per interior vowel,
/// -3 when more than half the letters repeat, plus a first-letter rarity
/// bonus derived from English letter frequency. Never below 1.
pub fn word_score(word: &str) -> i32 {
    let upper = word.to_ascii_uppercase();
    let bytes = upper.as_bytes();
    if bytes.is_empty() {
        return 1;
    }

    let mut score: i32 = bytes
        .iter()
        .filter(|b| b.is_ascii_uppercase())
        .map(|&b| LETTER_SCORES[(b - b'A') as usize])
        .sum();

    for i in 1..bytes.len().saturating_sub(1) {
        if matches!(bytes[i], b'A' | b'E' | b'I' | b'O' | b'U') {
            score += 2;
        }
    }

    let unique: HashSet<u8> = bytes.iter().copied().collect();
    if unique.len() * 2 < bytes.len() {
        score -= 3;
    }

    if bytes[0].is_ascii_uppercase() {
        let freq = LETTER_FREQUENCY[(bytes[0] - b'A') as usize];
        score += (10.0 - freq * 0.5).max(1.0) as i32;
    }

    score.max(1)
}

fn is_valid_word(word: &str) -> bool {
    (MIN_WORD_LEN..=MAX_WORD_LEN).contains(&word.len())
        && word.chars().all(|c| c.is_ascii_alphabetic())
}

impl Lexicon {
    /// Load every `*.json` corpus file under `dir`. Malformed files and
    /// entries are logged and skipped; only the directory read itself can
    /// fail.
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self, LexiconError> {
        let mut lexicon = Self::default();

        let mut paths: Vec<_> = fs::read_dir(dir)?
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();

        for path in paths {
            let text = match fs::read_to_string(&path) {
                Ok(text) => text,
                Err(err) => {
                    warn!("skipping unreadable corpus file {}: {err}", path.display());
                    continue;
                }
            };
            let records: serde_json::Map<String, serde_json::Value> =
                match serde_json::from_str(&text) {
                    Ok(map) => map,
                    Err(err) => {
                        warn!("skipping malformed corpus file {}: {err}", path.display());
                        continue;
                    }
                };

            for (key, value) in records {
                match serde_json::from_value::<RawRecord>(value) {
                    Ok(record) => lexicon.insert_record(&key, record),
                    Err(err) => debug!("skipping corpus entry {key}: {err}"),
                }
            }
        }

        info!("lexicon loaded: {} valid crossword words", lexicon.len());
        Ok(lexicon)
    }

    /// Build a lexicon from `(word, clue)` pairs. Invalid words are skipped
    /// the same way corpus loading skips them.
    pub fn from_entries<W, C>(pairs: impl IntoIterator<Item = (W, C)>) -> Self
    where
        W: Into<String>,
        C: Into<String>,
    {
        let mut lexicon = Self::default();
        for (word, clue) in pairs {
            let word = word.into().to_ascii_uppercase();
            if !is_valid_word(&word) {
                debug!("skipping invalid word {word:?}");
                continue;
            }
            let clue = clue.into();
            let definition = clue.clone();
            lexicon.insert(word, clue, definition);
        }
        lexicon
    }

    fn insert_record(&mut self, key: &str, record: RawRecord) {
        let word = record
            .word
            .as_deref()
            .unwrap_or(key)
            .to_ascii_uppercase();
        if word.contains(' ') || !is_valid_word(&word) {
            return;
        }

        let stub = format!("Definition related to {word}");
        let (clue, definition) = match &record.meanings {
            Some(meanings) => {
                let clue = meanings
                    .first()
                    .and_then(|m| m.def.clone())
                    .unwrap_or_else(|| stub.clone());
                let defs: Vec<&str> = meanings.iter().filter_map(|m| m.def.as_deref()).collect();
                (clue, defs.join("; "))
            }
            None => (stub.clone(), stub),
        };

        self.insert(word, clue, definition);
    }

    fn insert(&mut self, word: String, clue: String, definition: String) {
        let id = self.entries.len();
        let first = word.chars().next().unwrap_or('?');
        self.by_length.entry(word.len()).or_default().push(id);
        self.by_first.entry(first).or_default().push(id);
        self.by_word.insert(word.clone(), id);
        self.by_clue.entry(clue.to_lowercase()).or_insert(id);
        self.entries.push(LexiconEntry {
            length: word.len(),
            score: word_score(&word),
            word,
            clue,
            definition,
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &LexiconEntry> {
        self.entries.iter()
    }

    pub fn count_by_length(&self, length: usize) -> usize {
        self.by_length.get(&length).map_or(0, Vec::len)
    }

    /// Words of a given length. When `limit` is below the bucket size the
    /// selection samples diversely across first letters: the highest-scored
    /// words of each letter first, topped up from the global score order.
    pub fn by_length(&self, length: usize, limit: Option<usize>) -> Vec<&LexiconEntry> {
        let Some(bucket) = self.by_length.get(&length) else {
            return Vec::new();
        };
        let Some(limit) = limit.filter(|&limit| bucket.len() > limit) else {
            return bucket.iter().map(|&id| &self.entries[id]).collect();
        };

        // Group by first letter, preserving the order letters first appear.
        let mut groups: Vec<(char, Vec<usize>)> = Vec::new();
        let mut group_pos: HashMap<char, usize> = HashMap::new();
        for &id in bucket {
            let first = self.entries[id].word.chars().next().unwrap_or('?');
            let pos = *group_pos.entry(first).or_insert_with(|| {
                groups.push((first, Vec::new()));
                groups.len() - 1
            });
            groups[pos].1.push(id);
        }

        let per_letter = (limit / groups.len()).max(1);
        let mut selected: Vec<usize> = Vec::new();
        let mut taken: HashSet<usize> = HashSet::new();
        for (_, ids) in &mut groups {
            ids.sort_by_key(|&id| std::cmp::Reverse(self.entries[id].score));
            for &id in ids.iter().take(per_letter) {
                selected.push(id);
                taken.insert(id);
            }
        }

        if selected.len() < limit {
            let mut by_score: Vec<usize> = bucket.clone();
            by_score.sort_by_key(|&id| std::cmp::Reverse(self.entries[id].score));
            for id in by_score {
                if selected.len() >= limit {
                    break;
                }
                if taken.insert(id) {
                    selected.push(id);
                }
            }
        }

        selected.truncate(limit);
        selected.into_iter().map(|id| &self.entries[id]).collect()
    }

    pub fn by_first_letter(&self, letter: char, limit: Option<usize>) -> Vec<&LexiconEntry> {
        let letter = letter.to_ascii_uppercase();
        let Some(bucket) = self.by_first.get(&letter) else {
            return Vec::new();
        };
        let take = limit.unwrap_or(bucket.len());
        bucket
            .iter()
            .take(take)
            .map(|&id| &self.entries[id])
            .collect()
    }

    /// Case-insensitive full-clue match; first entry in insertion order.
    pub fn exact_clue(&self, clue: &str) -> Option<&LexiconEntry> {
        self.by_clue
            .get(&clue.to_lowercase())
            .map(|&id| &self.entries[id])
    }

    /// Candidate words for a clue: the exact-clue hit first (if any), then
    /// every entry whose clue contains `clue` as a substring, within the
    /// inclusive `length_range` when given. Stops at `limit`.
    pub fn possible_words(
        &self,
        clue: &str,
        limit: usize,
        length_range: Option<(usize, usize)>,
    ) -> Vec<&LexiconEntry> {
        let clue_lower = clue.to_lowercase();
        let mut results: Vec<&LexiconEntry> = Vec::new();

        let exact = self.by_clue.get(&clue_lower).copied();
        if let Some(id) = exact {
            results.push(&self.entries[id]);
        }

        for (id, entry) in self.entries.iter().enumerate() {
            if results.len() >= limit {
                break;
            }
            if Some(id) == exact {
                continue;
            }
            if !entry.clue.to_lowercase().contains(&clue_lower) {
                continue;
            }
            if let Some((min, max)) = length_range {
                if entry.length < min || entry.length > max {
                    continue;
                }
            }
            results.push(entry);
        }

        results.truncate(limit);
        results
    }

    /// Words matching a positional pattern where `.` is a wildcard. The
    /// search is confined to the length-`pattern.len()` bucket; an optional
    /// clue additionally filters by substring containment.
    pub fn by_pattern(
        &self,
        pattern: &str,
        clue: Option<&str>,
        limit: usize,
    ) -> Vec<&LexiconEntry> {
        let pattern: Vec<char> = pattern.to_ascii_uppercase().chars().collect();
        let clue_lower = clue.map(str::to_lowercase);
        let mut results = Vec::new();

        for entry in self.by_length(pattern.len(), None) {
            let matches = entry
                .word
                .chars()
                .zip(&pattern)
                .all(|(w, &p)| p == '.' || p == w);
            if !matches {
                continue;
            }
            if let Some(needle) = &clue_lower {
                if !entry.clue.to_lowercase().contains(needle) {
                    continue;
                }
            }
            results.push(entry);
            if results.len() >= limit {
                break;
            }
        }

        results
    }

    /// The stored entry for a word, or a synthetic stub when absent.
    pub fn clue_for_word(&self, word: &str) -> LexiconEntry {
        let upper = word.to_ascii_uppercase();
        if let Some(&id) = self.by_word.get(&upper) {
            return self.entries[id].clone();
        }
        let stub = format!("Definition related to {upper}");
        LexiconEntry {
            length: upper.len(),
            score: word_score(&upper),
            word: upper,
            clue: stub.clone(),
            definition: stub,
        }
    }

    /// Fuzzy fallback for a clue that matched nothing directly: nearby-length
    /// entries with a similar clue, then exact-length entries sharing the
    /// clue's first token, then plain length lookup.
    pub fn alternative_spellings(
        &self,
        clue: &str,
        length: usize,
        limit: usize,
    ) -> Vec<&LexiconEntry> {
        let clue_lower = clue.to_lowercase();
        let mut results: Vec<&LexiconEntry> = Vec::new();

        for entry in &self.entries {
            if entry.length.abs_diff(length) > 1 {
                continue;
            }
            if strsim::normalized_levenshtein(&clue_lower, &entry.clue.to_lowercase()) > 0.6 {
                results.push(entry);
                if results.len() >= limit {
                    break;
                }
            }
        }

        if results.is_empty() {
            if let Some(token) = clue_lower.split_whitespace().next() {
                for entry in &self.entries {
                    if entry.length == length && entry.clue.to_lowercase().contains(token) {
                        results.push(entry);
                        if results.len() >= limit {
                            break;
                        }
                    }
                }
            }
        }

        if results.is_empty() {
            debug!("no fuzzy matches for {clue:?}, falling back to length {length}");
            return self.by_length(length, Some(limit));
        }

        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Lexicon {
        Lexicon::from_entries([
            ("CAT", "Feline pet"),
            ("CUT", "Make an incision"),
            ("COT", "Portable bed"),
            ("CATS", "Feline pets"),
            ("DOG", "Canine pet"),
            ("DIG", "Excavate"),
            ("TEA", "Brewed drink"),
        ])
    }

    #[test]
    fn test_word_score_deterministic() {
        // C(3) + A(1) + T(1), +2 interior vowel, +trunc(10 - 2.8 * 0.5) = 15
        assert_eq!(word_score("CAT"), 15);
        assert_eq!(word_score("cat"), 15);
        // A(1) + A(1), no interior, no repeat penalty (1 * 2 == 2), +trunc(5.9)
        assert_eq!(word_score("AA"), 7);
    }

    #[test]
    fn test_word_score_repeat_penalty() {
        // M(3) + A(1) + M(3) + A(1) + M(3), +4 interior vowels, unique 2 * 2 < 5
        // so -3, +trunc(10 - 2.4 * 0.5) = 8
        assert_eq!(word_score("MAMAM"), 20);
    }

    #[test]
    fn test_from_entries_rejects_invalid() {
        let lexicon = Lexicon::from_entries([
            ("OK", "fine"),
            ("A", "too short"),
            ("SIXTEENLETTERSXX", "too long"),
            ("NO GOOD", "has a space"),
            ("NUM3ER", "has a digit"),
        ]);
        assert_eq!(lexicon.len(), 1);
    }

    #[test]
    fn test_index_membership() {
        let lexicon = sample();
        for entry in lexicon.entries() {
            assert!(
                lexicon
                    .by_length(entry.length, None)
                    .iter()
                    .any(|e| e.word == entry.word)
            );
            let first = entry.word.chars().next().unwrap();
            assert!(
                lexicon
                    .by_first_letter(first, None)
                    .iter()
                    .any(|e| e.word == entry.word)
            );
        }
    }

    #[test]
    fn test_by_length_diverse_sampling() {
        let lexicon = sample();
        // Bucket {CAT, CUT, COT, DOG, DIG, TEA} with limit 3: one per first
        // letter before any top-up.
        let picked = lexicon.by_length(3, Some(3));
        assert_eq!(picked.len(), 3);
        let firsts: HashSet<char> = picked
            .iter()
            .map(|e| e.word.chars().next().unwrap())
            .collect();
        assert_eq!(firsts.len(), 3);
    }

    #[test]
    fn test_exact_clue_case_insensitive() {
        let lexicon = sample();
        let entry = lexicon.exact_clue("FELINE PET").unwrap();
        assert_eq!(entry.word, "CAT");
        assert!(lexicon.exact_clue("no such clue").is_none());
    }

    #[test]
    fn test_possible_words_substring_and_range() {
        let lexicon = sample();
        let words: Vec<&str> = lexicon
            .possible_words("pet", 10, None)
            .iter()
            .map(|e| e.word.as_str())
            .collect();
        assert_eq!(words, vec!["CAT", "CATS", "DOG"]);

        let words: Vec<&str> = lexicon
            .possible_words("pet", 10, Some((3, 3)))
            .iter()
            .map(|e| e.word.as_str())
            .collect();
        assert_eq!(words, vec!["CAT", "DOG"]);
    }

    #[test]
    fn test_possible_words_exact_hit_first() {
        let lexicon = sample();
        let words: Vec<&str> = lexicon
            .possible_words("Canine pet", 10, None)
            .iter()
            .map(|e| e.word.as_str())
            .collect();
        assert_eq!(words, vec!["DOG"]);
    }

    #[test]
    fn test_by_pattern() {
        let lexicon = sample();
        let words: Vec<&str> = lexicon
            .by_pattern("C.T", None, 50)
            .iter()
            .map(|e| e.word.as_str())
            .collect();
        assert_eq!(words, vec!["CAT", "CUT", "COT"]);

        // Wildcards only: the whole length bucket.
        assert_eq!(lexicon.by_pattern("...", None, 100).len(), 6);
        // Pattern results are a subset of the length bucket.
        assert!(lexicon.by_pattern("C.TS", None, 100).len() <= lexicon.count_by_length(4));

        let words: Vec<&str> = lexicon
            .by_pattern("C.T", Some("bed"), 50)
            .iter()
            .map(|e| e.word.as_str())
            .collect();
        assert_eq!(words, vec!["COT"]);
    }

    #[test]
    fn test_clue_for_word_stub() {
        let lexicon = sample();
        assert_eq!(lexicon.clue_for_word("cat").clue, "Feline pet");

        let stub = lexicon.clue_for_word("ZAX");
        assert_eq!(stub.clue, "Definition related to ZAX");
        assert_eq!(stub.score, word_score("ZAX"));
    }

    #[test]
    fn test_alternative_spellings_tiers() {
        let lexicon = sample();

        // Similar clue, length within one.
        let close = lexicon.alternative_spellings("Feline pets!", 3, 10);
        assert!(close.iter().any(|e| e.word == "CATS"));

        // No similar clue: falls back to first-token containment.
        let token = lexicon.alternative_spellings("Brewed overnight perhaps", 3, 10);
        assert_eq!(token.len(), 1);
        assert_eq!(token[0].word, "TEA");

        // Nothing at all: plain length lookup.
        let length_only = lexicon.alternative_spellings("xyzzy plugh", 4, 10);
        assert_eq!(length_only.len(), 1);
        assert_eq!(length_only[0].word, "CATS");
    }

    #[test]
    fn test_load_dir_skips_bad_entries() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("words.json"),
            r#"{
                "cat": {"word": "cat", "meanings": [{"def": "Feline pet", "pos": "n"}, {"def": "Jazz musician"}]},
                "two words": {"word": "two words", "meanings": [{"def": "invalid"}]},
                "x": {"word": "x", "meanings": [{"def": "too short"}]},
                "dog": {"meanings": [{"def": "Canine pet"}]},
                "eel": {"word": "eel"}
            }"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("broken.json"), "not json at all").unwrap();
        std::fs::write(dir.path().join("ignored.txt"), "not a corpus file").unwrap();

        let lexicon = Lexicon::load_dir(dir.path()).unwrap();
        assert_eq!(lexicon.len(), 3);

        let cat = lexicon.clue_for_word("CAT");
        assert_eq!(cat.clue, "Feline pet");
        assert_eq!(cat.definition, "Feline pet; Jazz musician");

        // Key used when the record has no word field.
        assert_eq!(lexicon.clue_for_word("DOG").clue, "Canine pet");
        // No meanings at all: synthetic stub.
        assert_eq!(lexicon.clue_for_word("EEL").clue, "Definition related to EEL");
    }
}
