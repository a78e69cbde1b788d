use serde::{Deserialize, Serialize};

/// One numbered clue as it travels over the wire: origin cell, run length,
/// prompt text and (optionally) the intended answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clue {
    pub number: u32,
    pub x: usize,
    pub y: usize,
    pub length: usize,
    pub clue: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClueList {
    #[serde(default)]
    pub across: Vec<Clue>,
    #[serde(default)]
    pub down: Vec<Clue>,
}

impl ClueList {
    pub fn len(&self) -> usize {
        self.across.len() + self.down.len()
    }

    pub fn is_empty(&self) -> bool {
        self.across.is_empty() && self.down.is_empty()
    }
}
