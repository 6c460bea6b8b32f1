//! Script normalization and segmentation.
//!
//! Generated scripts arrive interleaved with commentary, markdown emphasis
//! and blank lines. Only lines of the form `speaker: utterance` (ASCII or
//! full-width colon) are dialogue; everything else is dropped before the
//! text is cut into service-sized segments.

use serde::{Deserialize, Serialize};

/// Speaker separators recognized in dialogue lines.
const SEPARATORS: [char; 2] = [':', '：'];

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DialogueLine {
    pub speaker: String,
    pub text: String,
}

impl DialogueLine {
    /// Parses `<label><colon><utterance>`. Returns `None` for anything else;
    /// non-matching lines are discarded, never mutated.
    pub fn parse(line: &str) -> Option<Self> {
        let trimmed = line.trim();
        let idx = trimmed.find(SEPARATORS)?;
        if idx == 0 {
            return None;
        }
        let sep_len = trimmed[idx..]
            .chars()
            .next()
            .map(char::len_utf8)
            .unwrap_or(1);
        Some(Self {
            speaker: trimmed[..idx].trim().to_owned(),
            text: trimmed[idx + sep_len..].trim().to_owned(),
        })
    }
}

/// A bounded slice of dialogue sent to the synthesis service in one call.
///
/// `index` defines assembly order and is the only ordering guarantee in the
/// pipeline. The text keeps one trailing newline per line.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Segment {
    pub index: usize,
    pub text: String,
}

impl Segment {
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Strips emphasis markers, keeps dialogue lines in their original order and
/// rejoins them with line breaks. Empty or fully non-matching input yields
/// the empty string.
pub fn normalize(raw: &str) -> String {
    raw.replace('*', "")
        .lines()
        .map(str::trim)
        .filter(|line| DialogueLine::parse(line).is_some())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Cuts normalized dialogue into segments of at most `budget` characters.
///
/// The budget is soft: it only applies across line boundaries. A single line
/// longer than the budget is emitted alone as an oversized segment rather
/// than split mid-line. Concatenating all segment texts in index order
/// reproduces the input line-for-line.
pub fn split_segments(dialogue: &str, budget: usize) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut current_chars = 0usize;

    for line in dialogue.lines() {
        let line_chars = line.chars().count() + 1; // rendered with trailing newline
        if !current.is_empty() && current_chars + line_chars > budget {
            segments.push(Segment {
                index: segments.len(),
                text: std::mem::take(&mut current),
            });
            current_chars = 0;
        }
        current.push_str(line);
        current.push('\n');
        current_chars += line_chars;
    }

    if !current.is_empty() {
        segments.push(Segment {
            index: segments.len(),
            text: current,
        });
    }

    segments
}
