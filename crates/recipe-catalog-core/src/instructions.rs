//! Free-text instruction splitting.
//!
//! Providers ship instructions as one blob. [`split_instructions`] turns it
//! into discrete steps, each within [`MAX_INSTRUCTION_LENGTH`] characters.
//!
//! # Algorithm
//!
//! 1. A digit within the first 10 characters means a numbered list: split on
//!    `\d+\.\s*` and keep non-empty trimmed fragments.
//! 2. Otherwise split on line breaks (CRLF and CR are folded to LF) and keep
//!    trimmed lines longer than 10 characters.
//! 3. Nothing survived: the whole trimmed text is one step. Blank text gives
//!    [`NO_INSTRUCTIONS`].
//! 4. Oversized steps are cut by [`split_long_step`] until every piece fits.
//!
//! Lengths are counted in characters, not bytes.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::MAX_INSTRUCTION_LENGTH;

/// Placeholder step for records without any instruction text.
pub const NO_INSTRUCTIONS: &str = "No instructions available";

/// How many leading characters are inspected for a step number.
const NUMBERED_PREFIX_WINDOW: usize = 10;
/// Lines this short (after trimming) are headings or noise, not steps.
const MIN_LINE_STEP_LENGTH: usize = 10;
/// How far back from the cut point a sentence terminator is searched for.
const SENTENCE_LOOKBACK: usize = 100;

static STEP_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+\.\s*").expect("static regex"));

pub fn split_instructions(text: &str) -> Vec<String> {
    split_instructions_with_limit(text, MAX_INSTRUCTION_LENGTH)
}

pub fn split_instructions_with_limit(text: &str, max_len: usize) -> Vec<String> {
    if text.trim().is_empty() {
        return vec![NO_INSTRUCTIONS.to_string()];
    }

    let mut steps: Vec<String> = if looks_numbered(text) {
        STEP_NUMBER
            .split(text)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    } else {
        text.replace("\r\n", "\n")
            .replace('\r', "\n")
            .split('\n')
            .map(str::trim)
            .filter(|s| s.chars().count() > MIN_LINE_STEP_LENGTH)
            .map(str::to_string)
            .collect()
    };

    if steps.is_empty() {
        steps.push(text.trim().to_string());
    }

    let bounded: Vec<String> = steps
        .into_iter()
        .flat_map(|step| split_long_step(&step, max_len))
        .filter(|s| !s.is_empty())
        .collect();

    if bounded.is_empty() {
        vec![NO_INSTRUCTIONS.to_string()]
    } else {
        bounded
    }
}

fn looks_numbered(text: &str) -> bool {
    text.chars()
        .take(NUMBERED_PREFIX_WINDOW)
        .any(|c| c.is_ascii_digit())
}

/// Cuts `step` into pieces of at most `max_len` characters.
///
/// Each cut prefers, in order: just after a `.`/`!`/`?` that is followed by a
/// space or the end of text (searched backward within the last
/// [`SENTENCE_LOOKBACK`] characters before the limit), the last space before
/// the limit, or exactly the limit. Whitespace at the cut is trimmed; no
/// other character is dropped.
pub fn split_long_step(step: &str, max_len: usize) -> Vec<String> {
    let max_len = max_len.max(1);
    let mut pieces = Vec::new();
    let mut remaining: Vec<char> = step.trim().chars().collect();

    while !remaining.is_empty() {
        if remaining.len() <= max_len {
            pieces.push(remaining.iter().collect());
            break;
        }

        let split_pos = sentence_cut(&remaining, max_len)
            .or_else(|| space_cut(&remaining, max_len))
            .unwrap_or(max_len);

        let head: String = remaining[..split_pos].iter().collect();
        let tail: String = remaining[split_pos..].iter().collect();
        let head = head.trim();
        if !head.is_empty() {
            pieces.push(head.to_string());
        }
        remaining = tail.trim().chars().collect();
    }

    pieces
}

fn sentence_cut(chars: &[char], max_len: usize) -> Option<usize> {
    let floor = max_len.saturating_sub(SENTENCE_LOOKBACK);
    (floor + 1..max_len).rev().find_map(|i| {
        let terminator = matches!(chars[i], '.' | '!' | '?');
        let boundary = chars.get(i + 1).map_or(true, |c| *c == ' ');
        (terminator && boundary).then_some(i + 1)
    })
}

fn space_cut(chars: &[char], max_len: usize) -> Option<usize> {
    chars[..max_len]
        .iter()
        .rposition(|c| *c == ' ')
        .filter(|pos| *pos > 0)
}
