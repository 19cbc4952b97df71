//! Text justification algorithm.
//!
//! Packs whitespace-delimited words greedily into lines of a fixed width,
//! then distributes extra spaces across the gaps of every full line. The
//! last line and single-word lines are left-aligned and right-padded.

use crate::error::{ApiError, Result};

/// A line under construction: the words it holds and their combined
/// character count (excluding separators).
#[derive(Debug, Default)]
struct Line<'a> {
    words: Vec<&'a str>,
    chars: usize,
}

impl<'a> Line<'a> {
    fn push(&mut self, word: &'a str, len: usize) {
        self.words.push(word);
        self.chars += len;
    }

    /// Rendered length with single-space separators.
    fn min_len(&self) -> usize {
        self.chars + self.words.len().saturating_sub(1)
    }
}

/// Justify `text` to `width` characters per line.
///
/// Whitespace runs collapse to single separators. Every line except the
/// last renders at exactly `width` characters; in multi-line output the
/// last line is left-aligned and padded with trailing spaces, as is any
/// line holding a single word. A body that fits on one line is itself
/// space-justified. A word longer than `width` keeps its own line
/// unmodified.
pub fn justify(text: &str, width: usize) -> Result<String> {
    if width == 0 {
        return Err(ApiError::Validation(
            "line width must be a positive integer".to_string(),
        ));
    }

    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return Ok(String::new());
    }

    let lines = pack_lines(&words, width);
    let last = lines.len() - 1;

    let rendered: Vec<String> = lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let ragged = i == last && last > 0;
            if ragged || line.words.len() < 2 {
                render_left_aligned(line, width)
            } else {
                render_justified(line, width)
            }
        })
        .collect();

    Ok(rendered.join("\n"))
}

/// Count whitespace-delimited words.
pub fn word_count(text: &str) -> u64 {
    text.split_whitespace().count() as u64
}

fn pack_lines<'a>(words: &[&'a str], width: usize) -> Vec<Line<'a>> {
    let mut lines = Vec::new();
    let mut current = Line::default();

    for &word in words {
        let len = word.chars().count();
        if current.words.is_empty() || current.min_len() + 1 + len <= width {
            current.push(word, len);
        } else {
            lines.push(std::mem::take(&mut current));
            current.push(word, len);
        }
    }
    lines.push(current);
    lines
}

fn render_left_aligned(line: &Line<'_>, width: usize) -> String {
    let mut out = line.words.join(" ");
    let natural = line.min_len();
    if natural < width {
        out.extend(std::iter::repeat(' ').take(width - natural));
    }
    out
}

fn render_justified(line: &Line<'_>, width: usize) -> String {
    // Packing guarantees chars + gaps <= width for multi-word lines,
    // so every gap receives at least one space.
    let gaps = line.words.len() - 1;
    let total_spaces = width - line.chars;
    let base = total_spaces / gaps;
    let extra = total_spaces % gaps;

    let mut out = String::with_capacity(width);
    for (i, word) in line.words.iter().enumerate() {
        out.push_str(word);
        if i < gaps {
            let pad = base + usize::from(i < extra);
            out.extend(std::iter::repeat(' ').take(pad));
        }
    }
    out
}
