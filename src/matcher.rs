//! Finds the known command on a line of a command file.
//!
//! Matching is start-anchored: windows of up to [`MAX_WINDOW`] whitespace
//! separated tokens are tried longest first and, within one length, leftmost
//! first. The first window whose normalized text is a composite key wins, so
//! `open d3plot` beats `open` and the result does not depend on where the
//! caret sits. If no window matches, the first token is looked up as a base
//! command.

use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};

use regex::Regex;

use crate::normalize::normalize;
use crate::table::{CommandEntry, CommandTable};

/// Longest token run considered a command key.
pub const MAX_WINDOW: usize = 4;

/// Compiled span patterns kept before the cache is cleared.
const PATTERN_CACHE_LIMIT: usize = 512;

/// Byte range within a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CommandMatch<'a> {
    pub entry: &'a CommandEntry,
    pub span: Span,
}

/// Lines whose first token is a lone `c` or `C` are comments.
pub fn is_comment_line(line: &str) -> bool {
    matches!(line.split_whitespace().next(), Some("c" | "C"))
}

/// Find the command on `line`. `caret` is a byte offset used only for the
/// fallback span when the matched text can't be located again.
pub fn find<'a>(table: &'a CommandTable, line: &str, caret: usize) -> Option<CommandMatch<'a>> {
    if is_comment_line(line) {
        return None;
    }
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.is_empty() {
        return None;
    }

    for len in (1..=MAX_WINDOW.min(tokens.len())).rev() {
        for window in tokens.windows(len) {
            if let Some(entry) = table.by_composite(&normalize(&window.join(" "))) {
                return Some(CommandMatch {
                    entry,
                    span: locate(line, window, caret),
                });
            }
        }
    }

    let mut candidates = table.by_base(&normalize(tokens[0])).peekable();
    let first = *candidates.peek()?;
    let entry = candidates
        .find(|entry| entry.variant().is_empty())
        .unwrap_or(first);
    Some(CommandMatch {
        entry,
        span: locate(line, &tokens[..1], caret),
    })
}

/// Recover the byte span of `tokens` in `line`, tolerating any whitespace between them.
fn locate(line: &str, tokens: &[&str], caret: usize) -> Span {
    let found = span_pattern(tokens)
        .and_then(|re| re.captures(line))
        .and_then(|caps| caps.get(1))
        .map(|m| Span::new(m.start(), m.end()));

    match found {
        Some(span) => span,
        None => {
            tracing::debug!(line = %line, tokens = ?tokens, "matched command text not found on line");
            let caret = clamp_to_boundary(line, caret);
            word_at(line, caret).unwrap_or(Span::new(caret, caret))
        }
    }
}

/// Word-boundary pattern for a run of tokens, compiled once per distinct run.
fn span_pattern(tokens: &[&str]) -> Option<Regex> {
    static PATTERNS: OnceLock<Mutex<HashMap<String, Regex>>> = OnceLock::new();

    let key = tokens.join(" ");
    let cache = PATTERNS.get_or_init(Default::default);
    if let Some(re) = cache.lock().ok()?.get(&key) {
        return Some(re.clone());
    }

    let body = tokens
        .iter()
        .map(|token| regex::escape(token))
        .collect::<Vec<_>>()
        .join(r"\s+");
    let re = Regex::new(&format!(r"(?i)(?:^|\s)({body})(?:\s|$)")).ok()?;

    let mut patterns = cache.lock().ok()?;
    if patterns.len() >= PATTERN_CACHE_LIMIT {
        patterns.clear();
    }
    patterns.insert(key, re.clone());
    Some(re)
}

/// The whitespace-delimited word touching `caret`, if any.
pub fn word_at(line: &str, caret: usize) -> Option<Span> {
    let caret = clamp_to_boundary(line, caret);
    let start = line[..caret]
        .char_indices()
        .rev()
        .find(|(_, c)| c.is_whitespace())
        .map(|(idx, c)| idx + c.len_utf8())
        .unwrap_or(0);
    let end = line[caret..]
        .char_indices()
        .find(|(_, c)| c.is_whitespace())
        .map(|(idx, _)| caret + idx)
        .unwrap_or(line.len());
    (start < end).then_some(Span::new(start, end))
}

/// The part of the word under the caret that lies before it.
pub fn word_prefix(line: &str, caret: usize) -> &str {
    let caret = clamp_to_boundary(line, caret);
    match word_at(line, caret) {
        Some(span) if span.start < caret => &line[span.start..caret],
        _ => "",
    }
}

pub(crate) fn clamp_to_boundary(line: &str, offset: usize) -> usize {
    let mut offset = offset.min(line.len());
    while !line.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}
