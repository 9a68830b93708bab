//! Semantic tokens for command files.

use tower_lsp::lsp_types::{SemanticToken, SemanticTokenType};

use crate::matcher::{self, Span};
use crate::position::{character, lines, Encoding};
use crate::table::CommandTable;

/// Token types, in legend order.
pub const LEGEND: &[SemanticTokenType] = &[
    SemanticTokenType::COMMENT,
    SemanticTokenType::FUNCTION,
    SemanticTokenType::NUMBER,
    SemanticTokenType::STRING,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Comment = 0,
    Command = 1,
    Number = 2,
    Text = 3,
}

/// A classified byte range on one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Highlight {
    pub line: u32,
    pub span: Span,
    pub kind: TokenKind,
}

/// Byte spans of the whitespace-separated tokens of `line`.
fn token_spans(line: &str) -> impl Iterator<Item = Span> + '_ {
    line.split_whitespace().map(move |token| {
        let start = token.as_ptr() as usize - line.as_ptr() as usize;
        Span::new(start, start + token.len())
    })
}

/// Classify one line.
pub fn highlight_line(table: &CommandTable, line: &str, line_no: u32) -> Vec<Highlight> {
    let mut highlights = Vec::new();
    if matcher::is_comment_line(line) {
        let start = line.len() - line.trim_start().len();
        highlights.push(Highlight {
            line: line_no,
            span: Span::new(start, line.trim_end().len()),
            kind: TokenKind::Comment,
        });
        return highlights;
    }

    let command = matcher::find(table, line, 0)
        .map(|m| m.span)
        .filter(|span| !span.is_empty());
    if let Some(span) = command {
        highlights.push(Highlight {
            line: line_no,
            span,
            kind: TokenKind::Command,
        });
    }

    for span in token_spans(line) {
        if command.is_some_and(|c| span.start < c.end && span.end > c.start) {
            continue;
        }
        let text = &line[span.start..span.end];
        let numeric = text.starts_with(|c: char| c.is_ascii_digit() || matches!(c, '-' | '+' | '.'));
        let kind = if numeric && text.parse::<f64>().is_ok() {
            TokenKind::Number
        } else if text.starts_with('"') || text.starts_with('\'') {
            TokenKind::Text
        } else {
            continue;
        };
        highlights.push(Highlight {
            line: line_no,
            span,
            kind,
        });
    }
    highlights.sort_by_key(|h| h.span.start);
    highlights
}

/// Delta-encoded semantic tokens for a whole document.
pub fn semantic_tokens(table: &CommandTable, text: &str, encoding: Encoding) -> Vec<SemanticToken> {
    let mut tokens = Vec::new();
    let mut previous_line = 0u32;
    let mut previous_col = 0u32;

    for (line_no, line) in lines(text).enumerate() {
        for highlight in highlight_line(table, line, line_no as u32) {
            let start = character(line, highlight.span.start, encoding);
            let end = character(line, highlight.span.end, encoding);

            let delta_line = highlight.line - previous_line;
            let delta_start = if delta_line == 0 {
                start - previous_col
            } else {
                start
            };
            tokens.push(SemanticToken {
                delta_line,
                delta_start,
                length: end - start,
                token_type: highlight.kind as u32,
                token_modifiers_bitset: 0,
            });
            previous_line = highlight.line;
            previous_col = start;
        }
    }
    tokens
}
