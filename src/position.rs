//! Conversion between LSP character positions and byte offsets within a line.

use tower_lsp::lsp_types::PositionEncodingKind;

/// Units the client counts `Position::character` in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    Utf8,
    #[default]
    Utf16,
}

impl Encoding {
    /// Pick UTF-8 when the client offers it, falling back to the LSP default of UTF-16.
    pub fn negotiate(offered: Option<&[PositionEncodingKind]>) -> Self {
        match offered {
            Some(kinds) if kinds.contains(&PositionEncodingKind::UTF8) => Encoding::Utf8,
            _ => Encoding::Utf16,
        }
    }

    pub fn kind(self) -> PositionEncodingKind {
        match self {
            Encoding::Utf8 => PositionEncodingKind::UTF8,
            Encoding::Utf16 => PositionEncodingKind::UTF16,
        }
    }

    fn width(self, c: char) -> usize {
        match self {
            Encoding::Utf8 => c.len_utf8(),
            Encoding::Utf16 => c.len_utf16(),
        }
    }
}

/// Lines of `text` split on `\r\n`, `\n` or a lone `\r`, the way LSP counts them.
/// A terminator at the very end does not start another line.
pub fn lines(text: &str) -> impl Iterator<Item = &str> + '_ {
    let mut rest = (!text.is_empty()).then_some(text);
    std::iter::from_fn(move || {
        let current = rest?;
        match current.find(|c: char| c == '\r' || c == '\n') {
            Some(idx) => {
                let width = if current[idx..].starts_with("\r\n") { 2 } else { 1 };
                let tail = &current[idx + width..];
                rest = (!tail.is_empty()).then_some(tail);
                Some(&current[..idx])
            }
            None => {
                rest = None;
                Some(current)
            }
        }
    })
}

/// Line `index` of `text`, without its line terminator.
pub fn line_at(text: &str, index: u32) -> Option<&str> {
    lines(text).nth(index as usize)
}

/// Byte offset of `character` in `line`; positions past the end clamp to the line length.
pub fn byte_offset(line: &str, character: u32, encoding: Encoding) -> usize {
    let target = character as usize;
    let mut units = 0;
    for (idx, c) in line.char_indices() {
        if units >= target {
            return idx;
        }
        units += encoding.width(c);
    }
    line.len()
}

/// Character position of byte offset `byte` in `line`.
pub fn character(line: &str, byte: usize, encoding: Encoding) -> u32 {
    let byte = byte.min(line.len());
    line.char_indices()
        .take_while(|(idx, _)| *idx < byte)
        .map(|(_, c)| encoding.width(c))
        .sum::<usize>() as u32
}
