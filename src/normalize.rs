//! Key normalization shared by the table loader and the position matcher.
//!
//! Table keys and query tokens go through the same function so lookups are
//! insensitive to case, spacing and quoting.

use std::borrow::Cow;

/// Normalize command text into a lookup key.
///
/// Lowercases, collapses runs of whitespace into a single space, strips a
/// layer of matching surrounding quotes (`"` or `'`) and unescapes doubled
/// quotes inside it. Stripping repeats while the unescaped text is itself
/// wrapped, so `normalize(normalize(x)) == normalize(x)` holds for any input.
pub fn normalize(text: &str) -> String {
    let mut current: Cow<'_, str> = Cow::Borrowed(text.trim());
    while let Some(inner) = strip_quotes(&current) {
        let next = inner.trim().to_string();
        current = Cow::Owned(next);
    }
    current
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Strip one layer of spreadsheet-style quoting from a table field.
///
/// `"a ""b"""` becomes `a "b"`; unquoted fields are returned trimmed.
pub fn unquote_field(field: &str) -> String {
    let field = field.trim();
    match strip_quotes(field) {
        Some(inner) => inner,
        None => field.to_string(),
    }
}

/// Collapse doubled quote escapes (`""` and `''`) to single quotes.
pub fn unescape_quotes(text: &str) -> String {
    text.replace("\"\"", "\"").replace("''", "'")
}

/// If `text` is wrapped in a matching pair of quotes, return the unescaped inner text.
fn strip_quotes(text: &str) -> Option<String> {
    let quote = text.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    if text.len() < 2 || !text.ends_with(quote) {
        return None;
    }
    let inner = &text[1..text.len() - 1];
    let doubled: String = [quote, quote].iter().collect();
    Some(inner.replace(&doubled, &quote.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_collapses_whitespace() {
        assert_eq!(normalize("  OPEN \t  D3plot "), "open d3plot");
        assert_eq!(normalize("OPEN"), normalize("open"));
    }

    #[test]
    fn strips_one_layer_of_quotes() {
        assert_eq!(normalize("\"D3PLOT\""), "d3plot");
        assert_eq!(normalize("'d3plot'"), "d3plot");
        assert_eq!(normalize("\"say \"\"hi\"\"\""), "say \"hi\"");
    }

    #[test]
    fn mismatched_quotes_are_kept() {
        assert_eq!(normalize("\"d3plot'"), "\"d3plot'");
        assert_eq!(normalize("\""), "\"");
    }

    #[test]
    fn normalization_is_idempotent() {
        let samples = [
            "",
            "\"",
            "\"\"\"\"",
            "\"\"\"a\"\"\"",
            "'\"a\"'",
            "\"a\"\"\"\"b\"",
            "  Open   \"C:\\runs\\d3plot\" ",
            "\"\" spaced \"\"",
            "GENSELECT target PART",
        ];
        for sample in samples {
            let once = normalize(sample);
            assert_eq!(normalize(&once), once, "not idempotent for {sample:?}");
        }
    }

    #[test]
    fn unquotes_table_fields() {
        assert_eq!(unquote_field(" \"a \"\"b\"\"\" "), "a \"b\"");
        assert_eq!(unquote_field("plain"), "plain");
        assert_eq!(unescape_quotes("use \"\"quoted\"\" names"), "use \"quoted\" names");
    }
}
