//! Hover content for matched commands.

use tower_lsp::lsp_types::{LanguageString, MarkedString};

use crate::table::{CommandEntry, CommandTable};

/// Language identifier used for code blocks and document selection.
pub const LANGUAGE_ID: &str = "cfile";

/// Other signatures listed under a hover; keeps tooltips for commands with
/// many variants readable.
const MAX_VARIANTS: usize = 5;

/// Title, signature code block, description and sibling variants for `entry`.
pub fn command_hover(table: &CommandTable, entry: &CommandEntry) -> Vec<MarkedString> {
    let mut hover_content = vec![
        MarkedString::String(format!("**{}**", entry.key_text())),
        MarkedString::LanguageString(LanguageString {
            language: LANGUAGE_ID.to_string(),
            value: entry.signature().to_string(),
        }),
    ];

    if !entry.description().is_empty() {
        hover_content.push(MarkedString::String(entry.description().to_string()));
    }

    let siblings: Vec<&str> = table
        .by_base(&entry.base_key())
        .map(CommandEntry::signature)
        .filter(|signature| *signature != entry.signature())
        .collect();
    if !siblings.is_empty() {
        let mut variants = siblings
            .iter()
            .take(MAX_VARIANTS)
            .map(|s| format!("`{s}`"))
            .collect::<Vec<_>>()
            .join(", ");
        if siblings.len() > MAX_VARIANTS {
            variants.push_str(&format!(" ... and {} more", siblings.len() - MAX_VARIANTS));
        }
        hover_content.push(MarkedString::String(format!("**Variants:** {variants}")));
    }

    hover_content
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(content: &[MarkedString]) -> Vec<String> {
        content
            .iter()
            .map(|m| match m {
                MarkedString::String(s) => s.clone(),
                MarkedString::LanguageString(ls) => format!("[{}] {}", ls.language, ls.value),
            })
            .collect()
    }

    #[test]
    fn renders_title_signature_and_description() {
        let table = CommandTable::parse("ac\t\t\tAuto center the model\n");
        let entry = table.by_composite("ac").unwrap();
        assert_eq!(
            strings(&command_hover(&table, entry)),
            vec!["**ac**", "[cfile] ac", "Auto center the model"]
        );
    }

    #[test]
    fn lists_sibling_variants() {
        let table = CommandTable::parse(
            "anim\t1\t1\t\nanim\t2\t2\t\nanim\t3\t3\t\nanim\t4\t4\t\nanim\t5\t5\t\nanim\t6\t6\t\nanim\t7\t7\t\n",
        );
        let entry = table.by_composite("anim 1").unwrap();
        let content = strings(&command_hover(&table, entry));
        assert_eq!(content.len(), 3);
        assert_eq!(
            content[2],
            "**Variants:** `anim 2`, `anim 3`, `anim 4`, `anim 5`, `anim 6` ... and 1 more"
        );
    }
}
