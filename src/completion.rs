//! Completion candidates, built once from the command table.

use std::collections::{HashMap, HashSet};

use crate::matcher::{clamp_to_boundary, is_comment_line, word_prefix, Span};
use crate::normalize::normalize;
use crate::table::CommandTable;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandCompletion {
    pub label: String,
    pub detail: String,
    pub documentation: Option<String>,
    /// Command and variant, without argument placeholders.
    pub insert_text: String,
    pub sort_text: String,
}

/// Candidates selected for one request.
#[derive(Debug, Default)]
pub struct Completions<'a> {
    pub items: Vec<&'a CommandCompletion>,
    /// When the list was narrowed to one command, the byte range (start of the
    /// command up to the caret) that accepted items should replace.
    pub replace: Option<Span>,
}

#[derive(Debug, Default)]
pub struct CompletionIndex {
    items: Vec<CommandCompletion>,
    /// Normalized command and variant of each item.
    keys: Vec<String>,
    by_base: HashMap<String, Vec<usize>>,
}

impl CompletionIndex {
    /// Composite entries come first, then the remaining base entries; the
    /// first item for a signature wins.
    pub fn build(table: &CommandTable) -> Self {
        let mut index = Self::default();
        let mut seen = HashSet::new();

        let mut used_keys = HashSet::new();
        let mut composites = Vec::new();
        for entry in table.entries() {
            let key = entry.composite_key();
            if !used_keys.insert(key.clone()) {
                continue;
            }
            composites.extend(table.by_composite(&key));
        }

        for entry in composites.into_iter().chain(table.entries()) {
            if !seen.insert(entry.signature().to_string()) {
                continue;
            }
            let position = index.items.len();
            index.by_base.entry(entry.base_key()).or_default().push(position);
            index.keys.push(entry.composite_key());
            index.items.push(CommandCompletion {
                label: entry.signature().to_string(),
                detail: entry.signature().to_string(),
                documentation: (!entry.description().is_empty())
                    .then(|| entry.description().to_string()),
                insert_text: entry.key_text(),
                sort_text: format!("{position:05}"),
            });
        }
        tracing::debug!(items = index.items.len(), "built completion list");
        index
    }

    pub fn items(&self) -> &[CommandCompletion] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Select candidates for a caret at byte offset `caret` on `line`.
    ///
    /// While the text before the caret is still the start of one of a known
    /// command's keys, the list narrows to that command's items, so typing
    /// `anim ` offers its variants. Once arguments follow a known command
    /// nothing is offered. Otherwise items are prefix-filtered by the word
    /// before the caret, and an empty word returns everything.
    pub fn complete(&self, line: &str, caret: usize) -> Completions<'_> {
        let typed = &line[..clamp_to_boundary(line, caret)];
        let past_first_word = typed.trim_start().contains(char::is_whitespace);
        if past_first_word && is_comment_line(typed) {
            return Completions::default();
        }

        if let Some(first) = typed.split_whitespace().next() {
            if let Some(positions) = self.by_base.get(&normalize(first)) {
                let typed_key = normalize(typed);
                if !positions
                    .iter()
                    .any(|&idx| self.keys[idx].starts_with(&typed_key))
                {
                    return Completions::default();
                }
                let start = typed.len() - typed.trim_start().len();
                return Completions {
                    items: positions.iter().map(|&idx| &self.items[idx]).collect(),
                    replace: Some(Span::new(start, typed.len())),
                };
            }
        }

        let prefix = word_prefix(line, typed.len()).to_lowercase();
        let items = if prefix.is_empty() {
            self.items.iter().collect()
        } else {
            self.items
                .iter()
                .filter(|item| item.label.to_lowercase().starts_with(&prefix))
                .collect()
        };
        Completions {
            items,
            replace: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> CompletionIndex {
        CompletionIndex::build(&CommandTable::parse(
            "anim\t1\t1\tPlay forward
anim\t2\t2\tPlay backward
ac\t\t\tAuto center
open\td3plot\td3plot \"file\"\tOpen a d3plot database
open\tkeyword\tkeyword \"file\"\t
",
        ))
    }

    fn labels(completions: &Completions<'_>) -> Vec<String> {
        completions.items.iter().map(|i| i.label.clone()).collect()
    }

    #[test]
    fn items_carry_signature_and_description() {
        let index = index();
        assert_eq!(index.len(), 5);
        let d3plot = &index.items()[3];
        assert_eq!(d3plot.label, "open d3plot \"file\"");
        assert_eq!(d3plot.detail, d3plot.label);
        assert_eq!(d3plot.insert_text, "open d3plot");
        assert_eq!(d3plot.documentation.as_deref(), Some("Open a d3plot database"));
        assert_eq!(index.items()[4].documentation, None);
    }

    #[test]
    fn command_then_space_narrows_to_variants() {
        let index = index();
        let completions = index.complete("anim ", 5);
        assert_eq!(labels(&completions), vec!["anim 1", "anim 2"]);
        assert_eq!(completions.replace, Some(Span::new(0, 5)));

        let indented = index.complete("  ANIM ", 7);
        assert_eq!(labels(&indented), vec!["anim 1", "anim 2"]);
        assert_eq!(indented.replace, Some(Span::new(2, 7)));
    }

    #[test]
    fn partial_word_filters_by_prefix() {
        let index = index();
        let completions = index.complete("A", 1);
        assert_eq!(labels(&completions), vec!["anim 1", "anim 2", "ac"]);
        assert_eq!(completions.replace, None);
        assert!(index.complete("zz", 2).items.is_empty());
    }

    #[test]
    fn empty_line_returns_everything() {
        let index = index();
        assert_eq!(index.complete("", 0).items.len(), 5);
        assert_eq!(index.complete("   ", 3).items.len(), 5);
    }

    #[test]
    fn variant_being_typed_keeps_narrowing() {
        let index = index();
        let completions = index.complete("open d3", 7);
        assert_eq!(
            labels(&completions),
            vec!["open d3plot \"file\"", "open keyword \"file\""]
        );
        assert_eq!(completions.replace, Some(Span::new(0, 7)));
    }

    #[test]
    fn typed_arguments_are_never_replaced() {
        let index = index();
        let line = "open d3plot \"/runs/crash/d3plot\" ";
        let completions = index.complete(line, line.len());
        assert!(completions.items.is_empty());
        assert_eq!(completions.replace, None);

        let completions = index.complete("anim 3", 6);
        assert!(completions.items.is_empty());
        assert_eq!(completions.replace, None);
    }

    #[test]
    fn comments_get_no_completions() {
        let index = index();
        assert!(index.complete("c anim ", 7).items.is_empty());
        assert!(index.complete("C ", 2).items.is_empty());
    }

    #[test]
    fn lone_c_is_a_word_not_a_comment() {
        let index = CompletionIndex::build(&CommandTable::parse(
            "cwd\t\t\"<dir>\"\tChange directory\ncolor\tbackground\tbackground <r> <g> <b>\t\nac\t\t\t\n",
        ));
        let completions = index.complete("c", 1);
        assert_eq!(
            labels(&completions),
            vec!["cwd \"<dir>\"", "color background <r> <g> <b>"]
        );
    }

    #[test]
    fn duplicate_signatures_are_dropped() {
        let index = CompletionIndex::build(&CommandTable::parse(
            "ac\t\t\tfirst\nac\tx\t\tsame signature\nac\t\t\tlast\n",
        ));
        assert_eq!(index.len(), 1);
        assert_eq!(index.items()[0].documentation.as_deref(), Some("last"));
    }
}
