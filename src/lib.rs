//! # cfilelsp
//!
//! Language tooling for LS-PrePost style command files: hover text,
//! completion and highlighting driven by a static table of command
//! signatures.
//!
//! The library is synchronous and transport-free. The `cfilelsp` binary
//! wraps it in a Tower LSP server.

use std::path::Path;

use tower_lsp::lsp_types::MarkedString;

pub mod completion;
pub mod highlight;
pub mod matcher;
pub mod normalize;
pub mod position;
pub mod table;
pub mod tooltip;

use completion::{CompletionIndex, Completions};
use matcher::Span;
use table::CommandTable;

/// The command table and the completion list derived from it.
///
/// Built once at startup and shared read-only by every request.
#[derive(Debug, Default)]
pub struct CommandSet {
    table: CommandTable,
    completions: CompletionIndex,
}

impl CommandSet {
    pub fn new(table: CommandTable) -> Self {
        let completions = CompletionIndex::build(&table);
        Self { table, completions }
    }

    /// Load from the packaged data file; an unreadable file yields an empty set.
    pub fn load(path: impl AsRef<Path>) -> Self {
        Self::new(CommandTable::load(path))
    }

    pub fn table(&self) -> &CommandTable {
        &self.table
    }

    pub fn completions(&self) -> &CompletionIndex {
        &self.completions
    }

    /// Tooltip and highlighted byte span for the command on `line`.
    pub fn hover(&self, line: &str, caret: usize) -> Option<(Vec<MarkedString>, Span)> {
        let found = matcher::find(&self.table, line, caret)?;
        Some((tooltip::command_hover(&self.table, found.entry), found.span))
    }

    pub fn complete(&self, line: &str, caret: usize) -> Completions<'_> {
        self.completions.complete(line, caret)
    }
}
