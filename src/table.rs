//! The command table: every known command signature and its description,
//! loaded once from the packaged tab-separated data file.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

use crate::normalize::{normalize, unescape_quotes, unquote_field};

#[derive(Debug, Error)]
pub enum TableError {
    #[error("could not read command table {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One row of the command table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandEntry {
    command: String,
    variant: String,
    args: String,
    signature: String,
    description: String,
}

impl CommandEntry {
    pub fn new(
        command: impl Into<String>,
        variant: impl Into<String>,
        args: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        let command = command.into();
        let args = args.into();
        let signature = if args.is_empty() {
            command.clone()
        } else {
            format!("{command} {args}")
        };
        Self {
            command,
            variant: variant.into(),
            args,
            signature,
            description: description.into(),
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn variant(&self) -> &str {
        &self.variant
    }

    pub fn args(&self) -> &str {
        &self.args
    }

    pub fn signature(&self) -> &str {
        &self.signature
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Command followed by its variant, as a user would type it.
    pub fn key_text(&self) -> String {
        if self.variant.is_empty() {
            self.command.clone()
        } else {
            format!("{} {}", self.command, self.variant)
        }
    }

    pub fn base_key(&self) -> String {
        normalize(&self.command)
    }

    pub fn composite_key(&self) -> String {
        normalize(&self.key_text())
    }
}

/// Counters collected while parsing a table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadStats {
    pub records: usize,
    pub skipped: usize,
    /// Composite keys defined more than once; the last definition wins.
    pub duplicates: Vec<String>,
}

#[derive(Debug, Default)]
pub struct CommandTable {
    entries: Vec<CommandEntry>,
    by_base: HashMap<String, Vec<usize>>,
    by_composite: HashMap<String, usize>,
    stats: LoadStats,
}

/// Which column holds which field.
#[derive(Debug, Clone, Copy)]
struct Columns {
    command: usize,
    variant: Option<usize>,
    args: Option<usize>,
    description: Option<usize>,
    /// Append columns past the description to it.
    overflow: bool,
}

impl Columns {
    fn from_header(fields: &[&str]) -> Self {
        let mut columns = Columns {
            command: 0,
            variant: None,
            args: None,
            description: None,
            overflow: false,
        };
        for (idx, name) in fields.iter().enumerate() {
            match normalize(name).as_str() {
                "command" => columns.command = idx,
                "variant" => columns.variant = Some(idx),
                "args" | "arguments" | "signature" => columns.args = Some(idx),
                "description" | "desc" => columns.description = Some(idx),
                _ => {}
            }
        }
        columns
    }

    fn positional(count: usize) -> Self {
        match count {
            0 | 1 => Columns {
                command: 0,
                variant: None,
                args: None,
                description: None,
                overflow: false,
            },
            2 => Columns {
                command: 0,
                variant: None,
                args: None,
                description: Some(1),
                overflow: false,
            },
            3 => Columns {
                command: 0,
                variant: None,
                args: Some(1),
                description: Some(2),
                overflow: false,
            },
            _ => Columns {
                command: 0,
                variant: Some(1),
                args: Some(2),
                description: Some(3),
                overflow: true,
            },
        }
    }
}

fn header_pattern() -> &'static Regex {
    static HEADER: OnceLock<Regex> = OnceLock::new();
    HEADER.get_or_init(|| Regex::new(r"(?i)^\s*command").expect("valid header regex"))
}

impl CommandTable {
    /// Load the table, logging and returning an empty table if the file can't be read.
    pub fn load(path: impl AsRef<Path>) -> Self {
        match Self::try_load(path) {
            Ok(table) => table,
            Err(err) => {
                tracing::error!("{err}; hover and completion are disabled");
                Self::default()
            }
        }
    }

    pub fn try_load(path: impl AsRef<Path>) -> Result<Self, TableError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| TableError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let table = Self::parse(&contents);
        tracing::info!(
            path = %path.display(),
            records = table.stats.records,
            skipped = table.stats.skipped,
            duplicates = table.stats.duplicates.len(),
            "loaded command table"
        );
        Ok(table)
    }

    pub fn parse(contents: &str) -> Self {
        let mut table = Self::default();
        let mut header_checked = false;
        let mut header_columns = None;

        for line in contents.lines() {
            if line.trim().is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split('\t').collect();

            if !header_checked {
                header_checked = true;
                if header_pattern().is_match(line) {
                    header_columns = Some(Columns::from_header(&fields));
                    continue;
                }
            }

            let columns = header_columns.unwrap_or_else(|| Columns::positional(fields.len()));
            match Self::parse_record(&fields, columns) {
                Some(entry) => table.insert(entry),
                None => table.stats.skipped += 1,
            }
        }
        table
    }

    fn parse_record(fields: &[&str], columns: Columns) -> Option<CommandEntry> {
        let field = |idx: Option<usize>| {
            idx.and_then(|i| fields.get(i))
                .map(|f| unquote_field(f))
                .unwrap_or_default()
        };

        let command = field(Some(columns.command));
        if command.is_empty() {
            return None;
        }
        let mut description = field(columns.description);
        if let Some(desc_idx) = columns.description.filter(|_| columns.overflow) {
            for extra in fields.iter().skip(desc_idx + 1) {
                let extra = unquote_field(extra);
                if !extra.is_empty() {
                    description.push('\t');
                    description.push_str(&extra);
                }
            }
        }

        // Quotes in the argument column are part of the syntax shown to the user.
        let args = columns
            .args
            .and_then(|i| fields.get(i))
            .map(|f| f.trim().to_string())
            .unwrap_or_default();

        Some(CommandEntry::new(
            command,
            field(columns.variant),
            args,
            unescape_quotes(&description),
        ))
    }

    fn insert(&mut self, entry: CommandEntry) {
        let idx = self.entries.len();
        let composite = entry.composite_key();
        self.by_base.entry(entry.base_key()).or_default().push(idx);
        if self.by_composite.insert(composite.clone(), idx).is_some() {
            tracing::debug!(key = %composite, "duplicate command key, keeping the later entry");
            self.stats.duplicates.push(composite);
        }
        self.entries.push(entry);
        self.stats.records += 1;
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn stats(&self) -> &LoadStats {
        &self.stats
    }

    /// All entries in table order.
    pub fn entries(&self) -> &[CommandEntry] {
        &self.entries
    }

    /// Entries for a normalized base command, in table order.
    pub fn by_base(&self, key: &str) -> impl Iterator<Item = &CommandEntry> + '_ {
        self.by_base
            .get(key)
            .into_iter()
            .flatten()
            .map(|&idx| &self.entries[idx])
    }

    pub fn by_composite(&self, key: &str) -> Option<&CommandEntry> {
        self.by_composite.get(key).map(|&idx| &self.entries[idx])
    }

    pub fn base_count(&self) -> usize {
        self.by_base.len()
    }

    pub fn composite_count(&self) -> usize {
        self.by_composite.len()
    }
}
