use std::io::Write;
use std::path::PathBuf;

use cfilelsp::{matcher, normalize::normalize, table::CommandTable, CommandSet};

fn packaged_table() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data/commands.tsv")
}

#[test]
fn packaged_table_loads_cleanly() {
    let table = CommandTable::try_load(packaged_table()).expect("packaged table is readable");
    assert!(!table.is_empty());
    assert_eq!(table.stats().skipped, 0);
    assert!(table.stats().duplicates.is_empty());
    assert!(table.by_composite("open d3plot").is_some());
}

#[test]
fn every_completion_label_resolves_to_its_entry() {
    let commands = CommandSet::load(packaged_table());
    assert!(!commands.completions().is_empty());

    for item in commands.completions().items() {
        let first = item.label.split_whitespace().next().unwrap();
        let resolved = matcher::find(commands.table(), first, 0)
            .filter(|m| m.entry.signature() == item.label)
            .or_else(|| matcher::find(commands.table(), &item.label, 0))
            .unwrap_or_else(|| panic!("{:?} does not resolve", item.label));
        assert_eq!(resolved.entry.signature(), item.label);
    }
}

#[test]
fn typing_a_command_offers_its_variants() {
    let commands = CommandSet::load(packaged_table());
    let completions = commands.complete("anim ", 5);
    let labels: Vec<_> = completions.items.iter().map(|i| i.label.as_str()).collect();
    assert_eq!(
        labels,
        vec!["anim forward", "anim backward", "anim stop", "anim speed <n>"]
    );
}

#[test]
fn hover_reports_command_span() {
    let commands = CommandSet::load(packaged_table());
    let line = "open   D3PLOT \"/runs/crash/d3plot\"";
    let (contents, span) = commands.hover(line, 30).expect("hover on open d3plot");
    assert_eq!(&line[span.start..span.end], "open   D3PLOT");
    assert!(!contents.is_empty());
    assert!(commands.hover("c open d3plot", 4).is_none());
}

#[test]
fn missing_file_gives_empty_set() {
    let dir = tempfile::tempdir().unwrap();
    let commands = CommandSet::load(dir.path().join("absent.tsv"));
    assert!(commands.table().is_empty());
    assert_eq!(commands.table().base_count(), 0);
    assert_eq!(commands.table().composite_count(), 0);
    assert!(commands.completions().is_empty());
    assert!(commands.hover("open d3plot", 0).is_none());
}

#[test]
fn loads_quoted_fields_from_disk() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "Command\tDescription\tVariant").unwrap();
    writeln!(file, "\"Print\"\t\"Save \"\"all\"\" windows\"\t\"ALL\"").unwrap();
    writeln!(file).unwrap();
    writeln!(file, "\tdescription only\t").unwrap();
    file.flush().unwrap();

    let table = CommandTable::try_load(file.path()).unwrap();
    assert_eq!(table.len(), 1);
    assert_eq!(table.stats().skipped, 1);
    let entry = table.by_composite(&normalize("print all")).unwrap();
    assert_eq!(entry.command(), "Print");
    assert_eq!(entry.variant(), "ALL");
    assert_eq!(entry.description(), "Save \"all\" windows");
    assert_eq!(entry.signature(), "Print");
}

#[test]
fn packaged_signatures_keep_argument_quotes() {
    let table = CommandTable::try_load(packaged_table()).unwrap();
    assert_eq!(table.by_composite("cwd").unwrap().signature(), "cwd \"<dir>\"");
    assert_eq!(table.by_composite("title").unwrap().signature(), "title \"<text>\"");
    assert_eq!(
        table.by_composite("open d3plot").unwrap().signature(),
        "open d3plot \"<file>\""
    );
}

#[test]
fn completing_after_arguments_offers_nothing() {
    let commands = CommandSet::load(packaged_table());
    let line = "open d3plot \"/runs/crash/d3plot\" ";
    let completions = commands.complete(line, line.len());
    assert!(completions.items.is_empty());
    assert_eq!(completions.replace, None);

    let completions = commands.complete("open d3", 7);
    assert!(completions.items.iter().any(|i| i.label == "open d3plot \"<file>\""));
}
