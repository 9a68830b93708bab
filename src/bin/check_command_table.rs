use std::env;
use std::process::ExitCode;

use cfilelsp::{matcher, table::CommandTable, CommandSet};

// Validates a command table before it is packaged:
// - the file must be readable
// - composite keys should be unique (later rows silently win otherwise)
// - every completion label must resolve back to its own entry when typed
fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!(
            "Usage: check_command_table <path-to-commands.tsv>\n\nExample: check_command_table data/commands.tsv"
        );
        return ExitCode::from(2);
    }

    let table = match CommandTable::try_load(&args[1]) {
        Ok(table) => table,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };
    let stats = table.stats().clone();
    let commands = CommandSet::new(table);
    let table = commands.table();

    println!("Records: {}", stats.records);
    println!("Skipped lines: {}", stats.skipped);
    println!("Base commands: {}", table.base_count());
    println!("Composite keys: {}", table.composite_count());
    println!("Completion items: {}", commands.completions().len());

    let mut problems = 0;

    if !stats.duplicates.is_empty() {
        println!("\nDuplicate keys (last row wins):");
        for key in &stats.duplicates {
            println!("  - {key}");
        }
        problems += stats.duplicates.len();
    }

    let unresolved: Vec<&str> = commands
        .completions()
        .items()
        .iter()
        .map(|item| item.label.as_str())
        .filter(|label| {
            matcher::find(table, label, 0).map(|m| m.entry.signature()) != Some(*label)
        })
        .collect();
    if !unresolved.is_empty() {
        println!("\nSignatures that resolve to a different entry:");
        for label in &unresolved {
            let got = matcher::find(table, label, 0)
                .map(|m| m.entry.signature().to_string())
                .unwrap_or_else(|| "(nothing)".to_string());
            println!("  - {label} -> {got}");
        }
        problems += unresolved.len();
    }

    if problems == 0 {
        println!("\nNo problems found.");
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
