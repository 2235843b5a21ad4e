//! Receipts command implementation.

use crate::output;
use a2a_journal::{JournalEntry, JournalReader, ReadMode};
use std::path::PathBuf;

pub fn run(journal: PathBuf, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let mut reader = JournalReader::open(&journal, ReadMode::Strict)
        .map_err(|e| format!("Failed to open journal file: {}: {}", journal.display(), e))?;

    if !json {
        output::print_table_header();
    }
    while let Some(entry) = reader.read_entry()? {
        if json {
            let line = match &entry {
                JournalEntry::Receipt(receipt) => {
                    serde_json::json!({ "kind": "receipt", "receipt": receipt })
                }
                JournalEntry::Verification(result) => {
                    serde_json::json!({ "kind": "verification", "result": result.to_record() })
                }
            };
            println!("{}", serde_json::to_string(&line)?);
        } else {
            println!("{}", output::format_table_row(&entry));
        }
    }
    Ok(())
}
