//! Output formatting utilities.

use a2a_core::{AnchoredTrace, CommittedTrace, VerificationResult};
use a2a_journal::JournalEntry;
use serde_json::{json, Value};

/// Human-readable commitment summary.
pub fn print_commitment(committed: &CommittedTrace) {
    let hashing = &committed.record.hashing;
    println!("session:    {}", committed.record.content.session.id);
    println!("bytes:      {}", committed.bytes.len());
    println!("chunk size: {}", hashing.chunk_size);
    println!("chunks:     {}", hashing.chunks.len());
    println!("root:       {}", hashing.root);
}

/// Summary of an anchoring for `--json`.
pub fn anchored_json(anchored: &AnchoredTrace) -> Value {
    json!({
        "receipt": anchored.receipt,
        "ipfs_url": anchored.ipfs_url,
        "event_count": anchored.event_count,
        "chunks": anchored.record.hashing.chunks.len(),
    })
}

/// Human-readable anchoring summary.
pub fn print_anchored(anchored: &AnchoredTrace) {
    let receipt = &anchored.receipt;
    println!("ANCHORED - session: {}", receipt.session_id);
    println!("  content:      {}", anchored.ipfs_url);
    println!("  merkle root:  {}", receipt.merkle_root);
    println!("  transaction:  {}", receipt.tx_ref);
    println!("  ledger index: {} ({})", receipt.ledger_index, receipt.network);
    println!("  events:       {}", anchored.event_count);
}

/// Human-readable verification report.
pub fn print_verification(result: &VerificationResult) {
    println!("{}", result);
    if let Some(expected) = &result.expected_root {
        println!("  expected root: {}", expected);
    }
    if let Some(computed) = &result.computed_root {
        println!("  computed root: {}", computed);
    }
    for (key, value) in &result.details {
        println!("  {}: {}", key, value);
    }
}

/// Prints table header.
#[allow(clippy::print_literal)]
pub fn print_table_header() {
    println!(
        "{:<13} {:<24} {:<20} {}",
        "KIND", "SESSION", "TX_REF", "STATUS"
    );
    println!("{}", "-".repeat(80));
}

/// Formats a journal entry as a table row.
pub fn format_table_row(entry: &JournalEntry) -> String {
    match entry {
        JournalEntry::Receipt(receipt) => format!(
            "{:<13} {:<24} {:<20} ledger {} ({})",
            "receipt",
            truncate(receipt.session_id.as_str(), 24),
            truncate(receipt.tx_ref.as_str(), 20),
            receipt.ledger_index,
            receipt.network
        ),
        JournalEntry::Verification(result) => format!(
            "{:<13} {:<24} {:<20} {}",
            "verification",
            truncate(result.session_id.as_ref().map_or("?", |s| s.as_str()), 24),
            truncate(result.tx_ref.as_ref().map_or("-", |t| t.as_str()), 20),
            if result.verified { "verified" } else { "FAILED" }
        ),
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
