//! Anchor command implementation.

use super::{load_config, read_trace};
use crate::output;
use a2a_core::AnchorService;
use a2a_journal::{JournalWriter, WriteOptions};
use a2a_ledger::XrplLedger;
use a2a_store::{IpfsStore, SessionArchive};
use std::path::PathBuf;

pub async fn run(
    trace: PathBuf,
    config: Option<PathBuf>,
    journal: Option<PathBuf>,
    archive: Option<PathBuf>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config.as_deref())?;
    config.require_credentials()?;

    let content = read_trace(&trace)?;
    let committer = config.committer()?;
    let committed = committer.commit(&content)?;

    if let Some(dir) = archive {
        let path = SessionArchive::open(&dir)?
            .write(&committed.record.content.session.id, committed.bytes.as_bytes())?;
        tracing::info!(path = %path.display(), "archived canonical trace");
    }

    // Open the journal before anchoring so a bad path fails without side effects.
    let mut journal = journal
        .map(|path| {
            JournalWriter::open(&path, WriteOptions::default())
                .map_err(|e| format!("Failed to open journal {}: {}", path.display(), e))
        })
        .transpose()?;

    let store = IpfsStore::new(&config.ipfs)?;
    let ledger = XrplLedger::new(config.xrpl.clone())?;
    let service = AnchorService::new(store, ledger, committer);

    let anchored = service
        .anchor_committed(committed, chrono::Utc::now().timestamp())
        .await
        .map_err(|e| format!("Anchoring failed at stage {}: {}", e.stage(), e))?;

    if let Some(writer) = journal.as_mut() {
        writer.append_receipt(&anchored.receipt)?;
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&output::anchored_json(&anchored))?);
    } else {
        output::print_anchored(&anchored);
    }
    Ok(())
}
