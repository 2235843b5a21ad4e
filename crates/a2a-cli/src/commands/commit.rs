//! Commit command implementation.

use super::read_trace;
use crate::output;
use a2a_core::Committer;
use a2a_store::SessionArchive;
use std::path::PathBuf;

pub fn run(
    trace: PathBuf,
    chunk_size: usize,
    archive: Option<PathBuf>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let committer = Committer::new(chunk_size)?;
    let content = read_trace(&trace)?;
    let committed = committer.commit(&content)?;

    if let Some(dir) = archive {
        let path = SessionArchive::open(&dir)?
            .write(&committed.record.content.session.id, committed.bytes.as_bytes())?;
        if !json {
            println!("archived: {}", path.display());
        }
    }

    if json {
        println!("{}", committed.record.to_json_pretty()?);
    } else {
        output::print_commitment(&committed);
    }
    Ok(())
}
