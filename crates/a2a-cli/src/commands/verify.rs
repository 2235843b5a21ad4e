//! Verify command implementations.

use super::load_config;
use crate::output;
use crate::VerifyOpts;
use a2a_canonical::{ContentId, TxRef};
use a2a_core::{AnchorConfig, VerificationResult, Verifier};
use a2a_journal::{JournalWriter, WriteOptions};
use a2a_ledger::XrplLedger;
use a2a_store::IpfsStore;
use std::path::PathBuf;

type RemoteVerifier = Verifier<IpfsStore, XrplLedger>;

fn remote_verifier(config: &AnchorConfig) -> Result<RemoteVerifier, Box<dyn std::error::Error>> {
    Ok(Verifier::new(
        IpfsStore::new(&config.ipfs)?,
        XrplLedger::new(config.xrpl.clone())?,
        config.committer()?,
    ))
}

pub async fn by_transaction(tx_ref: String, opts: VerifyOpts) -> Result<(), Box<dyn std::error::Error>> {
    let tx_ref = TxRef::parse(tx_ref).map_err(|e| format!("Invalid transaction hash: {}", e))?;
    let config = load_config(opts.config.as_deref())?;
    let result = remote_verifier(&config)?.verify_by_transaction(&tx_ref).await;
    finish(result, &opts)
}

pub async fn by_content(
    cid: String,
    root: String,
    opts: VerifyOpts,
) -> Result<(), Box<dyn std::error::Error>> {
    let cid = ContentId::parse(cid).map_err(|e| format!("Invalid content id: {}", e))?;
    let config = load_config(opts.config.as_deref())?;
    let result = remote_verifier(&config)?.verify_by_content(&cid, &root).await;
    finish(result, &opts)
}

pub fn by_file(file: PathBuf, root: String, opts: VerifyOpts) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(opts.config.as_deref())?;
    let bytes = a2a_store::read_trace_file(&file)
        .map_err(|e| format!("Failed to read {}: {}", file.display(), e))?;
    let result = a2a_core::verify_bytes(&config.committer()?, &bytes, &root);
    finish(result, &opts)
}

fn finish(result: VerificationResult, opts: &VerifyOpts) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(path) = &opts.journal {
        let mut writer = JournalWriter::open(path, WriteOptions::default())
            .map_err(|e| format!("Failed to open journal {}: {}", path.display(), e))?;
        writer.append_verification(&result)?;
        writer.finish()?;
    }

    if opts.json {
        println!("{}", serde_json::to_string_pretty(&result.to_record())?);
    } else {
        output::print_verification(&result);
    }

    if opts.strict && !result.verified {
        return Err(format!("verification failed: {}", result).into());
    }
    Ok(())
}
