//! Status command implementation.

use super::load_config;
use a2a_ledger::XrplLedger;
use a2a_store::IpfsStore;
use std::path::PathBuf;

pub async fn run(config: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config.as_deref())?;
    let mut healthy = true;

    let store = IpfsStore::new(&config.ipfs)?;
    match store.version().await {
        Ok(version) => println!("ipfs:    online ({}) at {}", version, store.base_url()),
        Err(e) => {
            healthy = false;
            println!("ipfs:    offline at {}: {}", store.base_url(), e);
        }
    }

    let ledger = XrplLedger::new(config.xrpl.clone())?;
    match ledger.server_info().await {
        Ok(info) => println!(
            "xrpl:    {} ({}, rippled {}, validated ledger {})",
            config.xrpl.network,
            info.server_state,
            info.build_version,
            info.validated_ledger
                .map(|i| i.to_string())
                .unwrap_or_else(|| "-".to_string())
        ),
        Err(e) => {
            healthy = false;
            println!("xrpl:    unreachable at {}: {}", config.xrpl.node_url, e);
        }
    }

    if config.xrpl.account.is_some() {
        match ledger.account_info().await {
            Ok(account) => println!(
                "account: {} balance {} drops, sequence {}",
                account.account, account.balance_drops, account.sequence
            ),
            Err(e) => {
                healthy = false;
                println!("account: unavailable: {}", e);
            }
        }
    } else {
        println!("account: not configured");
    }

    if !healthy {
        return Err("one or more services are unavailable".into());
    }
    Ok(())
}
