pub mod anchor;
pub mod canonicalize;
pub mod commit;
pub mod receipts;
pub mod status;
pub mod verify;

use a2a_canonical::{Canonicalizer, TraceContent};
use a2a_core::AnchorConfig;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

/// Reads a trace document (bare content or a full record) from a file.
pub fn read_trace(path: &Path) -> Result<TraceContent, Box<dyn std::error::Error>> {
    let bytes = a2a_store::read_trace_file(path)
        .map_err(|e| format!("Failed to read trace {}: {}", path.display(), e))?;
    parse_trace(&bytes)
}

/// Reads a trace document from a file or stdin.
pub fn read_trace_input(input: Option<PathBuf>) -> Result<TraceContent, Box<dyn std::error::Error>> {
    match input {
        Some(path) => read_trace(&path),
        None => {
            let mut buffer = Vec::new();
            io::stdin().read_to_end(&mut buffer)?;
            parse_trace(&buffer)
        }
    }
}

fn parse_trace(bytes: &[u8]) -> Result<TraceContent, Box<dyn std::error::Error>> {
    let content = Canonicalizer::new()
        .parse(bytes)
        .map_err(|e| format!("Invalid trace: {}", e))?;
    Ok(content)
}

/// File config plus environment overrides, validated.
pub fn load_config(path: Option<&Path>) -> Result<AnchorConfig, Box<dyn std::error::Error>> {
    Ok(AnchorConfig::load(path)?)
}
