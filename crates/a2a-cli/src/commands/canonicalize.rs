//! Canonicalize command implementation.

use super::read_trace_input;
use a2a_canonical::Canonicalizer;
use std::path::PathBuf;

pub fn run(input: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let content = read_trace_input(input)?;
    let bytes = Canonicalizer::new()
        .serialize(&content)
        .map_err(|e| format!("Canonicalization failed: {}", e))?;
    println!("{}", bytes.as_str());
    Ok(())
}
