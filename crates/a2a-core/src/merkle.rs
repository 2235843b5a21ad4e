//! Chunked Merkle commitment over canonical bytes.
//!
//! Bytes are cut into fixed-size chunks, each chunk is hashed to a lowercase
//! hex leaf, and leaves are folded pairwise until one node remains. A parent
//! is the hash of the two child hex strings concatenated as text. An unpaired
//! last node is promoted to the next level unchanged.

use a2a_canonical::HexDigest;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use thiserror::Error;

/// Chunk size used when none is configured.
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// Errors from commitment.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MerkleError {
    /// Chunk size must be positive.
    #[error("invalid chunk size {0}: must be a positive integer")]
    InvalidChunkSize(usize),
}

/// Root and leaf hashes of a byte sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleCommitment {
    /// Merkle root.
    pub root: HexDigest,
    /// Leaf hash of every chunk, in order.
    pub leaves: Vec<HexDigest>,
    /// Chunk size used.
    pub chunk_size: usize,
}

impl MerkleCommitment {
    /// Number of chunks.
    pub fn leaf_count(&self) -> usize {
        self.leaves.len()
    }
}

/// Commits `bytes` with the given chunk size.
///
/// Empty input has no leaves and the root `H("")`.
///
/// # Errors
///
/// Returns [`MerkleError::InvalidChunkSize`] when `chunk_size` is zero.
pub fn commit(bytes: &[u8], chunk_size: usize) -> Result<MerkleCommitment, MerkleError> {
    let size = NonZeroUsize::new(chunk_size).ok_or(MerkleError::InvalidChunkSize(chunk_size))?;
    Ok(commit_with(bytes, size))
}

pub(crate) fn commit_with(bytes: &[u8], chunk_size: NonZeroUsize) -> MerkleCommitment {
    let leaves: Vec<HexDigest> = bytes.chunks(chunk_size.get()).map(HexDigest::of).collect();
    MerkleCommitment {
        root: fold(&leaves),
        leaves,
        chunk_size: chunk_size.get(),
    }
}

/// Folds leaf hashes into the root.
pub fn fold(leaves: &[HexDigest]) -> HexDigest {
    let mut level = leaves.to_vec();
    while level.len() > 1 {
        let mut next = Vec::with_capacity((level.len() + 1) / 2);
        let mut nodes = level.into_iter();
        while let Some(left) = nodes.next() {
            match nodes.next() {
                Some(right) => next.push(parent(&left, &right)),
                None => next.push(left),
            }
        }
        level = next;
    }
    level.pop().unwrap_or_else(|| HexDigest::of(b""))
}

fn parent(left: &HexDigest, right: &HexDigest) -> HexDigest {
    let mut joined = String::with_capacity(left.as_str().len() + right.as_str().len());
    joined.push_str(left.as_str());
    joined.push_str(right.as_str());
    HexDigest::of(joined.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use a2a_canonical::sha256_hex;

    fn h(data: &str) -> String {
        sha256_hex(data.as_bytes())
    }

    #[test]
    fn empty_input_has_no_leaves() {
        let c = commit(b"", 4096).unwrap();
        assert!(c.leaves.is_empty());
        assert_eq!(
            c.root.as_str(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn single_chunk_root_is_the_leaf() {
        let c = commit(b"short", 4096).unwrap();
        assert_eq!(c.leaf_count(), 1);
        assert_eq!(c.root, c.leaves[0]);
        assert_eq!(c.root.as_str(), h("short"));
    }

    #[test]
    fn exact_multiple_has_no_empty_tail() {
        let c = commit(&[7u8; 8], 4).unwrap();
        assert_eq!(c.leaf_count(), 2);
        let a = sha256_hex(&[7u8; 4]);
        assert_eq!(c.root.as_str(), h(&format!("{}{}", a, a)));
    }

    #[test]
    fn odd_leaf_is_promoted_not_duplicated() {
        let c = commit(b"aaabbbccc", 3).unwrap();
        let (a, b, cc) = (h("aaa"), h("bbb"), h("ccc"));
        assert_eq!(
            c.leaves.iter().map(|l| l.as_str().to_string()).collect::<Vec<_>>(),
            vec![a.clone(), b.clone(), cc.clone()]
        );
        let expected = h(&format!("{}{}", h(&format!("{}{}", a, b)), cc));
        assert_eq!(c.root.as_str(), expected);

        let duplicated = h(&format!("{}{}", h(&format!("{}{}", a, b)), h(&format!("{}{}", cc, cc))));
        assert_ne!(c.root.as_str(), duplicated);
    }

    #[test]
    fn five_leaves_fold_in_three_levels() {
        let c = commit(b"abcde", 1).unwrap();
        let ab = h(&format!("{}{}", h("a"), h("b")));
        let cd = h(&format!("{}{}", h("c"), h("d")));
        let abcd = h(&format!("{}{}", ab, cd));
        assert_eq!(c.root.as_str(), h(&format!("{}{}", abcd, h("e"))));
    }

    #[test]
    fn ten_thousand_bytes_make_three_chunks() {
        let bytes: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
        let c = commit(&bytes, DEFAULT_CHUNK_SIZE).unwrap();
        assert_eq!(c.leaf_count(), 3);
        assert_eq!(c.leaves[0].as_str(), sha256_hex(&bytes[..4096]));
        assert_eq!(c.leaves[1].as_str(), sha256_hex(&bytes[4096..8192]));
        assert_eq!(c.leaves[2].as_str(), sha256_hex(&bytes[8192..]));
        assert_eq!(bytes[8192..].len(), 1808);
    }

    #[test]
    fn zero_chunk_size_is_rejected() {
        assert_eq!(commit(b"x", 0), Err(MerkleError::InvalidChunkSize(0)));
    }

    #[test]
    fn commitment_is_deterministic_and_sensitive() {
        let a = commit("héllo 世界 🚀".as_bytes(), 5).unwrap();
        let b = commit("héllo 世界 🚀".as_bytes(), 5).unwrap();
        let c = commit("héllo 世界 🚁".as_bytes(), 5).unwrap();
        assert_eq!(a, b);
        assert_ne!(a.root, c.root);
    }

    #[test]
    fn fold_matches_commit() {
        let c = commit(b"0123456789", 3).unwrap();
        assert_eq!(fold(&c.leaves), c.root);
    }
}
