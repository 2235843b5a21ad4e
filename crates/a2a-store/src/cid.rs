//! CIDv1 computation for raw blocks.

use a2a_canonical::ContentId;
use base64::Engine;
use sha2::{Digest, Sha256};

/// CID version byte.
const CID_V1: u8 = 0x01;
/// Multicodec `raw`.
const CODEC_RAW: u8 = 0x55;
/// Multihash code for sha2-256.
const MULTIHASH_SHA2_256: u8 = 0x12;
/// Digest length of sha2-256.
const SHA2_256_LEN: u8 = 0x20;
/// Multibase prefix for base64url without padding.
const MULTIBASE_BASE64URL: char = 'u';

/// Computes the CIDv1 (raw codec, sha2-256) of `bytes`, multibase base64url.
///
/// For single-block content this is the same CID an IPFS node reports with
/// raw leaves enabled, only in a different base.
pub fn cid_v1_raw(bytes: &[u8]) -> ContentId {
    let digest = Sha256::digest(bytes);
    let mut binary = Vec::with_capacity(4 + digest.len());
    binary.extend_from_slice(&[CID_V1, CODEC_RAW, MULTIHASH_SHA2_256, SHA2_256_LEN]);
    binary.extend_from_slice(&digest);

    let mut encoded = String::with_capacity(1 + 48);
    encoded.push(MULTIBASE_BASE64URL);
    encoded.push_str(&base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(binary));
    ContentId::new(encoded)
}
