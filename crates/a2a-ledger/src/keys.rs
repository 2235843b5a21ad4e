//! XRPL account keys derived from a family seed.
//!
//! Seeds and addresses are base58 in the ripple alphabet with a four byte
//! double SHA-256 checksum. An `sEd...` seed selects Ed25519; any other seed
//! is secp256k1 with the root/account generator derivation.

use ed25519_dalek::Signer as _;
use k256::ecdsa::signature::hazmat::PrehashSigner;
use k256::elliptic_curve::sec1::ToEncodedPoint;
use ripemd::Ripemd160;
use sha2::{Digest, Sha256, Sha512};
use std::fmt;

use crate::error::LedgerError;

const SEED_PREFIX_SECP256K1: &[u8] = &[0x21];
const SEED_PREFIX_ED25519: &[u8] = &[0x01, 0xE1, 0x4B];
const ACCOUNT_ID_PREFIX: u8 = 0x00;
const ED25519_KEY_PREFIX: u8 = 0xED;
const SEED_ENTROPY_LEN: usize = 16;
const ACCOUNT_ID_LEN: usize = 20;
const CHECKSUM_LEN: usize = 4;

/// First half of SHA-512 over the concatenated parts.
pub(crate) fn sha512_half(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Sha512::new();
    for part in parts {
        hasher.update(part);
    }
    let digest = hasher.finalize();
    let mut half = [0u8; 32];
    half.copy_from_slice(&digest[..32]);
    half
}

/// Signature algorithm selected by the seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyType {
    /// ECDSA over secp256k1 (`s...` seeds).
    Secp256k1,
    /// Ed25519 (`sEd...` seeds).
    Ed25519,
}

#[derive(Clone)]
enum SecretKey {
    Secp256k1(k256::ecdsa::SigningKey),
    Ed25519(ed25519_dalek::SigningKey),
}

/// Signing key pair of an XRPL account.
///
/// The secret half never leaves the process; [`fmt::Debug`] shows only the
/// public half.
#[derive(Clone)]
pub struct Keypair {
    secret: SecretKey,
    public_key: Vec<u8>,
    account_id: [u8; ACCOUNT_ID_LEN],
}

impl Keypair {
    /// Derives the master key pair of a family seed.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidConfiguration`] when the seed is not
    /// base58, fails its checksum or has an unknown prefix.
    pub fn from_seed(seed: &str) -> Result<Self, LedgerError> {
        let decoded = decode_check(seed.trim(), "seed")?;
        let (key_type, entropy) = match decoded.len() {
            n if n == SEED_PREFIX_ED25519.len() + SEED_ENTROPY_LEN
                && decoded.starts_with(SEED_PREFIX_ED25519) =>
            {
                (KeyType::Ed25519, &decoded[SEED_PREFIX_ED25519.len()..])
            }
            n if n == SEED_PREFIX_SECP256K1.len() + SEED_ENTROPY_LEN
                && decoded.starts_with(SEED_PREFIX_SECP256K1) =>
            {
                (KeyType::Secp256k1, &decoded[SEED_PREFIX_SECP256K1.len()..])
            }
            _ => {
                return Err(LedgerError::InvalidConfiguration(
                    "seed has an unknown prefix or length".to_string(),
                ))
            }
        };
        match key_type {
            KeyType::Ed25519 => Ok(Self::ed25519(entropy)),
            KeyType::Secp256k1 => Self::secp256k1(entropy),
        }
    }

    fn ed25519(entropy: &[u8]) -> Self {
        let key = ed25519_dalek::SigningKey::from_bytes(&sha512_half(&[entropy]));
        let mut public_key = Vec::with_capacity(33);
        public_key.push(ED25519_KEY_PREFIX);
        public_key.extend_from_slice(key.verifying_key().as_bytes());
        Self::with_public_key(SecretKey::Ed25519(key), public_key)
    }

    fn secp256k1(entropy: &[u8]) -> Result<Self, LedgerError> {
        let root = first_valid_scalar(&[entropy])?;
        let root_public = root.public_key().to_encoded_point(true);
        let account_index = 0u32.to_be_bytes();
        let intermediate = first_valid_scalar(&[root_public.as_bytes(), &account_index[..]])?;

        let scalar = *root.to_nonzero_scalar() + *intermediate.to_nonzero_scalar();
        let key = k256::ecdsa::SigningKey::from_bytes(&scalar.to_bytes()).map_err(|_| {
            LedgerError::InvalidConfiguration("seed yields an invalid secp256k1 key".to_string())
        })?;
        let public_key = key.verifying_key().to_encoded_point(true).as_bytes().to_vec();
        Ok(Self::with_public_key(SecretKey::Secp256k1(key), public_key))
    }

    fn with_public_key(secret: SecretKey, public_key: Vec<u8>) -> Self {
        let account_id = account_id_of(&public_key);
        Self {
            secret,
            public_key,
            account_id,
        }
    }

    /// Signature algorithm of this key pair.
    pub fn key_type(&self) -> KeyType {
        match self.secret {
            SecretKey::Secp256k1(_) => KeyType::Secp256k1,
            SecretKey::Ed25519(_) => KeyType::Ed25519,
        }
    }

    /// 33-byte public key as carried in `SigningPubKey`.
    pub fn public_key(&self) -> &[u8] {
        &self.public_key
    }

    /// 20-byte account id (RIPEMD-160 of SHA-256 of the public key).
    pub fn account_id(&self) -> [u8; ACCOUNT_ID_LEN] {
        self.account_id
    }

    /// Classic `r...` address of the key pair.
    pub fn address(&self) -> String {
        encode_address(&self.account_id)
    }

    /// Signs prefixed transaction bytes.
    ///
    /// Ed25519 signs the bytes as is. secp256k1 signs their SHA-512 half
    /// and returns a DER signature with a low `s`.
    pub fn sign(&self, signing_data: &[u8]) -> Result<Vec<u8>, LedgerError> {
        match &self.secret {
            SecretKey::Ed25519(key) => Ok(key.sign(signing_data).to_bytes().to_vec()),
            SecretKey::Secp256k1(key) => {
                let digest = sha512_half(&[signing_data]);
                let signature: k256::ecdsa::Signature = key
                    .sign_prehash(&digest)
                    .map_err(|e| LedgerError::Protocol(format!("signing failed: {}", e)))?;
                let signature = signature.normalize_s().unwrap_or(signature);
                Ok(signature.to_der().as_bytes().to_vec())
            }
        }
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keypair")
            .field("key_type", &self.key_type())
            .field("public_key", &hex::encode_upper(&self.public_key))
            .field("address", &self.address())
            .finish()
    }
}

fn first_valid_scalar(prefix: &[&[u8]]) -> Result<k256::SecretKey, LedgerError> {
    for seq in 0..=u32::MAX {
        let seq = seq.to_be_bytes();
        let mut parts = prefix.to_vec();
        parts.push(&seq[..]);
        if let Ok(key) = k256::SecretKey::from_slice(&sha512_half(&parts)) {
            return Ok(key);
        }
    }
    Err(LedgerError::InvalidConfiguration(
        "seed yields no valid secp256k1 key".to_string(),
    ))
}

fn account_id_of(public_key: &[u8]) -> [u8; ACCOUNT_ID_LEN] {
    let digest = Ripemd160::digest(Sha256::digest(public_key));
    let mut id = [0u8; ACCOUNT_ID_LEN];
    id.copy_from_slice(&digest);
    id
}

/// Classic address of a 20-byte account id.
pub fn encode_address(account_id: &[u8; ACCOUNT_ID_LEN]) -> String {
    let mut payload = Vec::with_capacity(1 + ACCOUNT_ID_LEN);
    payload.push(ACCOUNT_ID_PREFIX);
    payload.extend_from_slice(account_id);
    encode_check(&payload)
}

/// Account id of a classic address.
///
/// # Errors
///
/// Returns [`LedgerError::InvalidConfiguration`] for anything that is not a
/// well-formed classic address.
pub fn decode_address(address: &str) -> Result<[u8; ACCOUNT_ID_LEN], LedgerError> {
    let decoded = decode_check(address.trim(), "account address")?;
    match decoded.split_first() {
        Some((&ACCOUNT_ID_PREFIX, id)) if id.len() == ACCOUNT_ID_LEN => {
            let mut account_id = [0u8; ACCOUNT_ID_LEN];
            account_id.copy_from_slice(id);
            Ok(account_id)
        }
        _ => Err(LedgerError::InvalidConfiguration(format!(
            "not a classic address: {}",
            address
        ))),
    }
}

fn checksum(payload: &[u8]) -> [u8; CHECKSUM_LEN] {
    let digest = Sha256::digest(Sha256::digest(payload));
    let mut check = [0u8; CHECKSUM_LEN];
    check.copy_from_slice(&digest[..CHECKSUM_LEN]);
    check
}

fn encode_check(payload: &[u8]) -> String {
    let mut bytes = payload.to_vec();
    bytes.extend_from_slice(&checksum(payload));
    bs58::encode(bytes)
        .with_alphabet(bs58::Alphabet::RIPPLE)
        .into_string()
}

fn decode_check(text: &str, what: &str) -> Result<Vec<u8>, LedgerError> {
    let bytes = bs58::decode(text)
        .with_alphabet(bs58::Alphabet::RIPPLE)
        .into_vec()
        .map_err(|e| LedgerError::InvalidConfiguration(format!("{} is not base58: {}", what, e)))?;
    if bytes.len() <= CHECKSUM_LEN {
        return Err(LedgerError::InvalidConfiguration(format!(
            "{} is too short",
            what
        )));
    }
    let (payload, check) = bytes.split_at(bytes.len() - CHECKSUM_LEN);
    if checksum(payload)[..] != *check {
        return Err(LedgerError::InvalidConfiguration(format!(
            "{} checksum mismatch",
            what
        )));
    }
    Ok(payload.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::Verifier as _;
    use k256::ecdsa::signature::hazmat::PrehashVerifier;

    const GENESIS_SEED: &str = "snoPBrXtMeMyMHUVTgbuqAfg1SUTb";
    const GENESIS_ADDRESS: &str = "rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh";
    const ED25519_SEED: &str = "sEdSKaCy2JT7JaM7v95H9SxkhP9wS2r";

    #[test]
    fn secp256k1_seed_derives_known_account() {
        let keypair = Keypair::from_seed(GENESIS_SEED).unwrap();
        assert_eq!(keypair.key_type(), KeyType::Secp256k1);
        assert_eq!(
            hex::encode_upper(keypair.public_key()),
            "0330E7FC9D56BB25D6893BA3F317AE5BCF33B3291BD63DB32654A313222F7FD020"
        );
        assert_eq!(keypair.address(), GENESIS_ADDRESS);
        assert_eq!(decode_address(GENESIS_ADDRESS).unwrap(), keypair.account_id());
    }

    #[test]
    fn ed25519_seed_derives_known_account() {
        let keypair = Keypair::from_seed(ED25519_SEED).unwrap();
        assert_eq!(keypair.key_type(), KeyType::Ed25519);
        assert_eq!(
            hex::encode_upper(keypair.public_key()),
            "ED01FA53FA5A7E77798F882ECE20B1ABC00BB358A9E55A202D0D0676BD0CE37A63"
        );
        assert_eq!(keypair.address(), "rLUEXYuLiQptky37CqLcm9USQpPiz5rkpD");
    }

    #[test]
    fn signatures_verify_against_public_key() {
        let data: &[u8] = b"STX\0anchor";

        let ed = Keypair::from_seed(ED25519_SEED).unwrap();
        let signature = ed.sign(data).unwrap();
        assert_eq!(signature.len(), 64);
        let public: [u8; 32] = ed.public_key()[1..].try_into().unwrap();
        ed25519_dalek::VerifyingKey::from_bytes(&public)
            .unwrap()
            .verify(data, &ed25519_dalek::Signature::from_slice(&signature).unwrap())
            .unwrap();

        let secp = Keypair::from_seed(GENESIS_SEED).unwrap();
        let der = secp.sign(data).unwrap();
        let signature = k256::ecdsa::Signature::from_der(&der).unwrap();
        assert!(signature.normalize_s().is_none());
        k256::ecdsa::VerifyingKey::from_sec1_bytes(secp.public_key())
            .unwrap()
            .verify_prehash(&sha512_half(&[data]), &signature)
            .unwrap();
        assert_eq!(secp.sign(data).unwrap(), der);
    }

    #[test]
    fn malformed_seeds_are_configuration_errors() {
        let mut flipped = GENESIS_SEED.to_string();
        flipped.replace_range(5..6, "Z");
        for seed in ["", "not-base58-0OIl", flipped.as_str(), GENESIS_ADDRESS] {
            assert!(
                matches!(
                    Keypair::from_seed(seed),
                    Err(LedgerError::InvalidConfiguration(_))
                ),
                "{}",
                seed
            );
        }
    }

    #[test]
    fn debug_output_hides_secret() {
        let text = format!("{:?}", Keypair::from_seed(GENESIS_SEED).unwrap());
        assert!(text.contains(GENESIS_ADDRESS));
        assert!(!text.contains(GENESIS_SEED));
    }

    #[test]
    fn addresses_round_trip_and_reject_seeds() {
        let id = decode_address(GENESIS_ADDRESS).unwrap();
        assert_eq!(encode_address(&id), GENESIS_ADDRESS);
        assert!(decode_address(GENESIS_SEED).is_err());
        assert!(decode_address("rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTi").is_err());
    }
}
