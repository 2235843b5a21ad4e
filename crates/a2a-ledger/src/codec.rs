//! XRPL binary serialization of the anchor transaction.
//!
//! Only the fields an anchor `AccountSet` carries are encoded. Fields are
//! written in canonical order (type code, then field code), and variable
//! length fields use the ledger's 1-3 byte length prefix.

use a2a_canonical::TxRef;
use serde_json::{json, Value};

use crate::error::LedgerError;
use crate::keys::{decode_address, sha512_half, Keypair};
use crate::payload::{Memo, MemoWrapper};

/// Prefix of the bytes a single signer signs (`STX\0`).
const SIGNING_PREFIX: &[u8] = b"STX\0";
/// Prefix of the bytes hashed into a transaction id (`TXN\0`).
const TX_ID_PREFIX: &[u8] = b"TXN\0";

const TYPE_UINT16: u8 = 1;
const TYPE_UINT32: u8 = 2;
const TYPE_AMOUNT: u8 = 6;
const TYPE_BLOB: u8 = 7;
const TYPE_ACCOUNT: u8 = 8;
const TYPE_OBJECT: u8 = 14;
const TYPE_ARRAY: u8 = 15;

const OBJECT_END: u8 = 0xE1;
const ARRAY_END: u8 = 0xF1;

const ACCOUNT_SET: u16 = 3;

/// Largest XRP amount in drops.
const MAX_DROPS: u64 = 100_000_000_000_000_000;
const POSITIVE_XRP: u64 = 0x4000_0000_0000_0000;

/// `AccountSet` from the anchoring account to itself, carrying one memo
/// and changing no flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchorTransaction {
    /// Classic address of the sender.
    pub account: String,
    /// Account sequence consumed by the transaction.
    pub sequence: u32,
    /// Fee in drops.
    pub fee_drops: u64,
    /// Last ledger the transaction may be included in.
    pub last_ledger_sequence: u32,
    /// Commitment memo.
    pub memo: Memo,
}

/// Signed transaction blob and its id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    /// Serialized signed transaction.
    pub blob: Vec<u8>,
    /// Transaction hash.
    pub tx_ref: TxRef,
}

impl SignedTransaction {
    /// Upper-case hex of the blob, as `submit` expects in `tx_blob`.
    pub fn blob_hex(&self) -> String {
        hex::encode_upper(&self.blob)
    }
}

impl AnchorTransaction {
    /// Transaction JSON, without signing fields.
    pub fn to_json(&self) -> Value {
        json!({
            "TransactionType": "AccountSet",
            "Account": self.account,
            "Sequence": self.sequence,
            "Fee": self.fee_drops.to_string(),
            "LastLedgerSequence": self.last_ledger_sequence,
            "Memos": [MemoWrapper { memo: self.memo.clone() }],
        })
    }

    /// Signs with `keypair` and serializes the result.
    pub fn sign(&self, keypair: &Keypair) -> Result<SignedTransaction, LedgerError> {
        let public_key = keypair.public_key();
        let mut signing_data = SIGNING_PREFIX.to_vec();
        signing_data.extend_from_slice(&self.encode(public_key, None)?);
        let signature = keypair.sign(&signing_data)?;

        let blob = self.encode(public_key, Some(&signature))?;
        let tx_ref = TxRef::parse(hex::encode_upper(sha512_half(&[TX_ID_PREFIX, &blob[..]])))?;
        Ok(SignedTransaction { blob, tx_ref })
    }

    /// Canonical field encoding; `signature` is omitted for signing data.
    pub(crate) fn encode(
        &self,
        signing_pub_key: &[u8],
        signature: Option<&[u8]>,
    ) -> Result<Vec<u8>, LedgerError> {
        let account_id = decode_address(&self.account)?;
        let mut out = Vec::with_capacity(512);

        put_field(&mut out, TYPE_UINT16, 2);
        out.extend_from_slice(&ACCOUNT_SET.to_be_bytes());
        put_field(&mut out, TYPE_UINT32, 4);
        out.extend_from_slice(&self.sequence.to_be_bytes());
        put_field(&mut out, TYPE_UINT32, 27);
        out.extend_from_slice(&self.last_ledger_sequence.to_be_bytes());
        put_field(&mut out, TYPE_AMOUNT, 8);
        out.extend_from_slice(&xrp_amount(self.fee_drops)?);
        put_field(&mut out, TYPE_BLOB, 3);
        put_vl(&mut out, signing_pub_key)?;
        if let Some(signature) = signature {
            put_field(&mut out, TYPE_BLOB, 4);
            put_vl(&mut out, signature)?;
        }
        put_field(&mut out, TYPE_ACCOUNT, 1);
        put_vl(&mut out, &account_id)?;

        put_field(&mut out, TYPE_ARRAY, 9);
        put_field(&mut out, TYPE_OBJECT, 10);
        for (field_code, value) in [
            (12, &self.memo.memo_type),
            (13, &self.memo.memo_data),
            (14, &self.memo.memo_format),
        ] {
            if let Some(value) = value {
                let bytes = hex::decode(value)
                    .map_err(|e| LedgerError::Protocol(format!("memo field is not hex: {}", e)))?;
                put_field(&mut out, TYPE_BLOB, field_code);
                put_vl(&mut out, &bytes)?;
            }
        }
        out.push(OBJECT_END);
        out.push(ARRAY_END);
        Ok(out)
    }
}

fn put_field(out: &mut Vec<u8>, type_code: u8, field_code: u8) {
    match (type_code < 16, field_code < 16) {
        (true, true) => out.push((type_code << 4) | field_code),
        (true, false) => out.extend_from_slice(&[type_code << 4, field_code]),
        (false, true) => out.extend_from_slice(&[field_code, type_code]),
        (false, false) => out.extend_from_slice(&[0, type_code, field_code]),
    }
}

fn put_vl(out: &mut Vec<u8>, data: &[u8]) -> Result<(), LedgerError> {
    let len = data.len();
    if len <= 192 {
        out.push(len as u8);
    } else if len <= 12_480 {
        let n = len - 193;
        out.extend_from_slice(&[193 + (n >> 8) as u8, (n & 0xFF) as u8]);
    } else if len <= 918_744 {
        let n = len - 12_481;
        out.extend_from_slice(&[
            241 + (n >> 16) as u8,
            ((n >> 8) & 0xFF) as u8,
            (n & 0xFF) as u8,
        ]);
    } else {
        return Err(LedgerError::Protocol(format!(
            "field of {} bytes is too long to encode",
            len
        )));
    }
    out.extend_from_slice(data);
    Ok(())
}

fn xrp_amount(drops: u64) -> Result<[u8; 8], LedgerError> {
    if drops > MAX_DROPS {
        return Err(LedgerError::Protocol(format!(
            "fee of {} drops exceeds the XRP supply",
            drops
        )));
    }
    Ok((POSITIVE_XRP | drops).to_be_bytes())
}
