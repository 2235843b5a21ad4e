//! XRP Ledger adapter over JSON-RPC.
//!
//! Commitments ride in the `Memos` field of an `AccountSet` transaction the
//! anchoring account sends to itself with no flags changed: the fee is the
//! only value moved. Sequence and fee are read from the node, the
//! transaction is signed in process and only the signed blob is submitted.
//! The secret is never sent to the node.

use a2a_canonical::TxRef;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::time::Duration;

use crate::codec::AnchorTransaction;
use crate::error::LedgerError;
use crate::keys::Keypair;
use crate::payload::{decode_first, encode_memo, CommitmentPayload, Memo, MemoWrapper};
use crate::receipt::LedgerInclusion;
use crate::traits::{AnchoredPayload, Ledger};

/// Ledgers a submission may take before it expires.
pub const LAST_LEDGER_OFFSET: u64 = 20;

/// Highest fee paid for one anchor, in drops (2 XRP).
pub const MAX_FEE_DROPS: u64 = 2_000_000;

/// RPC error codes meaning the node cannot currently serve requests.
const UNAVAILABLE_CODES: &[&str] = &["tooBusy", "noNetwork", "noCurrent", "noClosed", "amendmentBlocked"];

fn default_node_url() -> String {
    "https://s.altnet.rippletest.net:51234".to_string()
}

fn default_network() -> String {
    "testnet".to_string()
}

fn default_confirm_timeout_secs() -> u64 {
    30
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_request_timeout_secs() -> u64 {
    20
}

/// Connection settings and credentials for an XRPL node.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XrplConfig {
    /// JSON-RPC endpoint.
    #[serde(default = "default_node_url")]
    pub node_url: String,
    /// Network tag written into receipts.
    #[serde(default = "default_network")]
    pub network: String,
    /// Classic address of the anchoring account.
    #[serde(default)]
    pub account: Option<String>,
    /// Family seed used to sign locally; never sent to the node.
    #[serde(default)]
    pub secret: Option<String>,
    /// Time to wait for validated inclusion.
    #[serde(default = "default_confirm_timeout_secs")]
    pub confirm_timeout_secs: u64,
    /// Delay between confirmation polls.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Per-request timeout.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for XrplConfig {
    fn default() -> Self {
        Self {
            node_url: default_node_url(),
            network: default_network(),
            account: None,
            secret: None,
            confirm_timeout_secs: default_confirm_timeout_secs(),
            poll_interval_ms: default_poll_interval_ms(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl fmt::Debug for XrplConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("XrplConfig")
            .field("node_url", &self.node_url)
            .field("network", &self.network)
            .field("account", &self.account)
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .field("confirm_timeout_secs", &self.confirm_timeout_secs)
            .field("poll_interval_ms", &self.poll_interval_ms)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

/// Node status from `server_info`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerStatus {
    /// rippled build version.
    pub build_version: String,
    /// Server state (`full`, `syncing`, ...).
    pub server_state: String,
    /// Sequence of the latest validated ledger, if any.
    pub validated_ledger: Option<u64>,
}

/// Account status from `account_info`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountStatus {
    /// Classic address.
    pub account: String,
    /// Balance in drops.
    pub balance_drops: String,
    /// Next transaction sequence.
    pub sequence: u64,
}

/// Error object returned inside a JSON-RPC result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RpcFailure {
    pub code: String,
    pub message: String,
}

impl RpcFailure {
    fn into_error(self) -> LedgerError {
        if UNAVAILABLE_CODES.contains(&self.code.as_str()) {
            LedgerError::Unavailable(format!("{}: {}", self.code, self.message))
        } else {
            LedgerError::Protocol(format!("{}: {}", self.code, self.message))
        }
    }
}

/// Confirmation state of a submitted transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TxStatus {
    Pending,
    Validated { ledger_index: u64 },
    Failed { code: String },
}

/// Ledger adapter for the XRP Ledger.
#[derive(Debug, Clone)]
pub struct XrplLedger {
    config: XrplConfig,
    client: Client,
}

impl XrplLedger {
    /// Creates an adapter for the configured node.
    pub fn new(config: XrplConfig) -> Result<Self, LedgerError> {
        if config.node_url.trim().is_empty() {
            return Err(LedgerError::InvalidConfiguration(
                "node_url is empty".to_string(),
            ));
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| LedgerError::Protocol(e.to_string()))?;
        Ok(Self { config, client })
    }

    /// Adapter configuration.
    pub fn config(&self) -> &XrplConfig {
        &self.config
    }

    fn credentials(&self) -> Result<(&str, &str), LedgerError> {
        match (&self.config.account, &self.config.secret) {
            (Some(account), Some(secret)) if !account.is_empty() && !secret.is_empty() => {
                Ok((account, secret))
            }
            _ => Err(LedgerError::InvalidConfiguration(
                "anchoring requires an XRPL account and secret".to_string(),
            )),
        }
    }

    /// Sends one JSON-RPC request and returns its `result` object as is.
    async fn call_raw(&self, method: &str, params: Value) -> Result<Value, LedgerError> {
        tracing::debug!(url = %self.config.node_url, method, "xrpl request");
        let resp = self
            .client
            .post(&self.config.node_url)
            .json(&json!({ "method": method, "params": [params] }))
            .send()
            .await
            .map_err(classify_send_error)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(classify_http_status(status, &body));
        }
        let mut body: Value = resp
            .json()
            .await
            .map_err(|e| LedgerError::Protocol(e.to_string()))?;
        match body.get_mut("result") {
            Some(result) => Ok(result.take()),
            None => Err(LedgerError::Protocol(format!(
                "{} response has no result",
                method
            ))),
        }
    }

    /// Like [`call_raw`](Self::call_raw), but turns RPC errors into
    /// [`LedgerError`]s.
    async fn call(&self, method: &str, params: Value) -> Result<Value, LedgerError> {
        let result = self.call_raw(method, params).await?;
        match rpc_failure(&result) {
            Some(failure) => Err(failure.into_error()),
            None => Ok(result),
        }
    }

    async fn current_ledger_index(&self) -> Result<u64, LedgerError> {
        let result = self.call("ledger_current", json!({})).await?;
        result
            .get("ledger_current_index")
            .and_then(Value::as_u64)
            .ok_or_else(|| LedgerError::Protocol("ledger_current_index missing".to_string()))
    }

    async fn lookup(&self, tx_ref: &str) -> Result<Option<Value>, LedgerError> {
        let result = self
            .call_raw("tx", json!({ "transaction": tx_ref, "binary": false }))
            .await?;
        match rpc_failure(&result) {
            Some(failure) if failure.code == "txnNotFound" => Ok(None),
            Some(failure) => Err(failure.into_error()),
            None => Ok(Some(result)),
        }
    }

    async fn wait_for_validation(
        &self,
        tx_ref: &TxRef,
        last_ledger_sequence: u64,
    ) -> Result<u64, LedgerError> {
        let deadline =
            tokio::time::Instant::now() + Duration::from_secs(self.config.confirm_timeout_secs);
        let interval = Duration::from_millis(self.config.poll_interval_ms.max(1));

        loop {
            tokio::time::sleep(interval).await;

            if let Some(result) = self.lookup(tx_ref.as_str()).await? {
                match tx_status(&result) {
                    TxStatus::Validated { ledger_index } => return Ok(ledger_index),
                    TxStatus::Failed { code } => {
                        return Err(LedgerError::SubmissionRejected {
                            code,
                            message: "transaction failed in a validated ledger".to_string(),
                        })
                    }
                    TxStatus::Pending => {}
                }
            }

            let current = self.current_ledger_index().await?;
            if current > last_ledger_sequence {
                return Err(LedgerError::NotConfirmed(format!(
                    "{} expired at ledger {} (current {})",
                    tx_ref, last_ledger_sequence, current
                )));
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(LedgerError::NotConfirmed(format!(
                    "{} not validated within {}s",
                    tx_ref, self.config.confirm_timeout_secs
                )));
            }
            tracing::debug!(tx_ref = %tx_ref, current, "waiting for validation");
        }
    }

    /// Next sequence of `account` in the current open ledger.
    async fn next_sequence(&self, account: &str) -> Result<u32, LedgerError> {
        let result = self
            .call(
                "account_info",
                json!({ "account": account, "ledger_index": "current" }),
            )
            .await?;
        let sequence = parse_account_info(&result)?.sequence;
        u32::try_from(sequence)
            .map_err(|_| LedgerError::Protocol(format!("account sequence {} out of range", sequence)))
    }

    /// Fee for inclusion in the open ledger, capped at [`MAX_FEE_DROPS`].
    async fn open_ledger_fee(&self) -> Result<u64, LedgerError> {
        let result = self.call("fee", json!({})).await?;
        parse_fee(&result)
    }

    /// Node version and sync state.
    pub async fn server_info(&self) -> Result<ServerStatus, LedgerError> {
        let result = self.call("server_info", json!({})).await?;
        parse_server_info(&result)
    }

    /// Balance and sequence of the configured account.
    pub async fn account_info(&self) -> Result<AccountStatus, LedgerError> {
        let account = self.config.account.as_deref().ok_or_else(|| {
            LedgerError::InvalidConfiguration("no XRPL account configured".to_string())
        })?;
        let result = self
            .call(
                "account_info",
                json!({ "account": account, "ledger_index": "validated" }),
            )
            .await?;
        parse_account_info(&result)
    }
}

#[async_trait]
impl Ledger for XrplLedger {
    fn network(&self) -> &str {
        &self.config.network
    }

    async fn submit(&self, payload: &CommitmentPayload) -> Result<LedgerInclusion, LedgerError> {
        let (account, secret) = self.credentials()?;
        let keypair = Keypair::from_seed(secret)?;
        if keypair.address() != account {
            tracing::debug!(account, signer = %keypair.address(), "signing with a regular key");
        }

        let memo = encode_memo(payload)?;
        let last_ledger_sequence = self.current_ledger_index().await? + LAST_LEDGER_OFFSET;
        let tx = AnchorTransaction {
            account: account.to_string(),
            sequence: self.next_sequence(account).await?,
            fee_drops: self.open_ledger_fee().await?,
            last_ledger_sequence: u32::try_from(last_ledger_sequence).map_err(|_| {
                LedgerError::Protocol(format!("ledger index {} out of range", last_ledger_sequence))
            })?,
            memo,
        };
        let signed = tx.sign(&keypair)?;
        tracing::debug!(tx = %tx.to_json(), tx_ref = %signed.tx_ref, "signed anchor transaction");

        let result = self
            .call_raw("submit", json!({ "tx_blob": signed.blob_hex() }))
            .await?;
        if let Some(failure) = rpc_failure(&result) {
            if UNAVAILABLE_CODES.contains(&failure.code.as_str()) {
                return Err(failure.into_error());
            }
            return Err(LedgerError::SubmissionRejected {
                code: failure.code,
                message: failure.message,
            });
        }

        let engine_result = result
            .get("engine_result")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let engine_message = result
            .get("engine_result_message")
            .and_then(Value::as_str)
            .unwrap_or_default();
        classify_preliminary(engine_result, engine_message)?;

        let tx_ref = signed.tx_ref;
        tracing::debug!(tx_ref = %tx_ref, engine_result, last_ledger_sequence, "submitted anchor transaction");

        let ledger_index = self.wait_for_validation(&tx_ref, last_ledger_sequence).await?;
        Ok(LedgerInclusion {
            tx_ref,
            ledger_index,
        })
    }

    async fn read(&self, tx_ref: &TxRef) -> Result<Option<AnchoredPayload>, LedgerError> {
        let result = self
            .lookup(tx_ref.as_str())
            .await?
            .ok_or_else(|| LedgerError::TransactionNotFound(tx_ref.clone()))?;
        let ledger_index = match tx_status(&result) {
            TxStatus::Validated { ledger_index } => Some(ledger_index),
            TxStatus::Pending => None,
            TxStatus::Failed { code } => {
                return Err(LedgerError::SubmissionRejected {
                    code,
                    message: "transaction failed in a validated ledger".to_string(),
                })
            }
        };
        let memos = extract_memos(&result)?;
        Ok(decode_first(&memos)?.map(|payload| AnchoredPayload {
            payload,
            ledger_index,
        }))
    }
}

/// Error object in a JSON-RPC result, if any.
pub(crate) fn rpc_failure(result: &Value) -> Option<RpcFailure> {
    let is_error = result.get("status").and_then(Value::as_str) == Some("error")
        || result.get("error").is_some();
    if !is_error {
        return None;
    }
    let code = result
        .get("error")
        .and_then(Value::as_str)
        .unwrap_or("unknown")
        .to_string();
    let message = result
        .get("error_message")
        .or_else(|| result.get("error_exception"))
        .and_then(Value::as_str)
        .unwrap_or(&code)
        .to_string();
    Some(RpcFailure { code, message })
}

/// Rejects preliminary results that can never succeed.
///
/// `tem` (malformed), `tef` (failed locally) and `tel` (local policy) codes
/// are final. `tes`, `ter` (retry/queued) and `tec` (claimed fee, decided at
/// validation) continue to the confirmation wait.
pub(crate) fn classify_preliminary(code: &str, message: &str) -> Result<(), LedgerError> {
    if code.is_empty() {
        return Err(LedgerError::Protocol(
            "submit response has no engine_result".to_string(),
        ));
    }
    if code.starts_with("tem") || code.starts_with("tef") || code.starts_with("tel") {
        return Err(LedgerError::SubmissionRejected {
            code: code.to_string(),
            message: message.to_string(),
        });
    }
    Ok(())
}

/// Confirmation state of a `tx` result.
pub(crate) fn tx_status(result: &Value) -> TxStatus {
    if result.get("validated").and_then(Value::as_bool) != Some(true) {
        return TxStatus::Pending;
    }
    let code = result
        .pointer("/meta/TransactionResult")
        .and_then(Value::as_str)
        .unwrap_or("tesSUCCESS");
    if code != "tesSUCCESS" {
        return TxStatus::Failed {
            code: code.to_string(),
        };
    }
    match result.get("ledger_index").and_then(Value::as_u64) {
        Some(ledger_index) => TxStatus::Validated { ledger_index },
        None => TxStatus::Pending,
    }
}

/// Memos of a `tx` result; API v1 puts them at the top level, v2 under
/// `tx_json`.
pub(crate) fn extract_memos(result: &Value) -> Result<Vec<Memo>, LedgerError> {
    let raw = result
        .get("Memos")
        .or_else(|| result.pointer("/tx_json/Memos"));
    match raw {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(value) => {
            let wrapped: Vec<MemoWrapper> = serde_json::from_value(value.clone())
                .map_err(|e| LedgerError::Decode(format!("malformed Memos field: {}", e)))?;
            Ok(wrapped.into_iter().map(|w| w.memo).collect())
        }
    }
}

pub(crate) fn parse_server_info(result: &Value) -> Result<ServerStatus, LedgerError> {
    let info = result
        .get("info")
        .ok_or_else(|| LedgerError::Protocol("server_info has no info".to_string()))?;
    Ok(ServerStatus {
        build_version: info
            .get("build_version")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        server_state: info
            .get("server_state")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        validated_ledger: info.pointer("/validated_ledger/seq").and_then(Value::as_u64),
    })
}

/// Open-ledger fee from a `fee` result, falling back to the base fee.
pub(crate) fn parse_fee(result: &Value) -> Result<u64, LedgerError> {
    let drops = |name: &str| {
        result
            .get("drops")
            .and_then(|d| d.get(name))
            .and_then(Value::as_str)
            .and_then(|v| v.parse::<u64>().ok())
    };
    let fee = drops("open_ledger_fee")
        .or_else(|| drops("base_fee"))
        .ok_or_else(|| LedgerError::Protocol("fee response has no drops".to_string()))?;
    Ok(fee.min(MAX_FEE_DROPS))
}

pub(crate) fn parse_account_info(result: &Value) -> Result<AccountStatus, LedgerError> {
    let data = result
        .get("account_data")
        .ok_or_else(|| LedgerError::Protocol("account_info has no account_data".to_string()))?;
    let field = |name: &str| {
        data.get(name)
            .ok_or_else(|| LedgerError::Protocol(format!("account_data has no {}", name)))
    };
    Ok(AccountStatus {
        account: field("Account")?.as_str().unwrap_or_default().to_string(),
        balance_drops: field("Balance")?.as_str().unwrap_or_default().to_string(),
        sequence: field("Sequence")?.as_u64().unwrap_or_default(),
    })
}

fn classify_send_error(err: reqwest::Error) -> LedgerError {
    if err.is_decode() || (err.is_body() && !err.is_timeout()) {
        LedgerError::Protocol(err.to_string())
    } else {
        LedgerError::Unavailable(err.to_string())
    }
}

fn classify_http_status(status: StatusCode, body: &str) -> LedgerError {
    let detail = format!("HTTP {}: {}", status, body.trim());
    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        LedgerError::Unavailable(detail)
    } else {
        LedgerError::Protocol(detail)
    }
}
