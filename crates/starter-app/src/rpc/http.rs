//! JSON-RPC over HTTP.
//!
//! Thin wrapper over a node's HTTP endpoint. Account subscriptions are
//! served by a polling task per subscription rather than a websocket, so the
//! same `AccountSubscription` contract holds against any plain RPC URL. A
//! poller pushes the first balance it reads and then every change.
//! Response parsing lives in pure functions for testability.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chain_sol::{Hash, Pubkey, Signature, Transaction};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::{
    AccountNotification, AccountSubscription, LatestBlockhash, RpcClient, RpcError,
    SubscriptionId,
};
use crate::config::{Commitment, NetworkConfig};

const REQUEST_TIMEOUT_SECS: u64 = 30;
const CONNECT_TIMEOUT_SECS: u64 = 10;

// =============================================================================
// TRANSPORT
// =============================================================================

#[derive(Clone)]
struct Transport {
    http: reqwest::Client,
    endpoint: String,
    next_id: Arc<AtomicU64>,
}

impl Transport {
    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, RpcError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        debug!(method, id, "rpc request");

        let response = self
            .http
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| RpcError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| RpcError::Transport(e.to_string()))?;

        if status != 200 {
            return Err(RpcError::Transport(format!("HTTP {status}: {text}")));
        }

        parse_response(&text)
    }

    async fn balance(&self, pubkey: &Pubkey, commitment: Commitment) -> Result<u64, RpcError> {
        let res: WithContext<u64> = self
            .call(
                "getBalance",
                json!([pubkey.to_string(), { "commitment": commitment.as_str() }]),
            )
            .await?;
        Ok(res.value)
    }
}

// =============================================================================
// CLIENT
// =============================================================================

pub struct HttpRpcClient {
    transport: Transport,
    commitment: Commitment,
    poll_interval: Duration,
    subscriptions: Mutex<HashMap<SubscriptionId, JoinHandle<()>>>,
    next_subscription: AtomicU64,
}

impl HttpRpcClient {
    pub fn new(config: &NetworkConfig) -> Result<Self, RpcError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| RpcError::Transport(e.to_string()))?;

        Ok(Self {
            transport: Transport {
                http,
                endpoint: config.endpoint.clone(),
                next_id: Arc::new(AtomicU64::new(1)),
            },
            commitment: config.commitment,
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            subscriptions: Mutex::new(HashMap::new()),
            next_subscription: AtomicU64::new(0),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.transport.endpoint
    }

    /// Pollers still running.
    pub fn active_subscriptions(&self) -> usize {
        self.subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|handle| !handle.is_finished())
            .count()
    }

    fn commitment_config(&self) -> Value {
        json!({ "commitment": self.commitment.as_str() })
    }
}

impl Drop for HttpRpcClient {
    fn drop(&mut self) {
        let subs = self
            .subscriptions
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        for (_, handle) in subs.drain() {
            handle.abort();
        }
    }
}

#[async_trait]
impl RpcClient for HttpRpcClient {
    async fn get_balance(&self, pubkey: &Pubkey) -> Result<u64, RpcError> {
        self.transport.balance(pubkey, self.commitment).await
    }

    async fn request_airdrop(&self, pubkey: &Pubkey, lamports: u64) -> Result<Signature, RpcError> {
        let sig: String = self
            .transport
            .call(
                "requestAirdrop",
                json!([pubkey.to_string(), lamports, self.commitment_config()]),
            )
            .await?;
        parse_signature(&sig)
    }

    async fn get_latest_blockhash(&self) -> Result<LatestBlockhash, RpcError> {
        let res: WithContext<BlockhashValue> = self
            .transport
            .call("getLatestBlockhash", json!([self.commitment_config()]))
            .await?;
        Ok(LatestBlockhash {
            blockhash: decode_hash(&res.value.blockhash)?,
            last_valid_block_height: res.value.last_valid_block_height,
        })
    }

    async fn send_transaction(&self, tx: &Transaction) -> Result<Signature, RpcError> {
        let wire = tx
            .serialize()
            .map_err(|e| RpcError::TransactionFailed(e.to_string()))?;
        let sig: String = self
            .transport
            .call(
                "sendTransaction",
                json!([
                    BASE64.encode(wire),
                    { "encoding": "base64", "preflightCommitment": self.commitment.as_str() }
                ]),
            )
            .await?;
        parse_signature(&sig)
    }

    async fn confirm_transaction(
        &self,
        signature: &Signature,
        checkpoint: &LatestBlockhash,
    ) -> Result<(), RpcError> {
        loop {
            let statuses: WithContext<Vec<Option<SignatureStatus>>> = self
                .transport
                .call(
                    "getSignatureStatuses",
                    json!([[signature.to_string()], { "searchTransactionHistory": false }]),
                )
                .await?;

            if let Some(status) = statuses.value.into_iter().next().flatten() {
                if status_reached(&status, self.commitment)? {
                    debug!(%signature, "transaction confirmed");
                    return Ok(());
                }
            }

            let height: u64 = self
                .transport
                .call("getBlockHeight", json!([self.commitment_config()]))
                .await?;
            if height > checkpoint.last_valid_block_height {
                return Err(RpcError::BlockHeightExceeded(*signature));
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }

    async fn get_minimum_balance_for_rent_exemption(&self, data_len: usize) -> Result<u64, RpcError> {
        self.transport
            .call("getMinimumBalanceForRentExemption", json!([data_len]))
            .await
    }

    async fn get_account_data(&self, pubkey: &Pubkey) -> Result<Option<Vec<u8>>, RpcError> {
        let res: WithContext<Option<AccountValue>> = self
            .transport
            .call(
                "getAccountInfo",
                json!([
                    pubkey.to_string(),
                    { "encoding": "base64", "commitment": self.commitment.as_str() }
                ]),
            )
            .await?;
        res.value.map(|account| decode_account_data(&account)).transpose()
    }

    async fn subscribe_account(&self, pubkey: &Pubkey) -> Result<AccountSubscription, RpcError> {
        let id = self.next_subscription.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();
        let transport = self.transport.clone();
        let commitment = self.commitment;
        let interval = self.poll_interval;
        let pubkey = *pubkey;

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            let mut last: Option<u64> = None;

            loop {
                ticker.tick().await;
                if tx.is_closed() {
                    break;
                }
                match transport.balance(&pubkey, commitment).await {
                    // The first poll is pushed too: the account may have
                    // moved since the caller's own read.
                    Ok(lamports) if last != Some(lamports) => {
                        if tx.send(AccountNotification { lamports }).is_err() {
                            break;
                        }
                        last = Some(lamports);
                    }
                    Ok(_) => {}
                    Err(e) => warn!(%pubkey, error = %e, "account poll failed"),
                }
            }
            debug!(%pubkey, id, "account poller stopped");
        });

        let mut subs = self
            .subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        // Pollers whose receiver was dropped have already exited.
        subs.retain(|_, handle| !handle.is_finished());
        subs.insert(id, handle);
        drop(subs);

        Ok(AccountSubscription { id, updates: rx })
    }

    async fn unsubscribe_account(&self, id: SubscriptionId) -> Result<(), RpcError> {
        let handle = self
            .subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
            .ok_or(RpcError::UnknownSubscription(id))?;
        handle.abort();
        Ok(())
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorObject>,
}

#[derive(Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Deserialize)]
struct WithContext<T> {
    value: T,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BlockhashValue {
    blockhash: String,
    last_valid_block_height: u64,
}

#[derive(Deserialize)]
struct AccountValue {
    /// `[payload, encoding]`
    data: (String, String),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignatureStatus {
    err: Option<Value>,
    confirmation_status: Option<Commitment>,
}

// =============================================================================
// PARSING
// =============================================================================

fn parse_response<T: DeserializeOwned>(json: &str) -> Result<T, RpcError> {
    let response: RpcResponse<T> =
        serde_json::from_str(json).map_err(|e| RpcError::Parse(e.to_string()))?;

    if let Some(err) = response.error {
        return Err(RpcError::Server {
            code: err.code,
            message: err.message,
        });
    }

    response
        .result
        .ok_or_else(|| RpcError::Parse("response has neither result nor error".into()))
}

fn parse_signature(raw: &str) -> Result<Signature, RpcError> {
    raw.parse().map_err(|e| RpcError::Parse(format!("{e}")))
}

fn decode_hash(raw: &str) -> Result<Hash, RpcError> {
    let bytes = bs58::decode(raw)
        .into_vec()
        .map_err(|e| RpcError::Parse(format!("blockhash base58 decode failed: {e}")))?;
    bytes
        .try_into()
        .map_err(|v: Vec<u8>| RpcError::Parse(format!("blockhash must be 32 bytes, got {}", v.len())))
}

fn decode_account_data(account: &AccountValue) -> Result<Vec<u8>, RpcError> {
    let (payload, encoding) = &account.data;
    if encoding != "base64" {
        return Err(RpcError::Parse(format!("unexpected account encoding: {encoding}")));
    }
    BASE64
        .decode(payload)
        .map_err(|e| RpcError::Parse(format!("account data base64 decode failed: {e}")))
}

fn status_reached(status: &SignatureStatus, commitment: Commitment) -> Result<bool, RpcError> {
    if let Some(err) = &status.err {
        return Err(RpcError::TransactionFailed(err.to_string()));
    }
    Ok(status
        .confirmation_status
        .is_some_and(|reached| commitment.is_satisfied_by(reached)))
}
