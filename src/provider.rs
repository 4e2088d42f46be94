//! Chain-data capability interfaces and bulk wire types.
//!
//! The payment flows consume remote indexers through these traits rather
//! than concrete services, so any backend that can answer balance, UTXO,
//! fee, and broadcast queries can be plugged in.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::PaymentsError;
use crate::types::{Balance, MinerFeeStat, Utxo};

/// Maximum number of addresses or outputs accepted per bulk call.
pub const MAX_BATCH_SIZE: usize = 20;

/// Confirmed/unconfirmed balance figures for one address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceData {
    /// Confirmed balance in satoshis.
    pub confirmed: u64,
    /// Unconfirmed delta in satoshis.
    #[serde(default)]
    pub unconfirmed: i64,
}

/// One entry of a bulk balance response.
///
/// `balance` is `None` when the provider included the address but could
/// not produce a balance object. Callers must treat a missing entry as a
/// signal to retry that address individually, never as a zero balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkBalanceEntry {
    /// The queried address.
    pub address: String,
    /// The balance figures, or `None` if the provider returned null.
    #[serde(default)]
    pub balance: Option<BalanceData>,
}

/// One entry of a bulk UTXO response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkUtxoEntry {
    /// The queried address.
    pub address: String,
    /// The unspent outputs held by that address.
    #[serde(default)]
    pub utxos: Vec<Utxo>,
}

/// Reference to a specific transaction output.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputRef {
    /// Hex-encoded transaction hash.
    pub tx_id: String,
    /// Output index within that transaction.
    pub vout: u32,
}

/// Spent status of one queried output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpentStatus {
    /// The queried output.
    pub output: OutputRef,
    /// Txid of the spending transaction, or `None` if still unspent.
    #[serde(default)]
    pub spent_by: Option<String>,
}

/// Capability interface for a remote chain indexer.
///
/// Bulk variants accept at most [`MAX_BATCH_SIZE`] addresses or outputs
/// per call; chunking larger lists is the caller's job (see
/// [`BulkBatchRunner`](crate::bulk::BulkBatchRunner)).
#[async_trait]
pub trait ChainDataProvider: Send + Sync {
    /// Fetch the balance of a single address.
    async fn balance(&self, address: &str) -> Result<Balance, PaymentsError>;

    /// Fetch the unspent outputs of a single address.
    async fn unspent_outputs(&self, address: &str) -> Result<Vec<Utxo>, PaymentsError>;

    /// Fetch per-miner fee statistics over the given time window.
    async fn miner_fee_stats(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<MinerFeeStat>, PaymentsError>;

    /// Submit a hex-encoded raw transaction, returning its txid.
    async fn broadcast_tx(&self, raw_tx_hex: &str) -> Result<String, PaymentsError>;

    /// Fetch confirmed balances for up to [`MAX_BATCH_SIZE`] addresses.
    async fn bulk_confirmed_balance(
        &self,
        addresses: &[String],
    ) -> Result<Vec<BulkBalanceEntry>, PaymentsError>;

    /// Fetch unconfirmed balances for up to [`MAX_BATCH_SIZE`] addresses.
    async fn bulk_unconfirmed_balance(
        &self,
        addresses: &[String],
    ) -> Result<Vec<BulkBalanceEntry>, PaymentsError>;

    /// Fetch confirmed UTXOs for up to [`MAX_BATCH_SIZE`] addresses.
    async fn bulk_confirmed_utxos(
        &self,
        addresses: &[String],
    ) -> Result<Vec<BulkUtxoEntry>, PaymentsError>;

    /// Fetch unconfirmed UTXOs for up to [`MAX_BATCH_SIZE`] addresses.
    async fn bulk_unconfirmed_utxos(
        &self,
        addresses: &[String],
    ) -> Result<Vec<BulkUtxoEntry>, PaymentsError>;

    /// Fetch spent status for up to [`MAX_BATCH_SIZE`] outputs.
    async fn bulk_spent_outputs(
        &self,
        outputs: &[OutputRef],
    ) -> Result<Vec<SpentStatus>, PaymentsError>;
}
