//! Core data types: UTXOs, outputs, balances, fee quotes, and results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Ticker symbol for the chain's native token.
pub const SYMBOL: &str = "BSV";

/// Number of decimal places in the chain's native token (1 BSV = 1e8 satoshis).
pub const DECIMALS: u32 = 8;

/// An unspent transaction output.
///
/// Identified by the `(tx_id, vout)` pair, which is unique within any
/// working set. Selection operates on clones so the caller's original
/// slice is never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Utxo {
    /// Hex-encoded hash of the transaction that created this output.
    pub tx_id: String,
    /// Index of this output within that transaction.
    pub vout: u32,
    /// Value in satoshis.
    pub amount: u64,
    /// The address that controls this output, if known.
    #[serde(default)]
    pub address: String,
    /// Raw locking script in hex, if the address is not known.
    #[serde(default)]
    pub script: Option<String>,
    /// Number of confirmations at query time.
    #[serde(default)]
    pub confirmations: i64,
}

/// A transaction output: destination address plus amount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxOutput {
    /// Destination address in Base58Check form.
    pub address: String,
    /// Value in satoshis. Must be at or above the dust floor.
    pub amount: u64,
}

/// A read-only balance snapshot for one address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Balance {
    /// The queried address.
    pub address: String,
    /// Confirmed balance in satoshis.
    pub confirmed: u64,
    /// Unconfirmed delta in satoshis, if known. Best-effort.
    pub unconfirmed: Option<i64>,
    /// Token symbol, e.g. `BSV`.
    pub symbol: String,
    /// Decimal places for display formatting.
    pub decimals: u32,
}

/// Per-miner fee rate statistics as reported by the chain-data provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MinerFeeStat {
    /// Miner identifier.
    pub miner: String,
    /// Standard (payment) fee rate in satoshis per kilobyte.
    pub standard_rate: f64,
    /// Data-carrier fee rate in satoshis per kilobyte.
    pub data_rate: f64,
}

/// A fee quote derived fresh per estimation call. Never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeeQuote {
    /// Standard fee rate in satoshis per kilobyte, clamped to safe bounds.
    pub standard_rate: u64,
    /// Data-carrier fee rate in satoshis per kilobyte. Informational.
    pub data_rate: u64,
    /// Where the quote came from: `"provider"` or `"default"`.
    pub source: &'static str,
    /// When the quote was derived.
    pub timestamp: DateTime<Utc>,
}

/// Outcome of a completed send or sweep operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionResult {
    /// Transaction ID accepted by the network.
    pub hash: String,
    /// Source address(es), comma separated for multi-address sweeps.
    pub from: String,
    /// Destination address.
    pub to: String,
    /// Amount sent, as a fixed-point decimal string.
    pub amount: String,
    /// Fee paid, as a fixed-point decimal string.
    pub fee: String,
    /// Submission status, e.g. `broadcast`.
    pub status: String,
}

/// Render an integer satoshi count as a fixed-point decimal string.
///
/// No binary floating point is involved: the value is split with integer
/// division at the chain's declared precision.
pub fn format_amount(satoshis: u64, decimals: u32) -> String {
    let scale = 10u64.pow(decimals);
    let whole = satoshis / scale;
    let frac = satoshis % scale;
    format!("{whole}.{frac:0width$}", width = decimals as usize)
}

/// Render a signed satoshi count as a fixed-point decimal string.
pub fn format_amount_signed(satoshis: i64, decimals: u32) -> String {
    let sign = if satoshis < 0 { "-" } else { "" };
    format!(
        "{sign}{}",
        format_amount(satoshis.unsigned_abs(), decimals)
    )
}
