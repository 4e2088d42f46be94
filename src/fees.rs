//! Fee-rate model: size estimation, fee calculation, and miner fee quotes.
//!
//! Queries per-miner fee statistics from the chain-data provider over a
//! fixed lookback window, reduces them with a configurable strategy, and
//! clamps the result into safe bounds. Provider failures fall back to a
//! default quote and are never surfaced to the caller.

use chrono::{Duration, Utc};

use crate::provider::ChainDataProvider;
use crate::types::FeeQuote;

/// Fixed serialized-size overhead of a transaction in bytes
/// (version, input/output counts, lock time).
pub const TX_OVERHEAD_SIZE: u64 = 10;
/// Serialized size of one P2PKH input in bytes.
pub const P2PKH_INPUT_SIZE: u64 = 148;
/// Serialized size of one P2PKH output in bytes.
pub const P2PKH_OUTPUT_SIZE: u64 = 34;

/// The chain's dust floor in satoshis.
pub const DUST_LIMIT: u64 = 1;

/// Fee rate used when no provider data is available, in satoshis per KB.
pub const DEFAULT_FEE_RATE: u64 = 500;
/// Lowest fee rate the model will ever return, in satoshis per KB.
pub const MIN_FEE_RATE: u64 = 50;
/// Highest fee rate the model will ever return, in satoshis per KB.
pub const MAX_FEE_RATE: u64 = 10_000;

/// Lookback window for miner fee statistics, in hours.
pub const FEE_LOOKBACK_HOURS: i64 = 24;

/// Strategy for reducing per-miner fee rates to a single quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeeStrategy {
    /// Minimum rate across all miners. Cheapest, slowest acceptance.
    Economy,
    /// Rate accepted by at least `min_miners` miners.
    #[default]
    Normal,
    /// Maximum rate across all miners. Fastest acceptance.
    Priority,
}

/// Estimate the serialized size in bytes of a transaction with the given
/// input and output counts, assuming P2PKH scripts throughout.
pub fn estimate_tx_size(num_inputs: usize, num_outputs: usize) -> u64 {
    TX_OVERHEAD_SIZE
        + num_inputs as u64 * P2PKH_INPUT_SIZE
        + num_outputs as u64 * P2PKH_OUTPUT_SIZE
}

/// Estimate the fee in satoshis for a transaction shape at the given rate.
///
/// Computes `ceil(size * rate / 1000)` where `rate` is satoshis per KB.
pub fn estimate_fee(num_inputs: usize, num_outputs: usize, rate_sat_per_kb: u64) -> u64 {
    let size = estimate_tx_size(num_inputs, num_outputs) as u128;
    ((size * rate_sat_per_kb as u128 + 999) / 1000) as u64
}

/// Clamp a fee rate into `[MIN_FEE_RATE, MAX_FEE_RATE]`.
pub fn clamp_fee_rate(rate: u64) -> u64 {
    rate.clamp(MIN_FEE_RATE, MAX_FEE_RATE)
}

/// Fee model configured with a strategy and a miner-acceptance threshold.
#[derive(Debug, Clone, Copy)]
pub struct FeeModel {
    /// Strategy for reducing per-miner rates.
    pub strategy: FeeStrategy,
    /// Minimum number of miners that must accept the chosen rate
    /// (used by [`FeeStrategy::Normal`]).
    pub min_miners: usize,
}

impl Default for FeeModel {
    fn default() -> Self {
        Self {
            strategy: FeeStrategy::Normal,
            min_miners: 2,
        }
    }
}

impl FeeModel {
    /// Create a fee model with the given strategy and miner threshold.
    pub fn new(strategy: FeeStrategy, min_miners: usize) -> Self {
        Self {
            strategy,
            min_miners,
        }
    }

    /// Derive a fresh fee quote from provider statistics.
    ///
    /// Queries the provider over the last [`FEE_LOOKBACK_HOURS`] hours.
    /// A transport error or an empty result set is a recovered failure:
    /// the returned quote carries `source = "default"` and the default
    /// rate. A quote is never cached across calls.
    pub async fn fee_quote(&self, provider: &dyn ChainDataProvider) -> FeeQuote {
        let now = Utc::now();
        let from = now - Duration::hours(FEE_LOOKBACK_HOURS);

        let stats = match provider.miner_fee_stats(from, now).await {
            Ok(stats) if !stats.is_empty() => stats,
            Ok(_) => {
                log::debug!("fee quote: provider returned no miner stats, using default");
                return Self::default_quote();
            }
            Err(e) => {
                log::debug!("fee quote: provider error ({e}), using default");
                return Self::default_quote();
            }
        };

        let standard: Vec<f64> = stats.iter().map(|s| s.standard_rate).collect();
        let data: Vec<f64> = stats.iter().map(|s| s.data_rate).collect();

        FeeQuote {
            standard_rate: clamp_fee_rate(self.pick_rate(&standard)),
            data_rate: clamp_fee_rate(self.pick_rate(&data)),
            source: "provider",
            timestamp: now,
        }
    }

    /// The fallback quote used when provider data is unavailable.
    pub fn default_quote() -> FeeQuote {
        FeeQuote {
            standard_rate: DEFAULT_FEE_RATE,
            data_rate: DEFAULT_FEE_RATE,
            source: "default",
            timestamp: Utc::now(),
        }
    }

    /// Reduce per-miner rates to a single rate according to the strategy,
    /// rounded up to an integer satoshi-per-KB value.
    ///
    /// For [`FeeStrategy::Normal`], miners are sorted descending by rate
    /// and the rate at index `min_miners - 1` (clamped into the valid
    /// range) is chosen, so at least `min_miners` miners accept it.
    fn pick_rate(&self, rates: &[f64]) -> u64 {
        let picked = match self.strategy {
            FeeStrategy::Economy => rates.iter().cloned().fold(f64::INFINITY, f64::min),
            FeeStrategy::Priority => rates.iter().cloned().fold(0.0, f64::max),
            FeeStrategy::Normal => {
                let mut sorted = rates.to_vec();
                sorted.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
                let index = self.min_miners.saturating_sub(1).min(sorted.len() - 1);
                sorted[index]
            }
        };
        picked.ceil() as u64
    }
}
