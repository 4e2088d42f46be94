//! Batched, rate-limited bulk queries with partial-failure semantics.
//!
//! Large address or output lists are chunked to the provider's per-call
//! limit, each batch waits on the shared rate limiter, and the confirmed
//! and unconfirmed halves of a batch run concurrently. Confirmed data is
//! load-bearing: its failure fails the batch. Unconfirmed data is
//! best-effort: its failure degrades the batch to confirmed-only.

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use crate::limiter::RateLimiter;
use crate::metrics::Metrics;
use crate::provider::{BalanceData, ChainDataProvider, OutputRef, SpentStatus, MAX_BATCH_SIZE};
use crate::types::{Balance, Utxo, DECIMALS, SYMBOL};

/// Result of a bulk balance query.
///
/// An input address is present in `balances` only when the provider
/// returned a non-null balance object for it. An address covered by a
/// failed batch appears in `errors` instead. An address in neither map
/// was included by the provider with a null balance: the caller must
/// retry it individually rather than assume zero.
#[derive(Debug, Default)]
pub struct BulkBalanceReport {
    /// Balances for addresses the provider answered definitively.
    pub balances: HashMap<String, Balance>,
    /// Per-address error text for addresses in failed batches.
    pub errors: HashMap<String, String>,
}

/// Result of a bulk UTXO query. Same partial-failure contract as
/// [`BulkBalanceReport`].
#[derive(Debug, Default)]
pub struct BulkUtxoReport {
    /// Unspent outputs per address, confirmed plus best-effort unconfirmed.
    pub utxos: HashMap<String, Vec<Utxo>>,
    /// Per-address error text for addresses in failed batches.
    pub errors: HashMap<String, String>,
}

/// Result of a bulk spent-output query.
#[derive(Debug, Default)]
pub struct BulkSpentReport {
    /// Spent status per queried output.
    pub statuses: Vec<SpentStatus>,
    /// Per-output (`txid:vout`) error text for outputs in failed batches.
    pub errors: HashMap<String, String>,
}

/// Chunks bulk queries, applies the shared rate limiter, and merges
/// per-batch results.
pub struct BulkBatchRunner<'a> {
    provider: &'a dyn ChainDataProvider,
    limiter: &'a RateLimiter,
    metrics: &'a Metrics,
    batch_size: usize,
}

impl<'a> BulkBatchRunner<'a> {
    /// Create a runner over the given provider, limiter, and metrics.
    ///
    /// `batch_size` is clamped into `[1, MAX_BATCH_SIZE]`.
    pub fn new(
        provider: &'a dyn ChainDataProvider,
        limiter: &'a RateLimiter,
        metrics: &'a Metrics,
        batch_size: usize,
    ) -> Self {
        Self {
            provider,
            limiter,
            metrics,
            batch_size: batch_size.clamp(1, MAX_BATCH_SIZE),
        }
    }

    /// Fetch balances for any number of addresses.
    ///
    /// Batches are processed sequentially to respect the rate limiter's
    /// ordering; within a batch the confirmed and unconfirmed sub-queries
    /// run concurrently. A failed batch marks its addresses as errored
    /// and later batches still run.
    pub async fn bulk_balances(&self, addresses: &[String]) -> BulkBalanceReport {
        let mut report = BulkBalanceReport::default();

        for chunk in addresses.chunks(self.batch_size) {
            self.limiter.acquire().await;

            let started = Instant::now();
            let (confirmed, unconfirmed) = tokio::join!(
                self.provider.bulk_confirmed_balance(chunk),
                self.provider.bulk_unconfirmed_balance(chunk),
            );
            let elapsed = started.elapsed();
            self.metrics.record(elapsed, confirmed.is_err());
            self.metrics.record(elapsed, unconfirmed.is_err());

            let confirmed = match confirmed {
                Ok(entries) => entries,
                Err(e) => {
                    log::error!("bulk balance batch failed: {e}");
                    for addr in chunk {
                        report.errors.insert(addr.clone(), e.to_string());
                    }
                    continue;
                }
            };

            let unconfirmed_map: HashMap<String, BalanceData> = match unconfirmed {
                Ok(entries) => entries
                    .into_iter()
                    .filter_map(|e| e.balance.map(|b| (e.address, b)))
                    .collect(),
                Err(e) => {
                    // Unconfirmed data is best-effort: degrade to
                    // confirmed-only for this batch.
                    log::error!("bulk unconfirmed balance failed, using confirmed only: {e}");
                    HashMap::new()
                }
            };

            for entry in confirmed {
                // A null balance object is a fallback trigger, not a zero:
                // leave the address out of the result map entirely.
                let Some(data) = entry.balance else { continue };
                let unconfirmed = unconfirmed_map.get(&entry.address).map(|d| d.unconfirmed);
                report.balances.insert(
                    entry.address.clone(),
                    Balance {
                        address: entry.address,
                        confirmed: data.confirmed,
                        unconfirmed,
                        symbol: SYMBOL.to_string(),
                        decimals: DECIMALS,
                    },
                );
            }
        }

        report
    }

    /// Fetch unspent outputs for any number of addresses.
    ///
    /// Confirmed and unconfirmed UTXOs are merged per address, deduplicated
    /// on the `(tx_id, vout)` pair with the confirmed copy kept.
    pub async fn bulk_utxos(&self, addresses: &[String]) -> BulkUtxoReport {
        let mut report = BulkUtxoReport::default();

        for chunk in addresses.chunks(self.batch_size) {
            self.limiter.acquire().await;

            let started = Instant::now();
            let (confirmed, unconfirmed) = tokio::join!(
                self.provider.bulk_confirmed_utxos(chunk),
                self.provider.bulk_unconfirmed_utxos(chunk),
            );
            let elapsed = started.elapsed();
            self.metrics.record(elapsed, confirmed.is_err());
            self.metrics.record(elapsed, unconfirmed.is_err());

            let confirmed = match confirmed {
                Ok(entries) => entries,
                Err(e) => {
                    log::error!("bulk UTXO batch failed: {e}");
                    for addr in chunk {
                        report.errors.insert(addr.clone(), e.to_string());
                    }
                    continue;
                }
            };

            let mut unconfirmed_map: HashMap<String, Vec<Utxo>> = match unconfirmed {
                Ok(entries) => entries
                    .into_iter()
                    .map(|e| (e.address, e.utxos))
                    .collect(),
                Err(e) => {
                    log::error!("bulk unconfirmed UTXOs failed, using confirmed only: {e}");
                    HashMap::new()
                }
            };

            for entry in confirmed {
                let mut seen: HashSet<(String, u32)> = entry
                    .utxos
                    .iter()
                    .map(|u| (u.tx_id.clone(), u.vout))
                    .collect();
                let mut utxos = entry.utxos;
                if let Some(extra) = unconfirmed_map.remove(&entry.address) {
                    for utxo in extra {
                        if seen.insert((utxo.tx_id.clone(), utxo.vout)) {
                            utxos.push(utxo);
                        }
                    }
                }
                report.utxos.insert(entry.address, utxos);
            }
        }

        report
    }

    /// Fetch spent status for any number of outputs.
    pub async fn bulk_spent(&self, outputs: &[OutputRef]) -> BulkSpentReport {
        let mut report = BulkSpentReport::default();

        for chunk in outputs.chunks(self.batch_size) {
            self.limiter.acquire().await;

            let started = Instant::now();
            let result = self.provider.bulk_spent_outputs(chunk).await;
            self.metrics.record(started.elapsed(), result.is_err());

            match result {
                Ok(statuses) => report.statuses.extend(statuses),
                Err(e) => {
                    log::error!("bulk spent batch failed: {e}");
                    for output in chunk {
                        report
                            .errors
                            .insert(format!("{}:{}", output.tx_id, output.vout), e.to_string());
                    }
                }
            }
        }

        report
    }
}
