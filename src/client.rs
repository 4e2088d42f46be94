//! High-level client tying the pieces together: fee quotes, coin
//! selection, transaction building, signing handoff, and broadcast.
//!
//! Each `Client` is independently constructible and owns its own rate
//! limiter and metrics; there is no process-wide shared state.

use std::collections::HashMap;
use std::sync::Arc;

use crate::address;
use crate::broadcast::{BroadcastChain, Broadcaster};
use crate::builder::{calculate_sweep_amount, TransactionBuilder};
use crate::bulk::{BulkBalanceReport, BulkBatchRunner, BulkSpentReport, BulkUtxoReport};
use crate::error::PaymentsError;
use crate::fees::{FeeModel, FeeStrategy};
use crate::limiter::RateLimiter;
use crate::metrics::{Metrics, MetricsSnapshot};
use crate::provider::{ChainDataProvider, OutputRef, MAX_BATCH_SIZE};
use crate::selection::select_utxos;
use crate::signing::{KeyMaterial, TransactionSigner};
use crate::types::{format_amount, Balance, FeeQuote, TransactionResult, Utxo, DECIMALS};

/// Configuration for a [`Client`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Strategy for reducing miner fee rates to a quote.
    pub fee_strategy: FeeStrategy,
    /// Miner-acceptance threshold for [`FeeStrategy::Normal`].
    pub min_miners: usize,
    /// Addresses or outputs per bulk batch, capped at the provider limit.
    pub batch_size: usize,
    /// Rate-limiter refill rate, calls per second.
    pub rate_per_sec: f64,
    /// Rate-limiter burst capacity.
    pub burst: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            fee_strategy: FeeStrategy::Normal,
            min_miners: 2,
            batch_size: MAX_BATCH_SIZE,
            rate_per_sec: 3.0,
            burst: 3,
        }
    }
}

/// A payment client for one chain-data provider and an ordered set of
/// broadcast providers.
pub struct Client {
    provider: Arc<dyn ChainDataProvider>,
    chain: BroadcastChain,
    fee_model: FeeModel,
    limiter: RateLimiter,
    metrics: Metrics,
    config: ClientConfig,
}

impl Client {
    /// Create a client over a chain-data provider and broadcasters in
    /// fallback order.
    pub fn new(
        provider: Arc<dyn ChainDataProvider>,
        broadcasters: Vec<Box<dyn Broadcaster>>,
        config: ClientConfig,
    ) -> Self {
        Self {
            provider,
            chain: BroadcastChain::new(broadcasters),
            fee_model: FeeModel::new(config.fee_strategy, config.min_miners),
            limiter: RateLimiter::new(config.rate_per_sec, config.burst),
            metrics: Metrics::new(),
            config,
        }
    }

    /// Fetch the balance of a validated address.
    pub async fn balance(&self, addr: &str) -> Result<Balance, PaymentsError> {
        address::validate(addr)?;
        self.provider.balance(addr).await
    }

    /// Fetch the unspent outputs of a validated address.
    pub async fn utxos(&self, addr: &str) -> Result<Vec<Utxo>, PaymentsError> {
        address::validate(addr)?;
        self.provider.unspent_outputs(addr).await
    }

    /// Derive a fresh fee quote. Falls back to the default quote when the
    /// provider has no data; never fails.
    pub async fn fee_quote(&self) -> FeeQuote {
        self.fee_model.fee_quote(self.provider.as_ref()).await
    }

    /// Snapshot of the rolling bulk-query metrics.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Build, sign, and broadcast a payment from pre-fetched UTXOs.
    ///
    /// Selects inputs from `utxos`, pays `amount` to `to_addr`, returns
    /// change above the dust floor to `from_addr`, signs everything with
    /// `key` (wiped after use), and submits through the broadcast chain.
    pub async fn send(
        &self,
        from_addr: &str,
        utxos: &[Utxo],
        to_addr: &str,
        amount: u64,
        key: KeyMaterial,
        signer: &dyn TransactionSigner,
    ) -> Result<TransactionResult, PaymentsError> {
        address::validate(from_addr)?;
        address::validate(to_addr)?;

        let quote = self.fee_quote().await;
        let (selected, change) = select_utxos(utxos, amount, quote.standard_rate)?;

        let mut builder = TransactionBuilder::new();
        builder.set_fee_rate(quote.standard_rate);
        for utxo in selected {
            builder.add_input(utxo);
        }
        builder.add_output(to_addr, amount)?;
        if change > 0 {
            builder.add_output(from_addr, change)?;
        }

        let fee_paid = builder.total_inputs()? - builder.total_outputs()?;
        let raw_tx = builder.sign(signer, key)?;
        let txid = self.chain.broadcast_transaction(&raw_tx).await?;

        Ok(TransactionResult {
            hash: txid,
            from: from_addr.to_string(),
            to: to_addr.to_string(),
            amount: format_amount(amount, DECIMALS),
            fee: format_amount(fee_paid, DECIMALS),
            status: "broadcast".to_string(),
        })
    }

    /// Fetch UTXOs for `from_addr` from the provider, then send.
    pub async fn send_from_address(
        &self,
        from_addr: &str,
        to_addr: &str,
        amount: u64,
        key: KeyMaterial,
        signer: &dyn TransactionSigner,
    ) -> Result<TransactionResult, PaymentsError> {
        let utxos = self.utxos(from_addr).await?;
        self.send(from_addr, &utxos, to_addr, amount, key, signer)
            .await
    }

    /// Sweep every given UTXO to a single destination with no change
    /// output, signing each input with the key mapped from its owning
    /// address.
    pub async fn sweep(
        &self,
        utxos: &[Utxo],
        to_addr: &str,
        keys: HashMap<String, KeyMaterial>,
        signer: &dyn TransactionSigner,
    ) -> Result<TransactionResult, PaymentsError> {
        address::validate(to_addr)?;
        if utxos.is_empty() {
            return Err(PaymentsError::NoInputs);
        }

        let mut total: u64 = 0;
        for utxo in utxos {
            total = total
                .checked_add(utxo.amount)
                .ok_or(PaymentsError::AmountOverflow)?;
        }

        let quote = self.fee_quote().await;
        let amount = calculate_sweep_amount(total, utxos.len(), quote.standard_rate)?;

        let mut builder = TransactionBuilder::new();
        builder.set_fee_rate(quote.standard_rate);
        for utxo in utxos {
            builder.add_input(utxo.clone());
        }
        builder.add_output(to_addr, amount)?;

        let raw_tx = builder.sign_multi(signer, keys)?;
        let txid = self.chain.broadcast_transaction(&raw_tx).await?;

        let mut from: Vec<String> = Vec::new();
        for utxo in utxos {
            if !from.contains(&utxo.address) {
                from.push(utxo.address.clone());
            }
        }

        Ok(TransactionResult {
            hash: txid,
            from: from.join(","),
            to: to_addr.to_string(),
            amount: format_amount(amount, DECIMALS),
            fee: format_amount(total - amount, DECIMALS),
            status: "broadcast".to_string(),
        })
    }

    /// Bulk balance query over any number of addresses, chunked and
    /// rate limited. See [`BulkBalanceReport`] for the partial-failure
    /// contract.
    pub async fn bulk_balances(&self, addresses: &[String]) -> BulkBalanceReport {
        self.runner().bulk_balances(addresses).await
    }

    /// Bulk UTXO query over any number of addresses.
    pub async fn bulk_utxos(&self, addresses: &[String]) -> BulkUtxoReport {
        self.runner().bulk_utxos(addresses).await
    }

    /// Bulk spent-status query over any number of outputs.
    pub async fn bulk_spent(&self, outputs: &[OutputRef]) -> BulkSpentReport {
        self.runner().bulk_spent(outputs).await
    }

    fn runner(&self) -> BulkBatchRunner<'_> {
        BulkBatchRunner::new(
            self.provider.as_ref(),
            &self.limiter,
            &self.metrics,
            self.config.batch_size,
        )
    }
}
