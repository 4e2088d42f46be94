//! WhatsOnChain-style REST client implementing the chain-data and
//! broadcast capabilities.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::broadcast::Broadcaster;
use crate::error::PaymentsError;
use crate::provider::{
    BulkBalanceEntry, BulkUtxoEntry, ChainDataProvider, OutputRef, SpentStatus, MAX_BATCH_SIZE,
};
use crate::types::{Balance, MinerFeeStat, Utxo, DECIMALS, SYMBOL};

/// Configuration for a [`WocClient`].
#[derive(Debug, Clone)]
pub struct WocConfig {
    /// Base URL for the REST API
    /// (e.g. `https://api.whatsonchain.com/v1/bsv/main`).
    pub base_url: String,
    /// Optional API key sent as the `woc-api-key` header.
    pub api_key: Option<String>,
}

impl Default for WocConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.whatsonchain.com/v1/bsv/main".to_string(),
            api_key: None,
        }
    }
}

/// HTTP client for a WhatsOnChain-style chain indexer.
#[derive(Debug, Clone)]
pub struct WocClient {
    /// Client configuration.
    config: WocConfig,
    /// Underlying HTTP client.
    client: reqwest::Client,
}

/// Balance figures as returned by the indexer.
#[derive(Debug, Deserialize)]
struct WireBalance {
    confirmed: u64,
    #[serde(default)]
    unconfirmed: i64,
}

/// One unspent output as returned by the indexer.
#[derive(Debug, Deserialize)]
struct WireUtxo {
    #[serde(default)]
    height: i64,
    tx_pos: u32,
    tx_hash: String,
    value: u64,
}

impl WireUtxo {
    fn into_utxo(self, address: &str) -> Utxo {
        Utxo {
            tx_id: self.tx_hash,
            vout: self.tx_pos,
            amount: self.value,
            address: address.to_string(),
            script: None,
            // Height 0 means mempool; the indexer does not report depth,
            // so anything mined counts as one confirmation.
            confirmations: if self.height > 0 { 1 } else { 0 },
        }
    }
}

/// One entry of a bulk unspent response.
#[derive(Debug, Deserialize)]
struct WireUtxoEntry {
    address: String,
    #[serde(default)]
    unspent: Vec<WireUtxo>,
}

/// Request body for bulk address queries.
#[derive(Debug, Serialize)]
struct AddressesBody<'a> {
    addresses: &'a [String],
}

impl WocClient {
    /// Create a new client with the given configuration.
    pub fn new(config: WocConfig) -> Self {
        let client = reqwest::Client::new();
        Self { config, client }
    }

    /// Perform a GET request and deserialize the JSON response.
    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, PaymentsError> {
        let url = format!("{}/{}", self.config.base_url, path);
        let resp = self
            .client
            .get(&url)
            .headers(self.build_headers())
            .send()
            .await?;
        Self::parse_response(resp).await
    }

    /// Perform a POST request with a JSON body and deserialize the response.
    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, PaymentsError> {
        let url = format!("{}/{}", self.config.base_url, path);
        let resp = self
            .client
            .post(&url)
            .headers(self.build_headers())
            .json(body)
            .send()
            .await?;
        Self::parse_response(resp).await
    }

    async fn parse_response<T: DeserializeOwned>(
        resp: reqwest::Response,
    ) -> Result<T, PaymentsError> {
        let status = resp.status();
        if status.as_u16() == 404 {
            return Err(PaymentsError::NotFound);
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(PaymentsError::NetworkError(format!(
                "HTTP {status}: {body}"
            )));
        }
        let text = resp.text().await?;
        let parsed = serde_json::from_str(&text)?;
        Ok(parsed)
    }

    /// Build common headers from config.
    fn build_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(ref key) = self.config.api_key {
            if let Ok(val) = HeaderValue::from_str(key) {
                headers.insert("woc-api-key", val);
            }
        }
        headers
    }

    fn check_batch_size(len: usize) -> Result<(), PaymentsError> {
        if len > MAX_BATCH_SIZE {
            return Err(PaymentsError::NotSupported(format!(
                "batch of {len} exceeds the provider limit of {MAX_BATCH_SIZE}"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl ChainDataProvider for WocClient {
    async fn balance(&self, address: &str) -> Result<Balance, PaymentsError> {
        let wire: WireBalance = self.get_json(&format!("address/{address}/balance")).await?;
        Ok(Balance {
            address: address.to_string(),
            confirmed: wire.confirmed,
            unconfirmed: Some(wire.unconfirmed),
            symbol: SYMBOL.to_string(),
            decimals: DECIMALS,
        })
    }

    async fn unspent_outputs(&self, address: &str) -> Result<Vec<Utxo>, PaymentsError> {
        let wire: Vec<WireUtxo> = self.get_json(&format!("address/{address}/unspent")).await?;
        Ok(wire.into_iter().map(|u| u.into_utxo(address)).collect())
    }

    async fn miner_fee_stats(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<MinerFeeStat>, PaymentsError> {
        let path = format!(
            "miner/fees?from={}&to={}",
            from.timestamp(),
            to.timestamp()
        );
        self.get_json(&path).await
    }

    async fn broadcast_tx(&self, raw_tx_hex: &str) -> Result<String, PaymentsError> {
        let body = serde_json::json!({ "txhex": raw_tx_hex });
        let txid: String = self.post_json("tx/raw", &body).await?;
        Ok(txid)
    }

    async fn bulk_confirmed_balance(
        &self,
        addresses: &[String],
    ) -> Result<Vec<BulkBalanceEntry>, PaymentsError> {
        Self::check_batch_size(addresses.len())?;
        self.post_json("addresses/balance/confirmed", &AddressesBody { addresses })
            .await
    }

    async fn bulk_unconfirmed_balance(
        &self,
        addresses: &[String],
    ) -> Result<Vec<BulkBalanceEntry>, PaymentsError> {
        Self::check_batch_size(addresses.len())?;
        self.post_json("addresses/balance/unconfirmed", &AddressesBody { addresses })
            .await
    }

    async fn bulk_confirmed_utxos(
        &self,
        addresses: &[String],
    ) -> Result<Vec<BulkUtxoEntry>, PaymentsError> {
        Self::check_batch_size(addresses.len())?;
        let wire: Vec<WireUtxoEntry> = self
            .post_json("addresses/unspent/confirmed", &AddressesBody { addresses })
            .await?;
        Ok(wire
            .into_iter()
            .map(|entry| {
                let utxos = entry
                    .unspent
                    .into_iter()
                    .map(|u| u.into_utxo(&entry.address))
                    .collect();
                BulkUtxoEntry {
                    address: entry.address,
                    utxos,
                }
            })
            .collect())
    }

    async fn bulk_unconfirmed_utxos(
        &self,
        addresses: &[String],
    ) -> Result<Vec<BulkUtxoEntry>, PaymentsError> {
        Self::check_batch_size(addresses.len())?;
        let wire: Vec<WireUtxoEntry> = self
            .post_json("addresses/unspent/unconfirmed", &AddressesBody { addresses })
            .await?;
        Ok(wire
            .into_iter()
            .map(|entry| {
                let utxos = entry
                    .unspent
                    .into_iter()
                    .map(|u| u.into_utxo(&entry.address))
                    .collect();
                BulkUtxoEntry {
                    address: entry.address,
                    utxos,
                }
            })
            .collect())
    }

    async fn bulk_spent_outputs(
        &self,
        outputs: &[OutputRef],
    ) -> Result<Vec<SpentStatus>, PaymentsError> {
        Self::check_batch_size(outputs.len())?;
        let body = serde_json::json!({ "utxos": outputs });
        self.post_json("utxos/spent", &body).await
    }
}

#[async_trait]
impl Broadcaster for WocClient {
    fn name(&self) -> &str {
        "whatsonchain"
    }

    async fn broadcast(&self, raw_tx_hex: &str) -> Result<String, PaymentsError> {
        self.broadcast_tx(raw_tx_hex).await
    }
}
