#![deny(missing_docs)]

//! # bsv-payments
//!
//! Transaction construction and submission for the BSV blockchain:
//! Base58Check address handling, miner fee quotes, greedy coin selection,
//! a validating transaction builder with an external signing capability,
//! a multi-provider broadcast fallback chain, and batched, rate-limited
//! bulk address queries.
//!
//! The crate is stateless between calls: every operation receives its
//! working set of UTXOs as input, and remote services are consumed
//! through the [`ChainDataProvider`] and [`Broadcaster`] capability
//! traits.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use bsv_payments::{Broadcaster, Client, ClientConfig, WocClient, WocConfig};
//!
//! let provider = Arc::new(WocClient::new(WocConfig::default()));
//! let broadcasters: Vec<Box<dyn Broadcaster>> =
//!     vec![Box::new(WocClient::new(WocConfig::default()))];
//! let client = Client::new(
//!     Arc::clone(&provider) as Arc<dyn bsv_payments::ChainDataProvider>,
//!     broadcasters,
//!     ClientConfig::default(),
//! );
//! ```

pub mod address;
pub mod broadcast;
pub mod builder;
pub mod bulk;
pub mod client;
pub mod fees;
pub mod hash;
pub mod limiter;
pub mod metrics;
pub mod provider;
pub mod selection;
pub mod signing;
pub mod types;
pub mod woc;

mod error;
pub use error::PaymentsError;


pub use broadcast::{BroadcastChain, Broadcaster};
pub use builder::{calculate_sweep_amount, TransactionBuilder};
pub use bulk::{BulkBalanceReport, BulkBatchRunner, BulkSpentReport, BulkUtxoReport};
pub use client::{Client, ClientConfig};
pub use fees::{FeeModel, FeeStrategy};
pub use limiter::RateLimiter;
pub use metrics::{Metrics, MetricsSnapshot};
pub use provider::{BulkBalanceEntry, BulkUtxoEntry, ChainDataProvider, OutputRef, SpentStatus};
pub use selection::select_utxos;
pub use signing::{KeyMaterial, TransactionSigner};
pub use types::{Balance, FeeQuote, MinerFeeStat, TransactionResult, TxOutput, Utxo};
pub use woc::{WocClient, WocConfig};
