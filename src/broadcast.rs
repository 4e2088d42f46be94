//! Multi-provider broadcast with ordered fallback.
//!
//! A submission walks the configured providers in order until one accepts
//! the transaction. Providers whose error text shows the transaction is
//! already known to the network count as success; only when every
//! provider fails is an error surfaced, wrapping the last cause.

use std::sync::LazyLock;

use async_trait::async_trait;

use crate::error::PaymentsError;

/// Matches a transaction-hash-shaped token inside provider error text.
static TXID_TOKEN: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"[0-9a-fA-F]{64}").expect("static pattern"));

/// Error-text phrases meaning the network already has the transaction.
const ALREADY_KNOWN_PHRASES: [&str; 3] = [
    "already in the mempool",
    "already in mempool",
    "txn-already-known",
];

/// Capability that submits a signed transaction to the network.
#[async_trait]
pub trait Broadcaster: Send + Sync {
    /// Human-readable provider name, used in logs and error messages.
    fn name(&self) -> &str;

    /// Submit a hex-encoded raw transaction.
    ///
    /// # Returns
    /// The txid the provider reports on acceptance.
    async fn broadcast(&self, raw_tx_hex: &str) -> Result<String, PaymentsError>;
}

/// Coarse classification of a provider failure.
///
/// Used only to produce a more specific error message; it never changes
/// the fallback control flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FailureKind {
    /// Authentication or endpoint rejection (401/403/404-class).
    Unauthorized,
    /// The provider could not parse the request or transaction format.
    Malformed,
    /// The provider considers the fee too low.
    InsufficientFee,
    /// Anything else.
    Generic,
}

fn classify(error_text: &str) -> FailureKind {
    let lower = error_text.to_lowercase();
    if lower.contains("unauthorized")
        || lower.contains("401")
        || lower.contains("403")
        || lower.contains("404")
    {
        FailureKind::Unauthorized
    } else if lower.contains("malformed") || lower.contains("extended format") {
        FailureKind::Malformed
    } else if lower.contains("fee") {
        FailureKind::InsufficientFee
    } else {
        FailureKind::Generic
    }
}

/// Check whether provider error text means the transaction is already
/// accepted, returning the txid to report if so.
///
/// When the text contains a 64-hex-character token, that token is taken
/// as the txid; otherwise the raw text is returned as a placeholder
/// identifier the caller can still treat as accepted.
fn already_known_txid(error_text: &str) -> Option<String> {
    let lower = error_text.to_lowercase();
    if !ALREADY_KNOWN_PHRASES.iter().any(|p| lower.contains(p)) {
        return None;
    }
    match TXID_TOKEN.find(error_text) {
        Some(m) => Some(m.as_str().to_lowercase()),
        None => Some(error_text.to_string()),
    }
}

/// Ordered, immutable chain of broadcast providers with fallback.
pub struct BroadcastChain {
    providers: Vec<Box<dyn Broadcaster>>,
}

impl BroadcastChain {
    /// Build a chain from providers in fallback order.
    pub fn new(providers: Vec<Box<dyn Broadcaster>>) -> Self {
        Self { providers }
    }

    /// Number of configured providers.
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Whether the chain has no providers.
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Submit a raw transaction, trying each provider in order.
    ///
    /// The bytes are hex-encoded once up front. The first provider to
    /// accept (or to report the transaction as already known) wins; its
    /// txid is returned. If every provider fails, the result is a
    /// [`PaymentsError::BroadcastFailed`] whose message contains
    /// `all providers failed` and which wraps the last underlying error.
    pub async fn broadcast_transaction(&self, raw_tx: &[u8]) -> Result<String, PaymentsError> {
        if self.providers.is_empty() {
            return Err(PaymentsError::NoBroadcasters);
        }

        let raw_hex = hex::encode(raw_tx);
        let mut last_error: Option<PaymentsError> = None;

        for provider in &self.providers {
            log::debug!("broadcasting via {}", provider.name());
            match provider.broadcast(&raw_hex).await {
                Ok(txid) => {
                    log::debug!("{} accepted txid {txid}", provider.name());
                    return Ok(txid);
                }
                Err(e) => {
                    let text = e.to_string();
                    if let Some(txid) = already_known_txid(&text) {
                        log::debug!(
                            "{} reports transaction already known, treating as accepted",
                            provider.name()
                        );
                        return Ok(txid);
                    }
                    let message = match classify(&text) {
                        FailureKind::Unauthorized => {
                            format!("{} rejected the request as unauthorized: {text}", provider.name())
                        }
                        FailureKind::Malformed => {
                            format!("{} could not parse the transaction: {text}", provider.name())
                        }
                        FailureKind::InsufficientFee => {
                            format!("{} considers the fee insufficient: {text}", provider.name())
                        }
                        FailureKind::Generic => {
                            format!("{} failed: {text}", provider.name())
                        }
                    };
                    log::error!("broadcast attempt failed: {message}");
                    last_error = Some(e);
                }
            }
        }

        let last = last_error.expect("at least one provider was tried");
        Err(PaymentsError::BroadcastFailed {
            message: format!("all providers failed, last error: {last}"),
            source: Some(Box::new(last)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Scripted broadcaster that counts how often it is invoked.
    struct ScriptedBroadcaster {
        name: String,
        result: Result<String, String>,
        calls: Arc<AtomicUsize>,
    }

    impl ScriptedBroadcaster {
        fn new(name: &str, result: Result<&str, &str>) -> (Box<dyn Broadcaster>, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            let b = Box::new(Self {
                name: name.to_string(),
                result: result.map(String::from).map_err(String::from),
                calls: Arc::clone(&calls),
            });
            (b, calls)
        }
    }

    #[async_trait]
    impl Broadcaster for ScriptedBroadcaster {
        fn name(&self) -> &str {
            &self.name
        }

        async fn broadcast(&self, _raw_tx_hex: &str) -> Result<String, PaymentsError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result
                .clone()
                .map_err(PaymentsError::NetworkError)
        }
    }

    #[tokio::test]
    async fn test_first_provider_success() {
        let (a, a_calls) = ScriptedBroadcaster::new("a", Ok("txid-a"));
        let (b, b_calls) = ScriptedBroadcaster::new("b", Ok("txid-b"));
        let chain = BroadcastChain::new(vec![a, b]);

        let txid = chain.broadcast_transaction(&[0x01]).await.unwrap();
        assert_eq!(txid, "txid-a");
        assert_eq!(a_calls.load(Ordering::SeqCst), 1);
        assert_eq!(b_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_fallback_to_second_provider() {
        let (a, a_calls) = ScriptedBroadcaster::new("a", Err("connection refused"));
        let (b, b_calls) = ScriptedBroadcaster::new("b", Ok("txid-b"));
        let chain = BroadcastChain::new(vec![a, b]);

        let txid = chain.broadcast_transaction(&[0x01]).await.unwrap();
        assert_eq!(txid, "txid-b");
        assert_eq!(a_calls.load(Ordering::SeqCst), 1);
        assert_eq!(b_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_all_providers_fail() {
        let (a, _) = ScriptedBroadcaster::new("a", Err("boom"));
        let (b, _) = ScriptedBroadcaster::new("b", Err("bust"));
        let chain = BroadcastChain::new(vec![a, b]);

        let err = chain.broadcast_transaction(&[0x01]).await.unwrap_err();
        let text = err.to_string();
        assert!(text.contains("all providers failed"), "got: {text}");
        assert!(text.contains("bust"), "should carry the last error: {text}");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[tokio::test]
    async fn test_empty_chain() {
        let chain = BroadcastChain::new(vec![]);
        let err = chain.broadcast_transaction(&[0x01]).await.unwrap_err();
        assert!(err.to_string().contains("no broadcast providers"));
    }

    #[tokio::test]
    async fn test_already_known_with_embedded_txid() {
        let txid = "c1d0f2e3a4b5c6d7e8f90a1b2c3d4e5f60718293a4b5c6d7e8f90a1b2c3d4e5f";
        let message = format!("258: txn-already-known {txid}");
        let (a, a_calls) = ScriptedBroadcaster::new("a", Err(&message));
        let (b, b_calls) = ScriptedBroadcaster::new("b", Ok("unused"));
        let chain = BroadcastChain::new(vec![a, b]);

        let result = chain.broadcast_transaction(&[0x01]).await.unwrap();
        assert_eq!(result, txid);
        // Already-known is success: later providers are not tried.
        assert_eq!(a_calls.load(Ordering::SeqCst), 1);
        assert_eq!(b_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_already_known_without_txid_token() {
        let (a, _) = ScriptedBroadcaster::new("a", Err("transaction already in the mempool"));
        let chain = BroadcastChain::new(vec![a]);

        let result = chain.broadcast_transaction(&[0x01]).await.unwrap();
        assert!(result.contains("already in the mempool"));
    }

    #[test]
    fn test_already_known_case_insensitive() {
        assert!(already_known_txid("TX Already In Mempool").is_some());
        assert!(already_known_txid("Txn-Already-Known").is_some());
        assert!(already_known_txid("insufficient fee").is_none());
    }

    #[test]
    fn test_classification() {
        assert_eq!(classify("401 unauthorized"), FailureKind::Unauthorized);
        assert_eq!(classify("not found: 404"), FailureKind::Unauthorized);
        assert_eq!(
            classify("transaction is not in extended format"),
            FailureKind::Malformed
        );
        assert_eq!(classify("fee too low"), FailureKind::InsufficientFee);
        assert_eq!(classify("connection reset"), FailureKind::Generic);
    }
}
