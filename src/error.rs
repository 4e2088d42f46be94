/// Unified error type for all payment operations.
///
/// Covers errors from address decoding, coin selection, transaction
/// building, signing handoff, and network transport. Each variant carries
/// the machine-checkable kind; the message carries the human-readable cause.
#[derive(Debug, thiserror::Error)]
pub enum PaymentsError {
    /// The address string is empty or structurally malformed.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// The string contains characters outside the Base58 alphabet.
    #[error("invalid base58: {0}")]
    InvalidBase58(String),

    /// The decoded checksum does not match the recomputed one.
    #[error("checksum mismatch")]
    InvalidChecksum,

    /// The decoded address has the wrong length.
    #[error("invalid address length: expected {expected}, got {got}")]
    InvalidAddressLength {
        /// The expected decoded length in bytes.
        expected: usize,
        /// The actual decoded length in bytes.
        got: usize,
    },

    /// The version byte is checksum-valid but not a recognized address kind.
    #[error("unsupported address version: 0x{0:02x}")]
    UnsupportedVersion(u8),

    /// The available inputs cannot cover the outputs plus fee.
    #[error("insufficient funds: need {needed} satoshis, have {available}")]
    InsufficientFunds {
        /// Total satoshis required (outputs plus fee).
        needed: u64,
        /// Total satoshis available in the working set.
        available: u64,
    },

    /// An output amount is below the chain's dust floor.
    #[error("dust output: {amount} satoshis is below the dust limit of {dust_limit}")]
    DustOutput {
        /// The offending output amount.
        amount: u64,
        /// The chain's dust floor.
        dust_limit: u64,
    },

    /// The transaction has no inputs.
    #[error("transaction has no inputs")]
    NoInputs,

    /// The transaction has no outputs.
    #[error("transaction has no outputs")]
    NoOutputs,

    /// Satoshi arithmetic overflowed a u64.
    #[error("amount overflow while summing satoshis")]
    AmountOverflow,

    /// The private key material is malformed.
    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    /// A previous-transaction-hash reference is malformed.
    #[error("invalid txid: {0}")]
    InvalidTxId(String),

    /// A UTXO supplies neither a locking script nor a derivable address.
    #[error("missing locking script for input {0}")]
    MissingLockingScript(String),

    /// The signer failed to produce a complete unlocking proof.
    #[error("signing failed: {0}")]
    SigningFailed(String),

    /// Multi-key signing found an input whose address has no key entry.
    #[error("no private key for address {0}")]
    NoPrivateKeyForAddress(String),

    /// A remote call failed at the transport or protocol level.
    #[error("network error: {0}")]
    NetworkError(String),

    /// The queried resource does not exist on the remote service.
    #[error("resource not found")]
    NotFound,

    /// Every configured broadcast provider rejected the transaction.
    #[error("broadcast failed: {message}")]
    BroadcastFailed {
        /// Summary of the provider chain outcome.
        message: String,
        /// The last underlying provider error, if any.
        #[source]
        source: Option<Box<PaymentsError>>,
    },

    /// The broadcast chain was constructed with zero providers.
    #[error("no broadcast providers configured")]
    NoBroadcasters,

    /// The capability does not support the requested operation.
    #[error("not supported: {0}")]
    NotSupported(String),

    /// The capability has not implemented the requested operation.
    #[error("not implemented: {0}")]
    NotImplemented(String),

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Failed to serialize or deserialize data.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Hex encoding or decoding failed.
    #[error("hex error: {0}")]
    Hex(#[from] hex::FromHexError),
}
