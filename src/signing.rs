//! Signing capability interface and key-material hygiene.
//!
//! The cryptographic work itself (ECDSA, script serialization) lives
//! behind the [`TransactionSigner`] trait; this crate only validates the
//! transaction shape, routes key material, and guarantees that key byte
//! buffers are wiped after use.

use std::collections::HashMap;

use zeroize::Zeroizing;

use crate::error::PaymentsError;
use crate::types::{TxOutput, Utxo};

/// Private key bytes that are zeroed in place when dropped.
///
/// `Zeroizing` uses volatile writes, so the wipe is not elided by the
/// optimizer. Copies the caller made before wrapping, or moves performed
/// by the allocator, are outside this guarantee; treat the wipe as
/// best-effort memory hygiene, not a hard security boundary.
pub type KeyMaterial = Zeroizing<Vec<u8>>;

/// Capability that turns validated inputs/outputs plus key material into
/// fully signed, serialized transaction bytes.
///
/// Implementations fail with [`PaymentsError::InvalidPrivateKey`] on
/// malformed key material, [`PaymentsError::InvalidTxId`] on a malformed
/// previous-transaction reference,
/// [`PaymentsError::MissingLockingScript`] when an input has neither a
/// script nor a derivable address, and [`PaymentsError::SigningFailed`]
/// if any input ends up without a non-empty unlocking proof.
pub trait TransactionSigner {
    /// Sign all inputs with a single private key (same-owner case).
    fn sign(
        &self,
        inputs: &[Utxo],
        outputs: &[TxOutput],
        key: &[u8],
    ) -> Result<Vec<u8>, PaymentsError>;

    /// Sign each input with the key mapped from its owning address
    /// (multi-owner sweep case).
    fn sign_multi(
        &self,
        inputs: &[Utxo],
        outputs: &[TxOutput],
        keys: &HashMap<String, KeyMaterial>,
    ) -> Result<Vec<u8>, PaymentsError>;
}
