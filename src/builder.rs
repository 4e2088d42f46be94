//! Transaction builder: validated accumulation of inputs and outputs,
//! balance checking against the actual transaction shape, and handoff to
//! the external signing capability.

use std::collections::HashMap;

use crate::address;
use crate::error::PaymentsError;
use crate::fees::{clamp_fee_rate, estimate_fee, DEFAULT_FEE_RATE, DUST_LIMIT};
use crate::signing::{KeyMaterial, TransactionSigner};
use crate::types::{TxOutput, Utxo};

/// Accumulates inputs and outputs for one send operation.
///
/// Created per send, validated once the shape is complete, then handed to
/// a [`TransactionSigner`] and discarded.
#[derive(Debug, Clone)]
pub struct TransactionBuilder {
    /// Ordered list of inputs.
    inputs: Vec<Utxo>,
    /// Ordered list of outputs.
    outputs: Vec<TxOutput>,
    /// Fee rate in satoshis per kilobyte, clamped to safe bounds.
    fee_rate: u64,
}

impl Default for TransactionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TransactionBuilder {
    /// Create an empty builder at the default fee rate.
    pub fn new() -> Self {
        Self {
            inputs: Vec::new(),
            outputs: Vec::new(),
            fee_rate: DEFAULT_FEE_RATE,
        }
    }

    /// Append an input. Validity is deferred to [`validate`](Self::validate).
    pub fn add_input(&mut self, utxo: Utxo) -> &mut Self {
        self.inputs.push(utxo);
        self
    }

    /// Append an output after validating the destination address and the
    /// dust floor.
    pub fn add_output(&mut self, addr: &str, amount: u64) -> Result<&mut Self, PaymentsError> {
        address::validate(addr)?;
        if amount < DUST_LIMIT {
            return Err(PaymentsError::DustOutput {
                amount,
                dust_limit: DUST_LIMIT,
            });
        }
        self.outputs.push(TxOutput {
            address: addr.to_string(),
            amount,
        });
        Ok(self)
    }

    /// Set the fee rate, clamped into the model's safe bounds.
    pub fn set_fee_rate(&mut self, rate: u64) -> &mut Self {
        self.fee_rate = clamp_fee_rate(rate);
        self
    }

    /// The fee rate currently in effect.
    pub fn fee_rate(&self) -> u64 {
        self.fee_rate
    }

    /// The inputs accumulated so far.
    pub fn inputs(&self) -> &[Utxo] {
        &self.inputs
    }

    /// The outputs accumulated so far.
    pub fn outputs(&self) -> &[TxOutput] {
        &self.outputs
    }

    /// Required fee for the shape being built, using the actual input and
    /// output counts rather than an estimate.
    pub fn calculate_fee(&self, rate: u64) -> u64 {
        estimate_fee(self.inputs.len(), self.outputs.len(), rate)
    }

    /// Sum of input amounts, overflow checked.
    pub fn total_inputs(&self) -> Result<u64, PaymentsError> {
        sum_amounts(self.inputs.iter().map(|u| u.amount))
    }

    /// Sum of output amounts, overflow checked.
    pub fn total_outputs(&self) -> Result<u64, PaymentsError> {
        sum_amounts(self.outputs.iter().map(|o| o.amount))
    }

    /// Check the builder's invariants: at least one input, at least one
    /// output, and inputs covering outputs plus the fee for the actual
    /// shape.
    pub fn validate(&self) -> Result<(), PaymentsError> {
        if self.inputs.is_empty() {
            return Err(PaymentsError::NoInputs);
        }
        if self.outputs.is_empty() {
            return Err(PaymentsError::NoOutputs);
        }

        let have = self.total_inputs()?;
        let out = self.total_outputs()?;
        let fee = self.calculate_fee(self.fee_rate);
        let needed = out.checked_add(fee).ok_or(PaymentsError::AmountOverflow)?;

        if have < needed {
            log::debug!(
                "builder validation failed: have {have}, need {needed} (outputs {out} + fee {fee})"
            );
            return Err(PaymentsError::InsufficientFunds {
                needed,
                available: have,
            });
        }
        Ok(())
    }

    /// Validate and sign with a single private key (all inputs assumed to
    /// share one owner).
    ///
    /// The key buffer is wrapped in [`KeyMaterial`] and wiped when this
    /// call returns, on both the success and error paths.
    pub fn sign(
        &self,
        signer: &dyn TransactionSigner,
        key: KeyMaterial,
    ) -> Result<Vec<u8>, PaymentsError> {
        self.validate()?;
        let raw = signer.sign(&self.inputs, &self.outputs, &key)?;
        if raw.is_empty() {
            return Err(PaymentsError::SigningFailed(
                "signer returned an empty transaction".to_string(),
            ));
        }
        Ok(raw)
    }

    /// Validate and sign with an address-to-key map (multi-owner sweep).
    ///
    /// Fails fast with [`PaymentsError::NoPrivateKeyForAddress`] if any
    /// input's owning address has no entry in the map, rather than
    /// silently skipping that input. Inputs that carry neither an address
    /// nor an explicit locking script fail with
    /// [`PaymentsError::MissingLockingScript`]. Key buffers are wiped
    /// when the map is dropped.
    pub fn sign_multi(
        &self,
        signer: &dyn TransactionSigner,
        keys: HashMap<String, KeyMaterial>,
    ) -> Result<Vec<u8>, PaymentsError> {
        self.validate()?;

        for (index, input) in self.inputs.iter().enumerate() {
            if input.address.is_empty() && input.script.is_none() {
                return Err(PaymentsError::MissingLockingScript(format!(
                    "input {index} ({}:{})",
                    input.tx_id, input.vout
                )));
            }
            if !keys.contains_key(&input.address) {
                return Err(PaymentsError::NoPrivateKeyForAddress(
                    input.address.clone(),
                ));
            }
        }

        let raw = signer.sign_multi(&self.inputs, &self.outputs, &keys)?;
        if raw.is_empty() {
            return Err(PaymentsError::SigningFailed(
                "signer returned an empty transaction".to_string(),
            ));
        }
        Ok(raw)
    }
}

/// Compute the amount a sweep transaction can send: the input total minus
/// the fee for an n-input, one-output shape.
///
/// # Errors
/// `InsufficientFunds` if the fee meets or exceeds the input total, or if
/// the remainder would fall below the dust floor.
pub fn calculate_sweep_amount(
    total_inputs: u64,
    num_inputs: usize,
    fee_rate: u64,
) -> Result<u64, PaymentsError> {
    let fee = estimate_fee(num_inputs, 1, fee_rate);
    if fee >= total_inputs {
        return Err(PaymentsError::InsufficientFunds {
            needed: fee,
            available: total_inputs,
        });
    }
    let amount = total_inputs - fee;
    if amount < DUST_LIMIT {
        return Err(PaymentsError::InsufficientFunds {
            needed: fee + DUST_LIMIT,
            available: total_inputs,
        });
    }
    Ok(amount)
}

/// Sum satoshi amounts with overflow checking.
fn sum_amounts(amounts: impl Iterator<Item = u64>) -> Result<u64, PaymentsError> {
    let mut total: u64 = 0;
    for amount in amounts {
        total = total
            .checked_add(amount)
            .ok_or(PaymentsError::AmountOverflow)?;
    }
    Ok(total)
}
