//! Greedy UTXO coin selection.
//!
//! Selects inputs largest-first until the accumulated value covers the
//! target amount plus the fee for the transaction shape actually being
//! assembled. The fee is recomputed after every added input: a static
//! up-front size estimate systematically under- or over-pays by a few
//! satoshis once the change output is added or omitted.

use crate::error::PaymentsError;
use crate::fees::{estimate_fee, DUST_LIMIT};
use crate::types::Utxo;

/// Number of outputs assumed while selecting: recipient plus change.
const ASSUMED_OUTPUTS: usize = 2;

/// Select UTXOs to cover `target_amount` plus fees at `fee_rate`.
///
/// Sorts a copy of the working set by amount descending (stable, so ties
/// keep their original order) and accumulates inputs one at a time. After
/// each addition the required fee is recomputed for the current input
/// count and a two-output shape, and selection stops as soon as the total
/// covers target plus fee.
///
/// The caller's slice is never mutated; selected UTXOs are clones.
///
/// # Arguments
/// * `utxos` - The working set of spendable outputs.
/// * `target_amount` - Satoshis to send, excluding fees.
/// * `fee_rate` - Fee rate in satoshis per kilobyte.
///
/// # Returns
/// The selected UTXOs and the change amount. Change below the dust floor
/// is dropped to zero; the caller omits the change output in that case.
///
/// # Errors
/// `InsufficientFunds` if the set cannot cover target plus fee, with the
/// shortfall reported as needed vs. available. `AmountOverflow` if the
/// satoshi sum wraps a u64.
pub fn select_utxos(
    utxos: &[Utxo],
    target_amount: u64,
    fee_rate: u64,
) -> Result<(Vec<Utxo>, u64), PaymentsError> {
    let mut candidates: Vec<Utxo> = utxos.to_vec();
    candidates.sort_by(|a, b| b.amount.cmp(&a.amount));

    let mut selected: Vec<Utxo> = Vec::new();
    let mut total: u64 = 0;

    for utxo in candidates {
        total = total
            .checked_add(utxo.amount)
            .ok_or(PaymentsError::AmountOverflow)?;
        selected.push(utxo);

        let fee = estimate_fee(selected.len(), ASSUMED_OUTPUTS, fee_rate);
        let needed = target_amount
            .checked_add(fee)
            .ok_or(PaymentsError::AmountOverflow)?;

        if total >= needed {
            let mut change = total - needed;
            if change < DUST_LIMIT {
                change = 0;
            }
            return Ok((selected, change));
        }
    }

    let fee = estimate_fee(selected.len().max(1), ASSUMED_OUTPUTS, fee_rate);
    Err(PaymentsError::InsufficientFunds {
        needed: target_amount.saturating_add(fee),
        available: total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utxo(tx_id: &str, vout: u32, amount: u64) -> Utxo {
        Utxo {
            tx_id: tx_id.to_string(),
            vout,
            amount,
            address: "1E7ucTTWRTahCyViPhxSMor2pj4VGQdFMr".to_string(),
            script: None,
            confirmations: 6,
        }
    }

    /// One 100k UTXO covering a 50k send at 1000 sat/KB: the fee for one
    /// input and two outputs is 226, so change is 49774.
    #[test]
    fn test_single_utxo_selection() {
        let utxos = vec![utxo("aa", 0, 100_000)];
        let (selected, change) = select_utxos(&utxos, 50_000, 1000).unwrap();
        assert_eq!(selected.len(), 1);
        assert_eq!(change, 49_774);
    }

    #[test]
    fn test_selects_largest_first() {
        let utxos = vec![
            utxo("aa", 0, 1_000),
            utxo("bb", 0, 80_000),
            utxo("cc", 0, 5_000),
        ];
        let (selected, _) = select_utxos(&utxos, 50_000, 1000).unwrap();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].tx_id, "bb");
    }

    #[test]
    fn test_accumulates_until_fee_covered() {
        // Each input adds 148 bytes, so the fee grows as inputs are added.
        let utxos = vec![
            utxo("aa", 0, 30_000),
            utxo("bb", 0, 30_000),
            utxo("cc", 0, 30_000),
        ];
        let (selected, change) = select_utxos(&utxos, 55_000, 1000).unwrap();
        assert_eq!(selected.len(), 2);
        // fee for 2 inputs, 2 outputs = 374 bytes at 1000 sat/KB.
        assert_eq!(change, 60_000 - 55_000 - 374);
    }

    #[test]
    fn test_ties_keep_original_order() {
        let utxos = vec![
            utxo("first", 0, 10_000),
            utxo("second", 0, 10_000),
            utxo("third", 0, 10_000),
        ];
        let (selected, _) = select_utxos(&utxos, 15_000, 1000).unwrap();
        assert_eq!(selected[0].tx_id, "first");
        assert_eq!(selected[1].tx_id, "second");
    }

    #[test]
    fn test_insufficient_funds_reports_shortfall() {
        let utxos = vec![utxo("aa", 0, 1_000)];
        let err = select_utxos(&utxos, 50_000, 1000).unwrap_err();
        match err {
            PaymentsError::InsufficientFunds { needed, available } => {
                assert_eq!(available, 1_000);
                assert!(needed > 50_000);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_working_set() {
        let err = select_utxos(&[], 1_000, 1000).unwrap_err();
        assert!(matches!(err, PaymentsError::InsufficientFunds { .. }));
    }

    /// Selection succeeds but the leftover is below the dust floor, so the
    /// change is dropped to zero rather than creating an uneconomic output.
    #[test]
    fn test_dust_change_dropped() {
        // fee(1 input, 2 outputs) at 1000 sat/KB = 226. Target + fee leaves
        // zero leftover, which is below a dust floor of 1.
        let utxos = vec![utxo("aa", 0, 50_226)];
        let (selected, change) = select_utxos(&utxos, 50_000, 1000).unwrap();
        assert_eq!(selected.len(), 1);
        assert_eq!(change, 0);
    }

    #[test]
    fn test_caller_slice_untouched() {
        let utxos = vec![
            utxo("small", 0, 1_000),
            utxo("large", 0, 90_000),
        ];
        let before = utxos.clone();
        let _ = select_utxos(&utxos, 50_000, 1000).unwrap();
        assert_eq!(utxos, before);
    }

    #[test]
    fn test_overflow_is_hard_error() {
        let utxos = vec![utxo("aa", 0, u64::MAX), utxo("bb", 0, u64::MAX)];
        let err = select_utxos(&utxos, u64::MAX, 1000).unwrap_err();
        assert!(matches!(err, PaymentsError::AmountOverflow));
    }

    /// The fee must track the shape being assembled: with enough inputs the
    /// total that covered the target at the old fee no longer does.
    #[test]
    fn test_fee_recomputed_per_iteration() {
        // Two 25_000 inputs, target 49_000 at 2000 sat/KB.
        // After 1 input: fee(1,2) = 452, need 49_452 > 25_000.
        // After 2 inputs: fee(2,2) = 748, need 49_748 < 50_000: selected.
        let utxos = vec![utxo("aa", 0, 25_000), utxo("bb", 0, 25_000)];
        let (selected, change) = select_utxos(&utxos, 49_000, 2000).unwrap();
        assert_eq!(selected.len(), 2);
        assert_eq!(change, 50_000 - 49_000 - 748);
    }
}
