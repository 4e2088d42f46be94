use proptest::prelude::*;

use bsv_payments::address;
use bsv_payments::fees::{estimate_fee, estimate_tx_size};
use bsv_payments::selection::select_utxos;
use bsv_payments::Utxo;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn address_roundtrip_any_version(
        version in any::<u8>(),
        payload in prop::array::uniform20(any::<u8>())
    ) {
        let encoded = address::encode(version, &payload);
        let (v, p) = address::decode(&encoded).unwrap();
        prop_assert_eq!(v, version);
        prop_assert_eq!(p, payload);
    }

    #[test]
    fn recognized_versions_pass_validation(
        payload in prop::array::uniform20(any::<u8>())
    ) {
        for version in [0x00u8, 0x05, 0x6f, 0xc4] {
            let encoded = address::encode(version, &payload);
            prop_assert!(address::validate(&encoded).is_ok());
        }
    }

    #[test]
    fn tampered_addresses_never_decode(
        payload in prop::array::uniform20(any::<u8>()),
        position in 0usize..25,
        replacement in prop::sample::select(
            "123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz".chars().collect::<Vec<char>>()
        )
    ) {
        let encoded = address::encode(0x00, &payload);
        let mut chars: Vec<char> = encoded.chars().collect();
        let position = position % chars.len();
        if chars[position] == replacement {
            return Ok(());
        }
        chars[position] = replacement;
        let tampered: String = chars.into_iter().collect();
        prop_assert!(address::decode(&tampered).is_err());
    }

    #[test]
    fn selection_invariant_holds(
        amounts in prop::collection::vec(1_000u64..10_000_000, 1..20),
        target in 1u64..1_000_000,
        rate in 50u64..10_000
    ) {
        let utxos: Vec<Utxo> = amounts
            .iter()
            .enumerate()
            .map(|(i, &amount)| Utxo {
                tx_id: format!("{i:064x}"),
                vout: 0,
                amount,
                address: String::new(),
                script: None,
                confirmations: 1,
            })
            .collect();

        if let Ok((selected, change)) = select_utxos(&utxos, target, rate) {
            let total: u64 = selected.iter().map(|u| u.amount).sum();
            let fee = estimate_fee(selected.len(), 2, rate);
            prop_assert!(total >= target + fee);
            let exact_change = total - target - fee;
            if exact_change >= 1 {
                prop_assert_eq!(change, exact_change);
            } else {
                prop_assert_eq!(change, 0);
            }
        }
    }

    #[test]
    fn tx_size_is_monotonic(
        inputs in 0usize..100,
        outputs in 0usize..100
    ) {
        let base = estimate_tx_size(inputs, outputs);
        prop_assert!(estimate_tx_size(inputs + 1, outputs) > base);
        prop_assert!(estimate_tx_size(inputs, outputs + 1) > base);
    }
}
