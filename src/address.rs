//! Base58Check address codec with version-byte validation.
//!
//! Provides encode/decode of versioned 20-byte payloads with the
//! double-SHA-256 checksum used for Bitcoin SV addresses, plus full
//! validation against the chain's recognized address kinds.

use std::sync::LazyLock;

use crate::error::PaymentsError;
use crate::hash::sha256d;

/// Mainnet P2PKH address version byte.
pub const MAINNET_P2PKH: u8 = 0x00;
/// Mainnet P2SH address version byte.
pub const MAINNET_P2SH: u8 = 0x05;
/// Testnet P2PKH address version byte.
pub const TESTNET_P2PKH: u8 = 0x6f;
/// Testnet P2SH address version byte.
pub const TESTNET_P2SH: u8 = 0xc4;

/// Version bytes the codec accepts as valid address kinds.
const RECOGNIZED_VERSIONS: [u8; 4] =
    [MAINNET_P2PKH, MAINNET_P2SH, TESTNET_P2PKH, TESTNET_P2SH];

/// Length of a decoded address: version byte + 20-byte payload + 4-byte checksum.
const DECODED_LENGTH: usize = 25;

/// Cheap structural pre-check: Base58 alphabet, plausible length.
///
/// This runs before the full decode so obviously malformed strings are
/// rejected without hashing.
static ADDRESS_FORMAT: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"^[1-9A-HJ-NP-Za-km-z]{25,35}$").expect("static pattern"));

/// Encode a version byte and 20-byte payload as a Base58Check address.
///
/// The checksum is the first 4 bytes of SHA-256d(version || payload).
/// Leading zero bytes in the concatenation become leading '1' characters,
/// count preserved exactly.
///
/// # Arguments
/// * `version` - The address version byte.
/// * `payload` - The 20-byte public key hash or script hash.
///
/// # Returns
/// The Base58Check-encoded address string.
pub fn encode(version: u8, payload: &[u8; 20]) -> String {
    let mut data = Vec::with_capacity(DECODED_LENGTH);
    data.push(version);
    data.extend_from_slice(payload);
    let checksum = sha256d(&data);
    data.extend_from_slice(&checksum[..4]);
    bs58::encode(&data)
        .with_alphabet(bs58::Alphabet::BITCOIN)
        .into_string()
}

/// Decode a Base58Check address into its version byte and 20-byte payload.
///
/// Rejects empty input, characters outside the Base58 alphabet (with the
/// offending position in the message), short decodings, and any checksum
/// mismatch. A checksum mismatch is never silently accepted.
///
/// # Arguments
/// * `s` - The Base58Check address string.
///
/// # Returns
/// The `(version, payload)` pair, or an error describing the first
/// problem found.
pub fn decode(s: &str) -> Result<(u8, [u8; 20]), PaymentsError> {
    if s.is_empty() {
        return Err(PaymentsError::InvalidAddress("empty string".to_string()));
    }

    let decoded = bs58::decode(s)
        .with_alphabet(bs58::Alphabet::BITCOIN)
        .into_vec()
        .map_err(|e| PaymentsError::InvalidBase58(e.to_string()))?;

    if decoded.len() < DECODED_LENGTH {
        return Err(PaymentsError::InvalidAddressLength {
            expected: DECODED_LENGTH,
            got: decoded.len(),
        });
    }

    let (data, checksum) = decoded.split_at(decoded.len() - 4);
    let expected = sha256d(data);
    if checksum != &expected[..4] {
        return Err(PaymentsError::InvalidChecksum);
    }

    // data = version byte + payload; the payload must be exactly 20 bytes.
    if data.len() != 21 {
        return Err(PaymentsError::InvalidAddressLength {
            expected: DECODED_LENGTH,
            got: decoded.len(),
        });
    }

    let mut payload = [0u8; 20];
    payload.copy_from_slice(&data[1..]);
    Ok((data[0], payload))
}

/// Validate an address string end to end.
///
/// Runs the format pre-check, the full checksum-verifying decode, and
/// finally requires the version byte to be one of the chain's recognized
/// kinds (P2PKH or P2SH, mainnet or testnet). Unrecognized but
/// checksum-valid version bytes are rejected.
///
/// # Arguments
/// * `address` - The address string to validate.
///
/// # Returns
/// `Ok(())` if the address is fully valid, or the specific error.
pub fn validate(address: &str) -> Result<(), PaymentsError> {
    if !ADDRESS_FORMAT.is_match(address) {
        return Err(PaymentsError::InvalidAddress(format!(
            "malformed address '{address}'"
        )));
    }

    let (version, _) = decode(address)?;
    if !RECOGNIZED_VERSIONS.contains(&version) {
        return Err(PaymentsError::UnsupportedVersion(version));
    }
    Ok(())
}
