//! Reputation envelope helpers

use std::time::{SystemTime, UNIX_EPOCH};

use reputation_zk_core::{Envelope, Scalar, PROOF_SIZE};

use crate::artifacts::decode_hex_text;
use crate::error::{Result, SdkError};

/// Seconds since the unix epoch, 0 if the clock is before it.
pub fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Parse a 32-byte value from hex or decimal.
///
/// Hex needs a `0x` prefix unless it contains a letter; short hex is
/// left-padded.
pub fn parse_bytes32(value: &str) -> Result<Scalar> {
    let s = value.trim();
    if s.starts_with("0x") || s.starts_with("0X") || s.bytes().any(|b| b.is_ascii_alphabetic()) {
        let bytes = decode_hex_text(&s.replacen("0X", "0x", 1))?;
        if bytes.len() > 32 {
            return Err(SdkError::InvalidSize {
                what: "32-byte value",
                expected: 32,
                actual: bytes.len(),
            });
        }
        let mut out = [0u8; 32];
        out[32 - bytes.len()..].copy_from_slice(&bytes);
        return Ok(out);
    }
    crate::snarkjs::parse_field_element(s)
}

/// Wrap a proof into a reputation envelope stamped with `timestamp`.
pub fn seal(
    threshold: u16,
    timestamp: u32,
    agent_id: [u8; 32],
    commitment: Scalar,
    proof: &[u8],
) -> Result<Envelope> {
    let proof: [u8; PROOF_SIZE] = proof.try_into().map_err(|_| SdkError::InvalidSize {
        what: "proof",
        expected: PROOF_SIZE,
        actual: proof.len(),
    })?;
    Ok(Envelope::new(threshold, timestamp, agent_id, commitment, proof)?)
}

/// Decode an envelope from raw bytes.
pub fn open(bytes: &[u8]) -> Result<Envelope> {
    Envelope::from_bytes(bytes).map_err(SdkError::from)
}

/// Current time as an envelope timestamp, saturating at `u32::MAX`.
pub fn timestamp_now() -> u32 {
    u32::try_from(now_unix()).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reputation_zk_core::{VerifyError, ENVELOPE_SIZE};

    #[test]
    fn test_parse_bytes32() {
        let v = parse_bytes32("0xabcd").unwrap();
        assert_eq!(&v[30..], &[0xab, 0xcd]);
        assert_eq!(parse_bytes32("ff").unwrap()[31], 0xff);
        assert_eq!(parse_bytes32("42").unwrap()[31], 42);
        assert!(parse_bytes32(&format!("0x{}", "00".repeat(33))).is_err());
    }

    #[test]
    fn test_seal_and_open() {
        let proof = [7u8; PROOF_SIZE];
        let env = seal(75, 1_700_000_000, [1u8; 32], [2u8; 32], &proof).unwrap();
        let bytes = env.to_bytes();
        assert_eq!(bytes.len(), ENVELOPE_SIZE);
        assert_eq!(open(&bytes).unwrap(), env);

        assert!(matches!(
            seal(75, 0, [0u8; 32], [0u8; 32], &proof[..10]),
            Err(SdkError::InvalidSize { actual: 10, .. })
        ));
        assert!(matches!(
            seal(101, 0, [0u8; 32], [0u8; 32], &proof),
            Err(SdkError::Verify(VerifyError::OutOfRange(_)))
        ));
    }
}
