//! Hex formatting for trace logs

use crate::curve::{G1Affine, G2Affine};
use crate::field::Fr;

/// Format Fr as hex string
pub fn fr_to_hex(fr: &Fr) -> String {
    format!("0x{}", hex::encode(fr.to_bytes()))
}

/// Format G1 point as hex
pub fn g1_to_hex(p: &G1Affine) -> String {
    if p.is_identity() {
        return "infinity".into();
    }
    let bytes = p.to_bytes();
    format!(
        "(0x{}, 0x{})",
        hex::encode(&bytes[0..32]),
        hex::encode(&bytes[32..64])
    )
}

/// Format G2 point as hex, imaginary part first per coordinate
pub fn g2_to_hex(p: &G2Affine) -> String {
    if p.is_identity() {
        return "infinity".into();
    }
    let bytes = p.to_bytes();
    format!(
        "((0x{}, 0x{}), (0x{}, 0x{}))",
        hex::encode(&bytes[0..32]),
        hex::encode(&bytes[32..64]),
        hex::encode(&bytes[64..96]),
        hex::encode(&bytes[96..128])
    )
}
