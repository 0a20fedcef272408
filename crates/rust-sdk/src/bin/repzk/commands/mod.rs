pub mod batch_verify;
pub mod commit;
pub mod convert;
pub mod nullifier;
pub mod tier;
pub mod verify;

/// `0x`-prefixed hex for 32-byte values
pub fn hex32(value: &[u8; 32]) -> String {
    format!("0x{}", hex::encode(value))
}
