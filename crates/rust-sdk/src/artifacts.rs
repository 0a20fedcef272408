//! Loading proof artifacts from disk
//!
//! Files are recognised by extension: `.json` is snarkjs output, `.hex`
//! is hex text (whitespace ignored, optional `0x`), anything else is raw
//! wire bytes.

use std::fs;
use std::path::Path;

use reputation_zk_core::types::SCALAR_SIZE;
use reputation_zk_core::{Fr, Scalar, VerifyingKey, PROOF_SIZE};

use crate::error::{Result, SdkError};
use crate::snarkjs;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactFormat {
    Json,
    Hex,
    Binary,
}

impl ArtifactFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ArtifactFormat::Json,
            Some(ext) if ext.eq_ignore_ascii_case("hex") => ArtifactFormat::Hex,
            _ => ArtifactFormat::Binary,
        }
    }
}

fn read(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|source| SdkError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn read_string(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| SdkError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Decode hex text, ignoring whitespace and a leading `0x`.
pub fn decode_hex_text(text: &str) -> Result<Vec<u8>> {
    let cleaned: String = text.split_whitespace().collect();
    let cleaned = cleaned.strip_prefix("0x").unwrap_or(&cleaned);
    Ok(hex::decode(cleaned)?)
}

/// Load VK wire bytes. The result has already been validated.
pub fn load_vk(path: &Path) -> Result<Vec<u8>> {
    let bytes = match ArtifactFormat::from_path(path) {
        ArtifactFormat::Json => return snarkjs::vk_json_to_bytes(&read_string(path)?),
        ArtifactFormat::Hex => decode_hex_text(&read_string(path)?)?,
        ArtifactFormat::Binary => read(path)?,
    };
    VerifyingKey::from_bytes(&bytes).map_err(reputation_zk_core::VerifyError::from)?;
    log::debug!("Loaded VK from {:?} ({} bytes)", path, bytes.len());
    Ok(bytes)
}

/// Load proof wire bytes. Only the size is checked; point validation
/// happens at verification time.
pub fn load_proof(path: &Path) -> Result<Vec<u8>> {
    let bytes = match ArtifactFormat::from_path(path) {
        ArtifactFormat::Json => return Ok(snarkjs::proof_json_to_bytes(&read_string(path)?)?.to_vec()),
        ArtifactFormat::Hex => decode_hex_text(&read_string(path)?)?,
        ArtifactFormat::Binary => read(path)?,
    };
    if bytes.len() != PROOF_SIZE {
        return Err(SdkError::InvalidSize {
            what: "proof",
            expected: PROOF_SIZE,
            actual: bytes.len(),
        });
    }
    Ok(bytes)
}

/// Split concatenated 32-byte values into canonical scalars.
pub fn inputs_from_bytes(bytes: &[u8]) -> Result<Vec<Scalar>> {
    if bytes.len() % SCALAR_SIZE != 0 {
        return Err(SdkError::InvalidSize {
            what: "public inputs",
            expected: bytes.len().next_multiple_of(SCALAR_SIZE),
            actual: bytes.len(),
        });
    }
    bytes
        .chunks_exact(SCALAR_SIZE)
        .map(|chunk| {
            let mut value = [0u8; 32];
            value.copy_from_slice(chunk);
            Fr::from_bytes(&value).map_err(|_| SdkError::InvalidFieldElement {
                value: hex::encode(value),
                reason: "not below the scalar field modulus",
            })?;
            Ok(value)
        })
        .collect()
}

/// Load public inputs.
pub fn load_public_inputs(path: &Path) -> Result<Vec<Scalar>> {
    match ArtifactFormat::from_path(path) {
        ArtifactFormat::Json => snarkjs::public_json_to_inputs(&read_string(path)?),
        ArtifactFormat::Hex => inputs_from_bytes(&decode_hex_text(&read_string(path)?)?),
        ArtifactFormat::Binary => inputs_from_bytes(&read(path)?),
    }
}

/// Load raw bytes from a hex or binary file (envelopes, exclusion paths).
pub fn load_bytes(path: &Path) -> Result<Vec<u8>> {
    match ArtifactFormat::from_path(path) {
        ArtifactFormat::Json => Err(SdkError::Unsupported(format!(
            "{:?}: expected hex or binary",
            path
        ))),
        ArtifactFormat::Hex => decode_hex_text(&read_string(path)?),
        ArtifactFormat::Binary => read(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_format_detection() {
        assert_eq!(
            ArtifactFormat::from_path(Path::new("vk.JSON")),
            ArtifactFormat::Json
        );
        assert_eq!(
            ArtifactFormat::from_path(Path::new("proof.hex")),
            ArtifactFormat::Hex
        );
        assert_eq!(
            ArtifactFormat::from_path(Path::new("proof")),
            ArtifactFormat::Binary
        );
    }

    #[test]
    fn test_decode_hex_text() {
        assert_eq!(decode_hex_text("0x01 02\n03").unwrap(), vec![1, 2, 3]);
        assert!(decode_hex_text("0g").is_err());
    }

    #[test]
    fn test_inputs_from_bytes() {
        let mut bytes = vec![0u8; 64];
        bytes[31] = 75;
        let inputs = inputs_from_bytes(&bytes).unwrap();
        assert_eq!(inputs.len(), 2);
        assert_eq!(inputs[0][31], 75);

        assert!(matches!(
            inputs_from_bytes(&bytes[..40]),
            Err(SdkError::InvalidSize { expected: 64, .. })
        ));
        assert!(matches!(
            inputs_from_bytes(&[0xff; 32]),
            Err(SdkError::InvalidFieldElement { .. })
        ));
    }

    #[test]
    fn test_missing_file_reports_path() {
        let path = PathBuf::from("/nonexistent/proof.bin");
        match load_proof(&path) {
            Err(SdkError::Io { path: p, .. }) => assert_eq!(p, path),
            other => panic!("unexpected {:?}", other),
        }
    }
}
