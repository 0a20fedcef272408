//! snarkjs artifact conversion
//!
//! snarkjs writes field elements as decimal strings and points in
//! projective form with `z = 1`. G2 coordinates are `[c0, c1]` pairs;
//! the wire format wants the imaginary part first, so every G2
//! coordinate is swapped on the way out.

use reputation_zk_core::field::limbs_to_be;
use reputation_zk_core::types::{G1Bytes, G2Bytes, G1_IDENTITY, G2_IDENTITY};
use reputation_zk_core::{Fr, Proof, Scalar, VerifyingKey, PROOF_SIZE};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SdkError};

/// `verification_key.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnarkjsVk {
    #[serde(default)]
    pub protocol: Option<String>,
    #[serde(default)]
    pub curve: Option<String>,
    #[serde(rename = "nPublic")]
    pub n_public: usize,
    pub vk_alpha_1: Vec<String>,
    pub vk_beta_2: Vec<Vec<String>>,
    pub vk_gamma_2: Vec<Vec<String>>,
    pub vk_delta_2: Vec<Vec<String>>,
    #[serde(rename = "IC")]
    pub ic: Vec<Vec<String>>,
}

/// `proof.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnarkjsProof {
    pub pi_a: Vec<String>,
    pub pi_b: Vec<Vec<String>>,
    pub pi_c: Vec<String>,
    #[serde(default)]
    pub protocol: Option<String>,
    #[serde(default)]
    pub curve: Option<String>,
}

/// Parse a decimal (or `0x`-prefixed hex) string into 32 big-endian bytes.
///
/// Only the 256-bit bound is enforced; range checks against a modulus
/// happen when the bytes are decoded as a field element or point.
pub fn parse_field_element(value: &str) -> Result<Scalar> {
    let s = value.trim();
    let invalid = |reason| SdkError::InvalidFieldElement {
        value: value.to_string(),
        reason,
    };

    if let Some(digits) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        let padded = format!("{:0>64}", digits);
        if padded.len() > 64 {
            return Err(invalid("exceeds 256 bits"));
        }
        let mut out = [0u8; 32];
        hex::decode_to_slice(&padded, &mut out)?;
        return Ok(out);
    }

    if s.is_empty() {
        return Err(invalid("empty"));
    }
    let mut limbs = [0u64; 4];
    for c in s.bytes() {
        if !c.is_ascii_digit() {
            return Err(invalid("not a decimal number"));
        }
        let mut carry = (c - b'0') as u128;
        for limb in limbs.iter_mut() {
            let v = (*limb as u128) * 10 + carry;
            *limb = v as u64;
            carry = v >> 64;
        }
        if carry != 0 {
            return Err(invalid("exceeds 256 bits"));
        }
    }
    Ok(limbs_to_be(&limbs))
}

fn is_zero_str(s: &str) -> bool {
    s.trim().trim_start_matches("0x").bytes().all(|b| b == b'0')
}

fn check_header(protocol: Option<&str>, curve: Option<&str>) -> Result<()> {
    if let Some(p) = protocol {
        if p != "groth16" {
            return Err(SdkError::Unsupported(format!("protocol {}", p)));
        }
    }
    if let Some(c) = curve {
        if c != "bn128" && c != "bn254" {
            return Err(SdkError::Unsupported(format!("curve {}", c)));
        }
    }
    Ok(())
}

/// `[x, y, z]` with z = 1, or z = 0 for the identity
pub fn g1_from_json(coords: &[String]) -> Result<G1Bytes> {
    if coords.len() < 2 || coords.len() > 3 {
        return Err(SdkError::InvalidSize {
            what: "G1 coordinate list",
            expected: 3,
            actual: coords.len(),
        });
    }
    if coords.get(2).is_some_and(|z| is_zero_str(z)) {
        return Ok(G1_IDENTITY);
    }
    let mut out = [0u8; 64];
    out[..32].copy_from_slice(&parse_field_element(&coords[0])?);
    out[32..].copy_from_slice(&parse_field_element(&coords[1])?);
    Ok(out)
}

/// `[[x.c0, x.c1], [y.c0, y.c1], [z.c0, z.c1]]` into `x.c1 | x.c0 | y.c1 | y.c0`
pub fn g2_from_json(coords: &[Vec<String>]) -> Result<G2Bytes> {
    if coords.len() < 2 || coords.len() > 3 || coords.iter().any(|c| c.len() != 2) {
        return Err(SdkError::InvalidSize {
            what: "G2 coordinate list",
            expected: 3,
            actual: coords.len(),
        });
    }
    if coords.get(2).is_some_and(|z| z.iter().all(|s| is_zero_str(s))) {
        return Ok(G2_IDENTITY);
    }
    let mut out = [0u8; 128];
    out[0..32].copy_from_slice(&parse_field_element(&coords[0][1])?);
    out[32..64].copy_from_slice(&parse_field_element(&coords[0][0])?);
    out[64..96].copy_from_slice(&parse_field_element(&coords[1][1])?);
    out[96..128].copy_from_slice(&parse_field_element(&coords[1][0])?);
    Ok(out)
}

impl SnarkjsVk {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Wire encoding, validated by parsing it back.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        check_header(self.protocol.as_deref(), self.curve.as_deref())?;
        if self.n_public.checked_add(1) != Some(self.ic.len()) {
            return Err(SdkError::InvalidSize {
                what: "IC",
                expected: self.n_public.saturating_add(1),
                actual: self.ic.len(),
            });
        }

        let mut out = Vec::with_capacity(reputation_zk_core::key::vk_size(self.ic.len()));
        out.extend_from_slice(&g1_from_json(&self.vk_alpha_1)?);
        out.extend_from_slice(&g2_from_json(&self.vk_beta_2)?);
        out.extend_from_slice(&g2_from_json(&self.vk_gamma_2)?);
        out.extend_from_slice(&g2_from_json(&self.vk_delta_2)?);
        out.extend_from_slice(&(self.ic.len() as u32).to_be_bytes());
        for point in &self.ic {
            out.extend_from_slice(&g1_from_json(point)?);
        }

        VerifyingKey::from_bytes(&out).map_err(reputation_zk_core::VerifyError::from)?;
        Ok(out)
    }
}

impl SnarkjsProof {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// 256-byte wire proof, validated by parsing it back.
    pub fn to_bytes(&self) -> Result<[u8; PROOF_SIZE]> {
        check_header(self.protocol.as_deref(), self.curve.as_deref())?;
        let mut out = [0u8; PROOF_SIZE];
        out[0..64].copy_from_slice(&g1_from_json(&self.pi_a)?);
        out[64..192].copy_from_slice(&g2_from_json(&self.pi_b)?);
        out[192..256].copy_from_slice(&g1_from_json(&self.pi_c)?);
        Proof::from_bytes(&out)?;
        Ok(out)
    }
}

/// Convert `verification_key.json` contents to VK bytes.
pub fn vk_json_to_bytes(json: &str) -> Result<Vec<u8>> {
    SnarkjsVk::from_json(json)?.to_bytes()
}

/// Convert `proof.json` contents to proof bytes.
pub fn proof_json_to_bytes(json: &str) -> Result<[u8; PROOF_SIZE]> {
    SnarkjsProof::from_json(json)?.to_bytes()
}

/// Convert `public.json` (array of decimal strings) to canonical scalars.
pub fn public_json_to_inputs(json: &str) -> Result<Vec<Scalar>> {
    let values: Vec<String> = serde_json::from_str(json)?;
    values
        .iter()
        .map(|v| {
            let bytes = parse_field_element(v)?;
            Fr::from_bytes(&bytes).map_err(|_| SdkError::InvalidFieldElement {
                value: v.clone(),
                reason: "not below the scalar field modulus",
            })?;
            Ok(bytes)
        })
        .collect()
}
