//! Error types for the reputation proof verifier
//!
//! A verification that runs to completion and finds the proof unsound is not
//! an error: it returns `Ok(false)`. Everything here describes inputs that
//! could not be checked at all.

use thiserror::Error;

/// Top-level verification error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifyError {
    #[error("Value out of range: {0}")]
    OutOfRange(#[from] FieldError),

    #[error("Invalid point: {0}")]
    InvalidPoint(#[from] PointError),

    #[error("Expected {expected} public inputs, got {actual}")]
    BadInputs { expected: usize, actual: usize },

    #[error("No verifying key loaded")]
    VkNotInitialized,

    #[error("Key load failed: {0}")]
    KeyLoadFailed(#[from] KeyError),

    #[error("Proof error: {0}")]
    Proof(#[from] ProofError),

    #[error("Allocation failed: {0}")]
    AllocationFailed(#[from] ArenaError),

    #[error("Batch error: {0}")]
    Batch(#[from] BatchError),

    #[error("Secure randomness unavailable: {0}")]
    Randomness(String),

    #[error("Engine not initialized (call init first)")]
    NotInitialized,
}

/// Field element decoding errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("Value is not a canonical field element")]
    NotCanonical,

    #[error("Invalid length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("Score {0} exceeds the maximum of 100")]
    ScoreOutOfRange(u16),
}

/// Curve point decoding errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PointError {
    #[error("Invalid point encoding length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("Coordinate is not a canonical base field element")]
    CoordinateOutOfRange,

    #[error("Point not on curve")]
    NotOnCurve,

    #[error("Point not in the prime-order subgroup")]
    NotInSubgroup,

    #[error("Point at infinity is not allowed here")]
    Identity,
}

/// Verifying key parsing errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    #[error("VK too short: need at least {min} bytes, got {actual}")]
    TooShort { min: usize, actual: usize },

    #[error("Invalid VK size: expected {expected}, got {actual}")]
    InvalidSize { expected: usize, actual: usize },

    #[error("VK declares {count} IC points, at most {max} are supported")]
    TooManyPublicInputs { count: usize, max: usize },

    #[error("VK has an empty IC vector")]
    EmptyIc,

    #[error("Invalid VK point {field}: {source}")]
    InvalidPoint {
        field: &'static str,
        source: PointError,
    },
}

/// Proof and envelope parsing errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProofError {
    #[error("Invalid proof size: expected {expected}, got {actual}")]
    InvalidSize { expected: usize, actual: usize },

    #[error("Unsupported envelope version {0}")]
    UnsupportedVersion(u8),

    #[error("Unknown proof kind {0}")]
    UnknownKind(u8),

    #[error("Invalid exclusion path length {0} (must be a multiple of 33)")]
    InvalidExclusionPath(usize),
}

/// Scratch arena errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ArenaError {
    #[error("Arena exhausted: requested {requested} bytes, {available} available")]
    Exhausted { requested: usize, available: usize },

    #[error("Unsupported alignment {0} (must be a power of two, at most 4096)")]
    InvalidAlignment(usize),

    #[error("Invalid arena capacity {0}")]
    InvalidCapacity(usize),

    #[error("Out of memory reserving {capacity} bytes")]
    OutOfMemory { capacity: usize },

    #[error("Scratch arena already in use on this thread")]
    ScratchBusy,
}

/// Batch accumulation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BatchError {
    #[error("Batch is full ({capacity} proofs)")]
    Full { capacity: usize },

    #[error("Invalid batch capacity {capacity} (max {max})")]
    InvalidCapacity { capacity: usize, max: usize },

    #[error("Got {proofs} proofs but {inputs} public input sets")]
    LengthMismatch { proofs: usize, inputs: usize },
}

/// Tier name that does not match any tier
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown tier: {0}")]
pub struct UnknownTier(pub String);
