//! Process-level entry points
//!
//! ```ignore
//! api::init()?;
//! let handle = api::vk_load(&vk_bytes)?;
//! let ok = api::verify(&handle, &proof_bytes, &[threshold, commitment])?;
//! api::cleanup();
//! ```
//!
//! Keys are returned as cheap-to-clone handles and can be shared across
//! threads; nothing here holds a lock while verifying.

use core::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::arena::release_scratch;
use crate::batch::{self, BatchResult};
use crate::errors::VerifyError;
use crate::key::VerifyingKey;
use crate::poseidon;
use crate::reputation;
use crate::stats::{self, StatsSnapshot};
use crate::tier::Tier;
use crate::types::Scalar;
use crate::verifier::{verify_recorded, VerifierConfig};

static INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Build the shared tables. Safe to call from many threads at once.
pub fn init() -> Result<(), VerifyError> {
    if INITIALIZED.load(Ordering::Acquire) {
        return Ok(());
    }
    // OnceLock makes concurrent first callers converge on one table
    poseidon::params();
    INITIALIZED.store(true, Ordering::Release);
    log::debug!("reputation-zk initialized");
    Ok(())
}

pub fn is_initialized() -> bool {
    INITIALIZED.load(Ordering::Acquire)
}

/// Tear down: mark uninitialized, reset statistics and free this thread's
/// scratch arena. Loaded handles stay valid.
pub fn cleanup() {
    INITIALIZED.store(false, Ordering::Release);
    stats::global().reset();
    release_scratch();
    log::debug!("reputation-zk cleaned up");
}

fn ensure_init() -> Result<(), VerifyError> {
    if is_initialized() {
        Ok(())
    } else {
        Err(VerifyError::NotInitialized)
    }
}

/// Shared reference to a validated verifying key
#[derive(Debug, Clone)]
pub struct KeyHandle(Arc<VerifyingKey>);

impl KeyHandle {
    pub fn key(&self) -> &Arc<VerifyingKey> {
        &self.0
    }

    pub fn num_public_inputs(&self) -> usize {
        self.0.num_public_inputs()
    }
}

impl From<Arc<VerifyingKey>> for KeyHandle {
    fn from(vk: Arc<VerifyingKey>) -> Self {
        KeyHandle(vk)
    }
}

/// Parse and validate a verifying key.
pub fn vk_load(bytes: &[u8]) -> Result<KeyHandle, VerifyError> {
    ensure_init()?;
    let vk = VerifyingKey::from_bytes(bytes).inspect_err(|e| {
        log::warn!("vk_load: {}", e);
    })?;
    log::debug!("vk_load: {} public inputs", vk.num_public_inputs());
    Ok(KeyHandle(Arc::new(vk)))
}

/// Verify one proof. `Ok(false)` means the proof was rejected.
pub fn verify(handle: &KeyHandle, proof: &[u8], inputs: &[Scalar]) -> Result<bool, VerifyError> {
    ensure_init()?;
    verify_recorded(&handle.0, proof, inputs)
}

/// Verify many proofs under one key with the default configuration.
pub fn batch_verify(
    handle: &KeyHandle,
    proofs: &[&[u8]],
    inputs: &[Vec<Scalar>],
) -> Result<BatchResult, VerifyError> {
    batch_verify_with(handle, proofs, inputs, &VerifierConfig::default())
}

pub fn batch_verify_with(
    handle: &KeyHandle,
    proofs: &[&[u8]],
    inputs: &[Vec<Scalar>],
    config: &VerifierConfig,
) -> Result<BatchResult, VerifyError> {
    ensure_init()?;
    batch::verify_wire(&handle.0, proofs, inputs, config)
}

/// `Poseidon(score, secret)`; score must be at most 100.
pub fn poseidon_commit(score: u16, secret: &Scalar) -> Result<Scalar, VerifyError> {
    Ok(reputation::poseidon_commit(score, secret)?)
}

pub fn tier_for_threshold(threshold: u16) -> Result<Tier, VerifyError> {
    Ok(Tier::for_threshold(threshold)?)
}

pub fn stats() -> StatsSnapshot {
    stats::global().snapshot()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{FieldError, KeyError};
    use crate::field::Fr;
    use crate::testing::Toy;
    use std::sync::Mutex;

    // init/cleanup flip process-wide state
    static API_LOCK: Mutex<()> = Mutex::new(());

    fn lock() -> std::sync::MutexGuard<'static, ()> {
        API_LOCK.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn scalars(values: &[u64]) -> Vec<Scalar> {
        values.iter().map(|v| Fr::from_u64(*v).to_bytes()).collect()
    }

    #[test]
    fn test_requires_init() {
        let _guard = lock();
        cleanup();
        assert!(!is_initialized());
        assert!(matches!(
            vk_load(&[0u8; 10]),
            Err(VerifyError::NotInitialized)
        ));
        init().unwrap();
        assert!(is_initialized());
        assert!(matches!(
            vk_load(&[0u8; 10]),
            Err(VerifyError::KeyLoadFailed(KeyError::TooShort { .. }))
        ));
        cleanup();
    }

    #[test]
    fn test_concurrent_init() {
        let _guard = lock();
        cleanup();
        let handles: Vec<_> = (0..8).map(|_| std::thread::spawn(init)).collect();
        for h in handles {
            h.join().unwrap().unwrap();
        }
        assert!(is_initialized());
        cleanup();
    }

    #[test]
    fn test_verify_and_batch() {
        let _guard = lock();
        init().unwrap();
        let toy = Toy::new(2);
        let handle = vk_load(&toy.vk.to_bytes()).unwrap();
        assert_eq!(handle.num_public_inputs(), 2);

        let proof = toy.prove(&[75, 99], 4, 5).to_bytes();
        assert!(verify(&handle, &proof, &scalars(&[75, 99])).unwrap());
        assert!(!verify(&handle, &proof, &scalars(&[76, 99])).unwrap());

        let proofs: Vec<[u8; 256]> = (0..5u64)
            .map(|i| toy.prove(&[60 + i, 7], 2 + i, 3).to_bytes())
            .collect();
        let refs: Vec<&[u8]> = proofs.iter().map(|p| p.as_slice()).collect();
        let mut inputs: Vec<Vec<Scalar>> = (0..5u64).map(|i| scalars(&[60 + i, 7])).collect();
        inputs[2] = scalars(&[0, 7]);
        let result = batch_verify(&handle, &refs, &inputs).unwrap();
        assert_eq!(result.failed_indices(), vec![2]);

        let snap = stats();
        assert!(snap.total_verified >= 1);
        assert!(snap.total_failed >= 1);
        cleanup();
    }

    #[test]
    fn test_pure_helpers() {
        assert_eq!(tier_for_threshold(75).unwrap(), Tier::Gold);
        assert_eq!(
            tier_for_threshold(150),
            Err(VerifyError::OutOfRange(FieldError::ScoreOutOfRange(150)))
        );
        let secret = Fr::from_u64(12345).to_bytes();
        assert_eq!(
            poseidon_commit(85, &secret).unwrap(),
            poseidon_commit(85, &secret).unwrap()
        );
    }
}
