//! Key derivation using Argon2id
//!
//! Argon2id is the recommended algorithm for password hashing and key
//! derivation, resistant to both side-channel and GPU-based attacks.

use argon2::{Algorithm, Argon2, Params, Version};
use zeroize::Zeroizing;

use crate::crypto::KEY_SIZE;
use crate::error::{Error, Result};

/// Application-wide KDF salt. A mount carries no per-volume metadata, so the
/// same passphrase must derive the same key on every mount of every mirror.
const KDF_SALT: &[u8] = b"veilfs/v1/kdf-salt";

/// Argon2id cost parameters.
#[derive(Debug, Clone)]
pub struct KdfParams {
    /// Memory cost in KiB
    pub memory_kib: u32,
    /// Time cost (iterations)
    pub iterations: u32,
    /// Lanes
    pub parallelism: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            memory_kib: 64 * 1024,
            iterations: 3,
            parallelism: 1,
        }
    }
}

/// Derive the master key from the mount passphrase.
pub fn derive_master_key(
    passphrase: &[u8],
    params: &KdfParams,
) -> Result<Zeroizing<[u8; KEY_SIZE]>> {
    let params = Params::new(
        params.memory_kib,
        params.iterations,
        params.parallelism,
        Some(KEY_SIZE),
    )
    .map_err(|e| Error::KeyDerivation(format!("invalid Argon2 parameters: {}", e)))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut key = Zeroizing::new([0u8; KEY_SIZE]);
    argon2
        .hash_password_into(passphrase, KDF_SALT, key.as_mut())
        .map_err(|e| Error::KeyDerivation(e.to_string()))?;

    Ok(key)
}
