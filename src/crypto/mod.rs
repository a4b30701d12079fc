//! Content transform: whole-stream encryption keyed by the mount passphrase.

mod cipher;
mod kdf;

pub use cipher::{PassphraseCipher, CIPHERTEXT_OVERHEAD};
pub use kdf::{derive_master_key, KdfParams};

use crate::error::Result;

/// Key size in bytes (256 bits)
pub const KEY_SIZE: usize = 32;

/// Which way the transform runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Encrypt,
    Decrypt,
}

/// Whole-stream encrypt/decrypt primitive.
///
/// Implementations must be deterministic for a fixed passphrase, operate on
/// the complete stream rather than addressable blocks, and satisfy
/// `decrypt(encrypt(p)) == p` for every plaintext `p`.
pub trait ContentTransform: Send + Sync {
    fn transform(&self, input: &[u8], direction: Direction) -> Result<Vec<u8>>;

    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        self.transform(plaintext, Direction::Encrypt)
    }

    fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>> {
        self.transform(ciphertext, Direction::Decrypt)
    }
}
