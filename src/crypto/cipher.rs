//! Whole-stream authenticated encryption
//!
//! ChaCha20-Poly1305 over the complete file content. The nonce is synthesized
//! from a keyed BLAKE3 hash of the plaintext, which keeps the transform
//! deterministic for a fixed passphrase: the same plaintext always produces
//! the same ciphertext. Ciphertext layout: `nonce (12) || body || tag (16)`.

use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, CHACHA20_POLY1305, NONCE_LEN};
use zeroize::Zeroizing;

use crate::crypto::{
    kdf::{derive_master_key, KdfParams},
    ContentTransform, Direction, KEY_SIZE,
};
use crate::error::{Error, Result};

const TAG_LEN: usize = 16;

/// Fixed size overhead of a non-empty ciphertext: nonce prefix plus AEAD tag.
pub const CIPHERTEXT_OVERHEAD: usize = NONCE_LEN + TAG_LEN;

/// Content transform keyed by the mount passphrase.
pub struct PassphraseCipher {
    content_key: Zeroizing<[u8; KEY_SIZE]>,
    nonce_key: Zeroizing<[u8; KEY_SIZE]>,
}

impl PassphraseCipher {
    /// Derive the cipher from a passphrase. Runs the Argon2id KDF once, then
    /// splits the master key into independent content and nonce keys.
    pub fn derive(passphrase: &[u8], params: &KdfParams) -> Result<Self> {
        let master = derive_master_key(passphrase, params)?;
        let content_key = Zeroizing::new(blake3::derive_key("veilfs v1 content key", &*master));
        let nonce_key = Zeroizing::new(blake3::derive_key("veilfs v1 nonce key", &*master));
        Ok(Self {
            content_key,
            nonce_key,
        })
    }

    fn sealing_key(&self) -> Result<LessSafeKey> {
        let unbound = UnboundKey::new(&CHACHA20_POLY1305, &*self.content_key)
            .map_err(|_| Error::Transform("invalid key length".into()))?;
        Ok(LessSafeKey::new(unbound))
    }

    fn synthetic_nonce(&self, plaintext: &[u8]) -> [u8; NONCE_LEN] {
        let digest = blake3::keyed_hash(&self.nonce_key, plaintext);
        let mut nonce = [0u8; NONCE_LEN];
        nonce.copy_from_slice(&digest.as_bytes()[..NONCE_LEN]);
        nonce
    }

    fn encrypt_stream(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let nonce_bytes = self.synthetic_nonce(plaintext);

        let mut out = Vec::with_capacity(CIPHERTEXT_OVERHEAD + plaintext.len());
        out.extend_from_slice(&nonce_bytes);
        // seal_in_place encrypts the plaintext copy, so no cleartext remains
        // in `out` afterwards.
        out.extend_from_slice(plaintext);
        self.sealing_key()?
            .seal_in_place_separate_tag(
                Nonce::assume_unique_for_key(nonce_bytes),
                Aad::empty(),
                &mut out[NONCE_LEN..],
            )
            .map(|tag| out.extend_from_slice(tag.as_ref()))
            .map_err(|_| Error::Transform("encryption failed".into()))?;
        Ok(out)
    }

    fn decrypt_stream(&self, ciphertext: &[u8]) -> Result<Vec<u8>> {
        // A freshly created backing file holds no ciphertext yet.
        if ciphertext.is_empty() {
            return Ok(Vec::new());
        }
        if ciphertext.len() < CIPHERTEXT_OVERHEAD {
            return Err(Error::Transform(format!(
                "ciphertext too short: {} bytes",
                ciphertext.len()
            )));
        }

        let (nonce_bytes, body) = ciphertext.split_at(NONCE_LEN);
        let nonce = Nonce::try_assume_unique_for_key(nonce_bytes)
            .map_err(|_| Error::Transform("malformed nonce".into()))?;

        let mut buf = body.to_vec();
        let plain_len = self
            .sealing_key()?
            .open_in_place(nonce, Aad::empty(), &mut buf)
            .map_err(|_| {
                Error::Transform("decryption failed (wrong passphrase or corrupt file)".into())
            })?
            .len();
        buf.truncate(plain_len);
        Ok(buf)
    }
}

impl ContentTransform for PassphraseCipher {
    fn transform(&self, input: &[u8], direction: Direction) -> Result<Vec<u8>> {
        match direction {
            Direction::Encrypt => self.encrypt_stream(input),
            Direction::Decrypt => self.decrypt_stream(input),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::RngCore;

    fn test_cipher(passphrase: &str) -> PassphraseCipher {
        let params = KdfParams {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        };
        PassphraseCipher::derive(passphrase.as_bytes(), &params).unwrap()
    }

    #[test]
    fn test_round_trip() {
        let cipher = test_cipher("secret");
        for len in [0usize, 1, 17, 4096, 70_000] {
            let mut plain = vec![0u8; len];
            rand::thread_rng().fill_bytes(&mut plain);

            let ct = cipher.encrypt(&plain).unwrap();
            assert_eq!(cipher.decrypt(&ct).unwrap(), plain, "len={}", len);
        }
    }

    #[test]
    fn test_deterministic_for_fixed_passphrase() {
        let cipher = test_cipher("secret");
        let a = cipher.encrypt(b"same input").unwrap();
        let b = cipher.encrypt(b"same input").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_ciphertext_differs_from_plaintext() {
        let cipher = test_cipher("secret");
        let ct = cipher.encrypt(b"attack at dawn").unwrap();
        assert_eq!(ct.len(), b"attack at dawn".len() + CIPHERTEXT_OVERHEAD);
        assert!(!ct.windows(14).any(|w| w == b"attack at dawn"));
    }

    #[test]
    fn test_wrong_passphrase_fails() {
        let ct = test_cipher("right").encrypt(b"payload").unwrap();
        let err = test_cipher("wrong").decrypt(&ct).unwrap_err();
        assert!(matches!(err, Error::Transform(_)));
    }

    #[test]
    fn test_empty_ciphertext_is_empty_plaintext() {
        // A backing file created by `create` and never written to.
        let cipher = test_cipher("secret");
        assert!(cipher.decrypt(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_truncated_ciphertext_fails() {
        let cipher = test_cipher("secret");
        let ct = cipher.encrypt(b"payload").unwrap();
        assert!(cipher.decrypt(&ct[..CIPHERTEXT_OVERHEAD - 1]).is_err());
        assert!(cipher.decrypt(&ct[..ct.len() - 1]).is_err());
    }
}
