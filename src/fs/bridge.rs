//! Transparent crypto I/O against backing files
//!
//! Every read, write, and truncate is a whole-file round trip: decrypt the
//! backing file into an ephemeral plaintext buffer, slice or splice, then
//! re-encrypt and write back. The bridge keeps no state between calls other
//! than the per-path guards; no file handle survives an operation.

use dashmap::DashMap;
use parking_lot::Mutex;
use std::fs::{self, OpenOptions};
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;
use zeroize::Zeroizing;

use crate::crypto::{ContentTransform, PassphraseCipher};
use crate::error::Result;

pub struct CryptoBridge {
    cipher: PassphraseCipher,
    /// Per-real-path guards. Each guard serializes complete
    /// decrypt-modify-encrypt round trips against one backing file, so
    /// concurrent writes cannot lose updates.
    locks: DashMap<PathBuf, Arc<Mutex<()>>>,
}

impl CryptoBridge {
    pub fn new(cipher: PassphraseCipher) -> Self {
        Self {
            cipher,
            locks: DashMap::new(),
        }
    }

    fn path_lock(&self, real: &Path) -> Arc<Mutex<()>> {
        self.locks
            .entry(real.to_path_buf())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Decrypt the whole backing file into an ephemeral buffer. The buffer
    /// is zeroized when dropped, on every exit path.
    fn load_plaintext(&self, real: &Path) -> Result<Zeroizing<Vec<u8>>> {
        let ciphertext = fs::read(real)?;
        Ok(Zeroizing::new(self.cipher.decrypt(&ciphertext)?))
    }

    /// Encrypt and persist a complete plaintext. The new ciphertext is
    /// staged in a sibling file and renamed over the backing file, so a
    /// crash mid-write cannot leave a truncated backing file behind.
    fn store_plaintext(&self, real: &Path, plaintext: &[u8]) -> Result<()> {
        let ciphertext = self.cipher.encrypt(plaintext)?;

        let staged = staging_path(real);
        fs::write(&staged, &ciphertext)?;
        if let Ok(meta) = fs::metadata(real) {
            let _ = fs::set_permissions(&staged, meta.permissions());
        }
        fs::rename(&staged, real)?;
        Ok(())
    }

    /// Read up to `size` plaintext bytes starting at `offset`. An offset at
    /// or past the end of the plaintext reads zero bytes, not an error.
    pub fn read_range(&self, real: &Path, offset: u64, size: u32) -> Result<Vec<u8>> {
        let lock = self.path_lock(real);
        let _guard = lock.lock();

        let plain = self.load_plaintext(real)?;
        let offset = offset as usize;
        if offset >= plain.len() {
            return Ok(Vec::new());
        }
        let end = plain.len().min(offset + size as usize);
        debug!("read_range({:?}): {} bytes at {}", real, end - offset, offset);
        Ok(plain[offset..end].to_vec())
    }

    /// Splice `payload` into the plaintext at `offset` and write the result
    /// back. The backing file must already exist; a write never creates one.
    /// A gap between the old end and `offset` is zero-filled. Returns the
    /// number of payload bytes written.
    pub fn write_range(&self, real: &Path, offset: u64, payload: &[u8]) -> Result<u32> {
        let lock = self.path_lock(real);
        let _guard = lock.lock();

        let mut plain = self.load_plaintext(real)?;
        let offset = offset as usize;
        let end = offset + payload.len();
        if plain.len() < end {
            plain.resize(end, 0);
        }
        plain[offset..end].copy_from_slice(payload);

        self.store_plaintext(real, &plain)?;
        debug!("write_range({:?}): {} bytes at {}", real, payload.len(), offset);
        Ok(payload.len() as u32)
    }

    /// Truncate or extend the plaintext to `size` bytes, zero-filling on
    /// extension, and re-encrypt.
    pub fn set_len(&self, real: &Path, size: u64) -> Result<()> {
        let lock = self.path_lock(real);
        let _guard = lock.lock();

        let mut plain = self.load_plaintext(real)?;
        plain.resize(size as usize, 0);
        self.store_plaintext(real, &plain)
    }

    /// Create an empty backing file with the given permission bits. No
    /// ciphertext placeholder is written; the first write round trip treats
    /// the zero-length file as an empty plaintext.
    pub fn create(&self, real: &Path, mode: u32) -> Result<()> {
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .mode(mode)
            .open(real)?;
        Ok(())
    }

    /// Drop the guard for a path that no longer names this file.
    pub fn forget(&self, real: &Path) {
        self.locks.remove(real);
    }
}

/// Sibling staging file for atomic replacement. Lives in the same directory
/// so the final rename stays on one filesystem.
fn staging_path(real: &Path) -> PathBuf {
    let mut name = std::ffi::OsString::from(".");
    if let Some(base) = real.file_name() {
        name.push(base);
    }
    name.push(".veilfs~");
    real.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KdfParams;
    use crate::error::Error;
    use tempfile::tempdir;

    fn test_bridge(passphrase: &str) -> CryptoBridge {
        let params = KdfParams {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        };
        CryptoBridge::new(PassphraseCipher::derive(passphrase.as_bytes(), &params).unwrap())
    }

    #[test]
    fn test_read_after_write_on_fresh_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("fresh");
        let bridge = test_bridge("pw");

        bridge.create(&path, 0o644).unwrap();
        assert_eq!(bridge.write_range(&path, 0, b"hello world").unwrap(), 11);
        assert_eq!(bridge.read_range(&path, 0, 11).unwrap(), b"hello world");

        // The backing file itself holds ciphertext, not the plaintext.
        let raw = fs::read(&path).unwrap();
        assert!(!raw.windows(11).any(|w| w == b"hello world"));
    }

    #[test]
    fn test_partial_overwrite() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("f");
        let bridge = test_bridge("pw");

        bridge.create(&path, 0o644).unwrap();
        bridge.write_range(&path, 0, b"HELLOWORLD").unwrap();
        bridge.write_range(&path, 5, b"XXXXX").unwrap();
        assert_eq!(bridge.read_range(&path, 0, 64).unwrap(), b"HELLOXXXXX");
    }

    #[test]
    fn test_read_past_eof_returns_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("f");
        let bridge = test_bridge("pw");

        bridge.create(&path, 0o644).unwrap();
        bridge.write_range(&path, 0, b"short").unwrap();

        assert!(bridge.read_range(&path, 5, 16).unwrap().is_empty());
        assert!(bridge.read_range(&path, 1000, 16).unwrap().is_empty());
    }

    #[test]
    fn test_read_clamps_to_plaintext_end() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("f");
        let bridge = test_bridge("pw");

        bridge.create(&path, 0o644).unwrap();
        bridge.write_range(&path, 0, b"0123456789").unwrap();
        assert_eq!(bridge.read_range(&path, 7, 100).unwrap(), b"789");
    }

    #[test]
    fn test_gap_write_zero_fills() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("f");
        let bridge = test_bridge("pw");

        bridge.create(&path, 0o644).unwrap();
        bridge.write_range(&path, 0, b"ab").unwrap();
        bridge.write_range(&path, 6, b"cd").unwrap();

        assert_eq!(bridge.read_range(&path, 0, 64).unwrap(), b"ab\0\0\0\0cd");
    }

    #[test]
    fn test_write_never_creates() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing");
        let bridge = test_bridge("pw");

        let err = bridge.write_range(&path, 0, b"x").unwrap_err();
        assert_eq!(err.errno(), libc::ENOENT);
        assert!(!path.exists());
    }

    #[test]
    fn test_create_refuses_existing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("f");
        let bridge = test_bridge("pw");

        bridge.create(&path, 0o644).unwrap();
        let err = bridge.create(&path, 0o644).unwrap_err();
        assert_eq!(err.errno(), libc::EEXIST);
    }

    #[test]
    fn test_set_len_shrink_and_extend() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("f");
        let bridge = test_bridge("pw");

        bridge.create(&path, 0o644).unwrap();
        bridge.write_range(&path, 0, b"HELLOWORLD").unwrap();

        bridge.set_len(&path, 5).unwrap();
        assert_eq!(bridge.read_range(&path, 0, 64).unwrap(), b"HELLO");

        bridge.set_len(&path, 8).unwrap();
        assert_eq!(bridge.read_range(&path, 0, 64).unwrap(), b"HELLO\0\0\0");
    }

    #[test]
    fn test_corrupt_ciphertext_surfaces_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("f");
        let bridge = test_bridge("pw");

        bridge.create(&path, 0o644).unwrap();
        bridge.write_range(&path, 0, b"payload").unwrap();

        let mut raw = fs::read(&path).unwrap();
        let last = raw.len() - 1;
        raw[last] ^= 0xff;
        fs::write(&path, &raw).unwrap();

        let err = bridge.read_range(&path, 0, 7).unwrap_err();
        assert!(matches!(err, Error::Transform(_)));
        assert_eq!(err.errno(), libc::EIO);
    }

    #[test]
    fn test_concurrent_writes_do_not_lose_updates() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("f");
        let bridge = Arc::new(test_bridge("pw"));

        bridge.create(&path, 0o644).unwrap();
        bridge.write_range(&path, 0, &[0u8; 64]).unwrap();

        let mut threads = Vec::new();
        for i in 0..8u8 {
            let bridge = Arc::clone(&bridge);
            let path = path.clone();
            threads.push(std::thread::spawn(move || {
                let payload = [b'A' + i; 8];
                bridge.write_range(&path, i as u64 * 8, &payload).unwrap();
            }));
        }
        for t in threads {
            t.join().unwrap();
        }

        let all = bridge.read_range(&path, 0, 64).unwrap();
        for i in 0..8u8 {
            let slice = &all[i as usize * 8..(i as usize + 1) * 8];
            assert_eq!(slice, &[b'A' + i; 8], "update {} lost", i);
        }
    }

    #[test]
    fn test_write_preserves_backing_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let path = dir.path().join("f");
        let bridge = test_bridge("pw");

        bridge.create(&path, 0o600).unwrap();
        bridge.write_range(&path, 0, b"secret").unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o7777;
        assert_eq!(mode, 0o600);
    }
}
