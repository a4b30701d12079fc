//! Mount context shared by every operation handler.

use std::fs;
use std::path::{Path, PathBuf};

use zeroize::Zeroizing;

use crate::error::{Error, Result};

/// Immutable per-mount state.
///
/// Built once at startup and injected into the filesystem value; handlers
/// only ever read it, so it needs no synchronization.
#[derive(Clone, Debug)]
pub struct MountContext {
    mirror_root: PathBuf,
    mount_point: PathBuf,
    passphrase: Zeroizing<Vec<u8>>,
}

impl MountContext {
    /// Resolve both directories to canonical absolute paths and capture the
    /// passphrase. Fails if either path is missing or not a directory.
    pub fn new(passphrase: &str, mirror_root: &Path, mount_point: &Path) -> Result<Self> {
        let mirror_root = fs::canonicalize(mirror_root)
            .map_err(|_| Error::NotFound(mirror_root.to_path_buf()))?;
        let mount_point = fs::canonicalize(mount_point)
            .map_err(|_| Error::NotFound(mount_point.to_path_buf()))?;

        if !mirror_root.is_dir() {
            return Err(Error::NotADirectory(mirror_root));
        }
        if !mount_point.is_dir() {
            return Err(Error::NotADirectory(mount_point));
        }

        Ok(Self {
            mirror_root,
            mount_point,
            passphrase: Zeroizing::new(passphrase.as_bytes().to_vec()),
        })
    }

    pub fn mirror_root(&self) -> &Path {
        &self.mirror_root
    }

    pub fn mount_point(&self) -> &Path {
        &self.mount_point
    }

    pub fn passphrase(&self) -> &[u8] {
        &self.passphrase
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_canonicalizes_paths() {
        let mirror = tempdir().unwrap();
        let mount = tempdir().unwrap();

        // Route through a `.` component to prove canonicalization happens.
        let dotted = mirror.path().join(".");
        let ctx = MountContext::new("pw", &dotted, mount.path()).unwrap();

        assert_eq!(ctx.mirror_root(), mirror.path().canonicalize().unwrap());
        assert_eq!(ctx.mount_point(), mount.path().canonicalize().unwrap());
        assert_eq!(ctx.passphrase(), b"pw");
    }

    #[test]
    fn test_missing_directory_rejected() {
        let mount = tempdir().unwrap();
        let err = MountContext::new("pw", Path::new("/no/such/dir"), mount.path()).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_file_as_mirror_root_rejected() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("plain");
        fs::write(&file, b"x").unwrap();

        let err = MountContext::new("pw", &file, dir.path()).unwrap_err();
        assert!(matches!(err, Error::NotADirectory(_)));
    }
}
