//! Virtual-to-real path translation

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Upper bound on a translated real path, in bytes.
pub const MAX_REAL_PATH: usize = libc::PATH_MAX as usize;

/// Maps mount-relative virtual paths onto the mirror root.
///
/// Translation is plain concatenation. No canonicalization is performed and
/// `..` components are not rejected, so a crafted virtual path can address
/// files outside the mirror root. Callers sit behind the kernel FUSE layer,
/// which normalizes the paths it sends, but this remains a documented risk.
#[derive(Debug, Clone)]
pub struct PathTranslator {
    root: PathBuf,
}

impl PathTranslator {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Produce the backing path for a virtual path. Fails with `NameTooLong`
    /// instead of truncating when the result exceeds [`MAX_REAL_PATH`].
    pub fn translate(&self, virtual_path: &Path) -> Result<PathBuf> {
        let relative = virtual_path.strip_prefix("/").unwrap_or(virtual_path);
        let real = self.root.join(relative);

        let len = real.as_os_str().len();
        if len > MAX_REAL_PATH {
            return Err(Error::NameTooLong(len, MAX_REAL_PATH));
        }
        Ok(real)
    }
}
