//! Inode bookkeeping for the kernel-facing surface
//!
//! The crypto bridge and the passthrough operations are path-addressed, but
//! the kernel speaks inode numbers. This table hands out stable numbers for
//! virtual paths and resolves them back. Entries persist for the lifetime of
//! the mount; unlink and rename drop or remap them.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

/// Inode number of the mount root, fixed by the FUSE protocol.
pub const ROOT_INO: u64 = 1;

pub struct InodeTable {
    next_ino: AtomicU64,
    paths: RwLock<HashMap<u64, PathBuf>>,
    inos: RwLock<HashMap<PathBuf, u64>>,
}

impl InodeTable {
    pub fn new() -> Self {
        let table = Self {
            next_ino: AtomicU64::new(ROOT_INO + 1),
            paths: RwLock::new(HashMap::new()),
            inos: RwLock::new(HashMap::new()),
        };
        table.paths.write().insert(ROOT_INO, PathBuf::from("/"));
        table.inos.write().insert(PathBuf::from("/"), ROOT_INO);
        table
    }

    /// Virtual path for an inode the kernel previously looked up.
    pub fn path_of(&self, ino: u64) -> Option<PathBuf> {
        self.paths.read().get(&ino).cloned()
    }

    /// Inode number for a virtual path, allocating one on first sight.
    pub fn ino_for(&self, path: &Path) -> u64 {
        if let Some(&ino) = self.inos.read().get(path) {
            return ino;
        }

        let mut inos = self.inos.write();
        // Re-check under the write lock; another thread may have won.
        if let Some(&ino) = inos.get(path) {
            return ino;
        }
        let ino = self.next_ino.fetch_add(1, Ordering::SeqCst);
        inos.insert(path.to_path_buf(), ino);
        self.paths.write().insert(ino, path.to_path_buf());
        ino
    }

    /// Virtual path of `name` inside the directory `parent` refers to.
    pub fn child_path(&self, parent: u64, name: &OsStr) -> Option<PathBuf> {
        self.path_of(parent).map(|p| p.join(name))
    }

    /// Drop the mapping for a removed path.
    pub fn forget_path(&self, path: &Path) {
        if let Some(ino) = self.inos.write().remove(path) {
            self.paths.write().remove(&ino);
        }
    }

    /// Rewrite every mapping at or under `old` to live under `new`.
    pub fn remap_prefix(&self, old: &Path, new: &Path) {
        let mut inos = self.inos.write();
        let mut paths = self.paths.write();

        let affected: Vec<(PathBuf, u64)> = inos
            .iter()
            .filter(|(p, _)| p.as_path() == old || p.starts_with(old))
            .map(|(p, &ino)| (p.clone(), ino))
            .collect();

        for (path, ino) in affected {
            let suffix = path.strip_prefix(old).unwrap_or(Path::new(""));
            let renamed = if suffix.as_os_str().is_empty() {
                new.to_path_buf()
            } else {
                new.join(suffix)
            };
            inos.remove(&path);
            inos.insert(renamed.clone(), ino);
            paths.insert(ino, renamed);
        }
    }
}

impl Default for InodeTable {
    fn default() -> Self {
        Self::new()
    }
}
