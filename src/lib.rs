//! veilfs - Transparent encryption mirror filesystem
//!
//! Mirrors an existing directory tree under a FUSE mount point. File content
//! is encrypted on disk and decrypted on the way through; metadata and
//! directory operations pass straight through to the backing store.

pub mod config;
pub mod crypto;
pub mod error;
pub mod fs;

pub use config::MountContext;
pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::MountContext;
    pub use crate::crypto::{ContentTransform, PassphraseCipher};
    pub use crate::error::{Error, Result};
    pub use crate::fs::VeilFs;
}
