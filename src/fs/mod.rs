//! FUSE surface, path translation, and the crypto I/O bridge

mod bridge;
mod filesystem;
mod inode;
mod path;

pub use bridge::CryptoBridge;
pub use filesystem::{VeilFs, ENCRYPTED_XATTR};
pub use inode::{InodeTable, ROOT_INO};
pub use path::{PathTranslator, MAX_REAL_PATH};
