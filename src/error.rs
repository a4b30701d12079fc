//! Error types for veilfs

use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("path not found: {0}")]
    NotFound(PathBuf),

    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    #[error("already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("is a directory: {0}")]
    IsADirectory(PathBuf),

    #[error("translated path is {0} bytes, limit is {1}")]
    NameTooLong(usize, usize),

    #[error("no space left on backing store")]
    NoSpace,

    #[error("content transform failed: {0}")]
    Transform(String),

    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("mount error: {0}")]
    Mount(String),
}

impl Error {
    /// The errno reported for this error at the FUSE boundary.
    pub fn errno(&self) -> i32 {
        match self {
            Error::Io(e) => io_errno(e),
            Error::NotFound(_) => libc::ENOENT,
            Error::PermissionDenied(_) => libc::EACCES,
            Error::AlreadyExists(_) => libc::EEXIST,
            Error::NotADirectory(_) => libc::ENOTDIR,
            Error::IsADirectory(_) => libc::EISDIR,
            Error::NameTooLong(..) => libc::ENAMETOOLONG,
            Error::NoSpace => libc::ENOSPC,
            Error::Transform(_) => libc::EIO,
            Error::KeyDerivation(_) => libc::EIO,
            Error::InvalidArgument(_) => libc::EINVAL,
            Error::Mount(_) => libc::EIO,
        }
    }
}

/// Errno for a raw I/O error, preserving the OS error code when present.
pub fn io_errno(e: &io::Error) -> i32 {
    e.raw_os_error().unwrap_or(match e.kind() {
        io::ErrorKind::NotFound => libc::ENOENT,
        io::ErrorKind::PermissionDenied => libc::EACCES,
        io::ErrorKind::AlreadyExists => libc::EEXIST,
        io::ErrorKind::InvalidInput => libc::EINVAL,
        _ => libc::EIO,
    })
}

impl From<nix::Error> for Error {
    fn from(e: nix::Error) -> Self {
        Error::Io(io::Error::from_raw_os_error(e as i32))
    }
}
