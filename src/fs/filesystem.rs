//! FUSE operation surface
//!
//! read/write/truncate/create run through the crypto bridge; every other
//! operation is a straight passthrough against the translated real path,
//! preserving the backing filesystem's error semantics.

use fuser::{
    FileAttr, FileType, Filesystem, ReplyAttr, ReplyCreate, ReplyData, ReplyDirectory, ReplyEmpty,
    ReplyEntry, ReplyOpen, ReplyStatfs, ReplyWrite, ReplyXattr, Request, TimeOrNow,
};
use nix::sys::stat::{self, Mode, SFlag, UtimensatFlags};
use nix::sys::statvfs;
use nix::sys::time::TimeSpec;
use nix::unistd::{self, AccessFlags, Gid, Uid};
use std::ffi::OsStr;
use std::fs::{self, File, OpenOptions};
use std::os::unix::fs::{
    DirBuilderExt, FileTypeExt, MetadataExt, OpenOptionsExt, PermissionsExt,
};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, error};

use crate::config::MountContext;
use crate::crypto::PassphraseCipher;
use crate::error::{io_errno, Error, Result};
use crate::fs::bridge::CryptoBridge;
use crate::fs::inode::{InodeTable, ROOT_INO};
use crate::fs::path::PathTranslator;

const TTL: Duration = Duration::from_secs(1);

/// Extended attribute reserved to mark encrypted backing files. Declared for
/// the on-disk layout; no operation consults it.
pub const ENCRYPTED_XATTR: &str = "user.veilfs.encrypted";

/// The mirror-encryption filesystem.
pub struct VeilFs {
    context: MountContext,
    translator: PathTranslator,
    bridge: CryptoBridge,
    inodes: InodeTable,
}

impl VeilFs {
    pub fn new(context: MountContext, cipher: PassphraseCipher) -> Self {
        let translator = PathTranslator::new(context.mirror_root().to_path_buf());
        Self {
            context,
            translator,
            bridge: CryptoBridge::new(cipher),
            inodes: InodeTable::new(),
        }
    }

    pub fn context(&self) -> &MountContext {
        &self.context
    }

    /// Virtual and real path for an inode the kernel already holds.
    fn resolve(&self, ino: u64) -> Result<(PathBuf, PathBuf)> {
        let vpath = self
            .inodes
            .path_of(ino)
            .ok_or_else(|| Error::NotFound(PathBuf::from(format!("inode {}", ino))))?;
        let real = self.translator.translate(&vpath)?;
        Ok((vpath, real))
    }

    /// Virtual and real path for `name` under the directory `parent`.
    fn resolve_child(&self, parent: u64, name: &OsStr) -> Result<(PathBuf, PathBuf)> {
        let vpath = self
            .inodes
            .child_path(parent, name)
            .ok_or_else(|| Error::NotFound(PathBuf::from(format!("inode {}", parent))))?;
        let real = self.translator.translate(&vpath)?;
        Ok((vpath, real))
    }

    /// Register `vpath` and build the entry attributes from the backing file.
    fn entry_attr(&self, vpath: &Path, real: &Path) -> Result<FileAttr> {
        let meta = fs::symlink_metadata(real)?;
        let ino = self.inodes.ino_for(vpath);
        Ok(attr_from_metadata(ino, &meta))
    }
}

fn kind_of(ft: fs::FileType) -> FileType {
    if ft.is_dir() {
        FileType::Directory
    } else if ft.is_symlink() {
        FileType::Symlink
    } else if ft.is_block_device() {
        FileType::BlockDevice
    } else if ft.is_char_device() {
        FileType::CharDevice
    } else if ft.is_fifo() {
        FileType::NamedPipe
    } else if ft.is_socket() {
        FileType::Socket
    } else {
        FileType::RegularFile
    }
}

/// Kernel-facing attributes straight from the backing file. Sizes reflect the
/// ciphertext on disk, matching the passthrough contract for attribute
/// queries.
fn attr_from_metadata(ino: u64, meta: &fs::Metadata) -> FileAttr {
    FileAttr {
        ino,
        size: meta.len(),
        blocks: meta.blocks(),
        atime: meta.accessed().unwrap_or(UNIX_EPOCH),
        mtime: meta.modified().unwrap_or(UNIX_EPOCH),
        ctime: UNIX_EPOCH + Duration::new(meta.ctime().max(0) as u64, meta.ctime_nsec() as u32),
        crtime: meta.created().unwrap_or(UNIX_EPOCH),
        kind: kind_of(meta.file_type()),
        perm: (meta.mode() & 0o7777) as u16,
        nlink: meta.nlink() as u32,
        uid: meta.uid(),
        gid: meta.gid(),
        rdev: meta.rdev() as u32,
        blksize: meta.blksize() as u32,
        flags: 0,
    }
}

fn timespec_of(t: Option<TimeOrNow>) -> TimeSpec {
    match t {
        None => TimeSpec::new(0, libc::UTIME_OMIT),
        Some(TimeOrNow::Now) => TimeSpec::new(0, libc::UTIME_NOW),
        Some(TimeOrNow::SpecificTime(st)) => {
            let d = st.duration_since(UNIX_EPOCH).unwrap_or_default();
            TimeSpec::new(d.as_secs() as i64, d.subsec_nanos() as i64)
        }
    }
}

impl Filesystem for VeilFs {
    fn lookup(&mut self, _req: &Request, parent: u64, name: &OsStr, reply: ReplyEntry) {
        debug!("lookup(parent={}, name={:?})", parent, name);

        let (vpath, real) = match self.resolve_child(parent, name) {
            Ok(p) => p,
            Err(e) => return reply.error(e.errno()),
        };
        match self.entry_attr(&vpath, &real) {
            Ok(attr) => reply.entry(&TTL, &attr, 0),
            Err(e) => reply.error(e.errno()),
        }
    }

    fn getattr(&mut self, _req: &Request, ino: u64, reply: ReplyAttr) {
        debug!("getattr(ino={})", ino);

        let result = self
            .resolve(ino)
            .and_then(|(_, real)| Ok(attr_from_metadata(ino, &fs::symlink_metadata(real)?)));
        match result {
            Ok(attr) => reply.attr(&TTL, &attr),
            Err(e) => reply.error(e.errno()),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn setattr(
        &mut self,
        _req: &Request,
        ino: u64,
        mode: Option<u32>,
        uid: Option<u32>,
        gid: Option<u32>,
        size: Option<u64>,
        atime: Option<TimeOrNow>,
        mtime: Option<TimeOrNow>,
        _ctime: Option<SystemTime>,
        _fh: Option<u64>,
        _crtime: Option<SystemTime>,
        _chgtime: Option<SystemTime>,
        _bkuptime: Option<SystemTime>,
        _flags: Option<u32>,
        reply: ReplyAttr,
    ) {
        debug!(
            "setattr(ino={}, mode={:?}, uid={:?}, gid={:?}, size={:?})",
            ino, mode, uid, gid, size
        );

        let real = match self.resolve(ino) {
            Ok((_, real)) => real,
            Err(e) => return reply.error(e.errno()),
        };

        if let Some(mode) = mode {
            if let Err(e) = fs::set_permissions(&real, fs::Permissions::from_mode(mode)) {
                return reply.error(io_errno(&e));
            }
        }

        if uid.is_some() || gid.is_some() {
            let res = unistd::chown(&real, uid.map(Uid::from_raw), gid.map(Gid::from_raw));
            if let Err(e) = res {
                return reply.error(e as i32);
            }
        }

        if let Some(size) = size {
            // Truncation addresses the plaintext, so it rides the crypto
            // bridge rather than passing through.
            if let Err(e) = self.bridge.set_len(&real, size) {
                error!("truncate({:?}) failed: {}", real, e);
                return reply.error(e.errno());
            }
        }

        if atime.is_some() || mtime.is_some() {
            let res = stat::utimensat(
                None,
                &real,
                &timespec_of(atime),
                &timespec_of(mtime),
                UtimensatFlags::FollowSymlink,
            );
            if let Err(e) = res {
                return reply.error(e as i32);
            }
        }

        match fs::symlink_metadata(&real) {
            Ok(meta) => reply.attr(&TTL, &attr_from_metadata(ino, &meta)),
            Err(e) => reply.error(io_errno(&e)),
        }
    }

    fn readlink(&mut self, _req: &Request, ino: u64, reply: ReplyData) {
        debug!("readlink(ino={})", ino);

        let result = self
            .resolve(ino)
            .and_then(|(_, real)| fs::read_link(real).map_err(Error::from));
        match result {
            Ok(target) => reply.data(target.as_os_str().as_encoded_bytes()),
            Err(e) => reply.error(e.errno()),
        }
    }

    fn mknod(
        &mut self,
        _req: &Request,
        parent: u64,
        name: &OsStr,
        mode: u32,
        _umask: u32,
        rdev: u32,
        reply: ReplyEntry,
    ) {
        debug!("mknod(parent={}, name={:?}, mode={:o})", parent, name, mode);

        let (vpath, real) = match self.resolve_child(parent, name) {
            Ok(p) => p,
            Err(e) => return reply.error(e.errno()),
        };

        let perm = Mode::from_bits_truncate(mode & 0o7777);
        let result: Result<()> = match mode & libc::S_IFMT {
            libc::S_IFREG | 0 => OpenOptions::new()
                .write(true)
                .create_new(true)
                .mode(mode & 0o7777)
                .open(&real)
                .map(|_| ())
                .map_err(Error::from),
            libc::S_IFIFO => unistd::mkfifo(&real, perm).map_err(Error::from),
            _ => stat::mknod(
                &real,
                SFlag::from_bits_truncate(mode & libc::S_IFMT),
                perm,
                rdev as libc::dev_t,
            )
            .map_err(Error::from),
        };

        match result.and_then(|_| self.entry_attr(&vpath, &real)) {
            Ok(attr) => reply.entry(&TTL, &attr, 0),
            Err(e) => reply.error(e.errno()),
        }
    }

    fn mkdir(
        &mut self,
        _req: &Request,
        parent: u64,
        name: &OsStr,
        mode: u32,
        _umask: u32,
        reply: ReplyEntry,
    ) {
        debug!("mkdir(parent={}, name={:?}, mode={:o})", parent, name, mode);

        let (vpath, real) = match self.resolve_child(parent, name) {
            Ok(p) => p,
            Err(e) => return reply.error(e.errno()),
        };

        let result = fs::DirBuilder::new()
            .mode(mode & 0o7777)
            .create(&real)
            .map_err(Error::from)
            .and_then(|_| self.entry_attr(&vpath, &real));
        match result {
            Ok(attr) => reply.entry(&TTL, &attr, 0),
            Err(e) => reply.error(e.errno()),
        }
    }

    fn unlink(&mut self, _req: &Request, parent: u64, name: &OsStr, reply: ReplyEmpty) {
        debug!("unlink(parent={}, name={:?})", parent, name);

        let (vpath, real) = match self.resolve_child(parent, name) {
            Ok(p) => p,
            Err(e) => return reply.error(e.errno()),
        };
        match fs::remove_file(&real) {
            Ok(()) => {
                self.inodes.forget_path(&vpath);
                self.bridge.forget(&real);
                reply.ok();
            }
            Err(e) => reply.error(io_errno(&e)),
        }
    }

    fn rmdir(&mut self, _req: &Request, parent: u64, name: &OsStr, reply: ReplyEmpty) {
        debug!("rmdir(parent={}, name={:?})", parent, name);

        let (vpath, real) = match self.resolve_child(parent, name) {
            Ok(p) => p,
            Err(e) => return reply.error(e.errno()),
        };
        match fs::remove_dir(&real) {
            Ok(()) => {
                self.inodes.forget_path(&vpath);
                reply.ok();
            }
            Err(e) => reply.error(io_errno(&e)),
        }
    }

    fn symlink(
        &mut self,
        _req: &Request,
        parent: u64,
        link_name: &OsStr,
        target: &Path,
        reply: ReplyEntry,
    ) {
        debug!("symlink(parent={}, name={:?} -> {:?})", parent, link_name, target);

        let (vpath, real) = match self.resolve_child(parent, link_name) {
            Ok(p) => p,
            Err(e) => return reply.error(e.errno()),
        };

        // The link target is stored verbatim; it is never translated.
        let result = std::os::unix::fs::symlink(target, &real)
            .map_err(Error::from)
            .and_then(|_| self.entry_attr(&vpath, &real));
        match result {
            Ok(attr) => reply.entry(&TTL, &attr, 0),
            Err(e) => reply.error(e.errno()),
        }
    }

    fn rename(
        &mut self,
        _req: &Request,
        parent: u64,
        name: &OsStr,
        newparent: u64,
        newname: &OsStr,
        _flags: u32,
        reply: ReplyEmpty,
    ) {
        debug!(
            "rename({}/{:?} -> {}/{:?})",
            parent, name, newparent, newname
        );

        let (old_vpath, old_real) = match self.resolve_child(parent, name) {
            Ok(p) => p,
            Err(e) => return reply.error(e.errno()),
        };
        let (new_vpath, new_real) = match self.resolve_child(newparent, newname) {
            Ok(p) => p,
            Err(e) => return reply.error(e.errno()),
        };

        match fs::rename(&old_real, &new_real) {
            Ok(()) => {
                self.inodes.forget_path(&new_vpath);
                self.inodes.remap_prefix(&old_vpath, &new_vpath);
                self.bridge.forget(&old_real);
                self.bridge.forget(&new_real);
                reply.ok();
            }
            Err(e) => reply.error(io_errno(&e)),
        }
    }

    fn link(
        &mut self,
        _req: &Request,
        ino: u64,
        newparent: u64,
        newname: &OsStr,
        reply: ReplyEntry,
    ) {
        debug!("link(ino={} -> {}/{:?})", ino, newparent, newname);

        let source_real = match self.resolve(ino) {
            Ok((_, real)) => real,
            Err(e) => return reply.error(e.errno()),
        };
        let (vpath, real) = match self.resolve_child(newparent, newname) {
            Ok(p) => p,
            Err(e) => return reply.error(e.errno()),
        };

        let result = fs::hard_link(&source_real, &real)
            .map_err(Error::from)
            .and_then(|_| self.entry_attr(&vpath, &real));
        match result {
            Ok(attr) => reply.entry(&TTL, &attr, 0),
            Err(e) => reply.error(e.errno()),
        }
    }

    fn open(&mut self, _req: &Request, ino: u64, flags: i32, reply: ReplyOpen) {
        debug!("open(ino={}, flags={:#x})", ino, flags);

        let real = match self.resolve(ino) {
            Ok((_, real)) => real,
            Err(e) => return reply.error(e.errno()),
        };

        // Probe with the caller's access mode and close again; no handle is
        // retained between calls.
        let accmode = flags & libc::O_ACCMODE;
        let result = OpenOptions::new()
            .read(accmode == libc::O_RDONLY || accmode == libc::O_RDWR)
            .write(accmode == libc::O_WRONLY || accmode == libc::O_RDWR)
            .open(&real);
        match result {
            Ok(_) => reply.opened(0, 0),
            Err(e) => reply.error(io_errno(&e)),
        }
    }

    fn read(
        &mut self,
        _req: &Request,
        ino: u64,
        _fh: u64,
        offset: i64,
        size: u32,
        _flags: i32,
        _lock_owner: Option<u64>,
        reply: ReplyData,
    ) {
        debug!("read(ino={}, offset={}, size={})", ino, offset, size);

        if offset < 0 {
            return reply.error(libc::EINVAL);
        }
        let real = match self.resolve(ino) {
            Ok((_, real)) => real,
            Err(e) => return reply.error(e.errno()),
        };
        match self.bridge.read_range(&real, offset as u64, size) {
            Ok(data) => reply.data(&data),
            Err(e) => {
                error!("read({:?}) failed: {}", real, e);
                reply.error(e.errno());
            }
        }
    }

    fn write(
        &mut self,
        _req: &Request,
        ino: u64,
        _fh: u64,
        offset: i64,
        data: &[u8],
        _write_flags: u32,
        _flags: i32,
        _lock_owner: Option<u64>,
        reply: ReplyWrite,
    ) {
        debug!("write(ino={}, offset={}, len={})", ino, offset, data.len());

        if offset < 0 {
            return reply.error(libc::EINVAL);
        }
        let real = match self.resolve(ino) {
            Ok((_, real)) => real,
            Err(e) => return reply.error(e.errno()),
        };
        match self.bridge.write_range(&real, offset as u64, data) {
            Ok(written) => reply.written(written),
            Err(e) => {
                error!("write({:?}) failed: {}", real, e);
                reply.error(e.errno());
            }
        }
    }

    fn release(
        &mut self,
        _req: &Request,
        _ino: u64,
        _fh: u64,
        _flags: i32,
        _lock_owner: Option<u64>,
        _flush: bool,
        reply: ReplyEmpty,
    ) {
        // Stateless: nothing was kept open on behalf of the caller.
        reply.ok();
    }

    fn fsync(&mut self, _req: &Request, ino: u64, _fh: u64, datasync: bool, reply: ReplyEmpty) {
        debug!("fsync(ino={}, datasync={})", ino, datasync);

        let real = match self.resolve(ino) {
            Ok((_, real)) => real,
            Err(e) => return reply.error(e.errno()),
        };
        let result = File::open(&real).and_then(|f| {
            if datasync {
                f.sync_data()
            } else {
                f.sync_all()
            }
        });
        match result {
            Ok(()) => reply.ok(),
            Err(e) => reply.error(io_errno(&e)),
        }
    }

    fn readdir(
        &mut self,
        _req: &Request,
        ino: u64,
        _fh: u64,
        offset: i64,
        mut reply: ReplyDirectory,
    ) {
        debug!("readdir(ino={}, offset={})", ino, offset);

        let (vdir, real) = match self.resolve(ino) {
            Ok(p) => p,
            Err(e) => return reply.error(e.errno()),
        };

        let parent_ino = vdir
            .parent()
            .map(|p| self.inodes.ino_for(p))
            .unwrap_or(ROOT_INO);

        let mut entries: Vec<(u64, FileType, std::ffi::OsString)> = vec![
            (ino, FileType::Directory, ".".into()),
            (parent_ino, FileType::Directory, "..".into()),
        ];

        let dir = match fs::read_dir(&real) {
            Ok(d) => d,
            Err(e) => return reply.error(io_errno(&e)),
        };
        for entry in dir {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => return reply.error(io_errno(&e)),
            };
            let kind = entry.file_type().map(kind_of).unwrap_or(FileType::RegularFile);
            let child_ino = self.inodes.ino_for(&vdir.join(entry.file_name()));
            entries.push((child_ino, kind, entry.file_name()));
        }

        for (i, (child_ino, kind, name)) in entries.iter().enumerate().skip(offset as usize) {
            if reply.add(*child_ino, (i + 1) as i64, *kind, name) {
                break;
            }
        }
        reply.ok();
    }

    fn statfs(&mut self, _req: &Request, ino: u64, reply: ReplyStatfs) {
        debug!("statfs(ino={})", ino);

        let real = match self.resolve(ino) {
            Ok((_, real)) => real,
            Err(e) => return reply.error(e.errno()),
        };
        match statvfs::statvfs(&real) {
            Ok(st) => reply.statfs(
                st.blocks(),
                st.blocks_free(),
                st.blocks_available(),
                st.files(),
                st.files_free(),
                st.block_size() as u32,
                st.name_max() as u32,
                st.fragment_size() as u32,
            ),
            Err(e) => reply.error(e as i32),
        }
    }

    fn create(
        &mut self,
        _req: &Request,
        parent: u64,
        name: &OsStr,
        mode: u32,
        _umask: u32,
        _flags: i32,
        reply: ReplyCreate,
    ) {
        debug!("create(parent={}, name={:?}, mode={:o})", parent, name, mode);

        let (vpath, real) = match self.resolve_child(parent, name) {
            Ok(p) => p,
            Err(e) => return reply.error(e.errno()),
        };

        let result = self
            .bridge
            .create(&real, mode & 0o7777)
            .and_then(|_| self.entry_attr(&vpath, &real));
        match result {
            Ok(attr) => reply.created(&TTL, &attr, 0, 0, 0),
            Err(e) => reply.error(e.errno()),
        }
    }

    fn access(&mut self, _req: &Request, ino: u64, mask: i32, reply: ReplyEmpty) {
        debug!("access(ino={}, mask={:#o})", ino, mask);

        let real = match self.resolve(ino) {
            Ok((_, real)) => real,
            Err(e) => return reply.error(e.errno()),
        };
        match unistd::access(&real, AccessFlags::from_bits_truncate(mask)) {
            Ok(()) => reply.ok(),
            Err(e) => reply.error(e as i32),
        }
    }

    fn setxattr(
        &mut self,
        _req: &Request,
        ino: u64,
        name: &OsStr,
        value: &[u8],
        _flags: i32,
        _position: u32,
        reply: ReplyEmpty,
    ) {
        debug!("setxattr(ino={}, name={:?})", ino, name);

        let real = match self.resolve(ino) {
            Ok((_, real)) => real,
            Err(e) => return reply.error(e.errno()),
        };
        match xattr::set(&real, name, value) {
            Ok(()) => reply.ok(),
            Err(e) => reply.error(io_errno(&e)),
        }
    }

    fn getxattr(&mut self, _req: &Request, ino: u64, name: &OsStr, size: u32, reply: ReplyXattr) {
        debug!("getxattr(ino={}, name={:?}, size={})", ino, name, size);

        let real = match self.resolve(ino) {
            Ok((_, real)) => real,
            Err(e) => return reply.error(e.errno()),
        };
        match xattr::get(&real, name) {
            Ok(Some(value)) => {
                if size == 0 {
                    reply.size(value.len() as u32);
                } else if size as usize >= value.len() {
                    reply.data(&value);
                } else {
                    reply.error(libc::ERANGE);
                }
            }
            Ok(None) => reply.error(libc::ENODATA),
            Err(e) => reply.error(io_errno(&e)),
        }
    }

    fn listxattr(&mut self, _req: &Request, ino: u64, size: u32, reply: ReplyXattr) {
        debug!("listxattr(ino={}, size={})", ino, size);

        let real = match self.resolve(ino) {
            Ok((_, real)) => real,
            Err(e) => return reply.error(e.errno()),
        };
        match xattr::list(&real) {
            Ok(names) => {
                let mut data = Vec::new();
                for name in names {
                    data.extend_from_slice(name.as_encoded_bytes());
                    data.push(0);
                }
                if size == 0 {
                    reply.size(data.len() as u32);
                } else if size as usize >= data.len() {
                    reply.data(&data);
                } else {
                    reply.error(libc::ERANGE);
                }
            }
            Err(e) => reply.error(io_errno(&e)),
        }
    }

    fn removexattr(&mut self, _req: &Request, ino: u64, name: &OsStr, reply: ReplyEmpty) {
        debug!("removexattr(ino={}, name={:?})", ino, name);

        let real = match self.resolve(ino) {
            Ok((_, real)) => real,
            Err(e) => return reply.error(e.errno()),
        };
        match xattr::remove(&real, name) {
            Ok(()) => reply.ok(),
            Err(e) => reply.error(io_errno(&e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_attr_from_metadata_regular_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("f");
        fs::write(&path, b"12345").unwrap();

        let meta = fs::symlink_metadata(&path).unwrap();
        let attr = attr_from_metadata(42, &meta);

        assert_eq!(attr.ino, 42);
        assert_eq!(attr.size, 5);
        assert_eq!(attr.kind, FileType::RegularFile);
        assert_eq!(attr.uid, meta.uid());
        assert_eq!(attr.perm, (meta.mode() & 0o7777) as u16);
    }

    #[test]
    fn test_attr_from_metadata_directory() {
        let dir = tempdir().unwrap();
        let meta = fs::symlink_metadata(dir.path()).unwrap();
        assert_eq!(attr_from_metadata(1, &meta).kind, FileType::Directory);
    }

    #[test]
    fn test_kind_of_symlink() {
        let dir = tempdir().unwrap();
        let link = dir.path().join("l");
        std::os::unix::fs::symlink("/nowhere", &link).unwrap();

        let meta = fs::symlink_metadata(&link).unwrap();
        assert_eq!(kind_of(meta.file_type()), FileType::Symlink);
    }

    #[test]
    fn test_timespec_of_omit_and_now() {
        assert_eq!(timespec_of(None).tv_nsec(), libc::UTIME_OMIT);
        assert_eq!(
            timespec_of(Some(TimeOrNow::Now)).tv_nsec(),
            libc::UTIME_NOW
        );

        let at = UNIX_EPOCH + Duration::new(1_000, 42);
        let ts = timespec_of(Some(TimeOrNow::SpecificTime(at)));
        assert_eq!(ts.tv_sec(), 1_000);
        assert_eq!(ts.tv_nsec(), 42);
    }
}
