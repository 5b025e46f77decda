// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Read-only [sysfs] helpers.
//!
//! The inventory never writes to sysfs.
//! It only needs to know where sysfs is mounted and to follow the symlinks the kernel publishes there
//! (e.g. `bus/pci/devices/<address>/driver`).
//!
//! [sysfs]: https://www.kernel.org/doc/Documentation/filesystems/sysfs.txt

#![deny(clippy::pedantic, clippy::unwrap_used)]

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use tracing::{debug, info, warn};

/// Errors which might occur when accessing sysfs directories
#[derive(Debug, thiserror::Error)]
pub enum SysfsErr {
    /// No sysfs filesystem is mounted on this host.
    #[error("sysfs is not mounted")]
    NotMounted,
    /// The path is not under a mounted sysfs and therefore does not qualify as a [`SysfsPath`].
    #[error("path {0:?} is not under sysfs")]
    PathNotUnderSysfs(PathBuf),
    /// Some [`std::io::Error`] error occurred
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    /// Invalid UTF-8 in a path under sysfs.
    ///
    /// The kernel just uses ascii byte strings for sysfs, so you should never see this
    /// error under healthy conditions.
    /// The offending bytes are deliberately not carried in the error.
    #[error("path under sysfs is not a valid UTF-8 string")]
    SysfsPathIsNotValidUtf8,
}

/// Locate the mounted sysfs.
///
/// The mount table is only consulted once per process.
///
/// # Errors
///
/// [`SysfsErr::NotMounted`] if `/proc/mounts` could not be read or lists no sysfs mount.
pub fn sysfs_root() -> Result<&'static SysfsPath, SysfsErr> {
    static SYSFS: LazyLock<Option<SysfsPath>> = LazyLock::new(|| {
        let mounts = match procfs::mounts() {
            Ok(mounts) => mounts,
            Err(err) => {
                warn!("unable to read mount table: {err}");
                return None;
            }
        };
        let mut sysfs_mounts = mounts
            .into_iter()
            .filter(|mount| mount.fs_vfstype == "sysfs");
        let first = sysfs_mounts.next()?;
        if let Some(other) = sysfs_mounts.next() {
            warn!(
                "sysfs is mounted at more than one location ({} and {}); using the first",
                first.fs_file, other.fs_file
            );
        }
        match SysfsPath::new(&first.fs_file) {
            Ok(root) => {
                info!("found sysfs filesystem at {root}");
                Some(root)
            }
            Err(err) => {
                warn!("sysfs mount point {} rejected: {err}", first.fs_file);
                None
            }
        }
    });
    SYSFS.as_ref().ok_or(SysfsErr::NotMounted)
}

/// Path which is promised to
///
/// 1. exist under a mounted sysfs at the time of creation,
/// 2. be both absolute and canonical,
/// 3. be safely represented as a valid UTF-8 string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SysfsPath(PathBuf);

impl SysfsPath {
    /// Create a new `SysfsPath` from a path.
    ///
    /// The path is canonicalized prior to any other checks, so passing paths to symlinks here
    /// is fine (sysfs uses a lot of symlinks).
    ///
    /// # Errors
    ///
    /// - If the canonicalized path is not under sysfs, an error is returned.
    /// - If the path is not a valid UTF-8 string, an error is returned.
    /// - io errors (such as permission denied) can also occur
    pub fn new(path: impl AsRef<Path>) -> Result<SysfsPath, SysfsErr> {
        let path = std::fs::canonicalize(path.as_ref())?;
        if path.to_str().is_none() {
            return Err(SysfsErr::SysfsPathIsNotValidUtf8);
        }
        match nix::sys::statfs::statfs(&path) {
            Ok(stats) if stats.filesystem_type() == nix::sys::statfs::SYSFS_MAGIC => {
                Ok(SysfsPath(path))
            }
            Ok(_) => Err(SysfsErr::PathNotUnderSysfs(path)),
            Err(errno) => Err(SysfsErr::IoError(errno.into())),
        }
    }

    /// Get an immutable reference to the inner [`PathBuf`].
    #[must_use]
    pub fn inner(&self) -> &PathBuf {
        &self.0
    }
}

impl AsRef<Path> for SysfsPath {
    fn as_ref(&self) -> &Path {
        self.inner()
    }
}

impl std::fmt::Display for SysfsPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// Read the symlink at `path` and return the base name of its target.
///
/// A link which does not exist is not an error: sysfs only publishes some links (e.g. `driver`)
/// while the relationship they describe holds.
///
/// # Errors
///
/// - [`SysfsErr::IoError`] if `path` exists but cannot be read as a symlink.
/// - [`SysfsErr::SysfsPathIsNotValidUtf8`] if the target's base name is not valid UTF-8.
pub fn link_name(path: impl AsRef<Path>) -> Result<Option<String>, SysfsErr> {
    let path = path.as_ref();
    let target = match std::fs::read_link(path) {
        Ok(target) => target,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            debug!("no link at {}", path.display());
            return Ok(None);
        }
        Err(err) => return Err(SysfsErr::IoError(err)),
    };
    match target.file_name() {
        Some(name) => match name.to_str() {
            Some(name) => Ok(Some(name.to_string())),
            None => Err(SysfsErr::SysfsPathIsNotValidUtf8),
        },
        None => {
            debug!("link {} has no base name ({})", path.display(), target.display());
            Ok(None)
        }
    }
}
