//! Atomic write-back shared by file and raw sources.
//!
//! Content is written to a temporary file in the target's directory, synced,
//! given the requested permission bits and then renamed over the target. The
//! rename is atomic on the same filesystem, so readers observe either the old
//! file or the complete new one. Concurrent writers are not coordinated: the
//! last rename wins.

use std::ffi::OsString;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

/// Mask selecting the owner, group and other read/write/execute bits.
pub const PERMISSION_MASK: u32 = 0o777;

/// Mode requested for new files written without an explicit mode, before the
/// umask is applied.
#[cfg(unix)]
const NEW_FILE_MODE: u32 = 0o666;

/// Strip everything but the permission bits from `mode`.
///
/// # Examples
///
/// ```rust
/// use tiered_config::permission_bits;
///
/// assert_eq!(permission_bits(0o100_600), 0o600);
/// assert_eq!(permission_bits(0o4755), 0o755);
/// ```
#[must_use]
pub const fn permission_bits(mode: u32) -> u32 {
    mode & PERMISSION_MASK
}

/// Atomically replace `path` with `contents`.
///
/// When `mode` is given its permission bits are applied to the temporary file
/// before the rename and to the final path afterwards, since some filesystems
/// do not carry the mode across a rename. Higher-order bits are ignored.
///
/// # Errors
///
/// Returns the first I/O error encountered. The target is never left
/// partially written; it either keeps its previous content or holds all of
/// `contents`.
pub fn write_atomic(path: &Path, contents: &[u8], mode: Option<u32>) -> io::Result<()> {
    write_atomic_with(path, mode, |file| file.write_all(contents))
}

/// Atomically replace `path` with whatever `fill` writes into the temporary
/// file.
///
/// If `fill` fails the temporary file is discarded and the target is left
/// untouched.
pub(crate) fn write_atomic_with<F>(path: &Path, mode: Option<u32>, fill: F) -> io::Result<()>
where
    F: FnOnce(&mut File) -> io::Result<()>,
{
    let dir = parent_or_dot(path);
    let prefix = temp_prefix(path);
    let mut builder = tempfile::Builder::new();
    builder.prefix(&prefix).suffix(".tmp");
    if mode.is_none() {
        request_new_file_mode(&mut builder);
    }
    let mut tmp = builder.tempfile_in(dir)?;
    fill(tmp.as_file_mut())?;
    tmp.as_file_mut().flush()?;
    tmp.as_file().sync_all()?;
    match mode {
        Some(bits) => apply_mode(tmp.path(), bits)?,
        None => keep_existing_permissions(path, tmp.path())?,
    }
    tmp.persist(path).map_err(|err| err.error)?;
    if let Some(bits) = mode {
        apply_mode(path, bits)?;
    }
    tracing::debug!(path = %path.display(), "atomically replaced file");
    Ok(())
}

/// Return the parent directory of `path`, falling back to `"."` when the path
/// has no parent or the parent is empty.
fn parent_or_dot(path: &Path) -> &Path {
    path.parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
}

/// Open the temporary file like a regular new file, so the process umask
/// decides its permissions instead of the private default of `tempfile`.
#[cfg(unix)]
fn request_new_file_mode(builder: &mut tempfile::Builder<'_, '_>) {
    use std::os::unix::fs::PermissionsExt;

    builder.permissions(std::fs::Permissions::from_mode(NEW_FILE_MODE));
}

#[cfg(not(unix))]
const fn request_new_file_mode(_builder: &mut tempfile::Builder<'_, '_>) {}

/// Give `tmp` the permissions of the file it is about to replace, if any.
fn keep_existing_permissions(target: &Path, tmp: &Path) -> io::Result<()> {
    match std::fs::metadata(target) {
        Ok(meta) => std::fs::set_permissions(tmp, meta.permissions()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err),
    }
}

fn temp_prefix(path: &Path) -> OsString {
    let mut prefix = OsString::from(".");
    if let Some(name) = path.file_name() {
        prefix.push(name);
    }
    prefix.push(".");
    prefix
}

/// Set the permission bits of `path` to `permission_bits(mode)`.
///
/// # Errors
///
/// Propagates the failure of the underlying `chmod`.
#[cfg(unix)]
pub fn apply_mode(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    std::fs::set_permissions(path, std::fs::Permissions::from_mode(permission_bits(mode)))
}

/// Permission bits are not applied on this platform.
///
/// # Errors
///
/// Never fails.
#[cfg(not(unix))]
pub const fn apply_mode(_path: &Path, _mode: u32) -> io::Result<()> {
    Ok(())
}
