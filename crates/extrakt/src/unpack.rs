use std::cell::Cell;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

/// Counters from one unpack run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UnpackReport {
    /// Entries written to the destination.
    pub unpacked: u64,
    /// Entries refused because their path would leave the destination.
    pub skipped: u64,
}

/// Errors an [`Unpacker`] can report.
#[derive(Debug, thiserror::Error)]
pub enum UnpackError {
    /// The tar stream could not be read or parsed.
    #[error("failed to read tar stream: {0}")]
    Read(#[source] std::io::Error),

    /// Writing into the destination failed.
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Writes a plain tar byte stream into a destination directory.
///
/// Implementations create `dest` and any directory named by an entry,
/// write entries at their relative paths, and overwrite files that
/// already exist. Files in `dest` that the archive does not mention are
/// left alone.
pub trait Unpacker: Send + Sync {
    fn unpack(&self, archive: &mut dyn Read, dest: &Path) -> Result<UnpackReport, UnpackError>;
}

/// [`Unpacker`] backed by the `tar` crate.
///
/// Entry mtimes are always restored. Setuid, setgid and sticky bits are
/// dropped unless [`preserve_permissions`](Self::preserve_permissions) is set.
#[derive(Debug, Clone, Copy, Default)]
pub struct TarUnpacker {
    preserve_permissions: bool,
}

impl TarUnpacker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep the special permission bits recorded in the archive.
    pub fn preserve_permissions(mut self, preserve: bool) -> Self {
        self.preserve_permissions = preserve;
        self
    }
}

impl Unpacker for TarUnpacker {
    fn unpack(&self, archive: &mut dyn Read, dest: &Path) -> Result<UnpackReport, UnpackError> {
        std::fs::create_dir_all(dest).map_err(|source| UnpackError::Write {
            path: dest.to_path_buf(),
            source,
        })?;

        let ended = Cell::new(false);
        let mut archive = tar::Archive::new(EndTracked {
            inner: archive,
            ended: &ended,
        });
        archive.set_overwrite(true);
        archive.set_preserve_permissions(self.preserve_permissions);
        archive.set_preserve_mtime(true);

        let mut report = UnpackReport::default();

        for entry_result in archive.entries().map_err(UnpackError::Read)? {
            let mut entry = entry_result.map_err(UnpackError::Read)?;
            let entry_path = entry.path().map_err(UnpackError::Read)?.into_owned();

            match entry.unpack_in(dest) {
                Ok(true) => report.unpacked += 1,
                Ok(false) => {
                    tracing::warn!(
                        entry = %entry_path.display(),
                        "skipping entry outside of destination"
                    );
                    report.skipped += 1;
                }
                // A stream that ran dry mid-entry is a truncated archive.
                Err(source) if ended.get() => return Err(UnpackError::Read(source)),
                Err(source) => {
                    return Err(UnpackError::Write {
                        path: dest.join(&entry_path),
                        source,
                    });
                }
            }
        }

        Ok(report)
    }
}

/// Reader that notes when the wrapped stream reports end of input.
struct EndTracked<'a, R: ?Sized> {
    inner: &'a mut R,
    ended: &'a Cell<bool>,
}

impl<R: Read + ?Sized> Read for EndTracked<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        if n == 0 && !buf.is_empty() {
            self.ended.set(true);
        }
        Ok(n)
    }
}
