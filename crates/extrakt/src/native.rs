//! In-process extraction: read, decompress if needed, unpack.
//!
//! The pipeline streams through fixed-size buffers on a blocking worker
//! thread. Reads from the archive file are watched so that a failure can be
//! attributed to the stage that produced it, rather than to whichever stage
//! happened to observe it.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::decompress::Decompressed;
use crate::error::ExtractError;
use crate::unpack::{UnpackError, Unpacker};

pub(crate) async fn run(
    unpacker: Arc<dyn Unpacker>,
    archive: &Path,
    dest: &Path,
) -> Result<(), ExtractError> {
    let archive = archive.to_path_buf();
    let dest = dest.to_path_buf();

    tokio::task::spawn_blocking(move || extract_blocking(unpacker.as_ref(), &archive, &dest))
        .await
        .map_err(|e| ExtractError::Interrupted(e.to_string()))?
}

fn extract_blocking(
    unpacker: &dyn Unpacker,
    archive: &Path,
    dest: &Path,
) -> Result<(), ExtractError> {
    let source_read = |source| ExtractError::SourceRead {
        path: archive.to_path_buf(),
        source,
    };

    let file = File::open(archive).map_err(source_read)?;
    let watched = Watched::new(file);
    let source_failed = watched.flag();

    let mut stream = match Decompressed::new(watched) {
        Ok(stream) => stream,
        Err(source) if source_failed.load(Ordering::Relaxed) => return Err(source_read(source)),
        Err(source) => {
            return Err(ExtractError::Decompress {
                path: archive.to_path_buf(),
                source,
            });
        }
    };

    if stream.is_compressed() {
        tracing::debug!(archive = %archive.display(), layers = ?stream.layers(), "decompressing archive");
    }

    match unpacker.unpack(&mut stream, dest) {
        Ok(report) => {
            tracing::debug!(
                dest = %dest.display(),
                unpacked = report.unpacked,
                skipped = report.skipped,
                "native extraction finished"
            );
            Ok(())
        }
        Err(e) => Err(classify(e, archive, source_failed.load(Ordering::Relaxed), &stream)),
    }
}

/// Attribute an unpack failure to the earliest stage that failed.
fn classify(
    error: UnpackError,
    archive: &Path,
    source_failed: bool,
    stream: &Decompressed,
) -> ExtractError {
    let path = archive.to_path_buf();
    match error {
        UnpackError::Read(source) | UnpackError::Write { source, .. } if source_failed => {
            ExtractError::SourceRead { path, source }
        }
        UnpackError::Read(source) | UnpackError::Write { source, .. }
            if stream.has_failed() && stream.is_compressed() =>
        {
            ExtractError::Decompress { path, source }
        }
        UnpackError::Read(source) => ExtractError::Corrupt { path, source },
        UnpackError::Write { path, source } => ExtractError::Destination { path, source },
    }
}

/// Reader that raises a shared flag when the wrapped reader errors.
struct Watched<R> {
    inner: R,
    failed: Arc<AtomicBool>,
}

impl<R> Watched<R> {
    fn new(inner: R) -> Self {
        Self {
            inner,
            failed: Arc::new(AtomicBool::new(false)),
        }
    }

    fn flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.failed)
    }
}

impl<R: Read> Read for Watched<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner
            .read(buf)
            .inspect_err(|_| self.failed.store(true, Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;
    use crate::error::ErrorKind;
    use crate::test_support::{RecordingUnpacker, build_tar, gzip};
    use crate::unpack::TarUnpacker;

    fn tar_unpacker() -> Arc<dyn Unpacker> {
        Arc::new(TarUnpacker::new())
    }

    #[tokio::test]
    async fn plain_and_gzip_reach_unpacker_as_same_bytes() {
        let temp = tempdir().unwrap();
        let tar = build_tar(&[("package.json", "{}")]);
        fs::write(temp.path().join("a.tar"), &tar).unwrap();
        fs::write(temp.path().join("a.tar.gz"), gzip(&tar)).unwrap();

        let unpacker = Arc::new(RecordingUnpacker::new());
        let dest = temp.path().join("out");
        run(unpacker.clone(), &temp.path().join("a.tar"), &dest)
            .await
            .unwrap();
        run(unpacker.clone(), &temp.path().join("a.tar.gz"), &dest)
            .await
            .unwrap();

        let calls = unpacker.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].0, dest);
        assert_eq!(calls[0].1, tar);
        assert_eq!(calls[1].1, tar);
    }

    #[tokio::test]
    async fn missing_source_is_source_read() {
        let temp = tempdir().unwrap();
        let err = run(
            tar_unpacker(),
            &temp.path().join("no/file/here.tar.gz"),
            &temp.path().join("out"),
        )
        .await
        .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::SourceRead);
        assert!(!temp.path().join("out").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn directory_as_source_is_source_read() {
        let temp = tempdir().unwrap();
        let err = run(tar_unpacker(), temp.path(), &temp.path().join("out"))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::SourceRead);
    }

    #[tokio::test]
    async fn corrupt_gzip_is_decompress() {
        let temp = tempdir().unwrap();
        let mut data = gzip(&build_tar(&[("a.txt", "hello")]));
        let len = data.len();
        for byte in &mut data[10..len - 8] {
            *byte = 0xff;
        }
        fs::write(temp.path().join("bad.tar.gz"), data).unwrap();

        let err = run(
            tar_unpacker(),
            &temp.path().join("bad.tar.gz"),
            &temp.path().join("out"),
        )
        .await
        .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Decompress);
    }

    #[tokio::test]
    async fn garbage_is_corrupt() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("junk.tar"), vec![0x42u8; 2048]).unwrap();

        let err = run(
            tar_unpacker(),
            &temp.path().join("junk.tar"),
            &temp.path().join("out"),
        )
        .await
        .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Corrupt);
    }

    #[tokio::test]
    async fn truncated_plain_tar_is_corrupt() {
        let temp = tempdir().unwrap();
        let big = "x".repeat(5000);
        let tar = build_tar(&[("a.txt", big.as_str()), ("b.txt", "b")]);
        fs::write(temp.path().join("cut.tar"), &tar[..512 + 2000]).unwrap();

        let err = run(
            tar_unpacker(),
            &temp.path().join("cut.tar"),
            &temp.path().join("out"),
        )
        .await
        .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Corrupt);
    }

    #[tokio::test]
    async fn blocked_destination_is_destination_error() {
        let temp = tempdir().unwrap();
        fs::write(
            temp.path().join("a.tar"),
            build_tar(&[("lib/index.js", "x")]),
        )
        .unwrap();
        let dest = temp.path().join("out");
        fs::create_dir(&dest).unwrap();
        fs::write(dest.join("lib"), "file, not dir").unwrap();

        let err = run(tar_unpacker(), &temp.path().join("a.tar"), &dest)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Destination);
    }

    #[test]
    fn watched_reader_flags_errors() {
        struct Broken;
        impl Read for Broken {
            fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::other("disk on fire"))
            }
        }

        let mut watched = Watched::new(Broken);
        let flag = watched.flag();
        assert!(!flag.load(Ordering::Relaxed));
        assert!(watched.read(&mut [0u8; 8]).is_err());
        assert!(flag.load(Ordering::Relaxed));
    }
}
