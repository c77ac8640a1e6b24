//! Extract tar and tar.gz archives into a directory.
//!
//! [`extract`] uses the system `tar` when it can be found on `PATH` and
//! falls back to a built-in pipeline (gzip detection + `tar` crate)
//! otherwise. [`extract_system`] and [`extract_native`] force one strategy.
//! For control over the tool name or to substitute collaborators, build an
//! [`Extractor`].

pub mod decompress;
pub mod error;
pub mod extractor;
mod native;
pub mod probe;
pub mod runner;
pub mod system;
pub mod unpack;

use std::path::Path;

pub use error::{ErrorKind, ExtractError};
pub use extractor::{DEFAULT_TOOL, ExtractOptions, Extractor, ExtractorBuilder, Strategy};
pub use probe::{SearchPathProbe, ToolProbe};
pub use runner::{CommandRunner, Completion, Invocation, ProcessRunner};
pub use unpack::{TarUnpacker, UnpackError, UnpackReport, Unpacker};

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

/// Extract `archive` into `dest`, preferring the system tar tool.
pub async fn extract(archive: impl AsRef<Path>, dest: impl AsRef<Path>) -> Result<(), ExtractError> {
    Extractor::default()
        .extract(archive.as_ref(), dest.as_ref())
        .await
}

/// Extract `archive` into `dest` with the system tar tool.
pub async fn extract_system(
    archive: impl AsRef<Path>,
    dest: impl AsRef<Path>,
) -> Result<(), ExtractError> {
    Extractor::default()
        .system(archive.as_ref(), dest.as_ref())
        .await
}

/// Extract `archive` into `dest` without launching any external program.
pub async fn extract_native(
    archive: impl AsRef<Path>,
    dest: impl AsRef<Path>,
) -> Result<(), ExtractError> {
    Extractor::default()
        .native(archive.as_ref(), dest.as_ref())
        .await
}
