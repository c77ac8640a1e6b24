use std::path::PathBuf;

/// Errors that can occur while extracting an archive.
///
/// A missing tar tool is not an error: the selector falls back to the
/// native strategy instead.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("failed to launch {}: {source}", program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} exited with {}: {}", program.display(), describe_code(*code), stderr.trim())]
    ToolFailed {
        program: PathBuf,
        code: Option<i32>,
        stderr: String,
    },

    #[error("cannot read archive {}: {source}", path.display())]
    SourceRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot decompress archive {}: {source}", path.display())]
    Decompress {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("archive {} is not a valid tar stream: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write to destination {}: {source}", path.display())]
    Destination {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("extraction task did not complete: {0}")]
    Interrupted(String),
}

/// Fieldless classification of an [`ExtractError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Spawn,
    ToolFailed,
    SourceRead,
    Decompress,
    Corrupt,
    Destination,
    Interrupted,
}

impl ExtractError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Spawn { .. } => ErrorKind::Spawn,
            Self::ToolFailed { .. } => ErrorKind::ToolFailed,
            Self::SourceRead { .. } => ErrorKind::SourceRead,
            Self::Decompress { .. } => ErrorKind::Decompress,
            Self::Corrupt { .. } => ErrorKind::Corrupt,
            Self::Destination { .. } => ErrorKind::Destination,
            Self::Interrupted(_) => ErrorKind::Interrupted,
        }
    }

    /// Returns true if the archive itself was unreadable or malformed.
    pub fn is_archive_error(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::SourceRead | ErrorKind::Decompress | ErrorKind::Corrupt
        )
    }

    /// Returns true if the failure came from the external tar tool.
    pub fn is_tool_error(&self) -> bool {
        matches!(self.kind(), ErrorKind::Spawn | ErrorKind::ToolFailed)
    }
}

fn describe_code(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "no status (terminated by signal)".to_owned(),
    }
}
