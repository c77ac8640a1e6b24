use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use flate2::write::GzEncoder;

use crate::runner::{CommandRunner, Completion, Invocation};
use crate::{ToolProbe, UnpackError, UnpackReport, Unpacker};

/// Build a plain tar archive in memory. Each entry is (path_in_tar, content).
pub fn build_tar(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut archive = tar::Builder::new(Vec::new());

    for (file_path, content) in entries {
        let data = content.as_bytes();
        let mut header = tar::Header::new_gnu();
        header.set_path(file_path).unwrap();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_entry_type(tar::EntryType::Regular);
        header.set_cksum();
        archive.append(&header, data).unwrap();
    }

    archive.into_inner().unwrap()
}

/// Gzip arbitrary bytes.
pub fn gzip(bytes: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(bytes).unwrap();
    encoder.finish().unwrap()
}

/// Probe that always gives the same answer.
pub struct FixedProbe {
    path: Option<PathBuf>,
    calls: Mutex<Vec<String>>,
}

impl FixedProbe {
    pub fn found(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn missing() -> Self {
        Self {
            path: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Tool names looked up so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl ToolProbe for FixedProbe {
    fn resolve(&self, tool: &str) -> Option<PathBuf> {
        self.calls.lock().unwrap().push(tool.to_owned());
        self.path.clone()
    }
}

/// Runner that records invocations and replies with a canned result.
pub struct RecordingRunner {
    reply: Reply,
    invocations: Mutex<Vec<Invocation>>,
}

enum Reply {
    Complete(Completion),
    LaunchFails(std::io::ErrorKind),
}

impl RecordingRunner {
    pub fn succeeding() -> Self {
        Self::completing(Completion::success())
    }

    pub fn completing(completion: Completion) -> Self {
        Self {
            reply: Reply::Complete(completion),
            invocations: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_to_launch(kind: std::io::ErrorKind) -> Self {
        Self {
            reply: Reply::LaunchFails(kind),
            invocations: Mutex::new(Vec::new()),
        }
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl CommandRunner for RecordingRunner {
    async fn run(&self, invocation: &Invocation) -> std::io::Result<Completion> {
        self.invocations.lock().unwrap().push(invocation.clone());
        match &self.reply {
            Reply::Complete(completion) => Ok(completion.clone()),
            Reply::LaunchFails(kind) => Err(std::io::Error::new(*kind, "launch refused")),
        }
    }
}

/// Unpacker that drains the stream and records what it was given.
#[derive(Default)]
pub struct RecordingUnpacker {
    calls: Mutex<Vec<(PathBuf, Vec<u8>)>>,
}

impl RecordingUnpacker {
    pub fn new() -> Self {
        Self::default()
    }

    /// (destination, bytes received) per call.
    pub fn calls(&self) -> Vec<(PathBuf, Vec<u8>)> {
        self.calls.lock().unwrap().clone()
    }
}

impl Unpacker for RecordingUnpacker {
    fn unpack(&self, archive: &mut dyn Read, dest: &Path) -> Result<UnpackReport, UnpackError> {
        let mut bytes = Vec::new();
        archive.read_to_end(&mut bytes).map_err(UnpackError::Read)?;
        self.calls.lock().unwrap().push((dest.to_path_buf(), bytes));
        Ok(UnpackReport::default())
    }
}
