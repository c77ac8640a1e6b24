use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;

/// A fully specified external program invocation.
///
/// Arguments are passed to the child verbatim; nothing is interpreted by
/// a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<OsString>,
}

impl Invocation {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Render the invocation for logs. Not shell-safe.
    pub fn display(&self) -> String {
        let mut line = self.program.display().to_string();
        for arg in &self.args {
            line.push(' ');
            line.push_str(&arg.to_string_lossy());
        }
        line
    }
}

/// Exit information from a finished child process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    /// Exit code, or `None` if the process was terminated by a signal.
    pub code: Option<i32>,
    pub stderr: String,
}

impl Completion {
    pub fn success() -> Self {
        Self {
            code: Some(0),
            stderr: String::new(),
        }
    }

    pub fn failure(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            stderr: stderr.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Spawns external programs and waits for them to exit.
#[async_trait::async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run the invocation to completion.
    ///
    /// `Err` means the program could not be launched at all; a program
    /// that ran and failed is an `Ok` with a non-zero [`Completion`].
    async fn run(&self, invocation: &Invocation) -> std::io::Result<Completion>;
}

/// Runs invocations as real child processes via `tokio::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

#[async_trait::async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, invocation: &Invocation) -> std::io::Result<Completion> {
        let output = tokio::process::Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await?;

        Ok(Completion {
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
