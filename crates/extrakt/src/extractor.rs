use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::ExtractError;
use crate::probe::{SearchPathProbe, ToolProbe};
use crate::runner::{CommandRunner, ProcessRunner};
use crate::unpack::{TarUnpacker, Unpacker};
use crate::{native, system};

/// Name of the external tool looked up on the search path by default.
pub const DEFAULT_TOOL: &str = "tar";

/// Which extraction strategy handled (or would handle) a call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Strategy {
    /// The external tool, at its resolved location.
    System(PathBuf),
    /// The built-in pipeline.
    Native,
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::System(path) => write!(f, "system ({})", path.display()),
            Self::Native => write!(f, "native"),
        }
    }
}

/// Settings shared by every call on one [`Extractor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Executable name probed for and launched by the system strategy.
    pub tool: String,
    /// Ask the external tool to list entries as it extracts them.
    pub verbose_tool: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            tool: DEFAULT_TOOL.to_owned(),
            verbose_tool: false,
        }
    }
}

/// Extracts tar and tar.gz archives, preferring the system tar tool.
///
/// The probe, command runner and unpacker are injected so that each can be
/// replaced independently. Cloning is cheap and clones share collaborators;
/// an `Extractor` holds no per-call state and can be used concurrently.
#[derive(Clone)]
pub struct Extractor {
    probe: Arc<dyn ToolProbe>,
    runner: Arc<dyn CommandRunner>,
    unpacker: Arc<dyn Unpacker>,
    options: ExtractOptions,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl std::fmt::Debug for Extractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Extractor")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Extractor {
    pub fn new(
        probe: Arc<dyn ToolProbe>,
        runner: Arc<dyn CommandRunner>,
        unpacker: Arc<dyn Unpacker>,
    ) -> Self {
        Self {
            probe,
            runner,
            unpacker,
            options: ExtractOptions::default(),
        }
    }

    pub fn builder() -> ExtractorBuilder {
        ExtractorBuilder::default()
    }

    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// Decide which strategy a call made now would use.
    ///
    /// Probes on every call; nothing is cached.
    pub fn select(&self) -> Strategy {
        match self.probe.resolve(&self.options.tool) {
            Some(path) => Strategy::System(path),
            None => Strategy::Native,
        }
    }

    /// Extract `archive` into `dest` with whichever strategy [`select`](Self::select) picks.
    ///
    /// A tool that disappears between the probe and the launch surfaces as
    /// [`ExtractError::Spawn`]; there is no second probe and no fallback.
    pub async fn extract(&self, archive: &Path, dest: &Path) -> Result<(), ExtractError> {
        let strategy = self.select();
        tracing::debug!(
            archive = %archive.display(),
            dest = %dest.display(),
            %strategy,
            "extracting archive"
        );

        match strategy {
            Strategy::System(_) => self.system(archive, dest).await,
            Strategy::Native => self.native(archive, dest).await,
        }
    }

    /// Extract with the external tool, regardless of what a probe would say.
    pub async fn system(&self, archive: &Path, dest: &Path) -> Result<(), ExtractError> {
        system::run(self.runner.as_ref(), &self.options, archive, dest).await
    }

    /// Extract in-process, without launching any external program.
    pub async fn native(&self, archive: &Path, dest: &Path) -> Result<(), ExtractError> {
        native::run(Arc::clone(&self.unpacker), archive, dest).await
    }
}

/// Builder for [`Extractor`]. Unset collaborators use the real implementations.
#[derive(Default)]
pub struct ExtractorBuilder {
    probe: Option<Arc<dyn ToolProbe>>,
    runner: Option<Arc<dyn CommandRunner>>,
    unpacker: Option<Arc<dyn Unpacker>>,
    options: ExtractOptions,
}

impl ExtractorBuilder {
    pub fn probe(mut self, probe: Arc<dyn ToolProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    pub fn runner(mut self, runner: Arc<dyn CommandRunner>) -> Self {
        self.runner = Some(runner);
        self
    }

    pub fn unpacker(mut self, unpacker: Arc<dyn Unpacker>) -> Self {
        self.unpacker = Some(unpacker);
        self
    }

    pub fn tool(mut self, tool: impl Into<String>) -> Self {
        self.options.tool = tool.into();
        self
    }

    pub fn verbose_tool(mut self, verbose: bool) -> Self {
        self.options.verbose_tool = verbose;
        self
    }

    pub fn options(mut self, options: ExtractOptions) -> Self {
        self.options = options;
        self
    }

    pub fn build(self) -> Extractor {
        Extractor {
            probe: self.probe.unwrap_or_else(|| Arc::new(SearchPathProbe)),
            runner: self.runner.unwrap_or_else(|| Arc::new(ProcessRunner)),
            unpacker: self.unpacker.unwrap_or_else(|| Arc::new(TarUnpacker::default())),
            options: self.options,
        }
    }
}
