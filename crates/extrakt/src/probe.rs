use std::path::PathBuf;

/// Answers whether an executable is available on the search path.
///
/// Resolution must not fail loudly: an absent tool, an unset `PATH` and
/// any lookup error all come back as `None`.
pub trait ToolProbe: Send + Sync {
    fn resolve(&self, tool: &str) -> Option<PathBuf>;
}

/// Resolves executables against the ambient `PATH`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchPathProbe;

impl ToolProbe for SearchPathProbe {
    fn resolve(&self, tool: &str) -> Option<PathBuf> {
        match which::which(tool) {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::debug!(tool, error = %e, "tool not resolvable on search path");
                None
            }
        }
    }
}
