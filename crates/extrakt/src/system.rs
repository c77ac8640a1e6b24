use std::path::Path;

use crate::error::ExtractError;
use crate::extractor::ExtractOptions;
use crate::runner::{CommandRunner, Invocation};

/// Build the tool invocation that extracts `archive` into `dest`.
pub fn invocation(options: &ExtractOptions, archive: &Path, dest: &Path) -> Invocation {
    let mode = if options.verbose_tool { "-xvf" } else { "-xf" };
    Invocation::new(&options.tool)
        .arg(mode)
        .arg(archive)
        .arg("-C")
        .arg(dest)
}

pub(crate) async fn run(
    runner: &dyn CommandRunner,
    options: &ExtractOptions,
    archive: &Path,
    dest: &Path,
) -> Result<(), ExtractError> {
    tokio::fs::create_dir_all(dest)
        .await
        .map_err(|source| ExtractError::Destination {
            path: dest.to_path_buf(),
            source,
        })?;

    let invocation = invocation(options, archive, dest);
    tracing::debug!(command = %invocation.display(), "running system tar");

    let completion = runner
        .run(&invocation)
        .await
        .map_err(|source| ExtractError::Spawn {
            program: invocation.program.clone(),
            source,
        })?;

    if !completion.is_success() {
        return Err(ExtractError::ToolFailed {
            program: invocation.program,
            code: completion.code,
            stderr: completion.stderr,
        });
    }

    Ok(())
}
