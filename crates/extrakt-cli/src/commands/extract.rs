use std::path::Path;

use anyhow::{Context, Result};
use extrakt::{Extractor, Strategy};

use crate::config::StrategyChoice;

/// Extract `archive` into `dest`, returning the strategy that did the work.
pub async fn extract(
    extractor: &Extractor,
    choice: StrategyChoice,
    archive: &Path,
    dest: &Path,
) -> Result<Strategy> {
    let strategy = match choice {
        StrategyChoice::Auto => extractor.select(),
        StrategyChoice::System => Strategy::System(extractor.options().tool.clone().into()),
        StrategyChoice::Native => Strategy::Native,
    };

    let outcome = match &strategy {
        Strategy::System(_) => extractor.system(archive, dest).await,
        Strategy::Native => extractor.native(archive, dest).await,
    };

    outcome.with_context(|| {
        format!(
            "failed to extract {} into {}",
            archive.display(),
            dest.display()
        )
    })?;

    Ok(strategy)
}

/// Run the extract command and report the result on stdout.
pub async fn run(
    extractor: &Extractor,
    choice: StrategyChoice,
    archive: &Path,
    dest: &Path,
) -> Result<()> {
    let strategy = extract(extractor, choice, archive, dest).await?;
    println!(
        "Extracted {} to {} using {strategy}.",
        archive.display(),
        dest.display()
    );
    Ok(())
}
