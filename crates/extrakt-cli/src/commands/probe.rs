use anyhow::Result;
use extrakt::{Extractor, Strategy};

/// Describe what an automatic extraction would do right now.
pub fn describe(extractor: &Extractor) -> String {
    let tool = &extractor.options().tool;
    match extractor.select() {
        Strategy::System(path) => format!("{tool} found at {}; using system strategy", path.display()),
        Strategy::Native => format!("{tool} not found on PATH; using native strategy"),
    }
}

pub fn run(extractor: &Extractor) -> Result<()> {
    println!("{}", describe(extractor));
    Ok(())
}
