mod commands;
mod config;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use extrakt::{Extractor, TarUnpacker};
use tracing_subscriber::EnvFilter;

use crate::config::{AppConfig, StrategyChoice};

#[derive(Parser)]
#[command(name = "extrakt")]
#[command(about = "Extract tar and tar.gz archives, with or without a system tar")]
struct Cli {
    /// Log what the extractor is doing (repeat for more detail)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Extract an archive into a directory
    Extract {
        /// Path to a .tar or .tar.gz archive
        archive: PathBuf,
        /// Destination directory (created if missing)
        dest: PathBuf,
        /// Which extraction strategy to use
        #[arg(long, value_enum)]
        strategy: Option<StrategyChoice>,
        /// Name of the tar executable to look for
        #[arg(long)]
        tool: Option<String>,
        /// Have the system tar list entries as it extracts
        #[arg(long)]
        verbose_tool: bool,
        /// Keep setuid, setgid and sticky bits recorded in the archive
        #[arg(long)]
        preserve_permissions: bool,
    },
    /// Report whether the system tar would be used
    Probe {
        /// Name of the tar executable to look for
        #[arg(long)]
        tool: Option<String>,
    },
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "extrakt=debug,info",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn build_extractor(
    config: &AppConfig,
    tool: Option<String>,
    verbose_tool: bool,
    preserve_permissions: bool,
) -> Extractor {
    let unpacker =
        TarUnpacker::new().preserve_permissions(preserve_permissions || config.preserve_permissions);
    let mut builder = Extractor::builder()
        .verbose_tool(verbose_tool || config.verbose_tool)
        .unpacker(Arc::new(unpacker));

    if let Some(tool) = tool.or_else(|| config.tool.clone()) {
        builder = builder.tool(tool);
    }

    builder.build()
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let app_config = config::load_config();

    match cli.command {
        Command::Extract {
            archive,
            dest,
            strategy,
            tool,
            verbose_tool,
            preserve_permissions,
        } => {
            let extractor =
                build_extractor(&app_config, tool, verbose_tool, preserve_permissions);
            let choice = strategy.unwrap_or(app_config.strategy);
            commands::extract::run(&extractor, choice, &archive, &dest).await
        }
        Command::Probe { tool } => {
            let extractor = build_extractor(&app_config, tool, false, false);
            commands::probe::run(&extractor)
        }
    }
}
