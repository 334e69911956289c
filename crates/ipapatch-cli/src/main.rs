//! Command-line interface for ipapatch.
//!
//! Patches every `.ipa` in the current directory in place.

use anyhow::{Context, Result};
use clap::Parser;
use ipapatch::config::{DEFAULT_APP_NAME, DEFAULT_TARGET_TOKEN};
use ipapatch::{BatchPipeline, LogReporter, PatchConfig};

#[derive(Parser)]
#[command(name = "ipapatch")]
#[command(about = "Repoint a dependency to its patched variant inside IPA archives")]
struct Cli {
    /// App bundle directory under Payload/
    #[arg(long, default_value = DEFAULT_APP_NAME)]
    app_name: String,

    /// Dependency token to repoint
    #[arg(long, default_value = DEFAULT_TARGET_TOKEN)]
    token: String,

    /// ZIP compression level for repacked archives (0-9)
    #[arg(short = 'z', long, default_value = "6")]
    zip_level: u32,

    /// Also show trace output (debug is shown by default)
    #[arg(short, long)]
    verbose: bool,

    /// Only show errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG still takes precedence over the flags
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(log_filter(cli.verbose, cli.quiet).as_str()),
    )
    .init();

    let config = PatchConfig::new()
        .app_name(cli.app_name)
        .target_token(cli.token)
        .compression_level(cli.zip_level);

    let cwd = std::env::current_dir().context("Failed to resolve the working directory")?;
    let count = BatchPipeline::new(&config, &LogReporter).run(&cwd)?;

    log::info!("Processed {count} archive(s) in {}", cwd.display());
    Ok(())
}

fn log_filter(verbose: bool, quiet: bool) -> log::LevelFilter {
    if quiet {
        log::LevelFilter::Error
    } else if verbose {
        log::LevelFilter::Trace
    } else {
        log::LevelFilter::Debug
    }
}
