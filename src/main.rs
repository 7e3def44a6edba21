//! Main entry point for the varanno CLI.

pub mod annotate;
pub mod common;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Read depth, consequence, and population frequency annotation of VCF files"
)]
struct Cli {
    /// Commonly used arguments
    #[command(flatten)]
    common: common::Args,

    /// Arguments of the annotation itself
    #[command(flatten)]
    annotate: annotate::Args,
}

fn main() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    // Build a tracing subscriber according to the configuration in `cli.common`.
    let collector = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(match cli.common.verbose.log_level() {
            Some(level) => match level {
                log::Level::Error => tracing::Level::ERROR,
                log::Level::Warn => tracing::Level::WARN,
                log::Level::Info => tracing::Level::INFO,
                log::Level::Debug => tracing::Level::DEBUG,
                log::Level::Trace => tracing::Level::TRACE,
            },
            None => tracing::Level::INFO,
        })
        .compact()
        .finish();

    // Install collector and run the annotation.
    tracing::subscriber::with_default(collector, || {
        tracing::info!("varanno startup -- letting the varan out to hunt...");

        annotate::run(&cli.common, &cli.annotate)?;

        tracing::info!("All done. Have a nice day!");

        Ok::<(), anyhow::Error>(())
    })?;

    Ok(())
}
