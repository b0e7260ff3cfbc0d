use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use console::style;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vsix_repack::cli::Args;

fn main() -> ExitCode {
    let args = Args::parse();

    let filter = if args.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();

    if let Err(e) = vsix_repack::interrupt::install() {
        tracing::warn!(error = %e, "failed to install interrupt handler");
    }

    match execute(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {e:#}", style("✗").red().bold());
            ExitCode::from(1)
        }
    }
}

fn execute(args: &Args) -> Result<()> {
    let config = args.load_config()?;
    let request = args.request(&config);
    let outcome = vsix_repack::run(&request)?;

    println!("{} {}", style("✓").green().bold(), outcome.output.display());
    println!(
        "  version {}, entry {} ({})",
        outcome.version,
        outcome.entry_script.display(),
        outcome.entry_source
    );
    println!("  sha256 {}", style(&outcome.packed.sha256).dim());
    if let Some(workdir) = &outcome.workdir {
        println!("  work directory kept at {}", workdir.display());
    }
    Ok(())
}
