//! Scratchpad CLI - run Rust scratch files.

mod colors;
mod console;
mod host;
mod run;
mod watch;
mod watcher;

use clap::{Parser, Subcommand};
use scratchpad_core::TargetPresets;

use crate::run::RunArgs;

#[derive(Parser)]
#[command(name = "scratchpad")]
#[command(about = "Run Rust scratch files")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scratch file once
    Run {
        #[command(flatten)]
        args: RunArgs,
    },

    /// Re-run a scratch file whenever it changes
    Watch {
        #[command(flatten)]
        args: RunArgs,

        /// Keep previous output instead of clearing the screen
        #[arg(long)]
        no_clear: bool,
    },

    /// List available run targets
    Targets,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        tracing_subscriber::EnvFilter::from_default_env()
            .add_directive(tracing::Level::DEBUG.into())
    } else {
        tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Helper to format scratchpad-core errors with recovery hints
    let format_error = |err: anyhow::Error| -> anyhow::Error {
        if let Some(core_err) = err.downcast_ref::<scratchpad_core::Error>() {
            anyhow::anyhow!("{}", core_err.with_hint())
        } else {
            err
        }
    };

    match cli.command {
        Commands::Run { args } => run::execute(&args).await.map_err(format_error)?,

        Commands::Watch { args, no_clear } => {
            watch::execute(&args, !no_clear).await.map_err(format_error)?;
        }

        Commands::Targets => list_targets(),
    }

    Ok(())
}

/// Print the registered run targets.
fn list_targets() {
    let targets = TargetPresets::standard();
    println!("{}Run targets:{}", colors::BOLD, colors::RESET);
    for target in targets.iter() {
        println!(
            "  {}{:<8}{} opt-level={} debug-info={}",
            colors::CYAN,
            target.name,
            colors::RESET,
            target.opt_level,
            target.debug_info
        );
    }
}
