//! Command-line interface for taskman
//!
//! Thin front end over the task pool: each subcommand seeds the pool with a
//! few tasks and keeps adding more as results come back.

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};

mod commands;
mod output;

pub use output::Output;

use crate::config::PoolConfig;

/// taskman - run self-extending workloads on a thread pool
#[derive(Parser)]
#[command(
    name = "taskman",
    version = crate::VERSION,
    about = "Dynamic work-queue executor with streaming results",
    propagate_version = true
)]
pub struct Cli {
    /// Increase verbosity (can be repeated)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Use custom configuration file
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Recursively expand a directory tree, one task per directory
    Scan(commands::scan::ScanArgs),
    /// Walk a simulated paginated listing, discovering each next page
    Pages(commands::pages::PagesArgs),
}

impl Cli {
    pub fn run(self) -> Result<()> {
        setup_logging(self.verbose, self.quiet);

        let output = Output::new(self.verbose > 0, self.quiet);

        match self.command {
            Some(Commands::Scan(args)) => {
                let config = PoolConfig::load(self.config.as_deref())?;
                commands::scan::execute(args, config, &output)
            }
            Some(Commands::Pages(args)) => {
                let config = PoolConfig::load(self.config.as_deref())?;
                commands::pages::execute(args, config, &output)
            }
            None => {
                let mut cmd = Cli::command();
                cmd.print_help()?;
                Ok(())
            }
        }
    }
}

fn setup_logging(verbose: u8, quiet: bool) {
    if quiet {
        return;
    }

    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        match verbose {
            0 => tracing_subscriber::EnvFilter::new("warn"),
            1 => tracing_subscriber::EnvFilter::new("info,ignore=warn"),
            2 => tracing_subscriber::EnvFilter::new("debug,ignore=warn"),
            _ => tracing_subscriber::EnvFilter::new("trace"),
        }
    });

    // Log to stderr so command output on stdout stays machine readable
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
