use anyhow::Result;
use clap::Parser;

use taskman::cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.run()
}
