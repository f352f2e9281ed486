//! ogetheory CLI — browse, render, and export OGE math theory items.
//!
//! Groups theory items into exam task buckets, renders an item's markup as a
//! standalone HTML page, and exports it as structured plain text.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli)
}
