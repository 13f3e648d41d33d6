//! treemark - mark files in a terminal tree browser, emit them as context
//!
//! treemark provides:
//! - An interactive tree browser with per-file, per-directory, range, and
//!   search-overlay selection
//! - Saved selection templates
//! - Markdown/Cypher/S-expression context documents with token estimates

use anyhow::Result;
use clap::Parser;

mod cli;
mod core;
mod error;
mod render;
mod templates;
mod tui;
mod walker;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli::run(cli)
}
