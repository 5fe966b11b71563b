//! # scrubline command line
//!
//! ```text
//! main()
//!   │
//!   ├─> Parse CLI arguments (clap)
//!   ├─> Load settings (--config or the default location)
//!   ├─> Initialise logging (console + rolling file)
//!   └─> Execute the command
//! ```
//!
//! ```bash
//! scrubline run --spec pipeline.json --input data.json --report report.json
//! scrubline validate --spec pipeline.json --input data.json
//! scrubline steps
//! ```

#![expect(clippy::print_stdout)] // Command output goes to stdout

mod cli;

use anyhow::{Context as _, Result};
use clap::Parser as _;
use scrubline::config::Settings;
use scrubline::logging;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    let settings = Settings::load_or_default(cli.config.as_deref()).context("Failed to load settings")?;
    logging::init(&settings, cli.verbose)?;

    cli::run_command(cli.command, &settings)
}
