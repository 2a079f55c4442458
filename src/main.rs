//! radval CLI entrypoint.
//!
//! Thin wrapper over the `cli` module: parse args, dispatch to pairing or
//! validation, and exit with appropriate status. For programmatic use,
//! prefer the library API (`radval::api`).

use clap::Parser;

mod cli;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = cli::CliArgs::parse();
    cli::run(args)
}
