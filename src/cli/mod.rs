//! Command Line Interface (CLI) layer for radval.
//!
//! This module defines argument parsing (`args`), error types (`errors`),
//! and the dispatch logic (`runner`) for the `pairs` and `validate`
//! subcommands. Embedders should call `radval::api` directly.
pub mod args;
pub mod errors;
pub mod runner;

pub use args::CliArgs;
pub use runner::run;
