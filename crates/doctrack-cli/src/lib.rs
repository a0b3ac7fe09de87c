//! `doctrack` command-line adapter.
//!
//! The binary in `main.rs` is the composition root: it loads settings,
//! bootstraps a [`CliContext`] and dispatches to [`handlers`]. Everything
//! else lives in `doctrack-core` and `doctrack-store`.

#![deny(unused_crate_dependencies)]

// Used by the binary target only
use dotenvy as _;
use tracing_subscriber as _;

pub mod bootstrap;
pub mod commands;
pub mod error;
pub mod handlers;
pub mod parser;
pub mod presentation;

pub use bootstrap::{CliContext, bootstrap, load_settings};
pub use commands::Commands;
pub use error::CliError;
pub use parser::Cli;
