//! Command handlers.
//!
//! Handlers follow one pattern:
//! - Signature: `pub fn execute(ctx: &CliContext, ...) -> Result<T>`
//! - Thin wrappers that:
//!   1. Load the store through the context
//!   2. Call into `doctrack-store`
//!   3. Format output for the terminal, saving when they mutated

pub mod add;
pub mod cleanup;
pub mod list;
pub mod report;
pub mod verify;
