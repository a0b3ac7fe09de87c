//! Common test utilities.
//!
//! Provides a temporary tracking layout and helpers for creating tracked
//! artifacts of a given age and size.

pub mod fixtures;
