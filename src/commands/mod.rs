//! # CLI Command Implementations
//!
//! Each command lives in its own file and provides:
//! - An `Args` struct that defines the command-specific arguments and options,
//!   derived using `clap`.
//! - An `execute` function that takes the parsed `Args` and performs the
//!   command's logic by calling into the `release_merge` library.
//!
//! The tool currently has a single command, `merge`, which is flattened into
//! the top-level CLI.

pub mod merge;
