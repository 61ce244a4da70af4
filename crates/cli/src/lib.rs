//! `wxalarm-cli` library crate.
//!
//! Re-exports the argument parser and run routine for integration testing.
//! The binary entrypoint lives in `main.rs`.

pub mod cli;
pub mod run;
