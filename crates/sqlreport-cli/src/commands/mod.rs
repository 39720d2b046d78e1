//! `sqlreport` subcommand implementations.

pub mod access;
pub mod input;
pub mod render;
pub mod run;
pub mod validate;
