//! CLI subcommand implementations.

pub mod cart;
pub mod catalog;
pub mod contact;
