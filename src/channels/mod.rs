//! Local message channels beyond the HTTP API.

pub mod cli;

pub use cli::CliChannel;
