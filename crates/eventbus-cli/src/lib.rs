//! EventBus CLI library
//!
//! Manifest loading, command dispatch and the toy demo scenario behind the
//! `eventbus` binary.

pub mod cli;
pub mod commands;
pub mod config;
pub mod demo;
pub mod error;

pub use cli::{Cli, Commands};
pub use commands::CommandDispatcher;
pub use demo::{run_demo, DemoReport};
pub use error::{CliError, Result};
