//! CLI layer for daily-english.
//!
//! Provides the command-line interface using clap: database setup, the
//! API server, article management and prompt templates.

pub mod commands;
pub mod output;
pub mod parser;

pub use commands::execute;
pub use output::OutputFormat;
pub use parser::{ArticleCommands, Cli, Commands, PromptCommands};
