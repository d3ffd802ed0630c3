//! # daily-english
//!
//! Reading backend for professional English learners. Learners read one
//! curated article a day, answer comprehension questions, write short
//! professional responses that an LLM grades, and build a memory bank of
//! expressions reviewed on a spaced-repetition schedule.
//!
//! ## Layers
//!
//! - [`core`]: domain types (articles, outputs, memory items, sessions)
//! - [`storage`]: `SQLite` persistence behind the [`storage::Storage`] trait
//! - [`agent`]: LLM gateway, prompt templates and the analysis pipeline
//! - [`service`]: business rules over storage and agents
//! - [`http`]: the REST API
//! - [`cli`]: the `daily-english` command
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use daily_english::agent::{AgentContext, AgentStages, LlmConfig, LlmGateway, PromptSet};
//! use daily_english::service::Services;
//! use daily_english::storage::SqliteStorage;
//!
//! # fn main() -> daily_english::Result<()> {
//! let storage = SqliteStorage::open(std::path::Path::new("daily-english.db"))?;
//! let gateway = LlmGateway::new(LlmConfig::builder().from_env().build()?)?;
//! let ctx = AgentContext::new(Arc::new(gateway), Arc::new(PromptSet::defaults()));
//! let services = Services::new(Arc::new(storage), Arc::new(AgentStages::new(&ctx)));
//! let page = services.articles.find_all(&Default::default())?;
//! # let _ = page;
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod cli;
pub mod core;
pub mod error;
pub mod http;
pub mod service;
pub mod storage;

pub use error::{Error, Result};
