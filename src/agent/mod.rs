//! LLM gateway, agents and the article processing pipeline.
//!
//! # Architecture
//!
//! ```text
//! run_pipeline(article)
//!   ├── DomainCuratorAgent        → DomainAnalysis
//!   ├── ArgumentMapperAgent       → ReadingMap + KeyParagraphs
//!   ├── LanguageReasoningAgent    → LanguageBreakdown
//!   └── ProfessionalFeedbackAgent → UnderstandingQuestions
//!         │
//!         └── each agent: render template → LlmGateway::send_with_retry
//!                         → extract JSON → typed result
//! ```
//!
//! The gateway hides three vendors (Zhipu, Qwen, `OpenAI`) behind
//! [`LlmProvider`]; vendor HTTP goes through the [`HttpTransport`] seam.

pub mod analysis;
pub mod argument_mapper;
pub mod client;
pub mod config;
pub mod domain_curator;
pub mod gateway;
pub mod json;
pub mod language_reasoning;
pub mod message;
pub mod pipeline;
pub mod professional_feedback;
pub mod prompt;
pub mod provider;
pub mod providers;
#[cfg(test)]
pub(crate) mod testing;
pub mod traits;
pub mod transport;

// Re-export key types
pub use analysis::{ArgumentMap, ContentValidation, DomainAnalysis, ExplainedExpression};
pub use argument_mapper::ArgumentMapperAgent;
pub use config::{LlmConfig, Vendor};
pub use domain_curator::DomainCuratorAgent;
pub use gateway::LlmGateway;
pub use language_reasoning::LanguageReasoningAgent;
pub use message::{ChatMessage, ChatRequest, ChatResponse, Role, TokenUsage};
pub use pipeline::{AgentStages, AnalysisStages, PipelineOutput, run_pipeline};
pub use professional_feedback::ProfessionalFeedbackAgent;
pub use prompt::PromptSet;
pub use provider::LlmProvider;
pub use traits::{Agent, AgentContext};
pub use transport::HttpTransport;
