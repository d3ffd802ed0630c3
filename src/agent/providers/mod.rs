//! Vendor provider implementations.

mod dashscope;
mod openai;

pub use dashscope::DashScopeProvider;
pub use openai::OpenAiCompatibleProvider;
