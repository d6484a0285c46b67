//! ABOUTME: Agent Runtime (C6) — LLM adapter with structured-output validation

mod provider;
mod runtime;
mod template;

pub use provider::{HttpLlmProvider, HttpLlmProviderConfig, LlmProvider};
pub use runtime::StructuredAgentRuntime;
pub use template::render as render_template;
