//! advisor-core - Retrieval-augmented solution advisory engine
//!
//! Provides the building blocks for turning a company profile into a
//! structured solution recommendation:
//! - LLM provider abstraction (OpenAI-compatible, Ollama)
//! - RAG over a vendor product catalog, industry knowledge and company data
//! - Three-stage analysis generation with fit scoring and normalization
//! - Configuration management
//! - Server API (Unix socket)
//!
//! ## Primary API
//!
//! Most callers only need [`Advisor`], which wires the knowledge base and the
//! analysis pipeline together from a [`Config`].

// Public modules
pub mod analysis;
pub mod config;
pub mod knowledge;
pub mod models;
pub mod provider;
pub mod rag;
pub mod server;

mod engine;
mod text;

#[cfg(test)]
mod test_support;

// Public exports
pub use analysis::{AnalysisError, AnalysisResult, OverallFit, RecommendedSolution};
pub use config::Config;
pub use engine::Advisor;
pub use knowledge::{
    CompanyContext, ContextBundle, DatasetSource, KnowledgeBase, KnowledgeError, KnowledgeSource,
};
pub use server::Server;

// Provider exports
pub use provider::{Completion, CompletionRequest, Provider, ProviderError, TokenUsage};
