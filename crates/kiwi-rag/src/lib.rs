//! RAG engine for the Kiwi knowledge base.
//!
//! Ingests heterogeneous JSON sources (FAQ entries, junior-entreprise
//! directories, scraped legal pages, RSE training modules, arbitrary JSON),
//! normalizes them into documents, builds a TF-IDF + truncated-SVD vector
//! index over type-tuned search text, and serves boosted cosine retrieval
//! plus LLM-backed question answering over the assembled context.

pub mod classify;
pub mod config;
pub mod context;
pub mod error;
pub mod extract;
pub mod index;
pub mod llm;
pub mod processing;
pub mod rag_engine;
pub mod search;
pub mod storage;
pub mod types;

// Re-export primary types for convenience
pub use config::RagConfig;
pub use error::RagError;
pub use rag_engine::RagEngine;
pub use types::{
    AnswerResponse, Chunk, Document, EngineStats, FaqHit, HealthReport, LegalGuidance,
    OrganizationHit, ScoredChunk, SourceType,
};

pub use anyhow::Result;
