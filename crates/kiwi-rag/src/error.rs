use thiserror::Error;

/// Engine error taxonomy.
///
/// Source-level and persistence failures are contained by the engine
/// (best-effort rebuild, fallback to a fresh index); only answer-generation
/// failures surface to callers, and even those become a structured degraded
/// response rather than a crash of the serving process.
#[derive(Debug, Error)]
pub enum RagError {
    /// A single source file is unreadable or not valid JSON. The file is
    /// skipped; the rebuild continues with the remaining sources.
    #[error("failed to read source {path}: {reason}")]
    SourceRead { path: String, reason: String },

    /// No fitted vectors and no loadable persisted state. Search degrades to
    /// empty results instead; this surfaces through stats and the loaders.
    #[error("vector index is not ready")]
    IndexNotReady,

    /// Saving or loading the persisted index blob failed.
    #[error("index persistence failed: {0}")]
    Persistence(String),

    /// The external completion call failed (network, quota, bad response).
    #[error("answer generation failed: {0}")]
    AnswerGeneration(String),
}
