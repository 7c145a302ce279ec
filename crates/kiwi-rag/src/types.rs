use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Sparse TF-IDF row: (column, weight) pairs sorted by column.
pub type SparseVec = Vec<(u32, f32)>;

/// Closed set of semantic source types inferred by the classifier.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    LegalSite,
    Faq,
    JuniorEntreprises,
    RseFormation,
    Unknown,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LegalSite => "legal_site",
            Self::Faq => "faq",
            Self::JuniorEntreprises => "junior_entreprises",
            Self::RseFormation => "rse_formation",
            Self::Unknown => "unknown",
        }
    }

    pub fn from_label(label: &str) -> Self {
        match label {
            "legal_site" => Self::LegalSite,
            "faq" => Self::Faq,
            "junior_entreprises" => Self::JuniorEntreprises,
            "rse_formation" => Self::RseFormation,
            _ => Self::Unknown,
        }
    }
}

/// Normalized record produced by extracting one raw JSON node, before
/// size-based splitting. `content` is the human-readable assembled text;
/// the type-specific fields feed search-text derivation and the expert
/// lookup operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub content: String,
    pub source: String,
    pub kind: SourceType,

    // FAQ fields
    pub question: Option<String>,
    pub answer: Option<String>,
    pub category: Option<String>,
    /// Relevance priority: base 1, raised for urgency/legal keywords.
    pub priority: u8,

    // Junior-entreprise fields
    pub name: Option<String>,
    pub city: Option<String>,
    pub school: Option<String>,
    pub domain: Option<String>,
    pub website: Option<String>,
    pub email: Option<String>,
    /// Region/category path accumulated while descending the directory tree.
    pub region_context: Option<String>,

    // Legal page / RSE module fields
    pub title: Option<String>,
    pub path: Option<String>,
    pub section_type: Option<String>,
    pub formation_type: Option<String>,
    pub legal_category: Option<String>,
    pub rse_category: Option<String>,
}

impl Document {
    pub fn new(kind: SourceType, source: &str, content: String) -> Self {
        Self {
            content,
            source: source.to_string(),
            kind,
            question: None,
            answer: None,
            category: None,
            priority: 1,
            name: None,
            city: None,
            school: None,
            domain: None,
            website: None,
            email: None,
            region_context: None,
            title: None,
            path: None,
            section_type: None,
            formation_type: None,
            legal_category: None,
            rse_category: None,
        }
    }

    /// Resolve the display category through the fallback chain
    /// category -> legal_category -> rse_category -> "unknown".
    pub fn resolved_category(&self) -> &str {
        self.category
            .as_deref()
            .or(self.legal_category.as_deref())
            .or(self.rse_category.as_deref())
            .unwrap_or("unknown")
    }
}

/// Retrieval-sized unit entered into the vector index. Derived from exactly
/// one [`Document`]: either a copy of it, or one ordered piece when the
/// document exceeded its type's target size. `search_content` is what gets
/// vectorized; `doc.content` is what gets displayed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub doc: Document,
    pub search_content: String,
    /// Present only on split documents: `{source}_{type}_{index}`.
    pub chunk_id: Option<String>,
}

impl Chunk {
    pub fn kind(&self) -> SourceType {
        self.doc.kind
    }

    pub fn resolved_category(&self) -> &str {
        self.doc.resolved_category()
    }
}

/// A chunk paired with its (possibly boosted) similarity score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
}

/// Structured answer returned by [`crate::RagEngine::answer`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerResponse {
    pub question: String,
    pub answer: String,
    pub context_found: bool,
    pub query_type: String,
    pub sources_count: usize,
    pub status: String,
}

/// A junior-entreprise record surfaced by the directory search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizationHit {
    pub name: String,
    pub city: String,
    pub school: String,
    pub domain: String,
    pub email: String,
    pub website: String,
    pub score: f32,
    pub content: String,
}

/// A FAQ entry surfaced by the FAQ search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaqHit {
    pub question: String,
    pub answer: String,
    pub category: String,
    pub score: f32,
    pub priority: u8,
}

/// Compiled legal guidance plus the sources it drew on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegalGuidance {
    pub topic: String,
    pub guidance: String,
    pub sources: Vec<GuidanceSource>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuidanceSource {
    pub source: String,
    pub category: String,
    pub path: String,
    pub score: f32,
}

/// Corpus and vector-space statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineStats {
    pub total_chunks: usize,
    pub by_source: BTreeMap<String, usize>,
    pub by_type: BTreeMap<String, usize>,
    pub by_category: BTreeMap<String, usize>,
    pub vocabulary_size: usize,
    /// (rows, terms) of the fitted TF-IDF matrix, if any.
    pub tfidf_dimensions: Option<(usize, usize)>,
    /// (rows, components) of the reduced matrix, if any.
    pub reduced_dimensions: Option<(usize, usize)>,
}

/// Readiness report for the serving layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: String,
    pub indexed_chunks: usize,
    pub vectorizer_fitted: bool,
    pub reduction_fitted: bool,
    pub metadata_built: bool,
    pub ready_for_queries: bool,
}
