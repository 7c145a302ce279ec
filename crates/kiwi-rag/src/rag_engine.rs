//! The engine facade: corpus ingestion, index lifecycle, retrieval and the
//! question-answering operations built on top of it.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use tracing::{info, warn};
use walkdir::WalkDir;

use crate::classify::detect_source_type;
use crate::config::RagConfig;
use crate::context::{assemble_context, intent_preferences, NO_CONTEXT_SENTINEL};
use crate::error::RagError;
use crate::extract::extract_documents;
use crate::index::VectorIndex;
use crate::llm::{build_answer_prompt, build_guidance_prompt, CompletionBackend};
use crate::processing::Chunker;
use crate::search::intent::detect_intent;
use crate::search::rank;
use crate::storage;
use crate::types::{
    AnswerResponse, Document, EngineStats, FaqHit, GuidanceSource, HealthReport, LegalGuidance,
    OrganizationHit, ScoredChunk, SourceType,
};

enum IndexState {
    Uninitialized,
    Ready(VectorIndex),
}

pub struct RagEngine {
    config: RagConfig,
    state: IndexState,
    backend: Box<dyn CompletionBackend>,
}

impl RagEngine {
    pub fn new(config: RagConfig, backend: Box<dyn CompletionBackend>) -> Self {
        Self {
            config,
            state: IndexState::Uninitialized,
            backend,
        }
    }

    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Scan the data directory, extract and chunk every readable source, fit
    /// a fresh index and swap it in. Unreadable files are skipped with a
    /// warning; the rebuild itself never fails on bad sources.
    ///
    /// Returns the number of indexed chunks.
    pub fn rebuild_index(&mut self) -> Result<usize, RagError> {
        let mut documents = Vec::new();

        for entry in WalkDir::new(&self.config.data_dir)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match self.load_source(path) {
                Ok(mut docs) => {
                    info!(path = %path.display(), documents = docs.len(), "source extracted");
                    documents.append(&mut docs);
                }
                Err(e) => warn!(error = %e, "skipping source"),
            }
        }

        let chunker = Chunker::new(self.config.chunking.base_size);
        let chunks = chunker.chunk_documents(documents);
        let index = VectorIndex::build(chunks, &self.config.vector);
        let total = index.len();

        // Persistence is best effort: a failed save leaves the in-memory
        // index serving.
        if let Err(e) = storage::save_index(&index, &self.config.index_path) {
            warn!(error = %e, "index save failed, continuing in memory");
        }

        self.state = IndexState::Ready(index);
        info!(chunks = total, "index rebuilt");
        Ok(total)
    }

    fn load_source(&self, path: &Path) -> Result<Vec<Document>, RagError> {
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown.json")
            .to_string();

        let raw = fs::read_to_string(path).map_err(|e| RagError::SourceRead {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let value: serde_json::Value =
            serde_json::from_str(&raw).map_err(|e| RagError::SourceRead {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;

        let kind = detect_source_type(&filename, &value);
        Ok(extract_documents(
            &value,
            &filename,
            kind,
            self.config.chunking.base_size,
        ))
    }

    /// Load the persisted index from disk and swap it in.
    pub fn load_persisted(&mut self) -> Result<usize, RagError> {
        let index = storage::load_index(&self.config.index_path)?;
        let total = index.len();
        self.state = IndexState::Ready(index);
        Ok(total)
    }

    /// Lazy readiness: an uninitialized engine first tries the persisted
    /// snapshot before reporting itself not ready.
    fn ensure_ready(&mut self) -> Result<&VectorIndex, RagError> {
        if matches!(self.state, IndexState::Uninitialized) {
            match self.load_persisted() {
                Ok(total) => info!(chunks = total, "loaded persisted index on demand"),
                Err(e) => {
                    warn!(error = %e, "no persisted index available");
                    return Err(RagError::IndexNotReady);
                }
            }
        }
        match &self.state {
            IndexState::Ready(index) => Ok(index),
            IndexState::Uninitialized => Err(RagError::IndexNotReady),
        }
    }

    /// Boosted similarity search over the index.
    ///
    /// A not-ready index (nothing fitted, nothing loadable) degrades to an
    /// empty result set; callers consult [`Self::health`] to tell "not
    /// ready" from "no matches".
    pub fn search(
        &mut self,
        query: &str,
        preferred_types: Option<&[&str]>,
        boost_categories: Option<&[&str]>,
    ) -> Vec<ScoredChunk> {
        let cfg = self.config.search.clone();
        let index = match self.ensure_ready() {
            Ok(index) => index,
            Err(e) => {
                warn!(error = %e, "search on unready index, returning empty");
                return Vec::new();
            }
        };
        rank(index, query, preferred_types, boost_categories, &cfg)
            .into_iter()
            .map(|(i, score)| ScoredChunk {
                chunk: index.chunks[i].clone(),
                score,
            })
            .collect()
    }

    /// Answer a question over retrieved context. Never fails: completion
    /// errors degrade into a structured error response.
    pub async fn answer(&mut self, question: &str, debug: bool) -> AnswerResponse {
        let intent = detect_intent(question);
        let (types, categories) = intent_preferences(intent);

        let results = self.search(question, types, categories);
        let context = assemble_context(&results);
        let context_found = context != NO_CONTEXT_SENTINEL;
        if debug {
            info!(
                intent = intent.as_str(),
                sources = results.len(),
                context = %context,
                "assembled answer context"
            );
        }
        let prompt = build_answer_prompt(question, &context, intent);

        match self.backend.complete(&prompt).await {
            Ok(answer) => AnswerResponse {
                question: question.to_string(),
                answer,
                context_found,
                query_type: intent.as_str().to_string(),
                sources_count: results.len(),
                status: "success".to_string(),
            },
            Err(e) => AnswerResponse {
                question: question.to_string(),
                answer: format!("Erreur système Kiwi: {}", e),
                context_found,
                query_type: intent.as_str().to_string(),
                sources_count: results.len(),
                status: "error".to_string(),
            },
        }
    }

    /// Directory search over junior-entreprise records, driven by whichever
    /// criteria the caller supplies.
    pub fn find_organizations(
        &mut self,
        city: Option<&str>,
        domain: Option<&str>,
        school: Option<&str>,
        region: Option<&str>,
    ) -> Vec<OrganizationHit> {
        let mut terms = Vec::new();
        if let Some(city) = city {
            terms.push(format!("ville {}", city));
        }
        if let Some(domain) = domain {
            terms.push(format!("domaine {}", domain));
        }
        if let Some(school) = school {
            terms.push(format!("école {}", school));
        }
        if let Some(region) = region {
            terms.push(format!("région {}", region));
        }
        let query = if terms.is_empty() {
            "junior entreprise".to_string()
        } else {
            terms.join(" ")
        };

        self.search(&query, Some(&["junior_entreprises"]), None)
            .into_iter()
            .filter(|r| r.chunk.kind() == SourceType::JuniorEntreprises)
            .map(|r| {
                let doc = &r.chunk.doc;
                OrganizationHit {
                    name: doc.name.clone().unwrap_or_else(|| "N/A".to_string()),
                    city: doc.city.clone().unwrap_or_else(|| "N/A".to_string()),
                    school: doc.school.clone().unwrap_or_else(|| "N/A".to_string()),
                    domain: doc.domain.clone().unwrap_or_else(|| "N/A".to_string()),
                    email: doc.email.clone().unwrap_or_else(|| "N/A".to_string()),
                    website: doc.website.clone().unwrap_or_else(|| "N/A".to_string()),
                    score: r.score,
                    content: doc.content.clone(),
                }
            })
            .collect()
    }

    /// FAQ lookup: boosted search restricted to Q&A chunks, optionally
    /// favoring one category.
    pub fn find_faq(&mut self, query: &str, category: Option<&str>) -> Vec<FaqHit> {
        let category_arr = category.map(|c| [c]);
        self.search(
            query,
            Some(&["faq"]),
            category_arr.as_ref().map(|a| a.as_slice()),
        )
        .into_iter()
        .filter(|r| r.chunk.kind() == SourceType::Faq)
        .map(|r| {
            let doc = &r.chunk.doc;
            FaqHit {
                question: doc.question.clone().unwrap_or_default(),
                answer: doc.answer.clone().unwrap_or_default(),
                category: doc.resolved_category().to_string(),
                score: r.score,
                priority: doc.priority,
            }
        })
        .collect()
    }

    /// Structured legal guidance for a described situation, grounded in the
    /// legal corpus. A supplied category joins the query text and narrows
    /// the boost to that domain; without one, no category boost applies.
    pub async fn legal_guidance(
        &mut self,
        situation: &str,
        category: Option<&str>,
    ) -> Result<LegalGuidance, RagError> {
        let query = match category {
            Some(c) => format!("{} {}", situation, c),
            None => situation.to_string(),
        };
        let category_arr = category.map(|c| [c]);
        let results = self.search(
            &query,
            Some(&["legal_site"]),
            category_arr.as_ref().map(|a| a.as_slice()),
        );

        if results.is_empty() {
            return Ok(LegalGuidance {
                topic: situation.to_string(),
                guidance: "Aucune guidance juridique trouvée".to_string(),
                sources: Vec::new(),
            });
        }

        let context = assemble_context(&results);
        let prompt = build_guidance_prompt(situation, &context);
        let guidance = self
            .backend
            .complete(&prompt)
            .await
            .map_err(|e| RagError::AnswerGeneration(e.to_string()))?;

        let sources = results
            .iter()
            .map(|r| GuidanceSource {
                source: r.chunk.doc.source.clone(),
                category: r.chunk.resolved_category().to_string(),
                path: r.chunk.doc.path.clone().unwrap_or_default(),
                score: r.score,
            })
            .collect();

        Ok(LegalGuidance {
            topic: situation.to_string(),
            guidance,
            sources,
        })
    }

    pub fn stats(&mut self) -> Result<EngineStats, RagError> {
        let index = self.ensure_ready()?;

        let count_lengths = |map: &BTreeMap<String, Vec<usize>>| {
            map.iter()
                .map(|(k, v)| (k.clone(), v.len()))
                .collect::<BTreeMap<String, usize>>()
        };

        Ok(EngineStats {
            total_chunks: index.len(),
            by_source: count_lengths(&index.metadata.by_source),
            by_type: count_lengths(&index.metadata.by_type),
            by_category: count_lengths(&index.metadata.by_category),
            vocabulary_size: index.vocab_size(),
            tfidf_dimensions: Some((index.len(), index.vocab_size())),
            reduced_dimensions: Some((index.len(), index.dims())),
        })
    }

    /// Readiness probe; reports rather than fails when no index is loaded.
    pub fn health(&self) -> HealthReport {
        match &self.state {
            IndexState::Ready(index) => HealthReport {
                status: "operational".to_string(),
                indexed_chunks: index.len(),
                vectorizer_fitted: index.vocab_size() > 0,
                reduction_fitted: index.is_reduced(),
                metadata_built: !index.metadata.by_type.is_empty(),
                ready_for_queries: !index.is_empty(),
            },
            IndexState::Uninitialized => HealthReport {
                status: "uninitialized".to_string(),
                indexed_chunks: 0,
                vectorizer_fitted: false,
                reduction_fitted: false,
                metadata_built: false,
                ready_for_queries: false,
            },
        }
    }
}
