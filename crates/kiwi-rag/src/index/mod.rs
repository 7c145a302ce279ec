//! The persisted vector index: chunks, fitted TF-IDF state, optional SVD
//! reduction and the metadata lookup tables, all in one serializable unit.

pub mod svd;
pub mod tfidf;

use std::collections::BTreeMap;

use chrono::Utc;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::VectorConfig;
use crate::types::{Chunk, SparseVec};

use svd::TruncatedSvd;
use tfidf::TfidfVectorizer;

/// Secondary lookups over chunk indices, keyed on the metadata that boosts
/// and filters consult at query time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetadataIndex {
    pub by_type: BTreeMap<String, Vec<usize>>,
    pub by_category: BTreeMap<String, Vec<usize>>,
    pub by_source: BTreeMap<String, Vec<usize>>,
}

impl MetadataIndex {
    fn build(chunks: &[Chunk]) -> Self {
        let mut index = Self::default();
        for (i, chunk) in chunks.iter().enumerate() {
            index
                .by_type
                .entry(chunk.kind().as_str().to_string())
                .or_default()
                .push(i);
            index
                .by_category
                .entry(chunk.resolved_category().to_string())
                .or_default()
                .push(i);
            index
                .by_source
                .entry(chunk.doc.source.clone())
                .or_default()
                .push(i);
        }
        index
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorIndex {
    pub chunks: Vec<Chunk>,
    vectorizer: TfidfVectorizer,
    /// Fitted sparse rows, one per chunk; persisted with the rest of the
    /// state so a loaded index carries the full term-weighted matrix.
    tfidf_rows: Vec<SparseVec>,
    /// `None` means the corpus was too small for a meaningful reduction and
    /// the dense TF-IDF rows are used directly.
    reduction: Option<TruncatedSvd>,
    reduced: Array2<f32>,
    pub metadata: MetadataIndex,
    pub built_at: i64,
}

impl VectorIndex {
    /// Fit the vector space over the chunk corpus. Empty input yields an
    /// index that answers every query with nothing.
    pub fn build(chunks: Vec<Chunk>, cfg: &VectorConfig) -> Self {
        let texts: Vec<String> = chunks.iter().map(|c| c.search_content.clone()).collect();

        let mut vectorizer =
            TfidfVectorizer::new(cfg.max_features, cfg.ngram_max, cfg.min_df, cfg.max_df);
        let tfidf_rows = vectorizer.fit_transform(&texts);
        let vocab = vectorizer.vocab_size();

        // The reduction rank cannot exceed min(vocab, n_chunks) - 1; below
        // rank 2 the projection adds nothing over raw TF-IDF.
        let max_components = vocab.min(chunks.len()).saturating_sub(1);
        let n_components = cfg.n_components.min(max_components);

        let (reduction, reduced) = if n_components >= 2 {
            let (svd, reduced) =
                TruncatedSvd::fit_transform(&tfidf_rows, vocab, n_components, cfg.seed);
            debug!(
                vocab,
                n_components = svd.n_components(),
                "fitted svd reduction"
            );
            (Some(svd), reduced)
        } else {
            debug!(vocab, chunks = chunks.len(), "corpus too small for svd, using dense tfidf");
            (None, densify(&tfidf_rows, vocab))
        };

        let metadata = MetadataIndex::build(&chunks);
        info!(
            chunks = chunks.len(),
            vocab,
            dims = reduced.ncols(),
            "vector index built"
        );

        Self {
            chunks,
            vectorizer,
            tfidf_rows,
            reduction,
            reduced,
            metadata,
            built_at: Utc::now().timestamp(),
        }
    }

    pub fn tfidf_rows(&self) -> &[SparseVec] {
        &self.tfidf_rows
    }

    /// Embed a query into the same space as the indexed rows.
    pub fn embed_query(&self, query: &str) -> Array1<f32> {
        let sparse = self.vectorizer.transform(query);
        match &self.reduction {
            Some(svd) => svd.transform(&sparse),
            None => densify_one(&sparse, self.reduced.ncols()),
        }
    }

    pub fn row(&self, i: usize) -> ndarray::ArrayView1<'_, f32> {
        self.reduced.row(i)
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn dims(&self) -> usize {
        self.reduced.ncols()
    }

    pub fn vocab_size(&self) -> usize {
        self.vectorizer.vocab_size()
    }

    pub fn is_reduced(&self) -> bool {
        self.reduction.is_some()
    }
}

fn densify(rows: &[SparseVec], dim: usize) -> Array2<f32> {
    let mut out = Array2::<f32>::zeros((rows.len(), dim));
    for (i, row) in rows.iter().enumerate() {
        for &(col, w) in row {
            out[[i, col as usize]] = w;
        }
    }
    out
}

fn densify_one(row: &SparseVec, dim: usize) -> Array1<f32> {
    let mut out = Array1::<f32>::zeros(dim);
    for &(col, w) in row {
        let col = col as usize;
        if col < dim {
            out[col] = w;
        }
    }
    out
}
