//! Similarity ranking over the reduced vector space, with metadata boosts
//! applied on top of raw cosine scores.

pub mod intent;

use ndarray::ArrayView1;
use tracing::debug;

use crate::config::SearchConfig;
use crate::index::VectorIndex;

/// Rank index rows against a query embedding.
///
/// Boosts are multiplicative and only applied when the caller expresses a
/// preference; a plain search scores raw cosine. Results come back sorted by
/// boosted score, thresholded and truncated per the config.
pub fn rank(
    index: &VectorIndex,
    query: &str,
    preferred_types: Option<&[&str]>,
    boost_categories: Option<&[&str]>,
    cfg: &SearchConfig,
) -> Vec<(usize, f32)> {
    if index.is_empty() {
        return Vec::new();
    }

    let query_vec = index.embed_query(query);
    let mut scored: Vec<(usize, f32)> = (0..index.len())
        .map(|i| {
            let mut score = cosine(query_vec.view(), index.row(i));
            if preferred_types.is_some() || boost_categories.is_some() {
                score *= boost_factor(index, i, preferred_types, boost_categories, cfg);
            }
            (i, score)
        })
        .collect();

    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    // Over-fetch before thresholding so borderline boosted rows are
    // considered ahead of discarding.
    scored.truncate(cfg.max_context_docs * 2);
    scored.retain(|&(_, score)| score > cfg.min_similarity);
    scored.truncate(cfg.max_context_docs);

    debug!(query, results = scored.len(), "ranked query");
    scored
}

fn boost_factor(
    index: &VectorIndex,
    i: usize,
    preferred_types: Option<&[&str]>,
    boost_categories: Option<&[&str]>,
    cfg: &SearchConfig,
) -> f32 {
    let chunk = &index.chunks[i];
    let mut factor = 1.0;

    if let Some(types) = preferred_types {
        if types.contains(&chunk.kind().as_str()) {
            factor *= cfg.type_boost;
        }
    }
    if let Some(categories) = boost_categories {
        if categories.contains(&chunk.resolved_category()) {
            factor *= cfg.category_boost;
        }
    }
    if chunk.doc.priority > 1 {
        factor *= cfg.priority_boost;
    }

    factor
}

pub fn cosine(a: ArrayView1<'_, f32>, b: ArrayView1<'_, f32>) -> f32 {
    let dot = a.dot(&b);
    let na = a.dot(&a).sqrt();
    let nb = b.dot(&b).sqrt();
    if na == 0.0 || nb == 0.0 {
        0.0
    } else {
        dot / (na * nb)
    }
}
