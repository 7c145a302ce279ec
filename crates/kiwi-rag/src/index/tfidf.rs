//! TF-IDF vectorizer over word n-grams, built once per corpus and reused at
//! query time. Vocabulary and idf weights are plain serde data so the fitted
//! state persists alongside the index.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::SparseVec;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TfidfVectorizer {
    /// Term -> column id, frozen at fit time.
    vocabulary: HashMap<String, usize>,
    /// Smoothed inverse document frequency per column.
    idf: Vec<f32>,
    max_features: usize,
    ngram_max: usize,
    min_df: usize,
    max_df: f32,
}

impl TfidfVectorizer {
    pub fn new(max_features: usize, ngram_max: usize, min_df: usize, max_df: f32) -> Self {
        Self {
            vocabulary: HashMap::new(),
            idf: Vec::new(),
            max_features,
            ngram_max,
            min_df,
            max_df,
        }
    }

    pub fn vocab_size(&self) -> usize {
        self.vocabulary.len()
    }

    /// Fit the vocabulary and idf weights on the corpus and return the
    /// L2-normalized row vectors, one per input text.
    pub fn fit_transform(&mut self, texts: &[String]) -> Vec<SparseVec> {
        let tokenized: Vec<Vec<String>> = texts.iter().map(|t| self.ngrams(t)).collect();
        let n_docs = tokenized.len();

        // Document frequency and total count per term.
        let mut doc_freq: HashMap<&str, usize> = HashMap::new();
        let mut total_count: HashMap<&str, usize> = HashMap::new();
        for terms in &tokenized {
            let mut seen: HashMap<&str, ()> = HashMap::new();
            for term in terms {
                *total_count.entry(term.as_str()).or_insert(0) += 1;
                seen.entry(term.as_str()).or_insert(());
            }
            for term in seen.keys() {
                *doc_freq.entry(term).or_insert(0) += 1;
            }
        }

        // Apply the df band, then keep the most frequent terms up to the cap.
        let max_df_count = self.max_df * n_docs as f32;
        let mut candidates: Vec<(&str, usize)> = doc_freq
            .iter()
            .filter(|(_, &df)| df >= self.min_df && df as f32 <= max_df_count)
            .map(|(&term, _)| (term, total_count.get(term).copied().unwrap_or(0)))
            .collect();
        candidates.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        candidates.truncate(self.max_features);

        self.vocabulary = candidates
            .iter()
            .enumerate()
            .map(|(i, (term, _))| (term.to_string(), i))
            .collect();

        self.idf = vec![0.0; self.vocabulary.len()];
        for (term, &col) in &self.vocabulary {
            let df = doc_freq.get(term.as_str()).copied().unwrap_or(0);
            self.idf[col] = ((1.0 + n_docs as f32) / (1.0 + df as f32)).ln() + 1.0;
        }

        tokenized
            .iter()
            .map(|terms| self.vectorize_terms(terms))
            .collect()
    }

    /// Vectorize a query with the fitted vocabulary; out-of-vocabulary terms
    /// are dropped.
    pub fn transform(&self, text: &str) -> SparseVec {
        self.vectorize_terms(&self.ngrams(text))
    }

    fn vectorize_terms(&self, terms: &[String]) -> SparseVec {
        let mut counts: HashMap<usize, f32> = HashMap::new();
        for term in terms {
            if let Some(&col) = self.vocabulary.get(term) {
                *counts.entry(col).or_insert(0.0) += 1.0;
            }
        }

        let mut row: SparseVec = counts
            .into_iter()
            .map(|(col, tf)| (col as u32, tf * self.idf[col]))
            .collect();
        row.sort_by_key(|&(col, _)| col);

        let norm: f32 = row.iter().map(|&(_, w)| w * w).sum::<f32>().sqrt();
        if norm > 0.0 {
            for (_, w) in row.iter_mut() {
                *w /= norm;
            }
        }
        row
    }

    /// Lowercased alphanumeric words of 2+ chars, expanded to n-grams up to
    /// the configured order.
    fn ngrams(&self, text: &str) -> Vec<String> {
        let words: Vec<String> = text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| w.chars().count() >= 2)
            .map(|w| w.to_lowercase())
            .collect();

        let mut terms = Vec::with_capacity(words.len() * self.ngram_max);
        for n in 1..=self.ngram_max {
            if words.len() < n {
                break;
            }
            for window in words.windows(n) {
                terms.push(window.join(" "));
            }
        }
        terms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<String> {
        vec![
            "junior entreprise contrat client".to_string(),
            "junior entreprise statut juridique".to_string(),
            "formation rse bilan carbone".to_string(),
            "contrat juridique obligatoire client".to_string(),
        ]
    }

    #[test]
    fn test_rows_are_l2_normalized() {
        let mut v = TfidfVectorizer::new(5000, 3, 1, 1.0);
        let rows = v.fit_transform(&corpus());
        for row in &rows {
            let norm: f32 = row.iter().map(|&(_, w)| w * w).sum::<f32>().sqrt();
            assert!((norm - 1.0).abs() < 1e-5, "norm was {}", norm);
        }
    }

    #[test]
    fn test_min_df_prunes_rare_terms() {
        let mut v = TfidfVectorizer::new(5000, 1, 2, 1.0);
        v.fit_transform(&corpus());
        // "carbone" appears in one document only.
        assert!(v.transform("carbone").is_empty());
        // "contrat" appears in two.
        assert!(!v.transform("contrat").is_empty());
    }

    #[test]
    fn test_max_df_prunes_ubiquitous_terms() {
        let texts = vec![
            "kiwi alpha".to_string(),
            "kiwi beta".to_string(),
            "kiwi alpha gamma".to_string(),
            "kiwi alpha delta".to_string(),
        ];
        let mut v = TfidfVectorizer::new(5000, 1, 1, 0.8);
        v.fit_transform(&texts);
        // "kiwi" is in 4/4 documents, above the 0.8 ceiling.
        assert!(v.transform("kiwi").is_empty());
        assert!(!v.transform("alpha").is_empty());
    }

    #[test]
    fn test_vocabulary_cap_keeps_most_frequent() {
        let mut v = TfidfVectorizer::new(2, 1, 1, 1.0);
        v.fit_transform(&corpus());
        assert_eq!(v.vocab_size(), 2);
    }

    #[test]
    fn test_ngrams_capture_phrases() {
        let mut v = TfidfVectorizer::new(5000, 3, 1, 1.0);
        v.fit_transform(&corpus());
        assert!(v.vocabulary.contains_key("junior entreprise"));
        assert!(v.vocabulary.contains_key("junior entreprise contrat"));
    }

    #[test]
    fn test_transform_drops_unknown_terms() {
        let mut v = TfidfVectorizer::new(5000, 1, 1, 1.0);
        v.fit_transform(&corpus());
        assert!(v.transform("inexistant").is_empty());
    }

    #[test]
    fn test_serde_round_trip_preserves_transform() {
        let mut v = TfidfVectorizer::new(5000, 2, 1, 1.0);
        v.fit_transform(&corpus());
        let bytes = bincode::serialize(&v).unwrap();
        let restored: TfidfVectorizer = bincode::deserialize(&bytes).unwrap();
        assert_eq!(v.transform("junior entreprise"), restored.transform("junior entreprise"));
    }
}
