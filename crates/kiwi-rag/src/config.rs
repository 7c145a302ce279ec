use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagConfig {
    /// Directory scanned for `.json` source files at rebuild time.
    pub data_dir: PathBuf,
    /// Location of the persisted index blob.
    pub index_path: PathBuf,
    pub chunking: ChunkingConfig,
    pub vector: VectorConfig,
    pub search: SearchConfig,
    pub llm: LlmConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Base target chunk size in characters; adjusted per source type
    /// (+200 for legal pages, -100 for junior-entreprise records).
    pub base_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorConfig {
    /// Vocabulary cap for the TF-IDF model.
    pub max_features: usize,
    /// Highest n-gram order (1 = unigrams only).
    pub ngram_max: usize,
    /// Minimum document frequency for a term to enter the vocabulary.
    pub min_df: usize,
    /// Maximum document-frequency ratio; terms above it are dropped.
    pub max_df: f32,
    /// Target SVD dimensionality, clamped to min(vocab, chunks) - 1 on
    /// small corpora.
    pub n_components: usize,
    /// Seed for the randomized SVD range finder.
    pub seed: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Maximum number of chunks returned per query.
    pub max_context_docs: usize,
    /// Results at or below this similarity are discarded.
    pub min_similarity: f32,
    /// Multiplier applied when the chunk type is in preferred_types.
    pub type_boost: f32,
    /// Multiplier applied when the chunk category is in boost_categories.
    pub category_boost: f32,
    /// Multiplier applied when the chunk carries a priority above 1.
    pub priority_boost: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Override for the completion endpoint (tests, proxies).
    pub endpoint: Option<String>,
}

impl RagConfig {
    /// Validate config values, returning errors for clearly broken configurations.
    pub fn validate(&self) -> Result<(), String> {
        if self.chunking.base_size < 200 {
            return Err("chunking.base_size must be >= 200".into());
        }
        if self.vector.max_features == 0 {
            return Err("vector.max_features must be > 0".into());
        }
        if self.vector.ngram_max == 0 {
            return Err("vector.ngram_max must be > 0".into());
        }
        if !(0.0..=1.0).contains(&self.vector.max_df) {
            return Err("vector.max_df must be in [0.0, 1.0]".into());
        }
        if self.vector.n_components < 2 {
            return Err("vector.n_components must be >= 2".into());
        }
        if self.search.max_context_docs == 0 {
            return Err("search.max_context_docs must be > 0".into());
        }
        if self.search.min_similarity < 0.0 {
            return Err("search.min_similarity must be >= 0.0".into());
        }
        Ok(())
    }

    /// Load config from a JSON file, validating before use.
    pub fn from_file(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| format!("Failed to parse config: {}", e))?;
        config.validate()?;
        Ok(config)
    }
}

impl Default for RagConfig {
    fn default() -> Self {
        let base_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("kiwi-rag");

        let data_dir = if let Ok(env_path) = std::env::var("DATA_DIR") {
            PathBuf::from(env_path)
        } else {
            PathBuf::from("./data")
        };

        Self {
            data_dir,
            index_path: base_dir.join("kiwi_index.bin"),
            chunking: ChunkingConfig { base_size: 800 },
            vector: VectorConfig {
                max_features: 5000,
                ngram_max: 3,
                min_df: 2,
                max_df: 0.8,
                n_components: 300,
                seed: 42,
            },
            search: SearchConfig {
                max_context_docs: 5,
                min_similarity: 0.1,
                type_boost: 1.3,
                category_boost: 1.2,
                priority_boost: 1.1,
            },
            llm: LlmConfig {
                model: "claude-3-haiku-20240307".to_string(),
                max_tokens: 4000,
                temperature: 0.1,
                api_key_env: "CLAUDE_API_KEY".to_string(),
                endpoint: None,
            },
        }
    }
}
