//! Completion backend boundary. The engine only depends on the
//! [`CompletionBackend`] trait; the Anthropic messages client is the default
//! implementation and tests substitute their own.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use crate::config::LlmConfig;
use crate::context::NO_CONTEXT_SENTINEL;
use crate::search::intent::QueryIntent;

const DEFAULT_ENDPOINT: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

pub struct AnthropicClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl AnthropicClient {
    pub fn new(cfg: &LlmConfig) -> Result<Self> {
        let api_key = std::env::var(&cfg.api_key_env)
            .with_context(|| format!("missing API key in ${}", cfg.api_key_env))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .context("failed to build http client")?;

        Ok(Self {
            client,
            endpoint: cfg
                .endpoint
                .clone()
                .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            api_key,
            model: cfg.model.clone(),
            max_tokens: cfg.max_tokens,
            temperature: cfg.temperature,
        })
    }
}

#[async_trait]
impl CompletionBackend for AnthropicClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let body = json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "temperature": self.temperature,
            "messages": [{ "role": "user", "content": prompt }],
        });

        debug!(model = %self.model, prompt_len = prompt.len(), "sending completion request");

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .context("completion request failed")?;

        let status = response.status();
        let text = response
            .text()
            .await
            .context("failed to read completion response")?;

        if !status.is_success() {
            return Err(anyhow!("completion API returned {}: {}", status, text));
        }
        // Proxies occasionally answer with an HTML error page and a 200.
        if text.trim_start().starts_with('<') {
            return Err(anyhow!("completion API returned non-JSON payload"));
        }

        let parsed: Value =
            serde_json::from_str(&text).context("failed to parse completion response")?;
        parsed["content"][0]["text"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| anyhow!("completion response missing content text"))
    }
}

/// Intent-specific framing line prepended to the answer prompt.
fn intent_preamble(intent: QueryIntent) -> &'static str {
    match intent {
        QueryIntent::Legal => {
            "Tu es l'expert juridique de Kiwi Legal, spécialisé dans le droit des Junior-Entreprises."
        }
        QueryIntent::Faq => {
            "Tu es l'assistant support de Kiwi Legal. Réponds de façon pratique et directe."
        }
        QueryIntent::Junior => {
            "Tu es l'annuaire intelligent du mouvement des Junior-Entreprises."
        }
        QueryIntent::Rse => {
            "Tu es le formateur RSE de Kiwi Legal, spécialisé en développement durable."
        }
        QueryIntent::General => "Tu es l'assistant IA de Kiwi Legal pour les Junior-Entreprises.",
    }
}

/// Prompt for a grounded answer: the model must stick to the supplied
/// context and say so when it is insufficient.
pub fn build_answer_prompt(question: &str, context: &str, intent: QueryIntent) -> String {
    format!(
        "{preamble}\n\n\
         Réponds à la question en te basant UNIQUEMENT sur le contexte fourni.\n\
         Si le contexte indique \"{sentinel}\" ou ne suffit pas, dis-le clairement\n\
         et suggère de contacter Kiwi Legal directement.\n\n\
         CONTEXTE:\n{context}\n\n\
         QUESTION: {question}\n\n\
         Réponds en français, de manière structurée et professionnelle.",
        preamble = intent_preamble(intent),
        sentinel = NO_CONTEXT_SENTINEL,
        context = context,
        question = question,
    )
}

/// Prompt for structured legal guidance on a described situation.
pub fn build_guidance_prompt(situation: &str, context: &str) -> String {
    format!(
        "{preamble}\n\n\
         Analyse la situation décrite et fournis une guidance structurée:\n\
         1. Qualification juridique de la situation\n\
         2. Points de vigilance\n\
         3. Démarches recommandées\n\
         4. Références utiles du contexte\n\n\
         Base-toi UNIQUEMENT sur le contexte fourni.\n\n\
         CONTEXTE:\n{context}\n\n\
         SITUATION: {situation}\n\n\
         Réponds en français.",
        preamble = intent_preamble(QueryIntent::Legal),
        context = context,
        situation = situation,
    )
}
