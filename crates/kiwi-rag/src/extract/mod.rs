//! Structural extraction: type-specific recursive walkers that pull
//! normalized [`Document`]s out of arbitrarily nested, schema-less JSON.
//!
//! Every walker is a pure function over `serde_json::Value` with an explicit
//! depth or path accumulator; field extraction goes through the shared
//! first-match-over-aliases lookup so alias lists stay in one place.

pub mod faq;
pub mod generic;
pub mod organizations;
pub mod sections;

use serde_json::{Map, Value};

use crate::types::{Document, SourceType};

// ── Field alias tables ─────────────────────────────────────────────────────

pub(crate) const QUESTION_KEYS: &[&str] = &["question", "q", "titre", "title", "demande", "probleme"];
pub(crate) const ANSWER_KEYS: &[&str] =
    &["answer", "a", "reponse", "response", "solution", "explication"];

pub(crate) const NAME_KEYS: &[&str] = &["nom", "name", "denomination"];
pub(crate) const CITY_KEYS: &[&str] = &["ville", "city", "localisation"];
pub(crate) const SCHOOL_KEYS: &[&str] = &["ecole", "school", "etablissement", "universite"];
pub(crate) const DOMAIN_KEYS: &[&str] = &["domaine", "domain", "secteur", "specialite"];
pub(crate) const WEBSITE_KEYS: &[&str] = &["site_web", "website", "url", "site"];
pub(crate) const EMAIL_KEYS: &[&str] = &["email", "mail", "contact_email"];
pub(crate) const PHONE_KEYS: &[&str] = &["telephone", "phone", "tel"];

// ── Shared helpers ─────────────────────────────────────────────────────────

/// Render a scalar-ish value as display text: strings verbatim, everything
/// else via its compact JSON serialization.
pub(crate) fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// First-match-over-aliases field lookup: the first alias present with a
/// non-empty trimmed value wins.
pub(crate) fn flexible_field(obj: &Map<String, Value>, aliases: &[&str]) -> Option<String> {
    for key in aliases {
        if let Some(value) = obj.get(*key) {
            if value.is_null() {
                continue;
            }
            let text = value_to_text(value).trim().to_string();
            if !text.is_empty() {
                return Some(text);
            }
        }
    }
    None
}

/// Dispatch one parsed source file to the walker for its detected type.
/// `chunk_size` only matters for the generic fallback, which pre-splits its
/// serialized output.
pub fn extract_documents(
    value: &Value,
    filename: &str,
    kind: SourceType,
    chunk_size: usize,
) -> Vec<Document> {
    match kind {
        SourceType::Faq => faq::extract(value, filename),
        SourceType::JuniorEntreprises => organizations::extract(value, filename),
        SourceType::LegalSite => sections::extract(value, filename, &sections::LEGAL_PROFILE),
        SourceType::RseFormation => sections::extract(value, filename, &sections::RSE_PROFILE),
        SourceType::Unknown => generic::extract_with_size(value, filename, chunk_size),
    }
}
