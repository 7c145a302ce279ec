//! Page/module walker shared by legal-site and RSE-formation sources.
//!
//! Both sources are nested dictionaries of titled sections; the two walkers
//! differ only in the key indicators that mark a section, the minimum
//! serialized size for it to count, the content label, and the taxonomy used
//! for categorization. One parameterized profile covers both.

use serde_json::Value;

use crate::classify::{first_family_with_hit, KeywordFamily, LEGAL_TAXONOMY, RSE_TAXONOMY};
use crate::types::{Document, SourceType};

pub struct SectionProfile {
    pub kind: SourceType,
    /// Substrings that make a key look like a page/module entry.
    pub indicators: &'static [&'static str],
    /// Minimum serialized length for a value to qualify as a section.
    pub min_len: usize,
    /// Label prefixed to each extracted section's content block.
    pub label: &'static str,
    pub taxonomy: &'static [KeywordFamily],
}

pub const LEGAL_PROFILE: SectionProfile = SectionProfile {
    kind: SourceType::LegalSite,
    indicators: &["titre", "title", "content", "contenu", "article", "section"],
    min_len: 100,
    label: "PAGE KIWI LEGAL",
    taxonomy: LEGAL_TAXONOMY,
};

pub const RSE_PROFILE: SectionProfile = SectionProfile {
    kind: SourceType::RseFormation,
    indicators: &["module", "formation", "cours", "objectif", "competence"],
    min_len: 50,
    label: "MODULE RSE",
    taxonomy: RSE_TAXONOMY,
};

pub fn extract(value: &Value, filename: &str, profile: &SectionProfile) -> Vec<Document> {
    let mut documents = Vec::new();
    walk(value, "", "", filename, profile, &mut documents);
    documents
}

fn walk(
    value: &Value,
    path: &str,
    parent_key: &str,
    filename: &str,
    profile: &SectionProfile,
    out: &mut Vec<Document>,
) {
    let Value::Object(obj) = value else {
        return;
    };

    for (key, child) in obj {
        let current_path = if path.is_empty() {
            key.clone()
        } else {
            format!("{}/{}", path, key)
        };

        if is_section(key, child, profile) {
            out.push(build_document(
                key,
                child,
                &current_path,
                parent_key,
                filename,
                profile,
            ));
        } else if child.is_object() {
            walk(child, &current_path, key, filename, profile, out);
        } else if let Value::Array(items) = child {
            for (i, item) in items.iter().enumerate() {
                if item.is_object() {
                    let indexed_path = format!("{}[{}]", current_path, i);
                    walk(item, &indexed_path, key, filename, profile, out);
                }
            }
        }
    }
}

fn is_section(key: &str, value: &Value, profile: &SectionProfile) -> bool {
    let key_lower = key.to_lowercase();
    let key_matches = profile
        .indicators
        .iter()
        .any(|indicator| key_lower.contains(indicator));
    if !key_matches {
        return false;
    }
    match value {
        Value::Object(_) | Value::String(_) => serialize_section(value).len() > profile.min_len,
        _ => false,
    }
}

/// Section body text: pretty JSON for dictionaries, verbatim for strings.
fn serialize_section(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    }
}

fn build_document(
    key: &str,
    value: &Value,
    path: &str,
    parent_key: &str,
    filename: &str,
    profile: &SectionProfile,
) -> Document {
    let body = serialize_section(value);
    let content = format!("=== {}: {} ===\n{}", profile.label, key, body);
    let category = first_family_with_hit(profile.taxonomy, &format!("{} {}", key, value))
        .unwrap_or("general")
        .to_string();

    let mut doc = Document::new(profile.kind, filename, content);
    doc.title = Some(key.to_string());
    doc.path = Some(path.to_string());
    match profile.kind {
        SourceType::LegalSite => {
            doc.legal_category = Some(category);
            if !parent_key.is_empty() {
                doc.section_type = Some(parent_key.to_string());
            }
        }
        _ => {
            doc.rse_category = Some(category);
            if !parent_key.is_empty() {
                doc.formation_type = Some(parent_key.to_string());
            }
        }
    }
    doc
}
