//! Heuristic keyword-family classification.
//!
//! Source-type detection, legal/RSE categorization, and intent detection all
//! consume the same pure data tables: a family is a name plus a fixed keyword
//! list, and matching is substring counting over lowercased text. The tables
//! live here so the heuristics stay testable apart from the walkers.

use serde_json::Value;

use crate::types::SourceType;

/// A named family of keywords used by the heuristic classifiers.
pub struct KeywordFamily {
    pub name: &'static str,
    pub keywords: &'static [&'static str],
}

/// Filename substring patterns checked first, in table order.
const FILENAME_PATTERNS: &[(&str, SourceType)] = &[
    ("kiwi-legal-all.json", SourceType::LegalSite),
    ("faq.json", SourceType::Faq),
    ("junior.json", SourceType::JuniorEntreprises),
    ("kiwi_rse", SourceType::RseFormation),
];

/// Content keyword families, in detection priority order.
const CONTENT_FAMILIES: &[(SourceType, &[&str])] = &[
    (SourceType::Faq, &["question", "answer", "faq", "reponse"]),
    (
        SourceType::JuniorEntreprises,
        &["junior", "entreprise", "ecole", "ville"],
    ),
    (
        SourceType::RseFormation,
        &["rse", "durable", "environnement", "formation"],
    ),
    (
        SourceType::LegalSite,
        &["legal", "juridique", "contrat", "droit"],
    ),
];

/// Taxonomy for legal page categorization.
pub const LEGAL_TAXONOMY: &[KeywordFamily] = &[
    KeywordFamily {
        name: "contrats",
        keywords: &["contrat", "contract", "accord", "convention"],
    },
    KeywordFamily {
        name: "statuts",
        keywords: &["statut", "constitution", "creation"],
    },
    KeywordFamily {
        name: "comptabilite",
        keywords: &["comptable", "fiscal", "tva", "urssaf"],
    },
    KeywordFamily {
        name: "assurances",
        keywords: &["assurance", "responsabilite", "couverture"],
    },
    KeywordFamily {
        name: "social",
        keywords: &["social", "salarie", "cotisation"],
    },
    KeywordFamily {
        name: "procedure",
        keywords: &["procedure", "demarche", "etape"],
    },
];

/// Taxonomy for RSE training-module categorization.
pub const RSE_TAXONOMY: &[KeywordFamily] = &[
    KeywordFamily {
        name: "environnement",
        keywords: &["environnement", "carbone", "ecologie", "durable"],
    },
    KeywordFamily {
        name: "social",
        keywords: &["social", "inclusivite", "diversite", "equite"],
    },
    KeywordFamily {
        name: "gouvernance",
        keywords: &["gouvernance", "ethique", "transparence"],
    },
    KeywordFamily {
        name: "formation",
        keywords: &["formation", "sensibilisation", "competence"],
    },
];

/// Return the first family (in table order) with at least one keyword hit.
pub fn first_family_with_hit<'a>(families: &'a [KeywordFamily], text: &str) -> Option<&'a str> {
    let lowered = text.to_lowercase();
    families
        .iter()
        .find(|family| family.keywords.iter().any(|kw| lowered.contains(kw)))
        .map(|family| family.name)
}

/// Count keyword hits per family and return the first family reaching the
/// highest nonzero count, in table order.
pub fn best_matching_family<'a>(families: &'a [KeywordFamily], text: &str) -> Option<&'a str> {
    let lowered = text.to_lowercase();
    let mut best: Option<(&str, usize)> = None;
    for family in families {
        let hits = family
            .keywords
            .iter()
            .filter(|kw| lowered.contains(*kw))
            .count();
        if hits > 0 && best.map_or(true, |(_, max)| hits > max) {
            best = Some((family.name, hits));
        }
    }
    best.map(|(name, _)| name)
}

/// Infer the semantic source type from a filename and a raw parsed value.
///
/// Filename substring patterns win; otherwise a bounded prefix of the value's
/// serialization is scanned for the content keyword families in fixed
/// priority order. Deterministic, no side effects.
pub fn detect_source_type(filename: &str, value: &Value) -> SourceType {
    let filename_lower = filename.to_lowercase();
    for (pattern, kind) in FILENAME_PATTERNS {
        if filename_lower.contains(pattern) {
            return *kind;
        }
    }

    let serialized = value.to_string();
    let prefix: String = serialized.chars().take(1000).collect::<String>().to_lowercase();

    for (kind, keywords) in CONTENT_FAMILIES {
        if keywords.iter().any(|kw| prefix.contains(kw)) {
            return *kind;
        }
    }

    SourceType::Unknown
}

/// Categorize legal content by key + serialized value against the legal
/// taxonomy; "general" when nothing matches.
pub fn categorize_legal(key: &str, value: &Value) -> String {
    let text = format!("{} {}", key, value);
    first_family_with_hit(LEGAL_TAXONOMY, &text)
        .unwrap_or("general")
        .to_string()
}

/// Categorize RSE content against the RSE taxonomy; "general" fallback.
pub fn categorize_rse(key: &str, value: &Value) -> String {
    let text = format!("{} {}", key, value);
    first_family_with_hit(RSE_TAXONOMY, &text)
        .unwrap_or("general")
        .to_string()
}
