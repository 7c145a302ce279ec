//! Query intent detection over the shared keyword-family matcher: highest
//! hit count wins, ties go to the first family in table order.

use crate::classify::{best_matching_family, KeywordFamily};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryIntent {
    Legal,
    Faq,
    Junior,
    Rse,
    General,
}

impl QueryIntent {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryIntent::Legal => "legal",
            QueryIntent::Faq => "faq",
            QueryIntent::Junior => "junior",
            QueryIntent::Rse => "rse",
            QueryIntent::General => "general",
        }
    }
}

const INTENT_FAMILIES: &[KeywordFamily] = &[
    KeywordFamily {
        name: "legal",
        keywords: &[
            "juridique", "legal", "contrat", "droit", "statut", "assurance", "comptable", "fiscal",
        ],
    },
    KeywordFamily {
        name: "faq",
        keywords: &["comment", "pourquoi", "que faire", "question", "aide", "probleme"],
    },
    KeywordFamily {
        name: "junior",
        keywords: &[
            "junior", "je ", "entreprise", "ecole", "ville", "contact", "trouve", "cherche",
        ],
    },
    KeywordFamily {
        name: "rse",
        keywords: &[
            "rse", "durable", "environnement", "social", "formation", "responsabilite", "carbone",
        ],
    },
];

pub fn detect_intent(query: &str) -> QueryIntent {
    match best_matching_family(INTENT_FAMILIES, query) {
        Some("legal") => QueryIntent::Legal,
        Some("faq") => QueryIntent::Faq,
        Some("junior") => QueryIntent::Junior,
        Some("rse") => QueryIntent::Rse,
        _ => QueryIntent::General,
    }
}
