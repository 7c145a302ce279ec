//! Context assembly: turn ranked chunks into the annotated text block handed
//! to the completion backend, with intent-driven type and category
//! preferences.

use crate::search::intent::QueryIntent;
use crate::types::ScoredChunk;

/// Fixed sentinel the answer prompt checks for when retrieval comes up empty.
pub const NO_CONTEXT_SENTINEL: &str = "Aucune information pertinente trouvée dans la base Kiwi.";

/// Type and category preferences per detected intent; `None` means rank on
/// raw similarity.
pub fn intent_preferences(
    intent: QueryIntent,
) -> (Option<&'static [&'static str]>, Option<&'static [&'static str]>) {
    match intent {
        QueryIntent::Legal => (
            Some(&["legal_site"]),
            Some(&["contrats", "statuts", "comptabilite"]),
        ),
        QueryIntent::Faq => (Some(&["faq"]), Some(&["general"])),
        QueryIntent::Junior => (Some(&["junior_entreprises"]), Some(&["general"])),
        QueryIntent::Rse => (
            Some(&["rse_formation"]),
            Some(&["environnement", "social", "gouvernance"]),
        ),
        QueryIntent::General => (None, None),
    }
}

/// Render retrieved chunks as one annotated context block, sections joined
/// by a `---` separator line.
pub fn assemble_context(results: &[ScoredChunk]) -> String {
    if results.is_empty() {
        return NO_CONTEXT_SENTINEL.to_string();
    }

    let sections: Vec<String> = results
        .iter()
        .map(|scored| {
            let chunk = &scored.chunk;
            let mut header = format!(
                "Source: {} | Type: {} | Score: {:.3}",
                chunk.doc.source,
                chunk.kind().as_str(),
                scored.score
            );
            if let Some(category) = &chunk.doc.category {
                header.push_str(&format!(" | Catégorie: {}", category));
            }
            if let Some(legal) = &chunk.doc.legal_category {
                header.push_str(&format!(" | Domaine juridique: {}", legal));
            }
            if let Some(rse) = &chunk.doc.rse_category {
                header.push_str(&format!(" | Domaine RSE: {}", rse));
            }
            format!("{}\nContenu: {}\n---", header, chunk.doc.content)
        })
        .collect();

    sections.join("\n")
}
