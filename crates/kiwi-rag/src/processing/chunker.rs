//! Adaptive chunking: size-targeted splitting that preserves semantic
//! boundaries per source type, plus derivation of the search text that gets
//! vectorized in place of the display content.

use crate::types::{Chunk, Document, SourceType};

/// Section marker the extractors embed in assembled content; splitting
/// happens on it so a section never straddles two chunks.
const SECTION_MARKER: &str = "\n===";

pub struct Chunker {
    base_size: usize,
}

impl Chunker {
    pub fn new(base_size: usize) -> Self {
        Self { base_size }
    }

    /// Target chunk size for a source type: legal pages carry more context,
    /// organization records less.
    pub fn target_size(&self, kind: SourceType) -> usize {
        match kind {
            SourceType::LegalSite => self.base_size + 200,
            SourceType::JuniorEntreprises => self.base_size.saturating_sub(100),
            _ => self.base_size,
        }
    }

    /// Turn the extracted document list into the chunk list that enters the
    /// vector index. Chunk order within a document is the split order.
    pub fn chunk_documents(&self, documents: Vec<Document>) -> Vec<Chunk> {
        let mut chunks = Vec::with_capacity(documents.len());

        for doc in documents {
            let target = self.target_size(doc.kind);

            if doc.content.len() <= target {
                let search_content = derive_search_content(&doc);
                chunks.push(Chunk {
                    doc,
                    search_content,
                    chunk_id: None,
                });
                continue;
            }

            for (i, part) in self.split_content(&doc.content, target, doc.kind).into_iter().enumerate() {
                let mut piece = doc.clone();
                piece.content = part;
                let chunk_id = format!("{}_{}_{}", doc.source, doc.kind.as_str(), i);
                let search_content = derive_search_content(&piece);
                chunks.push(Chunk {
                    doc: piece,
                    search_content,
                    chunk_id: Some(chunk_id),
                });
            }
        }

        chunks
    }

    /// Type-aware split of oversized content.
    ///
    /// Q&A entries are never split internally (a question must stay with its
    /// answer); only a prefix up to the limit survives. Everything else is
    /// accumulated section by section on the `===` marker convention.
    fn split_content(&self, content: &str, max_size: usize, kind: SourceType) -> Vec<String> {
        if kind == SourceType::Faq {
            return vec![truncate_at_char_boundary(content, max_size).to_string()];
        }

        let mut parts = Vec::new();
        let mut current = String::new();

        for section in content.split(SECTION_MARKER) {
            if current.len() + section.len() > max_size {
                if !current.is_empty() {
                    parts.push(current.trim().to_string());
                }
                current = if section.starts_with("===") {
                    section.to_string()
                } else {
                    format!("==={}", section)
                };
            } else if current.is_empty() {
                current = section.to_string();
            } else {
                current.push_str(SECTION_MARKER);
                current.push_str(section);
            }
        }

        if !current.is_empty() {
            parts.push(current.trim().to_string());
        }

        parts
    }
}

/// Build the type-tuned text used only for vectorization, distinct from the
/// display content.
pub fn derive_search_content(doc: &Document) -> String {
    match doc.kind {
        SourceType::Faq => {
            let question = doc.question.as_deref().unwrap_or("");
            let answer = doc.answer.as_deref().unwrap_or("");
            let category = doc.category.as_deref().unwrap_or("");
            format!("{} {} {} FAQ junior entreprise", category, question, answer)
        }
        SourceType::JuniorEntreprises => {
            let fields = [
                doc.name.as_deref(),
                doc.city.as_deref(),
                doc.domain.as_deref(),
                doc.school.as_deref(),
            ];
            let mut text = fields.iter().flatten().copied().collect::<Vec<_>>().join(" ");
            text.push_str(" junior entreprise");
            text
        }
        SourceType::LegalSite => {
            let category = doc.legal_category.as_deref().unwrap_or("");
            format!("{} {} juridique legal", doc.content, category)
        }
        SourceType::RseFormation => {
            let category = doc.rse_category.as_deref().unwrap_or("");
            format!("{} {} RSE formation durable", doc.content, category)
        }
        SourceType::Unknown => {
            // Generic content gets a truncated preview as its search text.
            if doc.content.len() > 200 {
                format!("{}...", truncate_at_char_boundary(&doc.content, 200))
            } else {
                doc.content.clone()
            }
        }
    }
}

fn truncate_at_char_boundary(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Document, SourceType};

    fn faq_doc(content_len: usize) -> Document {
        let mut doc = Document::new(
            SourceType::Faq,
            "faq.json",
            "=== FAQ KIWI LEGAL ===\n❓ QUESTION: q\n✅ RÉPONSE: ".to_string()
                + &"réponse ".repeat(content_len / 8),
        );
        doc.question = Some("Comment créer une junior entreprise ?".to_string());
        doc.answer = Some("En suivant la procédure officielle.".to_string());
        doc.category = Some("creation".to_string());
        doc
    }

    fn sectioned_doc(kind: SourceType, sections: usize, section_len: usize) -> Document {
        let body: Vec<String> = (0..sections)
            .map(|i| format!("=== SECTION {} ===\n{}", i, "x".repeat(section_len)))
            .collect();
        let mut doc = Document::new(kind, "kiwi-legal-all.json", body.join("\n"));
        doc.legal_category = Some("contrats".to_string());
        doc
    }

    #[test]
    fn test_small_document_passes_through_unsplit() {
        let chunker = Chunker::new(800);
        let chunks = chunker.chunk_documents(vec![faq_doc(100)]);
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].chunk_id.is_none());
        assert!(!chunks[0].search_content.is_empty());
    }

    #[test]
    fn test_faq_is_never_split_internally() {
        let chunker = Chunker::new(800);
        let chunks = chunker.chunk_documents(vec![faq_doc(3000)]);
        // A single truncated chunk, not several pieces.
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].doc.content.len() <= 800);
        assert_eq!(chunks[0].chunk_id.as_deref(), Some("faq.json_faq_0"));
    }

    #[test]
    fn test_sectioned_content_splits_on_marker() {
        let chunker = Chunker::new(800);
        let doc = sectioned_doc(SourceType::LegalSite, 6, 400);
        let original = doc.content.clone();
        let chunks = chunker.chunk_documents(vec![doc]);
        assert!(chunks.len() > 1);

        let target = chunker.target_size(SourceType::LegalSite);
        for chunk in &chunks {
            assert!(
                chunk.doc.content.len() <= target + 4,
                "chunk of {} exceeds target {}",
                chunk.doc.content.len(),
                target
            );
        }

        // Order is preserved by the chunk_id suffix.
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(
                chunk.chunk_id.as_deref(),
                Some(format!("kiwi-legal-all.json_legal_site_{}", i).as_str())
            );
        }

        // Reconstruction covers the original content without omission.
        let rebuilt: String = chunks
            .iter()
            .map(|c| c.doc.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        let strip = |s: &str| s.chars().filter(|c| !c.is_whitespace()).collect::<String>();
        assert_eq!(strip(&rebuilt), strip(&original));
    }

    #[test]
    fn test_target_size_adjustments() {
        let chunker = Chunker::new(800);
        assert_eq!(chunker.target_size(SourceType::LegalSite), 1000);
        assert_eq!(chunker.target_size(SourceType::JuniorEntreprises), 700);
        assert_eq!(chunker.target_size(SourceType::Faq), 800);
        assert_eq!(chunker.target_size(SourceType::Unknown), 800);
    }

    #[test]
    fn test_faq_search_content_combines_fields() {
        let chunker = Chunker::new(800);
        let chunks = chunker.chunk_documents(vec![faq_doc(100)]);
        // Category, question, answer, fixed tag — nothing else weighted in.
        assert_eq!(
            chunks[0].search_content,
            "creation Comment créer une junior entreprise ? \
             En suivant la procédure officielle. FAQ junior entreprise"
        );
    }

    #[test]
    fn test_organization_search_content() {
        let mut doc = Document::new(SourceType::JuniorEntreprises, "junior.json", "fiche".into());
        doc.name = Some("JE Alpha".into());
        doc.city = Some("Lyon".into());
        doc.domain = Some("conseil".into());
        doc.school = Some("INSA".into());
        let search = derive_search_content(&doc);
        assert_eq!(search, "JE Alpha Lyon conseil INSA junior entreprise");
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        let text = "électricité".to_string();
        // Byte 2 falls inside the 'é' encoding; truncation must back off.
        let cut = truncate_at_char_boundary(&text, 3);
        assert!(text.starts_with(cut));
        assert!(cut.len() <= 3);
    }
}
