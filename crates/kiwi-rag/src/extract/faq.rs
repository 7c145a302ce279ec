//! FAQ walker: recursive question/answer extraction with priority scoring.

use serde_json::{Map, Value};

use super::{flexible_field, value_to_text, ANSWER_KEYS, QUESTION_KEYS};
use crate::types::{Document, SourceType};

/// Recursion depth bound; self-referential or pathological nesting beyond
/// this is ignored rather than walked.
const MAX_DEPTH: usize = 5;

/// Question keywords that raise the priority of an entry.
const HIGH_PRIORITY_WORDS: &[&str] = &["urgent", "important", "obligatoire", "legal", "contrat"];

/// Keys whose mere presence marks a dictionary as a question/answer pair.
const QA_INDICATORS: &[&str] = &["question", "q", "answer", "a", "reponse", "response"];

pub fn extract(value: &Value, filename: &str) -> Vec<Document> {
    let mut documents = Vec::new();
    walk(value, "", 0, filename, &mut documents);
    documents
}

fn walk(value: &Value, category_path: &str, depth: usize, filename: &str, out: &mut Vec<Document>) {
    if depth > MAX_DEPTH {
        return;
    }

    match value {
        Value::Array(items) => {
            for item in items {
                if let Value::Object(obj) = item {
                    if let Some(doc) = extract_single_qa(obj, category_path, filename) {
                        out.push(doc);
                    }
                }
            }
        }
        Value::Object(obj) => {
            if is_qa_object(obj) {
                if let Some(doc) = extract_single_qa(obj, category_path, filename) {
                    out.push(doc);
                }
            } else {
                for (key, child) in obj {
                    let new_path = if category_path.is_empty() {
                        key.clone()
                    } else {
                        format!("{}/{}", category_path, key)
                    };
                    walk(child, &new_path, depth + 1, filename, out);
                }
            }
        }
        _ => {}
    }
}

fn is_qa_object(obj: &Map<String, Value>) -> bool {
    QA_INDICATORS.iter().any(|key| obj.contains_key(*key))
}

fn extract_single_qa(
    obj: &Map<String, Value>,
    category: &str,
    filename: &str,
) -> Option<Document> {
    let question = flexible_field(obj, QUESTION_KEYS)?;
    let answer = flexible_field(obj, ANSWER_KEYS)?;

    let mut content_parts = vec!["=== FAQ KIWI LEGAL ===".to_string()];
    if !category.is_empty() {
        content_parts.push(format!("Catégorie: {}", category));
    }
    content_parts.push(format!("❓ QUESTION: {}", question));
    content_parts.push(format!("✅ RÉPONSE: {}", answer));

    if let Some(Value::Array(tags)) = obj.get("tags") {
        let joined = tags
            .iter()
            .map(value_to_text)
            .collect::<Vec<_>>()
            .join(", ");
        content_parts.push(format!("🏷️ Tags: {}", joined));
    }

    if let Some(niveau) = obj.get("niveau").or_else(|| obj.get("difficulty")) {
        content_parts.push(format!("📊 Niveau: {}", value_to_text(niveau)));
    }

    let mut doc = Document::new(SourceType::Faq, filename, content_parts.join("\n"));
    doc.priority = calculate_priority(&question);
    doc.question = Some(question);
    doc.answer = Some(answer);
    if !category.is_empty() {
        doc.category = Some(category.to_string());
    }
    Some(doc)
}

fn calculate_priority(question: &str) -> u8 {
    let lowered = question.to_lowercase();
    if HIGH_PRIORITY_WORDS.iter().any(|word| lowered.contains(word)) {
        3
    } else {
        1
    }
}
