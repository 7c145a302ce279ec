//! Junior-entreprise directory walker: record detection via identity keys,
//! core-field extraction, and labeled leftover lines.

use serde_json::{Map, Value};

use super::{
    flexible_field, value_to_text, CITY_KEYS, DOMAIN_KEYS, EMAIL_KEYS, NAME_KEYS, PHONE_KEYS,
    SCHOOL_KEYS, WEBSITE_KEYS,
};
use crate::types::{Document, SourceType};

/// Keys whose presence marks a dictionary as an organization record.
const ORG_INDICATORS: &[&str] = &["nom", "name", "ecole", "school", "ville", "city", "domaine"];

/// Keys already rendered as dedicated lines, excluded from the leftover pass.
const CORE_KEYS: &[&str] = &[
    "nom", "name", "denomination", "ville", "city", "localisation", "ecole", "school",
    "etablissement", "universite", "domaine", "domain", "secteur", "specialite", "site_web",
    "website", "url", "site", "email", "mail", "contact_email", "telephone", "phone", "tel",
];

pub fn extract(value: &Value, filename: &str) -> Vec<Document> {
    let mut documents = Vec::new();
    walk(value, "", filename, &mut documents);
    documents
}

fn walk(value: &Value, region_context: &str, filename: &str, out: &mut Vec<Document>) {
    match value {
        Value::Array(items) => {
            for item in items {
                if let Value::Object(obj) = item {
                    if let Some(doc) = extract_single_record(obj, region_context, filename) {
                        out.push(doc);
                    }
                }
            }
        }
        Value::Object(obj) => {
            if is_org_object(obj) {
                if let Some(doc) = extract_single_record(obj, region_context, filename) {
                    out.push(doc);
                }
            } else {
                // Descend region/category levels, accumulating the path.
                for (key, child) in obj {
                    let new_context = if region_context.is_empty() {
                        key.clone()
                    } else {
                        format!("{}/{}", region_context, key)
                    };
                    walk(child, &new_context, filename, out);
                }
            }
        }
        _ => {}
    }
}

fn is_org_object(obj: &Map<String, Value>) -> bool {
    ORG_INDICATORS.iter().any(|key| obj.contains_key(*key))
}

fn extract_single_record(
    obj: &Map<String, Value>,
    region: &str,
    filename: &str,
) -> Option<Document> {
    let name = flexible_field(obj, NAME_KEYS)?;
    let city = flexible_field(obj, CITY_KEYS);
    let school = flexible_field(obj, SCHOOL_KEYS);
    let domain = flexible_field(obj, DOMAIN_KEYS);
    let website = flexible_field(obj, WEBSITE_KEYS);
    let email = flexible_field(obj, EMAIL_KEYS);
    let phone = flexible_field(obj, PHONE_KEYS);

    let mut content_parts = vec![format!("=== JUNIOR ENTREPRISE: {} ===", name.to_uppercase())];
    if !region.is_empty() {
        content_parts.push(format!("Région/Contexte: {}", region));
    }
    if let Some(school) = &school {
        content_parts.push(format!("🎓 École: {}", school));
    }
    if let Some(city) = &city {
        content_parts.push(format!("🏙️ Ville: {}", city));
    }
    if let Some(domain) = &domain {
        content_parts.push(format!("💼 Domaine: {}", domain));
    }
    if let Some(website) = &website {
        content_parts.push(format!("🌐 Site web: {}", website));
    }
    if let Some(email) = &email {
        content_parts.push(format!("📧 Email: {}", email));
    }
    if let Some(phone) = &phone {
        content_parts.push(format!("📞 Téléphone: {}", phone));
    }

    // Remaining non-empty fields become extra labeled lines.
    for (key, value) in obj {
        if CORE_KEYS.contains(&key.as_str()) || value.is_null() {
            continue;
        }
        match value {
            Value::Array(items) if !items.is_empty() => {
                let joined = items
                    .iter()
                    .map(value_to_text)
                    .collect::<Vec<_>>()
                    .join(" | ");
                content_parts.push(format!("{}: {}", title_case(key), joined));
            }
            Value::String(s) if !s.is_empty() => {
                content_parts.push(format!("{}: {}", title_case(key), s));
            }
            _ => {}
        }
    }

    let mut doc = Document::new(SourceType::JuniorEntreprises, filename, content_parts.join("\n"));
    doc.name = Some(name);
    doc.city = city;
    doc.school = school;
    doc.domain = domain;
    doc.website = website;
    doc.email = email;
    if !region.is_empty() {
        doc.region_context = Some(region.to_string());
    }
    Some(doc)
}

fn title_case(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
