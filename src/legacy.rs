use serde_json::Value;

use crate::calc;
use crate::store::{Document, Evaluation, DEFAULT_SUBJECTS};

/// Version literal of the retired flat-list format.
pub const LEGACY_VERSION: &str = "1.1";

/// Migrated legacy scores all land in this seed subject.
pub const MIGRATION_TARGET_SUBJECT: &str = DEFAULT_SUBJECTS[0];

/// The legacy file was a bare list of raw score values under `notas`.
pub fn is_legacy(raw: &Value) -> bool {
    raw.get("version").and_then(Value::as_str) == Some(LEGACY_VERSION)
        && raw.get("notas").map(Value::is_array).unwrap_or(false)
}

/// One-shot migration to the current format: seed a default document,
/// keep every legacy value that parses as an in-range score (unweighted),
/// drop the rest silently, and activate the target subject.
pub fn migrate(raw: &Value) -> Document {
    let mut doc = Document::default_seed();

    let mut evaluations: Vec<Evaluation> = Vec::new();
    if let Some(values) = raw.get("notas").and_then(Value::as_array) {
        for value in values {
            let text = match value {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                _ => continue,
            };
            if let Some(score) = calc::parse_score(&text) {
                evaluations.push(Evaluation {
                    score,
                    weight: None,
                });
            }
        }
    }
    let dropped = raw
        .get("notas")
        .and_then(Value::as_array)
        .map(|v| v.len() - evaluations.len())
        .unwrap_or(0);
    if dropped > 0 {
        log::warn!("legacy migration dropped {dropped} unparseable score(s)");
    }

    if let Some(subject) = doc.subjects.get_mut(MIGRATION_TARGET_SUBJECT) {
        subject.evaluations = evaluations;
    }
    doc.active_subject = MIGRATION_TARGET_SUBJECT.to_string();
    doc
}
