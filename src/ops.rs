//! Domain operations over the store. Every mutation is a full
//! load-validate-mutate-save cycle; nothing is cached between calls.

use serde::Serialize;

use crate::calc::{self, Average, SCORE_MAX, SCORE_MIN, WEIGHT_MAX};
use crate::store::{Document, Evaluation, Level, Profile, Store, Subject};

/// A rejected operation: short machine code plus a human-readable reason.
/// Rejections are terminal for the call; nothing is retried.
#[derive(Debug, Clone, Serialize)]
pub struct OpError {
    pub code: &'static str,
    pub message: String,
}

impl OpError {
    pub fn new(code: &'static str, message: impl Into<String>) -> OpError {
        OpError {
            code,
            message: message.into(),
        }
    }
}

fn load(store: &Store) -> Result<Document, OpError> {
    store
        .load()
        .map_err(|e| OpError::new("store_failed", e.to_string()))
}

fn persist(store: &Store, doc: &Document) -> Result<(), OpError> {
    store
        .save(doc)
        .map_err(|e| OpError::new("store_failed", e.to_string()))
}

fn resolve_subject(doc: &Document, subject: Option<&str>) -> String {
    subject
        .map(str::to_string)
        .unwrap_or_else(|| doc.active_subject.clone())
}

pub fn get_profile(store: &Store) -> Result<Profile, OpError> {
    Ok(load(store)?.profile)
}

pub fn set_level(store: &Store, level: Level) -> Result<Level, OpError> {
    let mut doc = load(store)?;
    doc.profile.level = level;
    persist(store, &doc)?;
    Ok(level)
}

pub fn weighting_enabled(store: &Store) -> Result<bool, OpError> {
    Ok(load(store)?.profile.level.weighting_enabled())
}

pub fn list_subjects(store: &Store) -> Result<(Vec<String>, String), OpError> {
    let doc = load(store)?;
    Ok((doc.subject_names(), doc.active_subject))
}

/// Silently ignores unknown names; the active pointer must always refer to
/// an existing subject.
pub fn set_active_subject(store: &Store, name: &str) -> Result<String, OpError> {
    let mut doc = load(store)?;
    if doc.subjects.contains_key(name) {
        doc.active_subject = name.to_string();
        persist(store, &doc)?;
    }
    Ok(doc.active_subject)
}

/// Appends a new empty subject. Does not activate it; that is the
/// caller's decision.
pub fn add_subject(store: &Store, name: &str) -> Result<Vec<String>, OpError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(OpError::new("empty_name", "subject name must not be empty"));
    }
    let mut doc = load(store)?;
    if doc.subjects.contains_key(name) {
        return Err(OpError::new(
            "duplicate_subject",
            format!("subject already exists: {name}"),
        ));
    }
    doc.subjects.insert(name.to_string(), Subject::default());
    persist(store, &doc)?;
    Ok(doc.subject_names())
}

/// Renames in place, keeping the subject's position and evaluations; the
/// active pointer follows a renamed active subject.
pub fn rename_subject(
    store: &Store,
    from: &str,
    to: &str,
) -> Result<(Vec<String>, String), OpError> {
    let from = from.trim();
    let to = to.trim();
    if from.is_empty() || to.is_empty() {
        return Err(OpError::new("empty_name", "subject name must not be empty"));
    }

    let mut doc = load(store)?;
    if !doc.subjects.contains_key(from) {
        return Err(OpError::new(
            "unknown_subject",
            format!("subject not found: {from}"),
        ));
    }
    if doc.subjects.contains_key(to) {
        return Err(OpError::new(
            "duplicate_subject",
            format!("subject already exists: {to}"),
        ));
    }

    if let Some(index) = doc.subjects.get_index_of(from) {
        if let Some((_, subject)) = doc.subjects.shift_remove_index(index) {
            doc.subjects.shift_insert(index, to.to_string(), subject);
        }
    }
    if doc.active_subject == from {
        doc.active_subject = to.to_string();
    }
    persist(store, &doc)?;
    Ok((doc.subject_names(), doc.active_subject))
}

pub fn delete_subject(store: &Store, name: &str) -> Result<(Vec<String>, String), OpError> {
    let name = name.trim();
    let mut doc = load(store)?;
    if !doc.subjects.contains_key(name) {
        return Err(OpError::new(
            "unknown_subject",
            format!("subject not found: {name}"),
        ));
    }
    if doc.subjects.len() <= 1 {
        return Err(OpError::new(
            "last_subject",
            "cannot delete the last remaining subject",
        ));
    }

    doc.subjects.shift_remove(name);
    if doc.active_subject == name {
        if let Some(first) = doc.subjects.keys().next() {
            doc.active_subject = first.clone();
        }
    }
    persist(store, &doc)?;
    Ok((doc.subject_names(), doc.active_subject))
}

/// Evaluations for the given subject, or the active one. An unknown
/// subject reads as empty.
pub fn get_evaluations(
    store: &Store,
    subject: Option<&str>,
) -> Result<(String, Vec<Evaluation>), OpError> {
    let doc = load(store)?;
    let name = resolve_subject(&doc, subject);
    let evaluations = doc
        .subjects
        .get(&name)
        .map(|s| s.evaluations.clone())
        .unwrap_or_default();
    Ok((name, evaluations))
}

/// Validation order: score range, then weighting policy for the current
/// level, then target subject, then weight range.
pub fn add_evaluation(
    store: &Store,
    score: f64,
    weight: Option<f64>,
    subject: Option<&str>,
) -> Result<usize, OpError> {
    if !(SCORE_MIN..=SCORE_MAX).contains(&score) {
        return Err(OpError::new(
            "score_out_of_range",
            format!("score must be between {SCORE_MIN} and {SCORE_MAX}"),
        ));
    }

    let mut doc = load(store)?;
    if weight.is_some() && !doc.profile.level.weighting_enabled() {
        return Err(OpError::new(
            "weighting_disabled",
            format!(
                "level {} does not use weighted evaluations",
                doc.profile.level.as_str()
            ),
        ));
    }

    let name = resolve_subject(&doc, subject);
    let Some(target) = doc.subjects.get_mut(&name) else {
        return Err(OpError::new(
            "unknown_subject",
            format!("subject not found: {name}"),
        ));
    };

    if let Some(w) = weight {
        if !(w > 0.0 && w <= WEIGHT_MAX) {
            return Err(OpError::new(
                "invalid_weight",
                format!("weight must be in (0, {WEIGHT_MAX}]"),
            ));
        }
    }

    target.evaluations.push(Evaluation { score, weight });
    let count = target.evaluations.len();
    persist(store, &doc)?;
    Ok(count)
}

/// Removes the evaluation at `index` (0-based), keeping the order of the
/// rest.
pub fn delete_evaluation(
    store: &Store,
    index: usize,
    subject: Option<&str>,
) -> Result<usize, OpError> {
    let mut doc = load(store)?;
    let name = resolve_subject(&doc, subject);
    let evaluations = doc
        .subjects
        .get_mut(&name)
        .map(|s| &mut s.evaluations)
        .filter(|evs| !evs.is_empty())
        .ok_or_else(|| OpError::new("no_evaluations", "no evaluations to delete"))?;

    if index >= evaluations.len() {
        return Err(OpError::new(
            "index_out_of_range",
            format!("no evaluation at index {index}"),
        ));
    }
    evaluations.remove(index);
    let count = evaluations.len();
    persist(store, &doc)?;
    Ok(count)
}

/// Empties the subject's list. Already-empty and unknown subjects are
/// silent no-ops.
pub fn clear_evaluations(store: &Store, subject: Option<&str>) -> Result<(), OpError> {
    let mut doc = load(store)?;
    let name = resolve_subject(&doc, subject);
    if let Some(target) = doc.subjects.get_mut(&name) {
        target.evaluations.clear();
        persist(store, &doc)?;
    }
    Ok(())
}

pub fn subject_average(store: &Store, subject: Option<&str>) -> Result<Average, OpError> {
    let (_, evaluations) = get_evaluations(store, subject)?;
    Ok(calc::weighted_average(&evaluations))
}

pub fn global_average(store: &Store) -> Result<Average, OpError> {
    let doc = load(store)?;
    Ok(calc::global_average(&doc))
}
