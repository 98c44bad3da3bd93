use anyhow::Context;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Version literal of the current on-disk document format.
pub const SCHEMA_VERSION: &str = "1.2";

pub const DEFAULT_PROFILE_NAME: &str = "Principal";
pub const DEFAULT_SUBJECTS: [&str; 5] =
    ["Matemática", "Lenguaje", "Historia", "Ciencias", "Inglés"];

pub const DATA_FILE_NAME: &str = "data.json";
const APP_DIR_NAME: &str = "notasd";

/// Grading mode. Weighted evaluations are only permitted for the
/// university-style levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Level {
    Escolar,
    Universidad,
    Postgrado,
}

impl Level {
    pub fn parse(s: &str) -> Option<Level> {
        match s {
            "Escolar" => Some(Level::Escolar),
            "Universidad" => Some(Level::Universidad),
            "Postgrado" => Some(Level::Postgrado),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Level::Escolar => "Escolar",
            Level::Universidad => "Universidad",
            Level::Postgrado => "Postgrado",
        }
    }

    pub fn weighting_enabled(self) -> bool {
        matches!(self, Level::Universidad | Level::Postgrado)
    }
}

impl Default for Level {
    fn default() -> Level {
        Level::Escolar
    }
}

/// One recorded score. The weight, when present, is a percentage in
/// (0, 100]; it is omitted from the file entirely when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    #[serde(rename = "nota")]
    pub score: f64,
    #[serde(rename = "peso", default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    #[serde(rename = "evaluaciones")]
    pub evaluations: Vec<Evaluation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "nivel")]
    pub level: Level,
}

/// The whole persisted document. Subject iteration order is insertion
/// order; "first remaining subject" fallbacks depend on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub version: String,
    #[serde(rename = "perfil")]
    pub profile: Profile,
    #[serde(rename = "ramos")]
    pub subjects: IndexMap<String, Subject>,
    #[serde(rename = "ramo_activo")]
    pub active_subject: String,
}

impl Document {
    pub fn default_seed() -> Document {
        Document {
            version: SCHEMA_VERSION.to_string(),
            profile: Profile {
                name: DEFAULT_PROFILE_NAME.to_string(),
                level: Level::default(),
            },
            subjects: DEFAULT_SUBJECTS
                .iter()
                .map(|name| (name.to_string(), Subject::default()))
                .collect(),
            active_subject: DEFAULT_SUBJECTS[0].to_string(),
        }
    }

    pub fn subject_names(&self) -> Vec<String> {
        self.subjects.keys().cloned().collect()
    }
}

/// Durable storage for the document. Owns the data file path; every load
/// re-reads the file and every save rewrites it whole.
pub struct Store {
    path: PathBuf,
}

impl Store {
    /// Store backed by `<data_dir>/data.json`.
    pub fn new(data_dir: &Path) -> Store {
        Store {
            path: data_dir.join(DATA_FILE_NAME),
        }
    }

    /// Store at the per-user platform location, creating the directory if
    /// needed. `NOTASD_DATA_DIR` overrides the resolved directory.
    pub fn open_default() -> anyhow::Result<Store> {
        let dir = default_data_dir()?;
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create data directory {}", dir.display()))?;
        Ok(Store::new(&dir))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the current document, repairing or replacing whatever is on
    /// disk. Never fails on bad content, only on filesystem errors while
    /// writing the recovered document back.
    pub fn load(&self) -> anyhow::Result<Document> {
        if !self.path.exists() {
            let doc = Document::default_seed();
            self.write_atomic(&doc)?;
            log::info!("created fresh data file at {}", self.path.display());
            return Ok(doc);
        }

        let raw: Value = match std::fs::read_to_string(&self.path)
            .ok()
            .and_then(|text| serde_json::from_str(&text).ok())
        {
            Some(v) => v,
            None => {
                // Unreadable or not valid JSON. Start over; no backup is kept.
                let doc = Document::default_seed();
                self.write_atomic(&doc)?;
                log::warn!(
                    "data file {} was unreadable, replaced with defaults",
                    self.path.display()
                );
                return Ok(doc);
            }
        };

        if crate::legacy::is_legacy(&raw) {
            let doc = crate::legacy::migrate(&raw);
            self.write_atomic(&doc)?;
            log::info!("migrated legacy data file {}", self.path.display());
            return Ok(doc);
        }

        let (doc, changed) = normalize(&raw);
        if changed {
            self.write_atomic(&doc)?;
            log::warn!("normalized data file {} on load", self.path.display());
        }
        Ok(doc)
    }

    /// Normalizes and persists the document atomically.
    pub fn save(&self, doc: &Document) -> anyhow::Result<()> {
        let raw = serde_json::to_value(doc).context("failed to serialize document")?;
        let (doc, _) = normalize(&raw);
        self.write_atomic(&doc)
    }

    // Write to a sibling temp file, then rename over the target, so a crash
    // mid-write never leaves a partial file visible.
    fn write_atomic(&self, doc: &Document) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create data directory {}", parent.display())
            })?;
        }
        let tmp = self.path.with_extension("tmp");
        let text =
            serde_json::to_string_pretty(doc).context("failed to serialize document")?;
        std::fs::write(&tmp, text)
            .with_context(|| format!("failed to write {}", tmp.display()))?;
        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("failed to replace {}", self.path.display()))?;
        Ok(())
    }
}

fn default_data_dir() -> anyhow::Result<PathBuf> {
    if let Some(dir) = std::env::var_os("NOTASD_DATA_DIR") {
        return Ok(PathBuf::from(dir));
    }
    let base = dirs::data_local_dir()
        .or_else(dirs::home_dir)
        .context("no writable per-user data directory found")?;
    Ok(base.join(APP_DIR_NAME))
}

/// Repairs arbitrary parsed JSON into a valid document. Idempotent; the
/// `changed` flag reports whether the normalized form differs from the
/// input, so callers can skip redundant writes.
pub fn normalize(raw: &Value) -> (Document, bool) {
    let doc = normalized_document(raw);
    let changed = serde_json::to_value(&doc)
        .map(|v| v != *raw)
        .unwrap_or(true);
    (doc, changed)
}

fn normalized_document(raw: &Value) -> Document {
    let Some(obj) = raw.as_object() else {
        return Document::default_seed();
    };
    if obj.get("version").and_then(Value::as_str) != Some(SCHEMA_VERSION) {
        return Document::default_seed();
    }

    // Profile fields are repaired independently.
    let profile_obj = obj.get("perfil").and_then(Value::as_object);
    let profile = Profile {
        name: profile_obj
            .and_then(|p| p.get("nombre"))
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_PROFILE_NAME)
            .to_string(),
        level: profile_obj
            .and_then(|p| p.get("nivel"))
            .and_then(Value::as_str)
            .and_then(Level::parse)
            .unwrap_or_default(),
    };

    let mut subjects: IndexMap<String, Subject> = IndexMap::new();
    if let Some(map) = obj.get("ramos").and_then(Value::as_object) {
        for (name, entry) in map {
            // Non-object subject records are dropped wholesale.
            let Some(record) = entry.as_object() else {
                continue;
            };
            let evaluations = record
                .get("evaluaciones")
                .and_then(Value::as_array)
                .map(|list| list.iter().filter_map(clean_evaluation).collect())
                .unwrap_or_default();
            subjects.insert(name.clone(), Subject { evaluations });
        }
    }

    // A document must always carry at least one subject. Deleted or renamed
    // seed subjects are left alone; only an unusable map is reseeded.
    if subjects.is_empty() {
        subjects = DEFAULT_SUBJECTS
            .iter()
            .map(|name| (name.to_string(), Subject::default()))
            .collect();
    }

    let active_subject = match obj.get("ramo_activo").and_then(Value::as_str) {
        Some(name) if subjects.contains_key(name) => name.to_string(),
        _ => subjects
            .keys()
            .next()
            .cloned()
            .unwrap_or_else(|| DEFAULT_SUBJECTS[0].to_string()),
    };

    Document {
        version: SCHEMA_VERSION.to_string(),
        profile,
        subjects,
        active_subject,
    }
}

// An entry must be an object with an in-range numeric score, else it is
// dropped. An out-of-range or malformed weight only loses the weight.
fn clean_evaluation(raw: &Value) -> Option<Evaluation> {
    let obj = raw.as_object()?;
    let score = numeric(obj.get("nota")?)?;
    if !(crate::calc::SCORE_MIN..=crate::calc::SCORE_MAX).contains(&score) {
        return None;
    }
    let weight = obj
        .get("peso")
        .and_then(numeric)
        .filter(|w| *w > 0.0 && *w <= crate::calc::WEIGHT_MAX);
    Some(Evaluation { score, weight })
}

// Legacy files stored some numbers as strings; accept both.
fn numeric(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}
