use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub title: String,
    pub body: String,
    /// Where the page came from, usually its URL.
    pub source: Option<String>,
}

impl Document {
    pub fn new(id: impl Into<String>, title: impl Into<String>, body: impl Into<String>, source: Option<String>) -> Self {
        Self { id: id.into(), title: title.into(), body: body.into(), source }
    }
}

/// Load every page file under `dir` into an ordered corpus.
///
/// Files are visited in path order; `.json` files hold one page object or an
/// array of them, `.jsonl` files hold one object per line. Fields that are
/// missing or not strings become empty rather than rejecting the page. Files
/// that are not valid JSON are logged and skipped.
pub fn load_corpus<P: AsRef<Path>>(dir: P) -> Result<Vec<Document>> {
    let dir = dir.as_ref();
    fs::read_dir(dir).with_context(|| format!("reading data directory {}", dir.display()))?;

    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|p| p.is_file() && matches!(extension(p), Some("json" | "jsonl")))
        .collect();
    files.sort();

    let mut docs = Vec::new();
    for file in &files {
        let text = match fs::read_to_string(file) {
            Ok(t) => t,
            Err(err) => {
                tracing::warn!(file = %file.display(), %err, "skipping unreadable page file");
                continue;
            }
        };
        let stem = file.file_stem().and_then(|s| s.to_str()).unwrap_or("page").to_string();
        if extension(file) == Some("jsonl") {
            read_jsonl(file, &text, &stem, &mut docs);
        } else {
            read_json(file, &text, &stem, &mut docs);
        }
    }

    tracing::info!(dir = %dir.display(), files = files.len(), num_docs = docs.len(), "loaded corpus");
    Ok(docs)
}

fn extension(path: &Path) -> Option<&str> {
    path.extension().and_then(|s| s.to_str())
}

fn read_json(file: &Path, text: &str, stem: &str, docs: &mut Vec<Document>) {
    let json: Value = match serde_json::from_str(text) {
        Ok(v) => v,
        Err(err) => {
            tracing::warn!(file = %file.display(), %err, "skipping malformed page file");
            return;
        }
    };
    match json {
        Value::Array(arr) => {
            for (i, v) in arr.iter().enumerate() {
                push_record(file, v, member_id(stem, i), docs);
            }
        }
        other => push_record(file, &other, stem.to_string(), docs),
    }
}

fn read_jsonl(file: &Path, text: &str, stem: &str, docs: &mut Vec<Document>) {
    let mut n = 0;
    for (line_no, line) in text.lines().enumerate() {
        if line.trim().is_empty() { continue; }
        match serde_json::from_str::<Value>(line) {
            Ok(v) => {
                push_record(file, &v, member_id(stem, n), docs);
                n += 1;
            }
            Err(err) => tracing::warn!(file = %file.display(), line = line_no + 1, %err, "skipping malformed page record"),
        }
    }
}

fn member_id(stem: &str, i: usize) -> String {
    if i == 0 { stem.to_string() } else { format!("{stem}#{i}") }
}

fn push_record(file: &Path, value: &Value, fallback_id: String, docs: &mut Vec<Document>) {
    match document_from_value(value, fallback_id) {
        Some(doc) => docs.push(doc),
        None => tracing::warn!(file = %file.display(), "skipping page record that is not an object"),
    }
}

fn document_from_value(value: &Value, fallback_id: String) -> Option<Document> {
    let obj = value.as_object()?;
    let field = |keys: &[&str]| {
        keys.iter()
            .find_map(|k| obj.get(*k).and_then(Value::as_str))
            .map(str::to_string)
    };
    Some(Document {
        id: field(&["id"]).unwrap_or(fallback_id),
        title: field(&["title"]).unwrap_or_default(),
        body: field(&["text", "body"]).unwrap_or_default(),
        source: field(&["url", "source"]),
    })
}
