//! Core data models used throughout qagen.
//!
//! These types represent the documents, index entries, and generated records
//! that flow through the per-file pipeline.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A PDF discovered in the input directory, plus whatever text was read from it.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub path: PathBuf,
    /// Stable key: the file's base name.
    pub id: String,
    pub text: String,
    pub page_cap: i64,
    pub pages_read: usize,
}

impl SourceDocument {
    pub fn discovered(path: &Path, page_cap: i64) -> Self {
        Self {
            path: path.to_path_buf(),
            id: file_id(path),
            text: String::new(),
            page_cap,
            pages_read: 0,
        }
    }
}

/// Derives the index identifier for a source file from its name.
///
/// Two files with the same base name in different directories share an id.
pub fn file_id(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// An entry in the similarity index.
#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub id: String,
    pub text: String,
    pub vector: Vec<f32>,
}

/// A neighbour returned by a vector store, before flattening to text.
#[derive(Debug, Clone)]
pub struct ScoredEntry {
    pub id: String,
    pub text: String,
    pub score: f32,
}

/// One question/answer training pair, in the shape the prompt asks for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaRecord {
    pub instruction: String,
    pub input: String,
    pub output: String,
    #[serde(default)]
    pub category: Option<String>,
}
