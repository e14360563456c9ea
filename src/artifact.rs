//! Output artifacts: one JSON file per processed source document.
//!
//! The file for `paper.pdf` is `<output_dir>/paper.pdf.json`. What goes
//! inside depends on [`ArtifactFormat`].

use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::models::QaRecord;

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("model response is not a list of Q&A records: {0}")]
    Invalid(String),

    #[error("JSON encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}

/// How model text becomes file content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactFormat {
    /// The text encoded as one JSON string.
    String,
    /// The text written verbatim.
    Raw,
    /// The text parsed as `[QaRecord]` and re-emitted pretty-printed.
    Validated,
}

impl FromStr for ArtifactFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "string" => Ok(ArtifactFormat::String),
            "raw" => Ok(ArtifactFormat::Raw),
            "validated" => Ok(ArtifactFormat::Validated),
            other => Err(format!("unknown artifact format: '{}'", other)),
        }
    }
}

/// `<output_dir>/<source base name>.json`
pub fn artifact_path(output_dir: &Path, source: &Path) -> PathBuf {
    let base = source
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    output_dir.join(format!("{}.json", base))
}

pub fn render_artifact(text: &str, format: ArtifactFormat) -> Result<String, ArtifactError> {
    match format {
        ArtifactFormat::String => Ok(serde_json::to_string(text)?),
        ArtifactFormat::Raw => Ok(text.to_string()),
        ArtifactFormat::Validated => {
            let records = parse_records(text)?;
            Ok(serde_json::to_string_pretty(&records)?)
        }
    }
}

/// Parses model output as a list of records, tolerating Markdown code
/// fences and prose around the outermost JSON array.
pub fn parse_records(text: &str) -> Result<Vec<QaRecord>, ArtifactError> {
    let trimmed = strip_code_fence(text.trim());
    let candidate = match (trimmed.find('['), trimmed.rfind(']')) {
        (Some(start), Some(end)) if start < end => &trimmed[start..=end],
        _ => trimmed,
    };
    serde_json::from_str(candidate).map_err(|e| ArtifactError::Invalid(e.to_string()))
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the info string (e.g. "json") on the opening fence line.
    let body = rest.split_once('\n').map(|(_, b)| b).unwrap_or("");
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Writes `body` to the artifact path for `source`, creating `output_dir`
/// if needed. An existing artifact is overwritten.
pub async fn write_artifact(
    output_dir: &Path,
    source: &Path,
    body: &str,
) -> Result<PathBuf, ArtifactError> {
    tokio::fs::create_dir_all(output_dir)
        .await
        .map_err(|e| ArtifactError::Write {
            path: output_dir.to_path_buf(),
            source: e,
        })?;

    let path = artifact_path(output_dir, source);
    tokio::fs::write(&path, body)
        .await
        .map_err(|e| ArtifactError::Write {
            path: path.clone(),
            source: e,
        })?;
    Ok(path)
}
