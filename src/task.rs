//! The per-file unit of work.
//!
//! ```text
//! Discovered ─▶ Extracted ─▶ Indexed ─▶ PromptBuilt ─▶ Generated ─▶ Persisted
//!     │             │           │            │             │
//!     └──────┬──────┴───────────┴────────────┴─────────────┘
//!            ▼
//!     Skipped (no text)  /  Aborted (TaskError)
//! ```
//!
//! Tasks share nothing but the [`SimilarityIndex`] and the generator,
//! both handed in explicitly through [`PipelineContext`].

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::artifact::{self, ArtifactFormat};
use crate::config::Config;
use crate::error::{PipelineError, TaskError};
use crate::extract;
use crate::generate::{ChatClient, Generator};
use crate::index::{self, SimilarityIndex};
use crate::prompt::build_prompt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Discovered,
    Extracted,
    Indexed,
    PromptBuilt,
    Generated,
    Persisted,
    Skipped,
    Aborted,
}

impl TaskState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskState::Discovered => "discovered",
            TaskState::Extracted => "extracted",
            TaskState::Indexed => "indexed",
            TaskState::PromptBuilt => "prompt-built",
            TaskState::Generated => "generated",
            TaskState::Persisted => "persisted",
            TaskState::Skipped => "skipped",
            TaskState::Aborted => "aborted",
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The extractor failed; the error is already logged.
    ExtractionFailed,
    /// The document produced no text and empty documents are skipped.
    EmptyText,
}

/// Terminal result of a task that did not abort.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Persisted {
        artifact: PathBuf,
        pages_read: usize,
        similar: usize,
    },
    Skipped(SkipReason),
}

impl TaskOutcome {
    pub fn state(&self) -> TaskState {
        match self {
            TaskOutcome::Persisted { .. } => TaskState::Persisted,
            TaskOutcome::Skipped(_) => TaskState::Skipped,
        }
    }
}

/// Per-task knobs taken from `[pipeline]`.
#[derive(Debug, Clone)]
pub struct TaskSettings {
    pub output_dir: PathBuf,
    pub pool_size: usize,
    pub question_count: usize,
    pub similar_k: usize,
    pub skip_empty_text: bool,
    pub artifact_format: ArtifactFormat,
}

impl TaskSettings {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let p = &config.pipeline;
        Ok(Self {
            output_dir: p.output_dir.clone(),
            pool_size: p.pool_size.max(1),
            question_count: p.question_count,
            similar_k: p.similar_k,
            skip_empty_text: p.skip_empty_text,
            artifact_format: p
                .artifact_format
                .parse()
                .map_err(|e: String| anyhow::anyhow!(e))?,
        })
    }
}

/// Handles every task needs, set up once per run.
pub struct PipelineContext {
    pub index: SimilarityIndex,
    pub generator: Arc<dyn Generator>,
    pub settings: TaskSettings,
}

impl PipelineContext {
    /// Runs the one-time index setup and builds the generation client.
    pub async fn from_config(config: &Config) -> anyhow::Result<Self> {
        let settings = TaskSettings::from_config(config)?;
        let index = index::setup(&config.index, &config.embedding).await?;
        let client = ChatClient::new(&config.generation)?;
        info!(
            "Generating with {} at {}",
            client.model(),
            config.generation.endpoint_url
        );
        let generator = Arc::new(client);
        Ok(Self {
            index,
            generator,
            settings,
        })
    }
}

/// Processes one PDF end to end.
///
/// Returns `Err` only for aborts; the caller logs them. Extraction
/// failures are logged by the extractor and reported as skips.
pub async fn process_file(
    ctx: &PipelineContext,
    path: &Path,
    page_cap: i64,
) -> Result<TaskOutcome, TaskError> {
    info!("Processing file: {}", path.display());
    let settings = &ctx.settings;
    let mut state = TaskState::Discovered;

    let owned = path.to_path_buf();
    let (doc, extracted) =
        tokio::task::spawn_blocking(move || extract::extract_or_empty(&owned, page_cap))
            .await
            .map_err(|e| TaskError::new(state, PipelineError::Worker(e.to_string())))?;

    if !extracted {
        return Ok(TaskOutcome::Skipped(SkipReason::ExtractionFailed));
    }
    if doc.text.is_empty() && settings.skip_empty_text {
        info!("No text extracted from {}, skipping", path.display());
        return Ok(TaskOutcome::Skipped(SkipReason::EmptyText));
    }
    state = TaskState::Extracted;
    debug!("{} -> {}", doc.id, state);

    ctx.index
        .upsert(&doc.id, &doc.text)
        .await
        .map_err(|e| TaskError::new(state, e))?;
    let similar = ctx
        .index
        .query(&doc.text, settings.similar_k)
        .await
        .map_err(|e| TaskError::new(state, e))?;
    state = TaskState::Indexed;
    debug!("{} -> {} ({} similar)", doc.id, state, similar.len());

    let prompt = build_prompt(&doc.text, &similar, settings.question_count);
    state = TaskState::PromptBuilt;
    debug!("{} -> {} ({} bytes)", doc.id, state, prompt.len());

    let generated = ctx
        .generator
        .generate(&prompt)
        .await
        .map_err(|e| TaskError::new(state, e))?;
    state = TaskState::Generated;
    debug!("{} -> {}", doc.id, state);

    let body = artifact::render_artifact(&generated, settings.artifact_format)
        .map_err(|e| TaskError::new(state, e))?;
    let artifact = artifact::write_artifact(&settings.output_dir, path, &body)
        .await
        .map_err(|e| TaskError::new(state, e))?;
    info!("Saved questions to {}", artifact.display());

    Ok(TaskOutcome::Persisted {
        artifact,
        pages_read: doc.pages_read,
        similar: similar.len(),
    })
}
