//! Batch orchestration.
//!
//! Lists the PDFs in one directory and runs a [`process_file`] task for
//! each on a bounded pool. Tasks are collected in completion order; a
//! task that aborts or panics is logged and counted, and never stops the
//! others.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;
use walkdir::WalkDir;

use crate::config::Config;
use crate::error::TaskError;
use crate::models::file_id;
use crate::progress::{BatchProgressEvent, BatchProgressReporter};
use crate::task::{process_file, PipelineContext, TaskOutcome, TaskState};

/// Counts for one batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub discovered: usize,
    pub persisted: usize,
    pub skipped: usize,
    pub aborted: usize,
}

impl BatchSummary {
    fn record(&mut self, state: TaskState) {
        match state {
            TaskState::Persisted => self.persisted += 1,
            TaskState::Skipped => self.skipped += 1,
            _ => self.aborted += 1,
        }
    }

    pub fn completed(&self) -> usize {
        self.persisted + self.skipped + self.aborted
    }
}

/// Regular files directly inside `dir` whose name ends in `.pdf`, sorted.
pub fn discover_pdfs(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        bail!("Input directory not found: {}", dir.display());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).follow_links(true) {
        let entry = entry.with_context(|| format!("Failed to list {}", dir.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        if entry.file_name().to_string_lossy().ends_with(".pdf") {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

/// Processes every PDF in `dir` with at most `pool_size` tasks in flight.
///
/// Only a failure to list `dir` is returned as an error; per-file
/// failures end up in the summary and the log.
pub async fn run_batch(
    ctx: Arc<PipelineContext>,
    dir: &Path,
    page_cap: i64,
    progress: &dyn BatchProgressReporter,
) -> Result<BatchSummary> {
    let run_id = Uuid::new_v4();
    let span = info_span!("batch", %run_id);
    dispatch(ctx, dir, page_cap, progress).instrument(span).await
}

async fn dispatch(
    ctx: Arc<PipelineContext>,
    dir: &Path,
    page_cap: i64,
    progress: &dyn BatchProgressReporter,
) -> Result<BatchSummary> {
    let files = discover_pdfs(dir)?;
    let total = files.len();
    info!(
        "Found {} PDF files in {} (pool size {}, page cap {})",
        total,
        dir.display(),
        ctx.settings.pool_size,
        page_cap
    );
    progress.report(BatchProgressEvent::Discovered {
        total: total as u64,
    });

    let semaphore = Arc::new(Semaphore::new(ctx.settings.pool_size.max(1)));
    let mut tasks = JoinSet::new();

    for path in files {
        let ctx = ctx.clone();
        let semaphore = semaphore.clone();
        tasks.spawn(
            async move {
                let finished = match semaphore.acquire_owned().await {
                    Ok(_permit) => run_isolated(ctx, path.clone(), page_cap).await,
                    Err(e) => Finished::Crashed(e.to_string()),
                };
                (path, finished)
            }
            .in_current_span(),
        );
    }

    let mut summary = BatchSummary {
        discovered: total,
        ..Default::default()
    };

    while let Some(joined) = tasks.join_next().await {
        let (file, state, artifact) = match joined {
            Ok((path, Finished::Completed(outcome))) => {
                let artifact = match &outcome {
                    TaskOutcome::Persisted {
                        artifact,
                        pages_read,
                        similar,
                    } => {
                        info!(
                            "Finished {}: {} pages read, {} similar documents, wrote {}",
                            path.display(),
                            pages_read,
                            similar,
                            artifact.display()
                        );
                        Some(artifact.display().to_string())
                    }
                    TaskOutcome::Skipped(_) => None,
                };
                (file_id(&path), outcome.state(), artifact)
            }
            Ok((path, Finished::Aborted(err))) => {
                error!("File processing failed for {}: {}", path.display(), err);
                (file_id(&path), TaskState::Aborted, None)
            }
            Ok((path, Finished::Crashed(reason))) => {
                error!("Worker crashed while processing {}: {}", path.display(), reason);
                (file_id(&path), TaskState::Aborted, None)
            }
            Err(e) => {
                error!("Worker task failed: {}", e);
                (String::from("<unknown>"), TaskState::Aborted, None)
            }
        };
        summary.record(state);
        progress.report(BatchProgressEvent::Completed {
            file,
            outcome: state.as_str(),
            artifact,
            n: summary.completed() as u64,
            total: total as u64,
        });
    }

    info!(
        "Batch complete: {} discovered, {} persisted, {} skipped, {} aborted",
        summary.discovered, summary.persisted, summary.skipped, summary.aborted
    );
    Ok(summary)
}

/// How one dispatched file ended.
enum Finished {
    Completed(TaskOutcome),
    Aborted(TaskError),
    /// The worker itself died (panic or cancellation), so no task state is known.
    Crashed(String),
}

/// Runs one task on its own tokio task so a panic stays inside it.
async fn run_isolated(ctx: Arc<PipelineContext>, path: PathBuf, page_cap: i64) -> Finished {
    let handle =
        tokio::spawn(async move { process_file(&ctx, &path, page_cap).await }.in_current_span());
    match handle.await {
        Ok(Ok(outcome)) => Finished::Completed(outcome),
        Ok(Err(err)) => Finished::Aborted(err),
        Err(e) => Finished::Crashed(e.to_string()),
    }
}

/// Sets up the index and generator from `config`, then runs the batch.
pub async fn run(
    config: &Config,
    dir: &Path,
    page_cap: i64,
    progress: &dyn BatchProgressReporter,
) -> Result<BatchSummary> {
    let ctx = Arc::new(PipelineContext::from_config(config).await?);
    run_batch(ctx, dir, page_cap, progress).await
}
