//! Task-level error types.
//!
//! Every failure inside a per-file task is converted to a [`TaskError`]
//! recording the last state the task reached. The orchestrator logs it
//! and moves on to the next file.

use crate::artifact::ArtifactError;
use crate::generate::GenerationError;
use crate::index::IndexError;
use crate::task::TaskState;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    #[error("worker task failed: {0}")]
    Worker(String),
}

#[derive(Debug, thiserror::Error)]
#[error("aborted after {state}: {source}")]
pub struct TaskError {
    pub state: TaskState,
    #[source]
    pub source: PipelineError,
}

impl TaskError {
    pub fn new(state: TaskState, source: impl Into<PipelineError>) -> Self {
        Self {
            state,
            source: source.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_state_and_cause() {
        let err = TaskError::new(
            TaskState::PromptBuilt,
            GenerationError::Status {
                status: 500,
                body: "boom".to_string(),
            },
        );
        let msg = err.to_string();
        assert!(msg.contains("prompt-built"), "{}", msg);
        assert!(msg.contains("500"), "{}", msg);
    }
}
