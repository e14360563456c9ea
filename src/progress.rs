//! Batch progress reporting.
//!
//! `qagen run` reports how many PDFs were found and each file as it
//! finishes. Progress goes to **stderr** so the summary on stdout stays
//! parseable; the log file is unaffected.

use std::io::Write;

use serde::Serialize;

/// A single progress event for a batch run.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum BatchProgressEvent {
    /// Discovery finished; `total` files will be dispatched.
    Discovered { total: u64 },
    /// The `n`th file reached a terminal state (`persisted`, `skipped`, `aborted`).
    Completed {
        file: String,
        outcome: &'static str,
        #[serde(skip_serializing_if = "Option::is_none")]
        artifact: Option<String>,
        n: u64,
        total: u64,
    },
}

/// Receives progress events from the orchestrator as tasks complete.
pub trait BatchProgressReporter: Send + Sync {
    fn report(&self, event: BatchProgressEvent);
}

/// Human-friendly progress on stderr: "run  [ 40%]  4 / 10 files  paper.pdf persisted".
pub struct StderrProgress;

impl BatchProgressReporter for StderrProgress {
    fn report(&self, event: BatchProgressEvent) {
        let mut stderr = std::io::stderr().lock();
        let _ = writeln!(stderr, "{}", human_line(&event));
        let _ = stderr.flush();
    }
}

fn human_line(event: &BatchProgressEvent) -> String {
    match event {
        BatchProgressEvent::Discovered { total } => {
            format!("run  found {} PDF files", format_number(*total))
        }
        BatchProgressEvent::Completed {
            file,
            outcome,
            artifact,
            n,
            total,
        } => {
            let pct = if *total == 0 { 100 } else { n * 100 / total };
            let mut line = format!(
                "run  [{:>3}%]  {} / {} files  {} {}",
                pct,
                format_number(*n),
                format_number(*total),
                file,
                outcome
            );
            if let Some(artifact) = artifact {
                line.push_str(" -> ");
                line.push_str(artifact);
            }
            line
        }
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl BatchProgressReporter for JsonProgress {
    fn report(&self, event: BatchProgressEvent) {
        if let Some(line) = json_line(&event) {
            let mut stderr = std::io::stderr().lock();
            let _ = writeln!(stderr, "{}", line);
            let _ = stderr.flush();
        }
    }
}

#[derive(Serialize)]
struct JsonEvent<'a> {
    event: &'static str,
    #[serde(flatten)]
    inner: &'a BatchProgressEvent,
}

fn json_line(event: &BatchProgressEvent) -> Option<String> {
    serde_json::to_string(&JsonEvent {
        event: "progress",
        inner: event,
    })
    .ok()
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl BatchProgressReporter for NoProgress {
    fn report(&self, _event: BatchProgressEvent) {}
}

/// `1234567` -> `"1,234,567"`
fn format_number(n: u64) -> String {
    let digits = n.to_string();
    let head = digits.len() % 3;
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (i + 3 - head) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    pub fn reporter(&self) -> Box<dyn BatchProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}
