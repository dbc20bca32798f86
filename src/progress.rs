//! Matching progress reporting.
//!
//! Reports observable progress during `lexalign run` so operators see which
//! task is active, how many units are embedded, and how far the comparison
//! has advanced. Progress is emitted on **stderr** so stdout remains
//! parseable for scripts.

use std::io::Write;

/// A single progress event for a mapping run.
#[derive(Clone, Debug)]
pub enum MatchProgressEvent {
    /// A task started loading its inputs.
    Loading { task: String },
    /// Unit texts on one side were embedded. `side` is "source" or "target".
    Embedded { task: String, side: &'static str, count: usize },
    /// Comparison phase: n source units processed out of total.
    Matching { task: String, n: usize, total: usize },
}

/// Reports matching progress. Implementations write to stderr (human or JSON).
pub trait MatchProgressReporter: Send + Sync {
    /// Emit a progress event. Called from the task driver and matcher.
    fn report(&self, event: MatchProgressEvent);
}

/// Human-friendly progress on stderr: "match articles  34 / 120 units".
pub struct StderrProgress;

impl MatchProgressReporter for StderrProgress {
    fn report(&self, event: MatchProgressEvent) {
        let line = match &event {
            MatchProgressEvent::Loading { task } => format!("task {}  loading...\n", task),
            MatchProgressEvent::Embedded { task, side, count } => {
                format!("task {}  embedded {} {} texts\n", task, count, side)
            }
            MatchProgressEvent::Matching { task, n, total } => {
                format!("task {}  matching  {} / {} units\n", task, n, total)
            }
        };
        let _ = std::io::stderr().lock().write_all(line.as_bytes());
        let _ = std::io::stderr().lock().flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl MatchProgressReporter for JsonProgress {
    fn report(&self, event: MatchProgressEvent) {
        let obj = match &event {
            MatchProgressEvent::Loading { task } => serde_json::json!({
                "event": "progress",
                "task": task,
                "phase": "loading"
            }),
            MatchProgressEvent::Embedded { task, side, count } => serde_json::json!({
                "event": "progress",
                "task": task,
                "phase": "embedding",
                "side": side,
                "count": count
            }),
            MatchProgressEvent::Matching { task, n, total } => serde_json::json!({
                "event": "progress",
                "task": task,
                "phase": "matching",
                "n": n,
                "total": total
            }),
        };
        if let Ok(line) = serde_json::to_string(&obj) {
            let _ = writeln!(std::io::stderr().lock(), "{}", line);
            let _ = std::io::stderr().lock().flush();
        }
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl MatchProgressReporter for NoProgress {
    fn report(&self, _event: MatchProgressEvent) {}
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    /// Parse a `--progress` flag value.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "off" => Some(ProgressMode::Off),
            "human" => Some(ProgressMode::Human),
            "json" => Some(ProgressMode::Json),
            _ => None,
        }
    }

    /// Build a reporter for this mode. Caller passes it to the task driver.
    pub fn reporter(&self) -> Box<dyn MatchProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}
