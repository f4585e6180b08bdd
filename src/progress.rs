#![forbid(unsafe_code)]

//! Coarse progress notifications emitted by an export run.
//!
//! The pipeline calls [`ProgressSink::report`] after each stage step and never
//! waits on the sink. [`ProgressWriter`] persists the latest notification as a
//! small JSON document so another process can poll it.

use std::fmt;
use std::fs;
use std::path::PathBuf;

use log::warn;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Resolve,
    Enumerate,
    Details,
    Write,
}

impl Stage {
    pub fn name(self) -> &'static str {
        match self {
            Stage::Resolve => "resolve",
            Stage::Enumerate => "enumerate",
            Stage::Details => "details",
            Stage::Write => "write",
        }
    }

    /// Share of the overall run, as `(start, end)` percentages.
    fn span(self) -> (u8, u8) {
        match self {
            Stage::Resolve => (0, 10),
            Stage::Enumerate => (10, 40),
            Stage::Details => (40, 90),
            Stage::Write => (90, 100),
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub trait ProgressSink {
    fn report(&mut self, stage: Stage, current: usize, total: usize);
}

impl<F> ProgressSink for F
where
    F: FnMut(Stage, usize, usize),
{
    fn report(&mut self, stage: Stage, current: usize, total: usize) {
        self(stage, current, total)
    }
}

/// Sink that drops every notification.
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&mut self, _stage: Stage, _current: usize, _total: usize) {}
}

/// Maps a stage step onto a 0-100 overall percentage.
pub fn overall_percent(stage: Stage, current: usize, total: usize) -> u8 {
    let (start, end) = stage.span();
    if total == 0 {
        return end;
    }
    let fraction = current.min(total) as f64 / total as f64;
    let value = f64::from(start) + fraction * f64::from(end - start);
    value.round().clamp(0.0, 100.0) as u8
}

pub fn describe(stage: Stage, current: usize, total: usize) -> String {
    match stage {
        Stage::Resolve => "Finding channel".to_string(),
        Stage::Enumerate => format!("Listing videos ({current}/{total})"),
        Stage::Details => format!("Processing batch {current}/{total}"),
        Stage::Write => format!("Writing CSV ({current}/{total} rows)"),
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProgressReport<'a> {
    stage: Stage,
    current: usize,
    total: usize,
    progress: u8,
    message: &'a str,
}

/// Writes the most recent notification to `path`, replacing it atomically.
#[derive(Clone)]
pub struct ProgressWriter {
    path: PathBuf,
}

impl ProgressWriter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn write(&self, stage: Stage, current: usize, total: usize) {
        let message = describe(stage, current, total);
        let report = ProgressReport {
            stage,
            current,
            total,
            progress: overall_percent(stage, current, total),
            message: &message,
        };

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
            && let Err(err) = fs::create_dir_all(parent)
        {
            warn!("could not create progress dir: {err}");
            return;
        }

        let tmp_path = self.path.with_extension("tmp");
        match serde_json::to_vec(&report) {
            Ok(payload) => {
                if let Err(err) = fs::write(&tmp_path, payload) {
                    warn!("could not write progress file: {err}");
                    return;
                }
                if let Err(err) = fs::rename(&tmp_path, &self.path) {
                    warn!("could not finalize progress file: {err}");
                }
            }
            Err(err) => {
                warn!("could not serialize progress report: {err}");
            }
        }
    }
}

impl ProgressSink for ProgressWriter {
    fn report(&mut self, stage: Stage, current: usize, total: usize) {
        self.write(stage, current, total);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use tempfile::tempdir;

    #[test]
    fn overall_percent_spans_stages() {
        assert_eq!(overall_percent(Stage::Resolve, 0, 1), 0);
        assert_eq!(overall_percent(Stage::Resolve, 1, 1), 10);
        assert_eq!(overall_percent(Stage::Details, 1, 2), 65);
        assert_eq!(overall_percent(Stage::Details, 5, 2), 90);
        assert_eq!(overall_percent(Stage::Write, 0, 0), 100);
    }

    #[test]
    fn closures_are_sinks() {
        let mut seen = Vec::new();
        {
            let mut sink = |stage: Stage, current: usize, total: usize| {
                seen.push((stage, current, total));
            };
            sink.report(Stage::Details, 3, 10);
        }
        assert_eq!(seen, vec![(Stage::Details, 3, 10)]);
    }

    #[test]
    fn progress_writer_replaces_file_contents() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state").join("progress.json");
        let mut writer = ProgressWriter::new(path.clone());

        writer.report(Stage::Enumerate, 50, 200);
        writer.report(Stage::Details, 3, 10);

        let value: Value = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        assert_eq!(value["stage"], "details");
        assert_eq!(value["current"], 3);
        assert_eq!(value["total"], 10);
        assert_eq!(value["progress"], 55);
        assert_eq!(value["message"], "Processing batch 3/10");
        assert!(!path.with_extension("tmp").exists());
    }
}
