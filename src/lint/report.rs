//! Lint verdicts and the diagnostic transcript sink.

use std::path::Path;

/// Soft, per-rule verdict. Findings accumulate; they never abort a run.
///
/// This type is deliberately separate from the fatal `anyhow::Error`
/// channel so a tool failure can't be demoted into a finding or a finding
/// promoted into an abort.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LintStatus {
    Ok,
    ErrorDetected,
}

impl LintStatus {
    /// Contribution of this verdict to a run's error count.
    pub fn errors(self) -> usize {
        match self {
            LintStatus::Ok => 0,
            LintStatus::ErrorDetected => 1,
        }
    }
}

/// Fold a sequence of verdicts into a run-local error count.
pub fn total_errors(statuses: impl IntoIterator<Item = LintStatus>) -> usize {
    statuses.into_iter().map(LintStatus::errors).sum()
}

enum Sink {
    Stderr { color: bool },
    Buffer(Vec<String>),
}

/// Append-only diagnostic transcript.
///
/// Rules emit lines as they run so the report reads top to bottom in rule
/// order; the buffered form lets tests assert on the transcript without
/// touching stderr.
pub struct Reporter {
    sink: Sink,
}

impl Reporter {
    /// Reporter writing to stderr, optionally with ANSI color.
    pub fn stderr(color: bool) -> Self {
        Reporter {
            sink: Sink::Stderr { color },
        }
    }

    /// Reporter collecting lines in memory.
    pub fn buffered() -> Self {
        Reporter {
            sink: Sink::Buffer(Vec::new()),
        }
    }

    fn emit(&mut self, line: String) {
        match &mut self.sink {
            Sink::Stderr { .. } => eprintln!("{}", line),
            Sink::Buffer(lines) => lines.push(line),
        }
    }

    /// A policy-violation line (yellow).
    pub fn warn(&mut self, message: impl AsRef<str>) {
        let line = match self.sink {
            Sink::Stderr { color: true } => {
                format!("\x1b[1;33mwarning\x1b[0m: {}", message.as_ref())
            }
            _ => format!("warning: {}", message.as_ref()),
        };
        self.emit(line);
    }

    /// The final rejection line (red).
    pub fn error(&mut self, message: impl AsRef<str>) {
        let line = match self.sink {
            Sink::Stderr { color: true } => {
                format!("\x1b[1;31merror\x1b[0m: {}", message.as_ref())
            }
            _ => format!("error: {}", message.as_ref()),
        };
        self.emit(line);
    }

    /// An unstyled transcript line (status banners, remediation snippets).
    pub fn plain(&mut self, message: impl AsRef<str>) {
        self.emit(message.as_ref().to_string());
    }

    /// An indented, blank-line-delimited file list.
    ///
    /// Callers pass already-sorted paths; the scanner sorts its results, so
    /// the printed list is deterministic.
    pub fn file_list<P: AsRef<Path>>(&mut self, paths: &[P]) {
        self.emit(String::new());
        for path in paths {
            self.emit(format!("    {}", path.as_ref().display()));
        }
        self.emit(String::new());
    }

    /// Transcript lines collected so far (buffered reporters only).
    pub fn transcript(&self) -> &[String] {
        match &self.sink {
            Sink::Stderr { .. } => &[],
            Sink::Buffer(lines) => lines,
        }
    }

    /// Whether any transcript line contains `needle`. Test helper.
    pub fn contains(&self, needle: &str) -> bool {
        self.transcript().iter().any(|line| line.contains(needle))
    }
}
