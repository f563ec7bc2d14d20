//! Diagnostic sink consumed by the generator.
//!
//! Every non-fatal condition is funneled through a [`DiagnosticSink`] with an
//! explicit [`Severity`]. Two sinks ship with the crate:
//! - [`SlogSink`] forwards to a `slog::Logger` (use [`crate::CargoDrain`] as the
//!   drain inside build scripts)
//! - [`DiagnosticLog`] keeps diagnostics in memory

use std::{fmt, path::PathBuf};

use slog::Logger;

use crate::error::GenerationError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Debug,
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        })
    }
}

/// Position in a schema source file.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SourceLocation {
    pub file: PathBuf,
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file.display(), self.line, self.column)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: &'static str,
    pub message: String,
    pub location: Option<SourceLocation>,
}

impl Diagnostic {
    pub fn new(severity: Severity, kind: &'static str, message: impl Into<String>) -> Self {
        Self {
            severity,
            kind,
            message: message.into(),
            location: None,
        }
    }

    #[must_use]
    pub fn with_location(mut self, location: Option<SourceLocation>) -> Self {
        self.location = location;
        self
    }
}

impl From<&GenerationError> for Diagnostic {
    fn from(err: &GenerationError) -> Self {
        Self::new(err.severity(), err.kind(), err.to_string())
    }
}

pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: Diagnostic);

    fn report_error(&mut self, err: &GenerationError, location: Option<SourceLocation>) {
        self.report(Diagnostic::from(err).with_location(location));
    }
}

/// In-memory sink.
#[derive(Clone, Debug, Default)]
pub struct DiagnosticLog {
    entries: Vec<Diagnostic>,
}

impl DiagnosticLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn of_kind<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a Diagnostic> + 'a {
        self.entries.iter().filter(move |d| d.kind == kind)
    }

    pub fn has_errors(&self) -> bool {
        self.entries.iter().any(|d| d.severity == Severity::Error)
    }
}

impl DiagnosticSink for DiagnosticLog {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.entries.push(diagnostic);
    }
}

/// Sink that writes structured `slog` records.
pub struct SlogSink {
    logger: Logger,
}

impl SlogSink {
    pub fn new(logger: Logger) -> Self {
        Self { logger }
    }
}

impl DiagnosticSink for SlogSink {
    fn report(&mut self, diagnostic: Diagnostic) {
        let Diagnostic {
            severity,
            kind,
            message,
            location,
        } = diagnostic;
        let location = location.map(|l| l.to_string());
        match severity {
            Severity::Debug => {
                slog::debug!(self.logger, "{}", message; "kind" => kind, "location" => location);
            }
            Severity::Info => {
                slog::info!(self.logger, "{}", message; "kind" => kind, "location" => location);
            }
            Severity::Warning => {
                slog::warn!(self.logger, "{}", message; "kind" => kind, "location" => location);
            }
            Severity::Error => {
                slog::error!(self.logger, "{}", message; "kind" => kind, "location" => location);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use slog::{Drain, Level, OwnedKVList, Record};

    use super::*;

    #[derive(Clone, Default)]
    struct Capture {
        records: Arc<Mutex<Vec<(Level, String)>>>,
    }

    impl Drain for Capture {
        type Ok = ();
        type Err = slog::Never;

        fn log(&self, record: &Record<'_>, _values: &OwnedKVList) -> Result<(), slog::Never> {
            self.records
                .lock()
                .unwrap()
                .push((record.level(), record.msg().to_string()));
            Ok(())
        }
    }

    #[test]
    fn log_collects_in_order() {
        let mut log = DiagnosticLog::new();
        log.report(Diagnostic::new(Severity::Info, "a", "first"));
        log.report(Diagnostic::new(Severity::Error, "b", "second"));
        assert_eq!(log.entries().len(), 2);
        assert_eq!(log.entries()[0].message, "first");
        assert!(log.has_errors());
        assert_eq!(log.of_kind("b").count(), 1);
    }

    #[test]
    fn errors_carry_their_severity() {
        let mut log = DiagnosticLog::new();
        let err = GenerationError::MissingRequiredMarkerType {
            marker: "Model".into(),
        };
        log.report_error(&err, None);
        assert_eq!(log.entries()[0].severity, Severity::Error);
        assert_eq!(log.entries()[0].kind, "missing_marker");
    }

    #[test]
    fn slog_sink_maps_levels() {
        let capture = Capture::default();
        let logger = Logger::root(capture.clone(), slog::o!());
        let mut sink = SlogSink::new(logger);
        sink.report(Diagnostic::new(Severity::Warning, "w", "careful"));
        sink.report(
            Diagnostic::new(Severity::Info, "i", "fyi").with_location(Some(SourceLocation {
                file: PathBuf::from("src/models.rs"),
                line: 3,
                column: 4,
            })),
        );
        let records = capture.records.lock().unwrap();
        assert_eq!(records[0], (Level::Warning, "careful".to_string()));
        assert_eq!(records[1], (Level::Info, "fyi".to_string()));
    }

    #[test]
    fn location_display() {
        let location = SourceLocation {
            file: PathBuf::from("src/models.rs"),
            line: 12,
            column: 8,
        };
        assert_eq!(location.to_string(), "src/models.rs:12:8");
    }
}
