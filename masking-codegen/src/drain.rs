//! A `slog` drain for build scripts.
//!
//! Cargo only surfaces build-script output that uses the `cargo:` protocol, so
//! warnings and errors are written as `cargo:warning=` lines. Lower levels go to
//! plain stdout, which cargo keeps in the build script's output file.

use std::{
    fmt::{self, Write as _},
    io::{self, Write as _},
};

use slog::{Drain, Key, Level, Never, OwnedKVList, Record, Serializer, KV};

#[derive(Clone, Copy, Debug)]
pub struct CargoDrain {
    min_level: Level,
}

impl CargoDrain {
    pub fn new() -> Self {
        Self {
            min_level: Level::Info,
        }
    }

    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.min_level = level;
        self
    }

    /// Formats a record as a single line: `message key=value key=value`.
    pub(crate) fn format(record: &Record<'_>, values: &OwnedKVList) -> String {
        let mut line = record.msg().to_string();
        let mut pairs = PairWriter { out: &mut line };
        // Formatting into a String cannot fail, and a broken pair only loses context.
        let _ = record.kv().serialize(record, &mut pairs);
        let _ = values.serialize(record, &mut pairs);
        line.replace(['\n', '\r'], " ")
    }
}

impl Default for CargoDrain {
    fn default() -> Self {
        Self::new()
    }
}

impl Drain for CargoDrain {
    type Ok = ();
    type Err = Never;

    fn log(&self, record: &Record<'_>, values: &OwnedKVList) -> Result<(), Never> {
        if !record.level().is_at_least(self.min_level) {
            return Ok(());
        }
        let line = Self::format(record, values);
        let mut stdout = io::stdout().lock();
        let _ = if record.level().is_at_least(Level::Warning) {
            writeln!(stdout, "cargo:warning={line}")
        } else {
            writeln!(stdout, "[masking] {}: {line}", record.level().as_short_str())
        };
        Ok(())
    }
}

struct PairWriter<'a> {
    out: &'a mut String,
}

impl Serializer for PairWriter<'_> {
    fn emit_arguments(&mut self, key: Key, val: &fmt::Arguments<'_>) -> slog::Result {
        let _ = write!(self.out, " {key}={val}");
        Ok(())
    }

    fn emit_none(&mut self, _key: Key) -> slog::Result {
        Ok(())
    }
}
