//! Structured JSON logger
//!
//! - One log line = one event
//! - `event` first, then `severity`, `ts`, then fields sorted by key
//! - Synchronous, no buffering
//! - INFO and below to stdout, WARN and above to stderr, unless every line
//!   is routed to stderr (stdout then belongs to a wire protocol)

use std::fmt;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};

use super::events::Event;

/// Log severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Debug-level detail
    Trace = 0,
    /// Normal operations
    Info = 1,
    /// Recoverable issues
    Warn = 2,
    /// Operation failures
    Error = 3,
    /// Unrecoverable, process exits
    Fatal = 4,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Trace => "TRACE",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
            Severity::Fatal => "FATAL",
        }
    }

    /// Parse a configured level name, case-insensitive
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_uppercase().as_str() {
            "TRACE" => Some(Severity::Trace),
            "INFO" => Some(Severity::Info),
            "WARN" => Some(Severity::Warn),
            "ERROR" => Some(Severity::Error),
            "FATAL" => Some(Severity::Fatal),
            _ => None,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            0 => Severity::Trace,
            1 => Severity::Info,
            2 => Severity::Warn,
            3 => Severity::Error,
            _ => Severity::Fatal,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

static MIN_SEVERITY: AtomicU8 = AtomicU8::new(Severity::Info as u8);

/// Set the process-wide minimum severity. Lines below it are dropped.
pub fn set_min_severity(severity: Severity) {
    MIN_SEVERITY.store(severity as u8, Ordering::Relaxed);
}

static ALL_TO_STDERR: AtomicBool = AtomicBool::new(false);

/// Send every line to stderr regardless of severity.
pub fn route_all_to_stderr(enabled: bool) {
    ALL_TO_STDERR.store(enabled, Ordering::Relaxed);
}

fn min_severity() -> Severity {
    Severity::from_u8(MIN_SEVERITY.load(Ordering::Relaxed))
}

pub struct Logger;

impl Logger {
    pub fn log(severity: Severity, event: Event, fields: &[(&str, &str)]) {
        if severity < min_severity() {
            return;
        }
        if severity >= Severity::Warn || ALL_TO_STDERR.load(Ordering::Relaxed) {
            Self::log_to_writer(severity, event, fields, &mut io::stderr());
        } else {
            Self::log_to_writer(severity, event, fields, &mut io::stdout());
        }
    }

    fn log_to_writer<W: Write>(
        severity: Severity,
        event: Event,
        fields: &[(&str, &str)],
        writer: &mut W,
    ) {
        let line = Self::render(severity, event, fields);
        // Logging must never fail the caller
        let _ = writer.write_all(line.as_bytes());
        let _ = writer.flush();
    }

    fn render(severity: Severity, event: Event, fields: &[(&str, &str)]) -> String {
        let mut sorted: Vec<_> = fields.iter().collect();
        sorted.sort_by_key(|(k, _)| *k);

        let mut line = String::with_capacity(256);
        line.push('{');
        push_pair(&mut line, "event", event.as_str());
        line.push(',');
        push_pair(&mut line, "severity", severity.as_str());
        line.push(',');
        push_pair(
            &mut line,
            "ts",
            &Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        );
        for (key, value) in sorted {
            if matches!(*key, "event" | "severity" | "ts") {
                continue;
            }
            line.push(',');
            push_pair(&mut line, key, value);
        }
        line.push_str("}\n");
        line
    }

    pub fn trace(event: Event, fields: &[(&str, &str)]) {
        Self::log(Severity::Trace, event, fields);
    }

    pub fn info(event: Event, fields: &[(&str, &str)]) {
        Self::log(Severity::Info, event, fields);
    }

    pub fn warn(event: Event, fields: &[(&str, &str)]) {
        Self::log(Severity::Warn, event, fields);
    }

    pub fn error(event: Event, fields: &[(&str, &str)]) {
        Self::log(Severity::Error, event, fields);
    }

    pub fn fatal(event: Event, fields: &[(&str, &str)]) {
        Self::log(Severity::Fatal, event, fields);
    }
}

fn push_pair(line: &mut String, key: &str, value: &str) {
    // serde_json handles escaping of quotes and control characters
    let mut pair = Map::with_capacity(1);
    pair.insert(key.to_string(), Value::String(value.to_string()));
    let rendered = Value::Object(pair).to_string();
    line.push_str(&rendered[1..rendered.len() - 1]);
}

#[cfg(test)]
pub(crate) fn capture_log(severity: Severity, event: Event, fields: &[(&str, &str)]) -> String {
    let mut buffer = Vec::new();
    Logger::log_to_writer(severity, event, fields, &mut buffer);
    String::from_utf8(buffer).unwrap()
}
