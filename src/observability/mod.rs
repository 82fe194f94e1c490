//! Observability for rolecall
//!
//! - Structured JSON logs, one event per line
//! - Typed events with stable names
//! - Monotonic counters for commits and replication outcomes
//!
//! Observability never changes registry behavior: logging failures are
//! swallowed and counters are relaxed atomics.
//!
//! # Usage
//!
//! ```ignore
//! use rolecall::observability::{Event, Logger, MetricsRegistry};
//!
//! Logger::info(Event::RoleCommit, &[("group", "-1001"), ("role", "eng")]);
//!
//! let metrics = MetricsRegistry::new();
//! metrics.increment_commits();
//! ```

mod events;
mod logger;
mod metrics;

pub use events::Event;
pub use logger::{route_all_to_stderr, set_min_severity, Logger, Severity};
pub use metrics::{MetricsRegistry, MetricsSnapshot};
