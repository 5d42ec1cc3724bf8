//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Host run loop and tasks produce:
//!     → logging.rs (structured log events, host/task spans)
//!     → metrics.rs (task and shutdown counters, gauges, histograms)
//!
//! Consumers:
//!     → stdout (pretty or JSON lines)
//!     → any `metrics` recorder installed by the embedding application
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Each run carries a host id in its span
//! - Metrics are cheap no-ops when no recorder is installed

pub mod logging;
pub mod metrics;
