//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Validate → Register services → Build host
//!
//! Run (host.rs):
//!     Spawn hosted tasks → wait for signal / request / fault / idle
//!
//! Shutdown (shutdown.rs):
//!     Trigger token → tasks observe cancellation → drain → report
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then services, then tasks
//! - Ordered shutdown: cancel, drain, abort stragglers
//! - Shutdown has timeout: forced abort after deadline

pub mod host;
pub mod shutdown;
pub mod signals;
pub mod startup;

pub use host::{Host, RunReport, ShutdownTrigger, TaskReport};
pub use shutdown::Shutdown;
