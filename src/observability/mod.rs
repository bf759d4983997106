//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Handlers, service, store adapters produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured fields on every event; JSON output is a config switch
//! - Request ID flows through every span
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;
