//! Idle-time insertion policies for non-preemptive schedulability analysis.
//!
//! During state-space exploration, an analysis engine repeatedly asks whether
//! deliberately idling, instead of dispatching the highest-priority ready job,
//! is consistent with the scheduling policy under analysis. The [`iip`] module
//! answers that question; the remaining modules provide the job model, the
//! engine boundary, and a simple dispatcher and generator to drive it.

pub mod bound;
pub mod error;
pub mod gen;
pub mod iip;
pub mod job;
pub mod sim;
pub mod space;
pub mod task;
pub mod time;
pub mod workload;

pub use error::{Error, Result};
