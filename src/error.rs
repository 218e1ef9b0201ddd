//! Errors raised while building workloads and policies.
//!
//! Only construction can fail recoverably. Queries made against a built
//! policy panic on contract violations instead, since continuing would risk
//! an optimistic (unsound) bound.

use crate::job::{JobId, TaskId};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("job T{task}J{job} has an inverted {what} interval")]
    InvertedInterval { task: TaskId, job: JobId, what: &'static str },

    #[error("job T{task}J{job} has a negative cost")]
    NegativeCost { task: TaskId, job: JobId },

    #[error("job T{task}J{job} has an infinite {what}")]
    Unbounded { task: TaskId, job: JobId, what: &'static str },

    #[error("job T{task}J{job} appears more than once")]
    DuplicateJob { task: TaskId, job: JobId },

    #[error("job T{task}J{job} carries no acquisition/restitution phase")]
    MissingPhase { task: TaskId, job: JobId },

    #[error("restitution T{task}J{job} has no preceding acquisition")]
    UnpairedRestitution { task: TaskId, job: JobId }
}

pub type Result<T> = std::result::Result<T, Error>;
