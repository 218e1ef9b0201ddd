//! The job model.

use crate::time::{Interval, Time};

use std::fmt;

/// Identifier of the task a job belongs to.
pub type TaskId = u64;

/// Identifier of a job within its task.
pub type JobId = u64;

/// Position of a job within a [`Workload`](`crate::workload::Workload`).
pub type JobIndex = usize;

/// Phase of a job under the acquisition/restitution resource model.
///
/// An acquisition claims a core for its task, and the paired restitution
/// (the next job of the same task) gives it back.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Phase {
    Acquisition,
    Restitution
}

impl Phase {
    /// Returns the change in claimed cores once a job of this phase is done.
    pub fn claimed_cores(self) -> i64 {
        match self {
            Phase::Acquisition => 1,
            Phase::Restitution => -1
        }
    }
}

/// A single job.
#[derive(Debug, Clone, Copy)]
pub struct Job {
    /// The task this job belongs to.
    pub task: TaskId,
    /// The job's identifier within its task.
    pub id: JobId,
    /// The job's priority; lower values take precedence.
    pub priority: u64,
    /// Window within which the job is released.
    pub arrival: Interval,
    /// Bounds on the job's execution cost.
    pub cost: Interval,
    /// The job's absolute deadline.
    pub deadline: Time,
    /// Phase, for acquisition/restitution workloads only.
    pub phase: Option<Phase>
}

impl Job {
    /// Constructs a new `Job` with no phase.
    pub fn new(task: TaskId, id: JobId, arrival: Interval, cost: Interval,
               deadline: Time, priority: u64) -> Self {
        Self { task, id, priority, arrival, cost, deadline, phase: None }
    }

    /// Returns the job with phase `phase`.
    #[must_use]
    pub fn with_phase(self, phase: Phase) -> Self {
        Self { phase: Some(phase), ..self }
    }

    pub fn earliest_arrival(&self) -> Time {
        self.arrival.min()
    }

    pub fn latest_arrival(&self) -> Time {
        self.arrival.max()
    }

    pub fn least_cost(&self) -> Time {
        self.cost.min()
    }

    pub fn maximal_cost(&self) -> Time {
        self.cost.max()
    }

    /// Interval covering every instant at which the job may be pending.
    pub fn scheduling_window(&self) -> Interval {
        Interval { from: self.earliest_arrival(), until: self.deadline }
    }

    /// Tests whether the job shares a task with `other`.
    pub fn sibling_of(&self, other: &Job) -> bool {
        self.task == other.task
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}J{}", self.task, self.id)?;

        match self.phase {
            Some(Phase::Acquisition) => write!(f, "(A)"),
            Some(Phase::Restitution) => write!(f, "(R)"),
            None => Ok(())
        }
    }
}

/// Set of job indices; the scheduled-set of a search state.
///
/// Only membership is ever queried by policies.
#[derive(Default, Debug, PartialEq, Eq, Hash, Clone)]
pub struct IndexSet {
    bits: Vec<u64>
}

impl IndexSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, i: JobIndex) -> bool {
        self.bits.get(i / 64)
                 .is_some_and(|word| word & (1u64 << (i % 64)) != 0)
    }

    pub fn insert(&mut self, i: JobIndex) {
        let word = i / 64;

        if word >= self.bits.len() {
            self.bits.resize(word + 1, 0);
        }

        self.bits[word] |= 1u64 << (i % 64);
    }

    /// Returns the number of indices in the set.
    pub fn len(&self) -> usize {
        self.bits.iter()
                 .map(|word| word.count_ones() as usize)
                 .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.iter().all(|word| *word == 0)
    }
}

impl FromIterator<JobIndex> for IndexSet {
    fn from_iter<I: IntoIterator<Item = JobIndex>>(iter: I) -> Self {
        let mut out = Self::new();

        for i in iter {
            out.insert(i);
        }

        out
    }
}

impl fmt::Display for IndexSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let members = (0 .. self.bits.len() * 64).filter(|i| self.contains(*i));

        write!(f, "{{")?;

        for (n, i) in members.enumerate() {
            if n > 0 {
                write!(f, ", ")?;
            }

            write!(f, "{i}")?;
        }

        write!(f, "}}")
    }
}
