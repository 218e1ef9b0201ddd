//! The periodic task model, from which workloads are generated.

use crate::{
    job::{Job, Phase, TaskId},
    time::{Interval, Time}
};

use dashu::{
    rational::Relaxed,
    integer::Sign
};

/// Type of task parameters (periods, costs, deadlines).
///
/// These are relative durations, in the same unit as [`Time`].
pub type Duration = u64;

/// A single periodic task with release jitter.
#[derive(Clone, Copy)]
pub struct Task {
    /// The task's period.
    pub period: Duration,
    /// The task's best-case execution time.
    pub bcet: Duration,
    /// The task's cost, also known as WCET (worst-case execution time).
    pub cost: Duration,
    /// The task's relative deadline.
    pub deadline: Duration,
    /// Maximum release jitter.
    pub jitter: Duration,
    /// The task's priority; lower values take precedence.
    pub priority: u64
}

impl Task {
    /// Constructs a new `Task` with the given `cost` and `period`, implicit deadline
    /// (equal to `period`), no jitter, fixed execution time and maximum priority.
    pub fn new(cost: Duration, period: Duration) -> Self {
        Self {
            period,
            bcet: cost,
            cost,
            deadline: period,
            jitter: 0,
            priority: 0
        }
    }

    /// Returns the task with new relative deadline `deadline`.
    #[must_use]
    pub fn with_deadline(self, deadline: Duration) -> Self {
        Self { deadline, ..self }
    }

    /// Returns the task with release jitter `jitter`.
    #[must_use]
    pub fn with_jitter(self, jitter: Duration) -> Self {
        Self { jitter, ..self }
    }

    /// Returns the task with best-case execution time `bcet`.
    ///
    /// # Panics
    ///
    /// Panics if `bcet` exceeds the task's cost.
    #[must_use]
    pub fn with_bcet(self, bcet: Duration) -> Self {
        assert!(bcet <= self.cost);
        Self { bcet, ..self }
    }

    /// Returns the task with rate-monotonic priority, i.e. equal to its period.
    #[must_use]
    pub fn rm(self) -> Self {
        Self { priority: self.period, ..self }
    }

    /// Expands the task into its jobs released before `horizon`, as task `id`.
    ///
    /// Job identifiers start at 1.
    pub fn jobs(&self, id: TaskId, horizon: Duration) -> impl Iterator<Item = Job> + '_ {
        (0 ..).map(move |k| k * self.period)
              .take_while(move |release| *release < horizon)
              .zip(1 ..)
              .map(move |(release, job)| Job::new(
                  id,
                  job,
                  Interval { from: time(release), until: time(release + self.jitter) },
                  Interval { from: time(self.bcet), until: time(self.cost) },
                  time(release + self.deadline),
                  self.priority
              ))
    }

    /// Expands the task like [`jobs`](`Self::jobs`), splitting each job into an
    /// acquisition and a restitution.
    ///
    /// The acquisition runs in the first half of the job's window with half of
    /// its cost (rounded up), and must complete before the restitution, which
    /// is released at the midpoint of the window with the remaining cost. The
    /// acquisition of job `k` has identifier `2k - 1`; its restitution `2k`.
    pub fn aer_jobs(&self, id: TaskId, horizon: Duration) -> impl Iterator<Item = Job> + '_ {
        let half = self.deadline / 2;
        let (acq_cost, acq_bcet) = (self.cost.div_ceil(2), self.bcet.div_ceil(2));

        self.jobs(id, horizon).flat_map(move |j| {
            let release = j.earliest_arrival();
            let mid = release + time(half);

            let acq = Job {
                id: 2 * j.id - 1,
                cost: Interval { from: time(acq_bcet), until: time(acq_cost) },
                deadline: mid,
                ..j
            }.with_phase(Phase::Acquisition);

            let rst = Job {
                id: 2 * j.id,
                arrival: Interval { from: mid, until: mid + time(self.jitter) },
                cost: Interval {
                    from: time(self.bcet - acq_bcet),
                    until: time(self.cost - acq_cost)
                },
                ..j
            }.with_phase(Phase::Restitution);

            [acq, rst]
        })
    }
}

/// Converts a duration into an instant.
///
/// # Panics
///
/// Panics if `d` does not fit into a finite [`Time`].
pub fn time(d: Duration) -> Time {
    match i64::try_from(d) {
        Ok(d) if d != i64::MAX => Time::new(d),
        _ => panic!("duration {d} out of range")
    }
}

/// Trait for tasks and collections of tasks (task-sets).
pub trait Set {
    /// Returns the exact value of the total utilization of the task-set.
    ///
    /// For this value to be computed exactly it is required that the return type
    /// be an arbitrary-precision (non-negative) rational; since its main use is to be
    /// summed or compared, it is not immediately returned as a
    /// [`RBig`](`dashu::rational::RBig`); use [`Relaxed::canonicalize`] to convert
    /// to it if needed.
    fn utilization(self) -> Relaxed;

    /// Tests if the task-set is feasible in isolation, i.e. if every task's
    /// cost fits within both its period and its deadline.
    fn feasible(self) -> bool;
}

/// A `Task` is in and of itself a `Set` of one element and is treated accordingly.
impl Set for &'_ Task {
    fn utilization(self) -> Relaxed {
        Relaxed::from_parts_const(
            Sign::Positive,
            self.cost.into(),
            self.period.into()
        )
    }

    fn feasible(self) -> bool {
        self.cost <= self.period && self.cost <= self.deadline
    }
}

/// Any collection of `Set`s (including [`Task`]) is a `Set`, and is treated as if each
/// of its elements were a task.
impl<I, T: Set> Set for I where I: IntoIterator<Item = T> {
    fn utilization(self) -> Relaxed {
        let mut out = Relaxed::default();

        for x in self {
            out += x.utilization();
        }

        out
    }

    fn feasible(self) -> bool {
        self.into_iter()
            .all(T::feasible)
    }
}

#[cfg(test)]
mod tests {
    use super::{Set, Task};
    use crate::{
        job::Phase,
        time::{Interval, Time}
    };

    use dashu::rational::RBig;

    #[test]
    fn utilization_is_exact() {
        let ts = [Task::new(1, 3), Task::new(1, 6)];
        assert_eq!(ts.iter().utilization().canonicalize(), RBig::from_parts(1.into(), 2u8.into()));
        assert!(ts.iter().feasible());
        assert!(!Task::new(5, 10).with_deadline(4).feasible());
    }

    #[test]
    fn expands_over_horizon() {
        let task = Task::new(3, 10).with_jitter(2).with_bcet(1).rm();
        let jobs = task.jobs(7, 25).collect::<Vec<_>>();

        assert_eq!(jobs.len(), 3);
        assert_eq!(jobs[2].id, 3);
        assert_eq!(jobs[2].task, 7);
        assert_eq!(jobs[2].priority, 10);
        assert_eq!(jobs[2].arrival, Interval::new(20, 22));
        assert_eq!(jobs[2].cost, Interval::new(1, 3));
        assert_eq!(jobs[2].deadline, Time::new(30));
    }

    #[test]
    fn splits_into_phases() {
        let task = Task::new(5, 10).with_bcet(3);
        let jobs = task.aer_jobs(1, 20).collect::<Vec<_>>();

        assert_eq!(jobs.len(), 4);

        let (acq, rst) = (jobs[2], jobs[3]);
        assert_eq!((acq.id, acq.phase), (3, Some(Phase::Acquisition)));
        assert_eq!((rst.id, rst.phase), (4, Some(Phase::Restitution)));
        assert_eq!(acq.arrival, Interval::new(10, 10));
        assert_eq!(acq.cost, Interval::new(2, 3));
        assert_eq!(acq.deadline, Time::new(15));
        assert_eq!(rst.arrival, Interval::new(15, 15));
        assert_eq!(rst.cost, Interval::new(1, 2));
        assert_eq!(rst.deadline, Time::new(20));
    }
}
