//! The workload: a fixed collection of jobs and its lookup indices.

use crate::{
    error::{Error, Result},
    job::{Job, JobId, JobIndex, Phase, TaskId},
    time::Time
};

use itertools::Itertools;

use std::collections::BTreeMap;

/// All jobs of one analysis run.
///
/// Jobs are immutable once the workload is built. Besides the job array
/// itself, two indices are kept: one ordered by earliest arrival and one
/// answering which jobs' scheduling windows contain a given instant.
pub struct Workload {
    jobs: Box<[Job]>,
    by_key: BTreeMap<(TaskId, JobId), JobIndex>,
    // restitution -> paired acquisition
    acquisition: Box<[Option<JobIndex>]>,
    // (earliest arrival, job), ties in insertion order
    by_earliest_arrival: Box<[(Time, JobIndex)]>,
    // jobs ordered by the start of their scheduling window
    by_window: Box<[JobIndex]>
}

impl Workload {
    /// Builds a workload out of `jobs`, in the given order.
    ///
    /// # Errors
    ///
    /// Fails if any job has an inverted arrival or cost interval, a negative
    /// cost, an infinite arrival, cost or deadline, or if two jobs share the
    /// same task and job identifiers.
    ///
    /// If any job carries a [`Phase`], every job must carry one, and each
    /// restitution is paired with the latest preceding (by job id) unpaired
    /// acquisition of its task; failing either is an error as well.
    pub fn new(jobs: impl IntoIterator<Item = Job>) -> Result<Self> {
        let jobs = jobs.into_iter().collect::<Box<[_]>>();
        let mut by_key = BTreeMap::new();

        for (i, j) in jobs.iter().enumerate() {
            check(j)?;

            if by_key.insert((j.task, j.id), i).is_some() {
                return Err(Error::DuplicateJob { task: j.task, job: j.id });
            }
        }

        let acquisition = pair_phases(&jobs)?;

        let by_earliest_arrival = jobs.iter()
                                      .enumerate()
                                      .map(|(i, j)| (j.earliest_arrival(), i))
                                      .sorted_by_key(|(t, _)| *t)
                                      .collect();

        let by_window = (0 .. jobs.len()).sorted_by_key(|i| jobs[*i].scheduling_window().from)
                                          .collect();

        Ok(Self { jobs, by_key, acquisition, by_earliest_arrival, by_window })
    }

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Retrieves the job at index `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i` is out of bounds for the workload.
    pub fn job(&self, i: JobIndex) -> &Job {
        &self.jobs[i]
    }

    /// Finds the index of job `id` of task `task`.
    pub fn lookup(&self, task: TaskId, id: JobId) -> Option<JobIndex> {
        self.by_key.get(&(task, id)).copied()
    }

    /// Tests whether the jobs are split into acquisitions and restitutions.
    pub fn is_phased(&self) -> bool {
        self.jobs.first().is_some_and(|j| j.phase.is_some())
    }

    /// Returns the acquisition that job `i` gives its core back for, if `i`
    /// is a restitution.
    pub fn acquisition_of(&self, i: JobIndex) -> Option<JobIndex> {
        self.acquisition[i]
    }

    /// Returns the index of every job whose scheduling window contains `t`.
    pub fn by_window_containing(&self, t: Time) -> impl Iterator<Item = JobIndex> + '_ {
        let end = self.by_window.partition_point(|i| self.jobs[*i].scheduling_window().from <= t);

        self.by_window[.. end].iter()
                               .copied()
                               .filter(move |i| self.jobs[*i].scheduling_window().contains(t))
    }

    /// Returns jobs with earliest arrival strictly after `t`, in order of
    /// earliest arrival and keyed by it.
    pub fn by_earliest_arrival_after(&self, t: Time) -> impl Iterator<Item = (Time, JobIndex)> + '_ {
        let start = self.by_earliest_arrival.partition_point(|(key, _)| *key <= t);
        self.by_earliest_arrival[start ..].iter().copied()
    }
}

fn pair_phases(jobs: &[Job]) -> Result<Box<[Option<JobIndex>]>> {
    let mut acquisition = vec![None; jobs.len()].into_boxed_slice();

    if jobs.iter().all(|j| j.phase.is_none()) {
        return Ok(acquisition);
    }

    let by_task = jobs.iter()
                      .enumerate()
                      .sorted_by_key(|(_, j)| (j.task, j.id))
                      .chunk_by(|(_, j)| j.task);

    for (_, task_jobs) in &by_task {
        let mut open = None;

        for (i, j) in task_jobs {
            match j.phase {
                Some(Phase::Acquisition) => open = Some(i),
                Some(Phase::Restitution) => {
                    let Some(acq) = open.take() else {
                        return Err(Error::UnpairedRestitution { task: j.task, job: j.id });
                    };

                    acquisition[i] = Some(acq);
                },
                None => return Err(Error::MissingPhase { task: j.task, job: j.id })
            }
        }
    }

    Ok(acquisition)
}

fn check(j: &Job) -> Result<()> {
    let (task, job) = (j.task, j.id);

    if j.latest_arrival().is_infinite() {
        return Err(Error::Unbounded { task, job, what: "arrival" });
    }

    if j.maximal_cost().is_infinite() {
        return Err(Error::Unbounded { task, job, what: "cost" });
    }

    if j.deadline.is_infinite() {
        return Err(Error::Unbounded { task, job, what: "deadline" });
    }

    if !j.arrival.valid() {
        return Err(Error::InvertedInterval { task, job, what: "arrival" });
    }

    if !j.cost.valid() {
        return Err(Error::InvertedInterval { task, job, what: "cost" });
    }

    if j.least_cost() < Time::ZERO {
        return Err(Error::NegativeCost { task, job });
    }

    Ok(())
}
