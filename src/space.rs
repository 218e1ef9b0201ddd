//! The boundary between idle-time insertion policies and the analysis engine.

use crate::{
    job::{IndexSet, JobIndex},
    time::{Interval, Time},
    workload::Workload
};

use std::collections::BTreeMap;

/// Read-only view of the analysis engine, as seen by a policy.
///
/// The engine owns the workload, the response-time table and every
/// scheduled-set; a policy only ever reads through this trait.
pub trait View {
    /// Returns the number of cores in the analyzed platform.
    fn num_cores(&self) -> usize;

    /// Returns the workload under analysis.
    fn workload(&self) -> &Workload;

    /// Tests whether job `j` is still incomplete in a state whose
    /// scheduled-set is `scheduled`.
    fn incomplete(&self, scheduled: &IndexSet, j: JobIndex) -> bool;

    /// Returns the response-time bounds of job `j`, if finalized.
    fn rta(&self, j: JobIndex) -> Option<Interval>;

    /// Returns the response-time bounds of job `j`.
    ///
    /// Callers may only ask for jobs the search order guarantees to be
    /// finalized already.
    ///
    /// # Panics
    ///
    /// Panics if the bounds of `j` have not been finalized.
    fn response_time(&self, j: JobIndex) -> Interval {
        self.rta(j).unwrap_or_else(|| {
            panic!("response time of {} read before being finalized", self.workload().job(j))
        })
    }

    /// Returns every job whose scheduling window contains `t`.
    fn jobs_by_window_containing(&self, t: Time) -> impl Iterator<Item = JobIndex> + '_ {
        self.workload().by_window_containing(t)
    }

    /// Returns, keyed and ordered by earliest arrival, every job that
    /// arrives strictly after `t`.
    fn jobs_by_earliest_arrival_after(&self, t: Time) -> impl Iterator<Item = (Time, JobIndex)> + '_ {
        self.workload().by_earliest_arrival_after(t)
    }
}

/// Concrete engine state for a single analysis run.
///
/// A job counts as complete as soon as it belongs to the scheduled-set:
/// this is a non-preemptive model, so dispatch commits the job to run to
/// completion.
pub struct Space<'a> {
    workload: &'a Workload,
    num_cores: usize,
    rta: BTreeMap<JobIndex, Interval>
}

impl<'a> Space<'a> {
    /// Constructs a new `Space` over `workload` on `num_cores` cores.
    ///
    /// The response-time table starts empty.
    pub fn new(workload: &'a Workload, num_cores: usize) -> Self {
        Self { workload, num_cores, rta: BTreeMap::new() }
    }

    /// Returns the workload, borrowed for as long as the space itself.
    ///
    /// Unlike [`View::workload`], the borrow is not tied to `&self`, so jobs
    /// stay readable while [`finalize`](`Self::finalize`) updates the table.
    pub fn jobs(&self) -> &'a Workload {
        self.workload
    }

    /// Merges completion bounds `bounds` into the entry of job `j`.
    ///
    /// Repeated calls widen the entry so that it covers every bound seen.
    pub fn finalize(&mut self, j: JobIndex, bounds: Interval) {
        assert!(j < self.workload.len());

        self.rta.entry(j)
                .and_modify(|old| *old = old.widen(bounds))
                .or_insert(bounds);
    }
}

impl View for Space<'_> {
    fn num_cores(&self) -> usize {
        self.num_cores
    }

    fn workload(&self) -> &Workload {
        self.workload
    }

    fn incomplete(&self, scheduled: &IndexSet, j: JobIndex) -> bool {
        !scheduled.contains(j)
    }

    fn rta(&self, j: JobIndex) -> Option<Interval> {
        self.rta.get(&j).copied()
    }
}
