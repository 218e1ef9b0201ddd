use crate::{
    iip::Iip,
    job::{IndexSet, Job, JobIndex},
    space::View,
    time::Time,
    workload::Workload
};

use itertools::Itertools;
use log::debug;

/// Precautious rate-monotonic idle-time insertion.
///
/// Under non-preemptive rate-monotonic scheduling, a long low-priority job
/// may block a maximum-priority job that arrives right after it started for
/// long enough to miss the latter's deadline. This policy prevents a job
/// from starting unless the next maximum-priority job can still meet its
/// deadline after waiting for it.
pub struct PrecautiousRm {
    max_priority: Option<u64>,
    // maximum-priority jobs as (latest arrival, job), ties in workload order
    hp_jobs: Box<[(Time, JobIndex)]>
}

impl PrecautiousRm {
    pub const CAN_BLOCK: bool = true;

    /// Constructs the policy for workload `jobs`.
    ///
    /// The maximum priority is the least priority value among `jobs`; it is
    /// undefined for an empty workload.
    pub fn new<V: View + ?Sized>(_view: &V, jobs: &Workload) -> Self {
        let max_priority = jobs.jobs().iter().map(|j| j.priority).min();

        let hp_jobs = jobs.jobs().iter()
                          .enumerate()
                          .filter(|(_, j)| Some(j.priority) == max_priority)
                          .map(|(i, j)| (j.latest_arrival(), i))
                          .sorted_by_key(|(t, _)| *t)
                          .collect();

        debug!("P-RM: max priority {max_priority:?}");

        Self { max_priority, hp_jobs }
    }
}

impl<V: View + ?Sized> Iip<V> for PrecautiousRm {
    fn latest_start(&self, view: &V, j: &Job, t: Time, scheduled: &IndexSet) -> Time {
        // never block maximum-priority jobs
        if Some(j.priority) == self.max_priority {
            debug!("P-RM: {j} at {t}: self");
            return Time::INFINITY;
        }

        let start = self.hp_jobs.partition_point(|(arrival, _)| *arrival <= t);

        let next = self.hp_jobs[start ..].iter()
                                         .map(|(_, h)| *h)
                                         .find(|h| view.incomplete(scheduled, *h));

        let Some(h) = next else {
            debug!("P-RM: {j} at {t}: none");
            return Time::INFINITY;
        };

        let h = view.workload().job(h);
        let latest = h.deadline - h.maximal_cost() - j.maximal_cost();

        debug!("P-RM: {j} at {t}: latest={latest} due to {h}");
        latest
    }

    fn can_block(&self) -> bool { Self::CAN_BLOCK }

    fn name(&self) -> &'static str { "P-RM" }
}
