use crate::{
    error::{Error, Result},
    iip::Iip,
    job::{IndexSet, Job, JobId, JobIndex, Phase, TaskId},
    space::View,
    time::Time,
    workload::Workload
};

use log::{debug, trace};

use std::collections::BTreeMap;

/// Idle-time insertion for a two-phase core acquisition/restitution protocol.
///
/// Every job is either an [acquisition](`Phase::Acquisition`), which claims a
/// core for its task, or the matching [restitution](`Phase::Restitution`),
/// which gives it back. An acquisition may only start while a core is free;
/// a restitution may always start.
///
/// A restitution is only ever considered once its acquisition has finished,
/// since acquisitions are given deadlines before the release of their
/// restitution. This is checked on every query.
pub struct AcquisitionRestitution {
    num_cores: usize,
    // restitution (task, id) -> paired acquisition
    pairs: BTreeMap<(TaskId, JobId), JobIndex>
}

impl AcquisitionRestitution {
    pub const CAN_BLOCK: bool = true;

    /// Constructs the policy for workload `jobs`, whose restitutions are
    /// already paired up by [`Workload::new`].
    ///
    /// # Errors
    ///
    /// Fails if the jobs carry no [`Phase`].
    pub fn new<V: View + ?Sized>(view: &V, jobs: &Workload) -> Result<Self> {
        if let Some(j) = jobs.jobs().iter().find(|j| j.phase.is_none()) {
            return Err(Error::MissingPhase { task: j.task, job: j.id });
        }

        let pairs = jobs.jobs().iter()
                        .enumerate()
                        .filter_map(|(i, j)| Some(((j.task, j.id), jobs.acquisition_of(i)?)))
                        .collect();

        Ok(Self { num_cores: view.num_cores(), pairs })
    }

    /// Counts cores currently claimed: scheduled acquisitions count as one
    /// each, and scheduled restitutions give one back.
    ///
    /// Scheduled restitutions are always finished by the time a scheduling
    /// decision is taken, hence their core is free again.
    fn busy_cores(view: &(impl View + ?Sized), scheduled: &IndexSet) -> i64 {
        let mut sum = 0;

        for (i, j) in view.workload().jobs().iter().enumerate() {
            if !scheduled.contains(i) {
                continue;
            }

            trace!("AER: scheduled {j}");
            sum += j.phase.map_or(0, Phase::claimed_cores);
        }

        sum
    }

    #[allow(clippy::cast_possible_wrap)]
    fn free_cores(&self, view: &(impl View + ?Sized), scheduled: &IndexSet) -> i64 {
        self.num_cores as i64 - Self::busy_cores(view, scheduled)
    }
}

impl<V: View + ?Sized> Iip<V> for AcquisitionRestitution {
    fn latest_start(&self, view: &V, j: &Job, t: Time, scheduled: &IndexSet) -> Time {
        if let Some(&acq) = self.pairs.get(&(j.task, j.id)) {
            assert!(
                !view.incomplete(scheduled, acq),
                "restitution {j} considered at {t} before its acquisition {}",
                view.workload().job(acq)
            );

            debug!("AER: {j} may start at {t}");
            return Time::INFINITY;
        }

        let free = self.free_cores(view, scheduled);
        debug!("AER: {j} at {t} with {scheduled}: {free} free cores");

        if free > 0 {
            Time::INFINITY
        } else {
            Time::ZERO
        }
    }

    fn can_block(&self) -> bool { Self::CAN_BLOCK }

    fn name(&self) -> &'static str { "AER" }
}
