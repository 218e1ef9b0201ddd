use crate::{
    iip::Iip,
    job::{IndexSet, Job, JobIndex, TaskId},
    space::View,
    time::Time,
    workload::Workload
};

use itertools::Itertools;
use log::{debug, trace};

use std::collections::{btree_map::Entry, BTreeMap, BTreeSet};

/// Critical-window idle-time insertion.
///
/// Bounds how long a job may be delayed so that, for every other task, one
/// influencing job (the next one that is pending or about to be released)
/// can still complete by its deadline if all of them run back to back after
/// the job in question.
///
/// Future releases are only looked at up to a horizon of the latest deadline
/// among influencing jobs found so far plus the largest cost in the workload;
/// no job released later can lower the bound.
pub struct CriticalWindow {
    max_cost: Time,
    n_tasks: usize
}

impl CriticalWindow {
    pub const CAN_BLOCK: bool = true;

    /// Constructs the policy for workload `jobs`.
    pub fn new<V: View + ?Sized>(_view: &V, jobs: &Workload) -> Self {
        let max_cost = jobs.jobs().iter()
                           .map(Job::maximal_cost)
                           .fold(Time::ZERO, Time::max);

        let n_tasks = jobs.jobs().iter()
                          .map(|j| j.task)
                          .collect::<BTreeSet<_>>()
                          .len();

        Self { max_cost, n_tasks }
    }

    /// Returns one influencing job per task, in order of deadline.
    ///
    /// # Panics
    ///
    /// Panics if some job released after `at` is already complete, which
    /// no reachable search state allows.
    fn influencing_jobs<V>(&self, view: &V, j_i: &Job, at: Time, already_scheduled: &IndexSet)
    -> Vec<JobIndex> where V: View + ?Sized {
        let jobs = view.workload();
        let mut ijs = BTreeMap::<TaskId, JobIndex>::new();

        // first, everything of other tasks that is already pending at `at`
        for i in view.jobs_by_window_containing(at) {
            let j = jobs.job(i);

            if j.sibling_of(j_i) || !view.incomplete(already_scheduled, i) {
                continue;
            }

            ijs.entry(j.task)
               .and_modify(|ij| if jobs.job(*ij).earliest_arrival() > j.earliest_arrival() {
                   *ij = i;
               })
               .or_insert(i);
        }

        let mut latest_deadline = ijs.values()
                                     .map(|ij| jobs.job(*ij).deadline)
                                     .fold(Time::ZERO, Time::max);

        // then look at later releases for tasks still missing
        let wanted = self.n_tasks.saturating_sub(1);

        for (arrival, i) in view.jobs_by_earliest_arrival_after(at) {
            if ijs.len() >= wanted {
                break;
            }

            let j = jobs.job(i);

            assert!(
                view.incomplete(already_scheduled, i),
                "future job {j} complete at {at} in {already_scheduled}"
            );

            if let Entry::Vacant(slot) = ijs.entry(j.task) {
                trace!("CW: {j} influences {j_i}");
                slot.insert(i);
                latest_deadline = latest_deadline.max(j.deadline);
            }

            // whatever arrives past the horizon cannot influence the bound
            if latest_deadline + self.max_cost < arrival {
                break;
            }
        }

        ijs.into_values()
           .sorted_by_key(|ij| jobs.job(*ij).deadline)
           .collect()
    }
}

impl<V: View + ?Sized> Iip<V> for CriticalWindow {
    fn latest_start(&self, view: &V, j: &Job, t: Time, scheduled: &IndexSet) -> Time {
        let ijs = self.influencing_jobs(view, j, t, scheduled);

        // from the latest to the earliest deadline
        let latest = ijs.iter()
                        .rev()
                        .map(|ij| view.workload().job(*ij))
                        .fold(Time::INFINITY, |latest, ij| {
                            latest.min(ij.deadline) - ij.maximal_cost()
                        });

        debug!("CW: {j} at {t}: latest={latest} over {} jobs", ijs.len());
        latest - j.maximal_cost()
    }

    fn can_block(&self) -> bool { Self::CAN_BLOCK }

    fn name(&self) -> &'static str { "CW" }
}

#[cfg(test)]
mod tests {
    use super::CriticalWindow;
    use crate::{
        iip::{Iip, PrecautiousRm},
        job::{IndexSet, Job},
        space::Space,
        time::{Interval, Time},
        workload::Workload
    };

    fn job(task: u64, id: u64, arrival: (i64, i64), cost: i64, deadline: i64) -> Job {
        Job::new(task, id, Interval::new(arrival.0, arrival.1), Interval::new(1, cost),
                 Time::new(deadline), task)
    }

    #[test]
    fn caches_cost_and_tasks() {
        let w = Workload::new([job(1, 1, (0, 0), 3, 10), job(2, 1, (0, 0), 7, 10),
                               job(1, 2, (10, 10), 2, 20)]).unwrap();
        let space = Space::new(&w, 1);
        let iip = CriticalWindow::new(&space, &w);

        assert_eq!(iip.max_cost, Time::new(7));
        assert_eq!(iip.n_tasks, 2);
    }

    #[test]
    fn two_tasks_match_precautious_rm() {
        // t = 1: the single other-task job h is pending
        let w = Workload::new([job(1, 1, (0, 2), 3, 10), job(2, 1, (0, 0), 4, 30)]).unwrap();
        let space = Space::new(&w, 1);
        let cw = CriticalWindow::new(&space, &w);
        let prm = PrecautiousRm::new(&space, &w);
        let (h, j) = (w.job(0), w.job(1));
        let t = Time::new(1);

        let expected = h.deadline - h.maximal_cost() - j.maximal_cost();
        assert_eq!(cw.latest_start(&space, j, t, &IndexSet::new()), expected);
        assert_eq!(prm.latest_start(&space, j, t, &IndexSet::new()), expected);
        assert_eq!(expected, Time::new(3));
    }

    #[test]
    fn single_task_never_blocks() {
        let w = Workload::new([job(1, 1, (0, 0), 3, 10), job(1, 2, (10, 10), 3, 20)]).unwrap();
        let space = Space::new(&w, 1);
        let iip = CriticalWindow::new(&space, &w);

        assert_eq!(iip.latest_start(&space, w.job(0), Time::ZERO, &IndexSet::new()),
                   Time::INFINITY);
    }

    #[test]
    fn earliest_pending_job_represents_its_task() {
        let w = Workload::new([
            job(2, 2, (5, 5), 1, 12),
            job(2, 1, (0, 0), 2, 9),
            job(1, 1, (6, 6), 1, 40)
        ]).unwrap();
        let space = Space::new(&w, 1);
        let iip = CriticalWindow::new(&space, &w);

        // both jobs of task 2 pending at 6: J1 wins, 9 - 2 - 1
        assert_eq!(iip.latest_start(&space, w.job(2), Time::new(6), &IndexSet::new()),
                   Time::new(6));

        // once J1 is done, J2 stands in: 12 - 1 - 1
        let done = [1].into_iter().collect::<IndexSet>();
        assert_eq!(iip.latest_start(&space, w.job(2), Time::new(6), &done), Time::new(10));
    }

    #[test]
    fn looks_ahead_for_missing_tasks() {
        let w = Workload::new([
            job(1, 1, (0, 0), 2, 50),
            job(2, 1, (3, 3), 2, 10),
            job(3, 1, (4, 4), 3, 20),
            job(3, 2, (24, 24), 3, 44)
        ]).unwrap();
        let space = Space::new(&w, 1);
        let iip = CriticalWindow::new(&space, &w);

        // 20 - 3 = 17, min(17, 10) - 2 = 8, 8 - 2 = 6
        assert_eq!(iip.latest_start(&space, w.job(0), Time::ZERO, &IndexSet::new()),
                   Time::new(6));
    }

    #[test]
    fn stops_at_horizon() {
        // task 3 only releases well past 10 + max cost
        let w = Workload::new([
            job(1, 1, (0, 0), 2, 50),
            job(2, 1, (3, 3), 2, 10),
            job(2, 2, (20, 20), 2, 30),
            job(3, 1, (100, 100), 3, 103)
        ]).unwrap();
        let space = Space::new(&w, 1);
        let iip = CriticalWindow::new(&space, &w);

        // only T2J1 counts: 10 - 2 - 2
        assert_eq!(iip.latest_start(&space, w.job(0), Time::ZERO, &IndexSet::new()),
                   Time::new(6));
    }

    #[test]
    #[should_panic(expected = "complete at")]
    fn complete_future_job_is_fatal() {
        let w = Workload::new([job(1, 1, (0, 0), 2, 50), job(2, 1, (3, 3), 2, 10)]).unwrap();
        let space = Space::new(&w, 1);
        let iip = CriticalWindow::new(&space, &w);
        let bogus = [1].into_iter().collect::<IndexSet>();

        iip.latest_start(&space, w.job(0), Time::ZERO, &bogus);
    }
}
