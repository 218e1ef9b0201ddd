//! A concrete dispatcher driven by an idle-time insertion policy.
//!
//! This follows a single execution scenario (every job released as late and
//! running as long as it may) under global non-preemptive fixed-priority
//! scheduling. Before each dispatch the policy is consulted exactly as an
//! exploring engine would, and completions are finalized into the
//! response-time table of the [`Space`] as they become known.

use crate::{
    iip::Iip,
    job::{IndexSet, JobIndex},
    space::{Space, View},
    time::{Interval, Time}
};

use itertools::Itertools;
use log::{debug, info};

/// Result of a single simulation run.
#[derive(Debug)]
pub struct Outcome {
    /// Completion time of each job, if it was dispatched.
    pub completion: Box<[Option<Time>]>,
    /// Jobs completing past their deadline, in dispatch order.
    pub misses: Vec<JobIndex>,
    /// Number of decision instants at which ready work was held back.
    pub idled: usize,
    /// Instant past which no ready job could ever be dispatched, if any.
    pub stalled: Option<Time>
}

impl Outcome {
    /// Tests whether every job was dispatched and met its deadline.
    pub fn schedulable(&self) -> bool {
        self.stalled.is_none() && self.misses.is_empty()
    }
}

/// Runs workload of `space` to completion under policy `iip`.
///
/// # Panics
///
/// Panics if `space` has no cores.
pub fn run<'a>(space: &mut Space<'a>, iip: &(impl Iip<Space<'a>> + ?Sized)) -> Outcome {
    let jobs = space.jobs();
    let num_cores = space.num_cores();
    assert!(num_cores > 0, "cannot dispatch on zero cores");

    // priority order; ties broken by earliest arrival, then workload order
    let order = (0 .. jobs.len()).sorted_by_key(|i| {
                                     let j = jobs.job(*i);
                                     (j.priority, j.earliest_arrival(), *i)
                                 })
                                 .collect::<Box<_>>();

    let mut out = Outcome {
        completion: vec![None; jobs.len()].into_boxed_slice(),
        misses: Vec::new(),
        idled: 0,
        stalled: None
    };

    let mut scheduled = IndexSet::new();
    let mut cores = vec![Time::ZERO; num_cores];
    let mut now = Time::ZERO;

    while scheduled.len() < jobs.len() {
        let Some((core, free_at)) = cores.iter().copied().enumerate().min_by_key(|(_, t)| *t) else {
            unreachable!("at least one core");
        };

        now = now.max(free_at);

        let (any_ready, pick) = {
            // a restitution waits for its acquisition to complete
            let mut ready = order.iter()
                                 .copied()
                                 .filter(|i| !scheduled.contains(*i) && jobs.job(*i).latest_arrival() <= now)
                                 .filter(|i| jobs.acquisition_of(*i).map_or(true, |a| {
                                     out.completion[a].is_some_and(|c| c <= now)
                                 }))
                                 .peekable();

            (ready.peek().is_some(),
             ready.find(|i| now <= iip.latest_start(space, jobs.job(*i), now, &scheduled)))
        };

        if let Some(i) = pick {
            let j = jobs.job(i);
            let finish = now + j.maximal_cost();

            debug!("sim: {j} on core {core} during [{now}, {finish}]");

            cores[core] = finish;
            out.completion[i] = Some(finish);
            space.finalize(i, Interval::point(finish));
            scheduled.insert(i);

            if finish > j.deadline {
                info!("sim: {j} misses its deadline {} by {}", j.deadline, finish - j.deadline);
                out.misses.push(i);
            }

            continue;
        }

        if any_ready {
            debug!("sim: {} holds back ready work at {now}", iip.name());
            out.idled += 1;
        }

        let release = (0 .. jobs.len()).filter(|i| !scheduled.contains(*i))
                                       .map(|i| jobs.job(i).latest_arrival())
                                       .filter(|t| *t > now)
                                       .min();

        let completion = cores.iter().copied().filter(|t| *t > now).min();

        match release.into_iter().chain(completion).min() {
            Some(next) => now = next,
            None => {
                info!("sim: stalled at {now} with {} jobs left", jobs.len() - scheduled.len());
                out.stalled = Some(now);
                break;
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::run;
    use crate::{
        gen,
        iip::{Kind, Null},
        job::{Job, Phase},
        space::{Space, View},
        task::Task,
        time::{Interval, Time},
        workload::Workload
    };

    fn job(task: u64, id: u64, arrival: i64, cost: i64, deadline: i64, prio: u64) -> Job {
        Job::new(task, id, Interval::new(arrival, arrival), Interval::new(cost, cost),
                 Time::new(deadline), prio)
    }

    // a long low-priority job released just before a tight high-priority one
    fn blocking() -> Workload {
        Workload::new([job(1, 1, 1, 2, 4, 0), job(2, 1, 0, 3, 20, 1)]).unwrap()
    }

    #[test]
    fn work_conserving_misses() {
        let w = blocking();
        let mut space = Space::new(&w, 1);
        let iip = Null::new(&space, &w);
        let out = run(&mut space, &iip);

        assert_eq!(out.misses, [0]);
        assert_eq!(out.idled, 0);
        assert_eq!(out.completion[1], Some(Time::new(3)));
        assert!(!out.schedulable());
    }

    #[test]
    fn idling_avoids_miss() {
        for kind in [Kind::Prm, Kind::Cw] {
            let w = blocking();
            let mut space = Space::new(&w, 1);
            let iip = kind.build(&space, &w).unwrap();
            let out = run(&mut space, iip.as_ref());

            assert!(out.schedulable(), "{kind}");
            assert_eq!(out.idled, 1);
            assert_eq!(out.completion[0], Some(Time::new(3)));
            assert_eq!(out.completion[1], Some(Time::new(6)));
            assert_eq!(space.response_time(1), Interval::new(6, 6));
        }
    }

    #[test]
    fn acquisition_waits_for_restitution() {
        let w = Workload::new([
            job(0, 1, 0, 1, 5, 0).with_phase(Phase::Acquisition),
            job(0, 2, 5, 1, 10, 0).with_phase(Phase::Restitution),
            job(1, 1, 0, 1, 20, 1).with_phase(Phase::Acquisition),
            job(1, 2, 10, 1, 30, 1).with_phase(Phase::Restitution)
        ]).unwrap();

        let mut space = Space::new(&w, 1);
        let iip = Kind::Aer.build(&space, &w).unwrap();
        let out = run(&mut space, iip.as_ref());

        assert!(out.schedulable());
        assert_eq!(out.idled, 1);
        assert_eq!(out.completion[1], Some(Time::new(6)));
        assert_eq!(out.completion[2], Some(Time::new(7)));
        assert_eq!(out.completion[3], Some(Time::new(11)));
    }

    #[test]
    fn stalls_when_nothing_may_start() {
        // two acquisitions and a single core, never given back
        let w = Workload::new([
            job(0, 1, 0, 1, 5, 0).with_phase(Phase::Acquisition),
            job(1, 1, 0, 1, 5, 1).with_phase(Phase::Acquisition)
        ]).unwrap();

        let mut space = Space::new(&w, 1);
        let iip = Kind::Aer.build(&space, &w).unwrap();
        let out = run(&mut space, iip.as_ref());

        assert_eq!(out.stalled, Some(Time::new(1)));
        assert_eq!(out.completion[1], None);
        assert!(!out.schedulable());
    }

    #[test]
    fn spreads_over_cores() {
        let w = Workload::new([job(1, 1, 0, 4, 10, 0), job(2, 1, 0, 4, 10, 1),
                               job(3, 1, 0, 4, 10, 2)]).unwrap();
        let mut space = Space::new(&w, 2);
        let iip = Null::new(&space, &w);
        let out = run(&mut space, &iip);

        assert!(out.schedulable());
        assert_eq!(&out.completion[..], [Some(Time::new(4)), Some(Time::new(4)), Some(Time::new(8))]);
    }

    #[test]
    fn restitution_waits_for_held_acquisition() {
        // the low-priority task holds the only core until its midpoint, so
        // the next acquisition of the short task misses its own midpoint
        let w = gen::workload(&[Task::new(2, 10).rm(), Task::new(2, 100).rm()], 200, true).unwrap();
        let mut space = Space::new(&w, 1);
        let iip = Kind::Aer.build(&space, &w).unwrap();
        let out = run(&mut space, iip.as_ref());

        // T0J3(A) at index 2, T0J4(R) at 3; T1J2(R) at 41
        assert_eq!(out.stalled, None);
        assert_eq!(out.completion[41], Some(Time::new(51)));
        assert_eq!(out.completion[2], Some(Time::new(52)));
        assert_eq!(out.completion[3], Some(Time::new(53)));
        assert_eq!(out.misses[0], 2);
        assert!(out.completion.iter().all(Option::is_some));
    }
}
