use iip::{
    gen, sim,
    iip::Kind,
    job::{IndexSet, Job, Phase},
    space::Space,
    task::Task,
    time::{Interval, Time},
    workload::Workload
};

use rand::{rngs::StdRng, Rng, SeedableRng};

fn job(task: u64, id: u64, arrival: (i64, i64), cost: i64, deadline: i64, prio: u64) -> Job {
    Job::new(task, id, Interval::new(arrival.0, arrival.1), Interval::new(1, cost),
             Time::new(deadline), prio)
}

#[test]
fn acquisition_restitution_end_to_end() {
    let a1 = job(1, 1, (0, 0), 2, 5, 0).with_phase(Phase::Acquisition);
    let r1 = job(1, 2, (5, 5), 2, 10, 0).with_phase(Phase::Restitution);
    let a3 = job(1, 3, (10, 10), 2, 15, 0).with_phase(Phase::Acquisition);

    let w = Workload::new([a1, r1, a3]).unwrap();
    let space = Space::new(&w, 1);
    let iip = Kind::Aer.build(&space, &w).unwrap();

    assert!(iip.can_block());
    assert_eq!(iip.latest_start(&space, &a1, Time::ZERO, &IndexSet::new()), Time::INFINITY);

    let after_a1 = [0].into_iter().collect::<IndexSet>();
    assert_eq!(iip.latest_start(&space, &r1, Time::new(5), &after_a1), Time::INFINITY);
    assert_eq!(iip.latest_start(&space, &a3, Time::new(5), &after_a1), Time::ZERO);

    let after_r1 = [0, 1].into_iter().collect::<IndexSet>();
    assert_eq!(iip.latest_start(&space, &a3, Time::new(10), &after_r1), Time::INFINITY);
}

#[test]
fn only_null_is_work_conserving() {
    let w = Workload::new([job(1, 1, (0, 0), 1, 5, 0).with_phase(Phase::Acquisition)]).unwrap();
    let space = Space::new(&w, 1);

    for kind in Kind::ALL {
        let iip = kind.build(&space, &w).unwrap();
        assert_eq!(iip.can_block(), kind != Kind::Null, "{kind}");
    }
}

#[test]
fn precautious_rm_single_pending_hp_job() {
    let w = Workload::new([
        job(1, 1, (0, 8), 3, 20, 2),
        job(2, 1, (0, 0), 5, 50, 9),
        job(3, 1, (0, 0), 2, 60, 4)
    ]).unwrap();
    let space = Space::new(&w, 1);
    let iip = Kind::Prm.build(&space, &w).unwrap();
    let h = w.job(0);

    for t in 0 .. 8 {
        for j in &w.jobs()[1 ..] {
            assert_eq!(iip.latest_start(&space, j, Time::new(t), &IndexSet::new()),
                       h.deadline - h.maximal_cost() - j.maximal_cost());
        }
    }

    // arrived at or before now
    assert_eq!(iip.latest_start(&space, w.job(1), Time::new(8), &IndexSet::new()), Time::INFINITY);

    // complete
    let done = [0].into_iter().collect::<IndexSet>();
    assert_eq!(iip.latest_start(&space, w.job(1), Time::new(3), &done), Time::INFINITY);
}

#[test]
fn critical_window_degenerates_to_prm_with_two_tasks() {
    let w = Workload::new([job(1, 1, (2, 6), 4, 30, 1), job(2, 1, (0, 0), 7, 90, 2)]).unwrap();
    let space = Space::new(&w, 1);
    let cw = Kind::Cw.build(&space, &w).unwrap();
    let (h, j) = (w.job(0), w.job(1));

    for t in 2 ..= 5 {
        assert_eq!(cw.latest_start(&space, j, Time::new(t), &IndexSet::new()), Time::new(19));
        assert_eq!(h.deadline - h.maximal_cost() - j.maximal_cost(), Time::new(19));
    }
}

#[test]
fn critical_window_single_task_is_unbounded() {
    let w = Workload::new((1 ..= 5).map(|k| job(1, k, (10 * k as i64, 10 * k as i64), 3,
                                                 10 * k as i64 + 10, 0))).unwrap();
    let space = Space::new(&w, 1);
    let cw = Kind::Cw.build(&space, &w).unwrap();

    for j in w.jobs() {
        assert_eq!(cw.latest_start(&space, j, j.earliest_arrival(), &IndexSet::new()),
                   Time::INFINITY);
    }
}

#[test]
fn queries_are_pure() {
    let mut rng = StdRng::seed_from_u64(42);
    let tasks = [Task::new(2, 7).with_jitter(1).rm(), Task::new(3, 11).rm(),
                 Task::new(1, 5).with_jitter(2).rm(), Task::new(4, 20).rm()];

    for kind in Kind::ALL {
        let w = gen::workload(&tasks, 60, kind == Kind::Aer).unwrap();
        let space = Space::new(&w, 2);
        let iip = kind.build(&space, &w).unwrap();

        for _ in 0 .. 200 {
            let t = Time::new(rng.gen_range(0 .. 60));

            // every job released before `t` may have been scheduled; none after
            let scheduled = (0 .. w.len()).filter(|i| w.job(*i).latest_arrival() <= t && rng.gen_bool(0.5))
                                          .collect::<IndexSet>();

            let i = rng.gen_range(0 .. w.len());
            let j = w.job(i);

            // a restitution is only considered once its acquisition is done
            if w.acquisition_of(i).is_some_and(|a| !scheduled.contains(a)) {
                continue;
            }

            let first = iip.latest_start(&space, j, t, &scheduled);
            let again = iip.latest_start(&space, j, t, &scheduled);
            assert_eq!(first, again, "{kind}: {j} at {t}");
        }
    }
}

#[test]
fn acquisitions_and_restitutions_run_in_order() {
    let mut rng = StdRng::seed_from_u64(7);

    for num_cores in 1 ..= 2 {
        for _ in 0 .. 50 {
            let tasks = gen::Tasks::new(num_cores, 0.6, num_cores ..= 5, 10 ..= 60)
                .with_jitter(0.1)
                .gen(&mut rng);

            let horizon = 2 * tasks.iter().map(|t| t.period).max().unwrap();
            let w = gen::workload(&tasks, horizon, true).unwrap();
            let mut space = Space::new(&w, num_cores);
            let iip = Kind::Aer.build(&space, &w).unwrap();
            let out = sim::run(&mut space, iip.as_ref());

            for i in 0 .. w.len() {
                let Some(a) = w.acquisition_of(i) else { continue };

                if let Some(done) = out.completion[i] {
                    let acquired = out.completion[a].unwrap();
                    assert!(acquired + w.job(i).maximal_cost() <= done, "{} before {}", w.job(i), w.job(a));
                }
            }

            assert!(out.stalled.is_some() || out.completion.iter().all(Option::is_some));
        }
    }
}
