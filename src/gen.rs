//! Generators for task-sets and workloads.

use crate::{
    error::Result,
    task::{Duration, Task},
    workload::Workload
};

use itertools::Either;
use rand::{
    distributions::{uniform::SampleRange, Bernoulli},
    seq::SliceRandom,
    Rng
};

use std::mem;

/// Stafford's RandFixedSum: uniformly distributed vectors in `[0, 1]^n`
/// with a fixed sum.
struct Rfs {
    // transition probabilities; row i has i + 2 entries
    t: Box<[Box<[Bernoulli]>]>,
    s: f64,
    k: usize
}

impl Rfs {
    #[allow(clippy::cast_precision_loss, clippy::cast_sign_loss,
            clippy::cast_possible_truncation)]
    fn new(length: usize, s: f64) -> Self {
        assert!(length > 0, "length must be nonzero");
        assert!((0.0 ..= length as f64).contains(&s), "s must be between 0 and length");

        let k = (s as usize).min(length - 1);     // 0 <= k <= length-1
        let s = s.clamp(k as f64, (k + 1) as f64); // k <= s <= k+1
        let delta = s - k as f64;

        let certain = Bernoulli::from_ratio(1, 1).unwrap();

        let mut w = vec![0.0; length];
        let mut t = (1 .. length).map(|l| vec![certain; l + 1].into_boxed_slice())
                                 .collect::<Box<_>>();

        w[0] = f64::MAX;

        for i in 1 .. length {
            let mut lastw = 0.0;

            for j in 0 .. i {
                let coe1 = (j as f64       + delta) / i as f64;
                let coe2 = ((i - j) as f64 - delta) / i as f64;

                let tmp1 = w[j]  * coe1;
                let tmp2 = lastw * coe2;

                lastw = mem::replace(&mut w[j], tmp1 + tmp2);

                let p = if w[j] == 0.0 { f64::from(u8::from(coe1 >= 0.5)) } else { tmp2 / w[j] };
                t[i-1][j] = Bernoulli::new(p.clamp(0.0, 1.0)).unwrap();
            }
        }

        Self { t, s, k }
    }

    #[allow(clippy::cast_precision_loss)]
    fn sample(&self, rng: &mut impl Rng) -> Box<[f64]> {
        let length = self.t.len() + 1;
        let mut out = vec![0.0; length].into_boxed_slice();

        let mut sm = 0.0; // running sum
        let mut pr = 1.0; // running product
        let mut j = self.k;

        for i in (1 .. length).rev() {
            let s = self.s - (self.k - j) as f64;
            let e = rng.sample(self.t[i-1][j]);
            let sx = rng.gen::<f64>().powf((i as f64).recip());

            sm += (1.0 - sx) * pr * s / (i + 1) as f64;
            pr *= sx;
            out[length - i] = f64::from(e).mul_add(pr, sm);
            j -= usize::from(e);
        }

        out[0] = (self.s - (self.k - j) as f64).mul_add(pr, sm);
        out.shuffle(rng);

        out
    }
}

/// Generator for periodic task-sets.
pub struct Tasks<R1, R2> {
    util: f64,
    num: R1,
    period: R2,
    jitter: f64,
    bcet: f64
}

impl<R1, R2> Tasks<R1, R2> {
    /// Constructs a new `Tasks` with the given parameters.
    ///
    /// The task-set to be generated will have normalized utilization
    /// `norm_util` for `num_cores` cores. The number of tasks will be chosen
    /// uniformly at random from `num_tasks`, and their period also uniformly
    /// at random from `period`. Each task will have implicit deadline,
    /// rate-monotonic priority, no release jitter and a fixed execution time
    /// unless changed with [`with_jitter`](`Self::with_jitter`) and
    /// [`with_bcet`](`Self::with_bcet`).
    ///
    /// Per-task utilizations are drawn with
    /// [Stafford's RandFixedSum](https://www.mathworks.com/matlabcentral/fileexchange/9700-random-vectors-with-fixed-sum).
    #[allow(clippy::cast_precision_loss)]
    pub fn new(num_cores: usize, norm_util: f64, num_tasks: R1, period: R2) -> Self {
        Self {
            util: norm_util * num_cores as f64,
            num: num_tasks,
            period,
            jitter: 0.0,
            bcet: 1.0
        }
    }

    /// Sets maximum release jitter to fraction `jitter` of each period.
    #[must_use]
    pub fn with_jitter(self, jitter: f64) -> Self {
        assert!((0.0 ..= 1.0).contains(&jitter));
        Self { jitter, ..self }
    }

    /// Sets best-case execution time to fraction `bcet` of each cost.
    #[must_use]
    pub fn with_bcet(self, bcet: f64) -> Self {
        assert!((0.0 ..= 1.0).contains(&bcet));
        Self { bcet, ..self }
    }
}

impl<R1, R2> Tasks<R1, R2> where R1: SampleRange<usize>,
                                 R2: SampleRange<Duration> + Clone {
    /// Runs the generator.
    ///
    /// # Panics
    ///
    /// Panics if the chosen number of tasks is zero, or cannot carry the
    /// requested utilization.
    #[allow(clippy::cast_precision_loss, clippy::cast_sign_loss,
            clippy::cast_possible_truncation)]
    pub fn gen(self, rng: &mut impl Rng) -> Box<[Task]> {
        let Self { util, num, period, jitter, bcet } = self;

        let num = rng.gen_range(num);
        let utils = Rfs::new(num, util).sample(rng);

        IntoIterator::into_iter(utils).map(|u| {
            let period = rng.gen_range(period.clone());
            let cost = ((period as f64 * u).ceil() as Duration).max(1);

            Task::new(cost, period)
                .with_bcet((cost as f64 * bcet).floor() as Duration)
                .with_jitter((period as f64 * jitter).floor() as Duration)
                .rm()
        }).collect()
    }
}

/// Expands `tasks` into a workload of all jobs released before `horizon`.
///
/// Task identifiers are the positions of the tasks in `tasks`. With `aer`
/// set, every job is split into an acquisition and a restitution as per
/// [`Task::aer_jobs`].
///
/// # Errors
///
/// Fails if the resulting jobs do not form a valid [`Workload`].
pub fn workload(tasks: &[Task], horizon: Duration, aer: bool) -> Result<Workload> {
    let jobs = tasks.iter().zip(0 ..).flat_map(|(task, id)| {
        if aer {
            Either::Left(task.aer_jobs(id, horizon))
        } else {
            Either::Right(task.jobs(id, horizon))
        }
    });

    Workload::new(jobs)
}
