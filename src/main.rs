#![warn(clippy::pedantic)]

use iip::{
    iip::Kind,
    job::Phase,
    space::Space,
    task::{Duration, Task},
    gen, bound, sim
};

use clap::{Args, Parser, ValueEnum};
use itertools::Itertools;
use log::warn;
use rand::{rngs::StdRng, SeedableRng};

use std::{
    ops::RangeInclusive,
    process::ExitCode,
    thread, fmt
};

/// Periods (short, medium, long) in milliseconds.
const PERIODS: [RangeInclusive<Duration>; 3] = [
     3 ..=  33,
    10 ..= 100,
    50 ..= 500
];

// normalized utilization grid
struct Nuf {
    range: RangeInclusive<usize>,
    gen: Box<dyn Fn(usize) -> f64 + Sync>
}

impl Nuf {
    #[allow(clippy::cast_precision_loss)]
    pub fn uniform() -> Self {
        Self {
            range: 1 ..= 9,
            gen: Box::new(|x| x as f64 / 10.0)
        }
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn log() -> Self {
        Self {
            range: 1 ..= 32,
            gen: Box::new(|x| -(x as f64 / -8.0).exp_m1())
        }
    }

    pub fn gen(&self) -> impl Iterator<Item = f64> + '_ {
        self.range.clone().map(&self.gen)
    }
}

#[derive(Clone, Copy, ValueEnum)]
#[repr(usize)]
enum Length {
    Short,
    Medium,
    Long
}

#[derive(Args)]
struct GenArgs {
    #[arg(short = 'm', default_value_t = 1)]
    /// Number of cores in system
    num_cores: usize,
    #[arg(value_enum, short = 'p', default_value = "short")]
    /// Task period length class
    periods: Length,
    #[arg(short = 'n', default_value_t = 6)]
    /// Maximum number of tasks (at least one per core)
    max_tasks: usize,
    #[arg(short = 'j', default_value_t = 0.0)]
    /// Maximum release jitter, as a fraction of the period
    jitter: f64,
    #[arg(short = 'b', default_value_t = 1.0)]
    /// Best-case execution time, as a fraction of the cost
    bcet: f64,
    #[arg(short = 'H')]
    /// Horizon up to which jobs are released (default: twice the longest period)
    horizon: Option<Duration>,
    #[arg(short = 's')]
    /// Seed for the random generator
    seed: Option<u64>
}

impl GenArgs {
    fn check(&self) -> Result<(), &'static str> {
        if !(0.0 ..= 1.0).contains(&self.jitter) {
            return Err("jitter must lie within [0, 1]");
        }

        if !(0.0 ..= 1.0).contains(&self.bcet) {
            return Err("best-case execution time must lie within [0, 1]");
        }

        Ok(())
    }

    fn rng(&self, stream: u64) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(stream)),
            None => StdRng::from_entropy()
        }
    }

    fn tasks(&self, norm_util: f64, rng: &mut StdRng) -> Box<[Task]> {
        let min = self.num_cores.max(1);

        gen::Tasks::new(self.num_cores, norm_util, min ..= self.max_tasks.max(min),
                        PERIODS[self.periods as usize].clone())
            .with_jitter(self.jitter)
            .with_bcet(self.bcet)
            .gen(rng)
    }

    fn horizon(&self, tasks: &[Task]) -> Duration {
        self.horizon.unwrap_or_else(|| 2 * tasks.iter().map(|t| t.period).max().unwrap_or(0))
    }
}

#[derive(Parser)]
#[command(version)]
enum Command {
    /// Simulate a single random workload under one policy
    Run {
        #[command(flatten)]
        args: GenArgs,
        #[arg(value_enum, short = 'i', default_value = "null")]
        /// Idle-time insertion policy
        policy: Kind,
        #[arg(short = 'u', default_value_t = 0.5)]
        /// Normalized utilization
        norm_util: f64
    },
    /// Compare the share of schedulable workloads per policy over utilizations
    Sweep {
        #[command(flatten)]
        args: GenArgs,
        #[arg(short = 'N', default_value_t = 1000)]
        /// Workloads per utilization
        passes: usize,
        #[arg(short = 'l')]
        /// Generate log-scale utilizations instead of linear-scale
        log_nuf: bool
    }
}

impl Command {
    // rejects arguments the generator would otherwise panic on
    fn check(&self) -> Result<(), &'static str> {
        match self {
            Command::Run { norm_util, .. } if !(0.0 ..= 1.0).contains(norm_util) =>
                Err("normalized utilization must lie within [0, 1]"),
            Command::Run { args, .. } | Command::Sweep { args, .. } => args.check()
        }
    }
}

struct SweepRunner<'a> {
    args: &'a GenArgs,
    passes: usize,
    nuf: &'a Nuf
}

/// Simulates one task-set under `kind`, returning whether it was schedulable.
fn schedulable(tasks: &[Task], kind: Kind, args: &GenArgs) -> bool {
    let workload = match gen::workload(tasks, args.horizon(tasks), kind == Kind::Aer) {
        Ok(workload) => workload,
        Err(e) => panic!("generated an invalid workload: {e}")
    };

    let mut space = Space::new(&workload, args.num_cores);

    let iip = match kind.build(&space, &workload) {
        Ok(iip) => iip,
        Err(e) => panic!("cannot build {kind} policy: {e}")
    };

    sim::run(&mut space, iip.as_ref()).schedulable()
}

impl fmt::Display for SweepRunner<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut results = self.nuf.gen()
                                  .map(|_| [0usize; Kind::ALL.len()])
                                  .collect::<Box<_>>();

        thread::scope(|s| {
            for ((res, util), stream) in results.iter_mut().zip(self.nuf.gen()).zip(0 ..) {
                s.spawn(move || {
                    let mut rng = self.args.rng(stream);

                    for _ in 0 .. self.passes {
                        let tasks = self.args.tasks(util, &mut rng);

                        if !bound::necessary(tasks.iter(), self.args.num_cores) {
                            continue;
                        }

                        for (i, kind) in Kind::ALL.into_iter().enumerate() {
                            res[i] += usize::from(schedulable(&tasks, kind, self.args));
                        }
                    }
                });
            }
        });

        write!(f, "norm_util\t{}", Kind::ALL.iter().join("\t"))?;

        for (util, res) in self.nuf.gen().zip(results.iter()) {
            writeln!(f)?;
            write!(f, "{util}")?;

            for count in res {
                #[allow(clippy::cast_precision_loss)]
                let share = *count as f64 / self.passes as f64;
                write!(f, "\t{share}")?;
            }
        }

        Ok(())
    }
}

fn run(args: &GenArgs, policy: Kind, norm_util: f64) -> iip::Result<bool> {
    let mut rng = args.rng(0);
    let tasks = args.tasks(norm_util, &mut rng);
    let horizon = args.horizon(&tasks);

    if !bound::necessary(tasks.iter(), args.num_cores) {
        warn!("task-set exceeds the utilization bound");
    }

    let workload = gen::workload(&tasks, horizon, policy == Kind::Aer)?;
    let mut space = Space::new(&workload, args.num_cores);
    let iip = policy.build(&space, &workload)?;
    let out = sim::run(&mut space, iip.as_ref());

    println!("task\tperiod\tcost\tpriority");

    for (id, task) in tasks.iter().enumerate() {
        println!("{id}\t{}\t{}\t{}", task.period, task.cost, task.priority);
    }

    println!();
    println!("job\tarrival\tcost\tdeadline\tcompletion");

    for (i, j) in workload.jobs().iter().enumerate() {
        let completion = out.completion[i].map_or_else(|| "-".to_owned(), |t| t.to_string());
        let flag = if out.misses.contains(&i) { "\tMISS" } else { "" };

        println!("{j}\t{}\t{}\t{}\t{completion}{flag}", j.arrival, j.cost, j.deadline);
    }

    println!();
    println!("policy: {} (can block: {})", iip.name(), iip.can_block());
    println!("idle insertions: {}", out.idled);
    println!("deadline misses: {}", out.misses.len());

    if let Some(t) = out.stalled {
        println!("stalled at: {t}");
    }

    if policy == Kind::Aer {
        let acquisitions = workload.jobs().iter()
                                   .filter(|j| j.phase == Some(Phase::Acquisition))
                                   .count();
        println!("acquisitions: {acquisitions}");
    }

    Ok(out.schedulable())
}

fn main() -> ExitCode {
    env_logger::init();

    let command = Command::parse();

    if let Err(e) = command.check() {
        eprintln!("error: {e}");
        return ExitCode::from(2);
    }

    match command {
        Command::Run { args, policy, norm_util } => match run(&args, policy, norm_util) {
            Ok(true) => ExitCode::SUCCESS,
            Ok(false) => ExitCode::from(1),
            Err(e) => {
                eprintln!("error: {e}");
                ExitCode::from(2)
            }
        },

        Command::Sweep { args, passes, log_nuf } => {
            let nuf = if log_nuf {
                Nuf::log()
            } else {
                Nuf::uniform()
            };

            println!("{}", SweepRunner { args: &args, passes, nuf: &nuf });
            ExitCode::SUCCESS
        }
    }
}
