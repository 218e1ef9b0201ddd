//! Idle-time insertion policies (IIPs).
//!
//! Whenever the engine could dispatch a job `j` at time `t`, it asks the
//! active policy for the latest instant at which `j` may start without the
//! policy objecting. If `t` lies beyond that instant, the engine must consider
//! idling instead of dispatching `j`. Policies are purely advisory: they never
//! mutate engine state, and every query is a pure function of its arguments
//! and of the (read-only) engine view.

mod aer;
mod cw;
mod null;
mod prm;

pub use aer::AcquisitionRestitution;
pub use cw::CriticalWindow;
pub use null::Null;
pub use prm::PrecautiousRm;

use crate::{
    error::Result,
    job::{IndexSet, Job},
    space::View,
    time::Time,
    workload::Workload
};

use clap::ValueEnum;

use std::fmt;

/// An idle-time insertion policy over engine views of type `V`.
pub trait Iip<V: View + ?Sized> {
    /// Returns the latest time at which job `j` may start, if considered
    /// for dispatch at time `t` in a state with scheduled-set `scheduled`.
    ///
    /// The result may be [`Time::INFINITY`], meaning that the policy never
    /// objects to dispatching `j`.
    fn latest_start(&self, view: &V, j: &Job, t: Time, scheduled: &IndexSet) -> Time;

    /// Tests whether the policy can ever insert idle time.
    ///
    /// This is fixed per policy type (see the `CAN_BLOCK` constant of each
    /// implementation); when it is `false` the engine may skip exploring
    /// idle branches altogether.
    fn can_block(&self) -> bool;

    /// Returns the name of the policy.
    fn name(&self) -> &'static str;
}

/// Selector for the available policies.
#[derive(Debug, PartialEq, Eq, Clone, Copy, ValueEnum)]
pub enum Kind {
    /// Work-conserving; never inserts idle time
    Null,
    /// Acquisition/restitution of cores
    Aer,
    /// Precautious rate-monotonic
    Prm,
    /// Critical window
    Cw
}

impl Kind {
    /// Every policy kind, in declaration order.
    pub const ALL: [Kind; 4] = [Kind::Null, Kind::Aer, Kind::Prm, Kind::Cw];

    /// Constructs the policy of this kind for `jobs` as seen through `view`.
    ///
    /// # Errors
    ///
    /// Fails if the policy cannot be built for `jobs`; see
    /// [`AcquisitionRestitution::new`].
    pub fn build<V>(self, view: &V, jobs: &Workload) -> Result<Box<dyn Iip<V> + Send + Sync>>
    where V: View + ?Sized {
        Ok(match self {
            Kind::Null => Box::new(Null::new(view, jobs)),
            Kind::Aer  => Box::new(AcquisitionRestitution::new(view, jobs)?),
            Kind::Prm  => Box::new(PrecautiousRm::new(view, jobs)),
            Kind::Cw   => Box::new(CriticalWindow::new(view, jobs))
        })
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Kind::Null => write!(f, "null"),
            Kind::Aer  => write!(f, "aer"),
            Kind::Prm  => write!(f, "prm"),
            Kind::Cw   => write!(f, "cw")
        }
    }
}
