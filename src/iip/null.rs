use crate::{
    iip::Iip,
    job::{IndexSet, Job},
    space::View,
    time::Time,
    workload::Workload
};

/// The work-conserving policy: idle time is never inserted.
pub struct Null;

impl Null {
    pub const CAN_BLOCK: bool = false;

    /// Constructs the null policy. Neither argument is inspected.
    pub fn new<V: View + ?Sized>(_view: &V, _jobs: &Workload) -> Self {
        Self
    }
}

impl<V: View + ?Sized> Iip<V> for Null {
    fn latest_start(&self, _view: &V, _j: &Job, _t: Time, _scheduled: &IndexSet) -> Time {
        Time::INFINITY
    }

    fn can_block(&self) -> bool { Self::CAN_BLOCK }

    fn name(&self) -> &'static str { "null" }
}
