//! Utilization-based schedulability bounds.

use crate::task::Set;

use num_order::NumOrd;

/// Necessary condition for schedulability of task-set `ts` on `num_cores`
/// cores under any scheduler: total utilization no greater than `num_cores`
/// and every task feasible in isolation.
///
/// Task-sets failing this test need not be analyzed further.
pub fn necessary(ts: impl Set + Clone, num_cores: usize) -> bool {
    ts.clone().utilization().num_le(&num_cores) && ts.feasible()
}
