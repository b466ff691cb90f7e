pub mod interval;
pub mod planner;

pub use interval::{Interval, IntervalField};
pub use planner::IntervalPlanner;
