pub mod local_planner;
pub mod no_local_plan;
pub mod ttc;

pub use local_planner::LocalPlanner;
pub use no_local_plan::NoLocalPlan;
pub use ttc::TtcAvoidance;
