pub mod astar;
pub mod roadmap;

pub use astar::{plan_path, AStarSearch, PlanOutcome};
pub use roadmap::{FreeSpaceSampler, Roadmap};
