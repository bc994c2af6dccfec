pub mod obstacle_map;

pub use obstacle_map::{ObstacleMap, WorldBounds};
