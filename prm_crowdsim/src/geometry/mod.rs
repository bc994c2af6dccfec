pub mod circle;
pub mod collision;

pub use circle::{Circle, Obstacle};
pub use collision::{
    point_inside_any_circle, ray_circle_first_hit, ray_circle_list_first_hit, segment_is_clear,
    time_to_circle_collision, Hit,
};
