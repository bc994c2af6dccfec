//! Closed form point/circle and ray/circle tests.
//!
//! All ray casts solve `|origin + t * dir - center|^2 = radius^2` for `t`.
//! The result distinguishes a future contact ([`Hit::At`]) from a ray that
//! already starts inside the circle ([`Hit::Overlapping`]); callers that only
//! care about blocking can use [`Hit::is_hit`].

use crate::geometry::circle::Circle;
use crate::{Point, Vec2f};

/// Below this squared speed two disks are treated as relatively at rest.
const MIN_RELATIVE_SPEED_SQUARED: f64 = 1e-12;

/// Outcome of a ray or motion cast against one or more circles.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Hit {
    /// No contact within the queried range.
    Miss,
    /// The origin is already inside (or on) the circle. This is reported
    /// instead of a distance and is not a future event.
    Overlapping,
    /// First contact at the given ray parameter (distance for unit
    /// directions, time for velocities).
    At(f64),
}

impl Hit {
    pub fn is_hit(&self) -> bool {
        !matches!(self, Hit::Miss)
    }

    /// The contact parameter of a future hit. `None` for misses and overlaps.
    pub fn time(&self) -> Option<f64> {
        match self {
            Hit::At(t) => Some(*t),
            _ => None,
        }
    }
}

/// Roots `t1 <= t2` of `a t^2 + b t + c = 0`, or `None` if there are no real roots.
fn solve_quadratic(a: f64, b: f64, c: f64) -> Option<(f64, f64)> {
    let discriminant = b * b - 4f64 * a * c;
    if discriminant < 0f64 {
        return None;
    }
    let root = discriminant.sqrt();
    Some(((-b - root) / (2f64 * a), (-b + root) / (2f64 * a)))
}

/// True if `point` is within `radius + epsilon` of any circle center.
pub fn point_inside_any_circle(point: &Point, circles: &[Circle], epsilon: f64) -> bool {
    circles.iter().any(|circle| circle.contains(point, epsilon))
}

/// Casts a ray with unit length `direction` against a single circle.
///
/// Returns [`Hit::At`] for a first approach from outside with
/// `0 < t < max_distance`, and [`Hit::Overlapping`] when the origin is
/// strictly between the two intersections.
pub fn ray_circle_first_hit(
    circle: &Circle,
    origin: &Point,
    direction: &Vec2f,
    max_distance: f64,
) -> Hit {
    let to_circle = circle.center - origin;
    // direction is unit length so the leading coefficient is 1
    let b = -2f64 * direction.dot(&to_circle);
    let c = to_circle.norm_squared() - circle.radius * circle.radius;

    match solve_quadratic(1f64, b, c) {
        Some((t1, _)) if t1 > 0f64 && t1 < max_distance => Hit::At(t1),
        Some((t1, t2)) if t1 < 0f64 && t2 > 0f64 => Hit::Overlapping,
        _ => Hit::Miss,
    }
}

/// Casts a ray against every circle and returns the closest hit.
///
/// An overlap with any circle wins over every finite hit. Otherwise a hit
/// only replaces the incumbent when it is strictly closer.
pub fn ray_circle_list_first_hit(
    circles: &[Circle],
    origin: &Point,
    direction: &Vec2f,
    max_distance: f64,
) -> Hit {
    let mut closest = Hit::Miss;
    let mut limit = max_distance;
    for circle in circles {
        match ray_circle_first_hit(circle, origin, direction, limit) {
            Hit::Overlapping => return Hit::Overlapping,
            Hit::At(t) => {
                closest = Hit::At(t);
                limit = t;
            }
            Hit::Miss => {}
        }
    }
    closest
}

/// True if the straight segment `from -> to` touches none of `circles`.
///
/// A degenerate segment is clear unless its point lies strictly inside one
/// of the circles.
pub fn segment_is_clear(circles: &[Circle], from: &Point, to: &Point) -> bool {
    let delta = to - from;
    let length = delta.norm();
    if length <= f64::EPSILON {
        return !circles
            .iter()
            .any(|circle| (from - circle.center).norm() < circle.radius);
    }
    let direction = delta / length;
    !ray_circle_list_first_hit(circles, from, &direction, length).is_hit()
}

/// Predicts when a disk at `origin` moving with `relative_velocity` first
/// touches a stationary disk at `other_center`, where `combined_radius` is the
/// sum of both radii.
///
/// Unlike the ray casts this is unbounded in time. Disks that already overlap
/// report [`Hit::Overlapping`]. Disks at relative rest never collide.
pub fn time_to_circle_collision(
    other_center: &Point,
    combined_radius: f64,
    origin: &Point,
    relative_velocity: &Vec2f,
) -> Hit {
    let offset = origin - other_center;
    let c = offset.norm_squared() - combined_radius * combined_radius;
    let a = relative_velocity.norm_squared();

    if a < MIN_RELATIVE_SPEED_SQUARED {
        if c < 0f64 {
            return Hit::Overlapping;
        }
        return Hit::Miss;
    }

    let b = 2f64 * relative_velocity.dot(&offset);
    match solve_quadratic(a, b, c) {
        Some((t1, _)) if t1 > 0f64 => Hit::At(t1),
        Some((t1, t2)) if t1 <= 0f64 && t2 > 0f64 => Hit::Overlapping,
        _ => Hit::Miss,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_x() -> Vec2f {
        Vec2f::new(1f64, 0f64)
    }

    #[test]
    fn test_point_strictly_inside_any_epsilon() {
        let circles = vec![
            Circle::new(Point::new(100f64, 100f64), 3f64),
            Circle::new(Point::new(0f64, 0f64), 4f64),
        ];
        for epsilon in [0f64, 0.5f64, 2f64] {
            assert!(point_inside_any_circle(&Point::new(1f64, 1f64), &circles, epsilon));
            assert!(point_inside_any_circle(&Point::new(-3.9f64, 0f64), &circles, epsilon));
        }
        assert!(!point_inside_any_circle(&Point::new(50f64, 50f64), &circles, 2f64));
        assert!(!point_inside_any_circle(&Point::new(1f64, 1f64), &[], 2f64));
    }

    #[test]
    fn test_point_within_safety_margin() {
        let circles = vec![Circle::new(Point::new(0f64, 0f64), 4f64)];
        let near_surface = Point::new(5.5f64, 0f64);
        assert!(!point_inside_any_circle(&near_surface, &circles, 0f64));
        assert!(point_inside_any_circle(&near_surface, &circles, 2f64));
    }

    #[test]
    fn test_ray_hits_circle_ahead() {
        let circle = Circle::new(Point::new(10f64, 0f64), 2f64);
        let hit = ray_circle_first_hit(&circle, &Point::new(0f64, 0f64), &unit_x(), 100f64);
        assert_eq!(hit, Hit::At(8f64));
    }

    #[test]
    fn test_ray_stops_short_of_circle() {
        let circle = Circle::new(Point::new(10f64, 0f64), 2f64);
        let hit = ray_circle_first_hit(&circle, &Point::new(0f64, 0f64), &unit_x(), 7.9f64);
        assert_eq!(hit, Hit::Miss);
    }

    #[test]
    fn test_ray_pointing_away() {
        let circle = Circle::new(Point::new(10f64, 0f64), 2f64);
        let hit = ray_circle_first_hit(&circle, &Point::new(0f64, 0f64), &-unit_x(), 100f64);
        assert_eq!(hit, Hit::Miss);
    }

    #[test]
    fn test_ray_starting_inside_reports_overlap() {
        let circle = Circle::new(Point::new(0f64, 0f64), 5f64);
        let hit = ray_circle_first_hit(&circle, &Point::new(1f64, 1f64), &unit_x(), 0.5f64);
        assert_eq!(hit, Hit::Overlapping);
        assert!(hit.is_hit());
        assert_eq!(hit.time(), None);
    }

    #[test]
    fn test_list_keeps_closest_hit() {
        let circles = vec![
            Circle::new(Point::new(30f64, 0f64), 2f64),
            Circle::new(Point::new(10f64, 0f64), 2f64),
            Circle::new(Point::new(20f64, 0f64), 2f64),
        ];
        let hit = ray_circle_list_first_hit(&circles, &Point::new(0f64, 0f64), &unit_x(), 100f64);
        assert_eq!(hit, Hit::At(8f64));
    }

    #[test]
    fn test_list_overlap_overrides_closer_hit() {
        let circles = vec![
            Circle::new(Point::new(10f64, 0f64), 2f64),
            Circle::new(Point::new(-50f64, 0f64), 60f64),
        ];
        let hit = ray_circle_list_first_hit(&circles, &Point::new(0f64, 0f64), &unit_x(), 100f64);
        assert_eq!(hit, Hit::Overlapping);
    }

    #[test]
    fn test_list_clear_segment_misses() {
        let circles = vec![
            Circle::new(Point::new(10f64, 10f64), 3f64),
            Circle::new(Point::new(-10f64, -10f64), 3f64),
            Circle::new(Point::new(50f64, 0f64), 3f64),
        ];
        let hit = ray_circle_list_first_hit(&circles, &Point::new(0f64, 0f64), &unit_x(), 40f64);
        assert_eq!(hit, Hit::Miss);
        assert!(segment_is_clear(&circles, &Point::new(0f64, 0f64), &Point::new(40f64, 0f64)));
        assert!(!segment_is_clear(&circles, &Point::new(0f64, 0f64), &Point::new(60f64, 0f64)));
    }

    #[test]
    fn test_segment_is_symmetric() {
        let circles = vec![Circle::new(Point::new(5f64, 1f64), 2f64)];
        let a = Point::new(0f64, 0f64);
        let b = Point::new(10f64, 0f64);
        assert_eq!(
            segment_is_clear(&circles, &a, &b),
            segment_is_clear(&circles, &b, &a)
        );
    }

    #[test]
    fn test_degenerate_segment() {
        let circles = vec![Circle::new(Point::new(0f64, 0f64), 2f64)];
        let outside = Point::new(5f64, 5f64);
        let inside = Point::new(0.5f64, 0f64);
        assert!(segment_is_clear(&circles, &outside, &outside));
        assert!(!segment_is_clear(&circles, &inside, &inside));
    }

    #[test]
    fn test_time_to_collision_head_on() {
        // 10 apart, combined radius 2, closing at 2 units/s
        let hit = time_to_circle_collision(
            &Point::new(10f64, 0f64),
            2f64,
            &Point::new(0f64, 0f64),
            &Vec2f::new(2f64, 0f64),
        );
        assert_eq!(hit, Hit::At(4f64));
    }

    #[test]
    fn test_time_to_collision_never_collide() {
        let hit = time_to_circle_collision(
            &Point::new(10f64, 0f64),
            2f64,
            &Point::new(0f64, 0f64),
            &Vec2f::new(-1f64, 0f64),
        );
        assert_eq!(hit, Hit::Miss);

        let passing = time_to_circle_collision(
            &Point::new(10f64, 5f64),
            2f64,
            &Point::new(0f64, 0f64),
            &Vec2f::new(1f64, 0f64),
        );
        assert_eq!(passing, Hit::Miss);
    }

    #[test]
    fn test_time_to_collision_zero_relative_velocity() {
        let apart = time_to_circle_collision(
            &Point::new(10f64, 0f64),
            2f64,
            &Point::new(0f64, 0f64),
            &Vec2f::zeros(),
        );
        assert_eq!(apart, Hit::Miss);

        let overlapping = time_to_circle_collision(
            &Point::new(1f64, 0f64),
            2f64,
            &Point::new(0f64, 0f64),
            &Vec2f::zeros(),
        );
        assert_eq!(overlapping, Hit::Overlapping);
    }

    #[test]
    fn test_time_to_collision_already_overlapping() {
        let hit = time_to_circle_collision(
            &Point::new(1f64, 0f64),
            2f64,
            &Point::new(0f64, 0f64),
            &Vec2f::new(1f64, 0f64),
        );
        assert_eq!(hit, Hit::Overlapping);
    }
}
