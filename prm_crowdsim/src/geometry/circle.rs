use crate::Point;

/// A disk in the plane. Obstacles, inflated obstacles and agent bodies are all
/// represented this way.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Circle {
    pub center: Point,
    pub radius: f64,
}

/// Static obstacles are plain circles. They are never inflated in place,
/// see [`Circle::inflated`].
pub type Obstacle = Circle;

impl Circle {
    pub fn new(center: Point, radius: f64) -> Self {
        Circle { center, radius }
    }

    /// Returns a copy grown by `amount`. Used to account for the size of the
    /// querying agent so point and segment tests can treat it as a point.
    pub fn inflated(&self, amount: f64) -> Self {
        Circle {
            center: self.center,
            radius: self.radius + amount,
        }
    }

    /// True if `point` lies within `radius + epsilon` of the center.
    pub fn contains(&self, point: &Point, epsilon: f64) -> bool {
        (point - self.center).norm() <= self.radius + epsilon
    }
}
