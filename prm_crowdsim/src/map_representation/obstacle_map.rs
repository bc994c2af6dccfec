use log::debug;
use rand::Rng;

use crate::error::{CrowdSimError, CrowdSimResult};
use crate::geometry::{point_inside_any_circle, Circle, Obstacle};
use crate::Point;

/// Axis aligned world rectangle centered on the origin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WorldBounds {
    pub width: f64,
    pub height: f64,
}

impl WorldBounds {
    pub fn new(width: f64, height: f64) -> CrowdSimResult<Self> {
        if !(width > 0f64 && height > 0f64) {
            return Err(CrowdSimError::Config(format!(
                "world bounds must be positive, got {} x {}",
                width, height
            )));
        }
        Ok(WorldBounds { width, height })
    }

    /// Draws a point uniformly from the bounds shrunk by `inset` on every side.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R, inset: f64) -> CrowdSimResult<Point> {
        let half_width = self.width / 2f64 - inset;
        let half_height = self.height / 2f64 - inset;
        if half_width <= 0f64 || half_height <= 0f64 {
            return Err(CrowdSimError::Config(format!(
                "an inset of {} leaves no room in {} x {} bounds",
                inset, self.width, self.height
            )));
        }
        let x = rng.gen_range(-half_width..half_width);
        let y = rng.gen_range(-half_height..half_height);
        Ok(Point::new(x, y))
    }

    pub fn contains(&self, point: &Point) -> bool {
        point.x.abs() <= self.width / 2f64 && point.y.abs() <= self.height / 2f64
    }
}

/// The static environment shared read-only by every agent during a tick.
#[derive(Clone, Debug)]
pub struct ObstacleMap {
    bounds: WorldBounds,
    obstacles: Vec<Obstacle>,
}

impl ObstacleMap {
    pub fn new(bounds: WorldBounds) -> Self {
        ObstacleMap {
            bounds,
            obstacles: vec![],
        }
    }

    pub fn with_obstacles(bounds: WorldBounds, obstacles: Vec<Obstacle>) -> Self {
        ObstacleMap { bounds, obstacles }
    }

    pub fn bounds(&self) -> &WorldBounds {
        &self.bounds
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    /// Obstacles grown by `agent_radius`, so an agent of that size can be
    /// planned for as a point. The stored obstacles are left untouched.
    pub fn inflated(&self, agent_radius: f64) -> Vec<Circle> {
        self.obstacles
            .iter()
            .map(|obstacle| obstacle.inflated(agent_radius))
            .collect()
    }

    pub fn add_obstacle(&mut self, obstacle: Obstacle) {
        self.obstacles.push(obstacle);
    }

    pub fn remove_obstacle(&mut self, index: usize) -> CrowdSimResult<Obstacle> {
        if index >= self.obstacles.len() {
            return Err(CrowdSimError::ObstacleNotFound(index));
        }
        Ok(self.obstacles.remove(index))
    }

    pub fn clear(&mut self) {
        self.obstacles.clear();
    }

    /// Scatters `count` non-overlapping obstacles with radii drawn from
    /// `[min_radius, max_radius)`. Each candidate is kept clear of previously
    /// placed obstacles by `epsilon`. Gives up after `max_attempts` draws for a
    /// single obstacle.
    pub fn place_random_obstacles<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        count: usize,
        min_radius: f64,
        max_radius: f64,
        epsilon: f64,
        max_attempts: usize,
    ) -> CrowdSimResult<()> {
        for _ in 0..count {
            let mut placed = false;
            for _ in 0..max_attempts {
                let radius = if max_radius > min_radius {
                    rng.gen_range(min_radius..max_radius)
                } else {
                    min_radius
                };
                let center = self.bounds.sample(rng, radius)?;
                // Grow the existing obstacles by the candidate radius so the
                // candidate can be tested as a point.
                if !point_inside_any_circle(&center, &self.inflated(radius), epsilon) {
                    self.obstacles.push(Obstacle::new(center, radius));
                    placed = true;
                    break;
                }
            }
            if !placed {
                return Err(CrowdSimError::SamplingExhausted {
                    attempts: max_attempts,
                });
            }
        }
        debug!("Placed {} obstacles, {} total", count, self.obstacles.len());
        Ok(())
    }
}
