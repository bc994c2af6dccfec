use crate::agent::AgentState;
use crate::geometry::{time_to_circle_collision, Hit};
use crate::local_planners::local_planner::LocalPlanner;
use crate::Vec2f;

/// Upper bound on a single pairwise force, guards against `t -> 0`.
const MAX_FORCE_MAGNITUDE: f64 = 1e15f64;

/// Predictive avoidance based on time to collision.
///
/// For every neighbour with a predicted contact at time `t > 0`, both agents
/// are extrapolated to `t` and the agent is pushed along the separation of the
/// two extrapolated positions with magnitude `gain / t`. Pairs that already
/// overlap, or never meet, contribute nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct TtcAvoidance {}

impl TtcAvoidance {
    pub fn new() -> Self {
        TtcAvoidance {}
    }

    /// Predicted contact between the two disks assuming constant velocities.
    pub fn time_to_collision(&self, agent: &AgentState, other: &AgentState) -> Hit {
        time_to_circle_collision(
            &other.position,
            agent.radius + other.radius,
            &agent.position,
            &(agent.velocity - other.velocity),
        )
    }

    fn compute_agent_force(&self, agent: &AgentState, other: &AgentState, gain: f64) -> Vec2f {
        let t = match self.time_to_collision(agent, other) {
            Hit::At(t) => t,
            Hit::Overlapping | Hit::Miss => return Vec2f::zeros(),
        };

        let future_pos = agent.position + agent.velocity * t;
        let other_future_pos = other.position + other.velocity * t;
        let separation = future_pos - other_future_pos;
        let dist = separation.norm();
        if dist <= f64::EPSILON {
            return Vec2f::zeros();
        }

        let magnitude = (gain / t).min(MAX_FORCE_MAGNITUDE);
        separation * (magnitude / dist)
    }
}

impl LocalPlanner for TtcAvoidance {
    fn avoidance_force(
        &self,
        agent: &AgentState,
        nearby_agents: &[AgentState],
        gain: f64,
    ) -> Vec2f {
        let mut force = Vec2f::zeros();
        for nearby_agent in nearby_agents {
            if nearby_agent.agent_id == agent.agent_id {
                continue;
            }
            force += self.compute_agent_force(agent, nearby_agent, gain);
        }
        force
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Point;

    fn state(agent_id: usize, position: Point, velocity: Vec2f) -> AgentState {
        AgentState {
            agent_id,
            position,
            velocity,
            radius: 1f64,
        }
    }

    #[test]
    fn test_head_on_force_pushes_back() {
        let planner = TtcAvoidance::new();
        let me = state(0, Point::new(0f64, 0f64), Vec2f::new(1f64, 0f64));
        let other = state(1, Point::new(10f64, 0f64), Vec2f::new(-1f64, 0f64));
        assert_eq!(planner.time_to_collision(&me, &other), Hit::At(4f64));

        let force = planner.avoidance_force(&me, &[other], 100f64);
        assert!((force - Vec2f::new(-25f64, 0f64)).norm() < 1e-9);
    }

    #[test]
    fn test_sooner_collisions_push_harder() {
        let planner = TtcAvoidance::new();
        let me = state(0, Point::new(0f64, 0f64), Vec2f::new(1f64, 0f64));
        let far = state(1, Point::new(20f64, 0f64), Vec2f::new(-1f64, 0f64));
        let near = state(2, Point::new(6f64, 0f64), Vec2f::new(-1f64, 0f64));
        let far_force = planner.avoidance_force(&me, &[far], 10f64);
        let near_force = planner.avoidance_force(&me, &[near], 10f64);
        assert!(near_force.norm() > far_force.norm());
    }

    #[test]
    fn test_no_force_without_predicted_collision() {
        let planner = TtcAvoidance::new();
        let me = state(0, Point::new(0f64, 0f64), Vec2f::new(1f64, 0f64));
        let diverging = state(1, Point::new(10f64, 0f64), Vec2f::new(2f64, 0f64));
        let resting = state(2, Point::new(0f64, 10f64), Vec2f::new(1f64, 0f64));
        let force = planner.avoidance_force(&me, &[diverging, resting], 100f64);
        assert_eq!(force, Vec2f::zeros());
    }

    #[test]
    fn test_no_force_when_already_overlapping() {
        let planner = TtcAvoidance::new();
        let me = state(0, Point::new(0f64, 0f64), Vec2f::new(1f64, 0f64));
        let other = state(1, Point::new(1f64, 0f64), Vec2f::new(-1f64, 0f64));
        assert_eq!(planner.time_to_collision(&me, &other), Hit::Overlapping);
        assert_eq!(planner.avoidance_force(&me, &[other], 100f64), Vec2f::zeros());
    }

    #[test]
    fn test_ignores_itself() {
        let planner = TtcAvoidance::new();
        let me = state(3, Point::new(0f64, 0f64), Vec2f::new(1f64, 0f64));
        assert_eq!(planner.avoidance_force(&me, &[me], 100f64), Vec2f::zeros());
    }
}
