use crate::agent::AgentState;
use crate::Vec2f;

pub trait LocalPlanner {
    /// Steering force that keeps `agent` clear of the moving `nearby_agents`.
    /// `gain` is the agent's avoidance gain.
    fn avoidance_force(&self, agent: &AgentState, nearby_agents: &[AgentState], gain: f64)
        -> Vec2f;
}
