use crate::agent::AgentState;
use crate::local_planners::local_planner::LocalPlanner;
use crate::Vec2f;

/// Disables avoidance; agents only follow their goal force.
pub struct NoLocalPlan {}

impl LocalPlanner for NoLocalPlan {
    fn avoidance_force(
        &self,
        _agent: &AgentState,
        _nearby_agents: &[AgentState],
        _gain: f64,
    ) -> Vec2f {
        Vec2f::zeros()
    }
}
