//! Agent state and the per-frame steering model.

use log::{info, trace};
use rand::Rng;

use crate::config::SimulationParameters;
use crate::error::CrowdSimResult;
use crate::geometry::{segment_is_clear, Circle};
use crate::highlevel_planners::{plan_path, FreeSpaceSampler, PlanOutcome, Roadmap};
use crate::local_planners::LocalPlanner;
use crate::{AgentId, Point, Vec2f};

/// The read-only view of an agent that other agents see during a tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AgentState {
    pub agent_id: AgentId,
    pub position: Point,
    pub velocity: Vec2f,
    pub radius: f64,
}

/// Size and gains shared by agents spawned from the same parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AgentProfile {
    pub radius: f64,
    /// Goal attraction gain
    pub goal_gain: f64,
    /// Avoidance gain
    pub avoidance_gain: f64,
    /// Speed cap applied to the desired velocity of the goal force
    pub max_goal_speed: f64,
}

impl From<&SimulationParameters> for AgentProfile {
    fn from(params: &SimulationParameters) -> Self {
        AgentProfile {
            radius: params.agent_radius,
            goal_gain: params.k_goal,
            avoidance_gain: params.k_avoid,
            max_goal_speed: params.goal_speed,
        }
    }
}

/// Data representing an individual agent.
///
/// The agent owns its roadmap and its route through it. Route entries are
/// always valid indices into the roadmap.
#[derive(Clone, Debug)]
pub struct Agent {
    /// Unique Agent ID
    pub agent_id: AgentId,
    pub position: Point,
    pub start_position: Point,
    pub goal_position: Point,
    pub radius: f64,
    pub velocity: Vec2f,
    /// Acceleration applied on the last update
    pub acceleration: Vec2f,
    pub goal_gain: f64,
    pub avoidance_gain: f64,
    pub max_goal_speed: f64,
    roadmap: Roadmap,
    /// Node route from the last plan
    route: Vec<usize>,
    /// Index into `route` of the current subgoal
    next_waypoint: usize,
}

impl Agent {
    /// Creates an agent at rest on `start` with no roadmap. Until a roadmap is
    /// built the agent steers straight at `goal`.
    pub fn new(agent_id: AgentId, start: Point, goal: Point, profile: AgentProfile) -> Self {
        Agent {
            agent_id,
            position: start,
            start_position: start,
            goal_position: goal,
            radius: profile.radius,
            velocity: Vec2f::zeros(),
            acceleration: Vec2f::zeros(),
            goal_gain: profile.goal_gain,
            avoidance_gain: profile.avoidance_gain,
            max_goal_speed: profile.max_goal_speed,
            roadmap: Roadmap::default(),
            route: vec![],
            next_waypoint: 0,
        }
    }

    pub fn state(&self) -> AgentState {
        AgentState {
            agent_id: self.agent_id,
            position: self.position,
            velocity: self.velocity,
            radius: self.radius,
        }
    }

    pub fn roadmap(&self) -> &Roadmap {
        &self.roadmap
    }

    /// Full node route of the last plan, including nodes already passed.
    pub fn route(&self) -> &[usize] {
        &self.route
    }

    /// Route nodes not yet reached. The first entry is the current subgoal.
    pub fn remaining_path(&self) -> &[usize] {
        &self.route[self.next_waypoint.min(self.route.len())..]
    }

    pub fn remaining_path_positions(&self) -> Vec<Point> {
        self.remaining_path()
            .iter()
            .map(|node| self.roadmap.nodes()[*node])
            .collect()
    }

    /// The point the agent is currently heading for: the next route node, or
    /// the goal once the route is used up or was never found.
    pub fn current_subgoal(&self) -> Point {
        match self.remaining_path().first() {
            Some(node) => self.roadmap.nodes()[*node],
            None => self.goal_position,
        }
    }

    /// True once the route is used up and the agent is within `tolerance` of
    /// its goal.
    pub fn has_arrived(&self, tolerance: f64) -> bool {
        self.remaining_path().is_empty()
            && (self.goal_position - self.position).norm() <= tolerance
    }

    /// Line segments start -> route nodes -> goal for drawing the plan.
    pub fn path_segments(&self) -> Vec<(Point, Point)> {
        let mut waypoints = Vec::with_capacity(self.route.len() + 2);
        waypoints.push(self.start_position);
        waypoints.extend(self.route.iter().map(|node| self.roadmap.nodes()[*node]));
        waypoints.push(self.goal_position);
        waypoints.windows(2).map(|pair| (pair[0], pair[1])).collect()
    }

    /// Samples a fresh roadmap and plans on it. `sampler` must be built from
    /// obstacles inflated by this agent's radius.
    pub fn build_roadmap<R: Rng + ?Sized>(
        &mut self,
        sampler: &FreeSpaceSampler,
        node_count: usize,
        rng: &mut R,
    ) -> CrowdSimResult<PlanOutcome> {
        self.roadmap = Roadmap::build(sampler, node_count, rng)?;
        info!(
            "Agent {}: roadmap with {} nodes and {} edges",
            self.agent_id,
            self.roadmap.len(),
            self.roadmap.edge_count()
        );
        Ok(self.replan(sampler.obstacles()))
    }

    /// Plans from the start position to the goal on the current roadmap. Any
    /// failure leaves an empty route.
    pub fn replan(&mut self, obstacles: &[Circle]) -> PlanOutcome {
        let outcome = plan_path(
            &self.roadmap,
            obstacles,
            &self.start_position,
            &self.goal_position,
        );
        self.route = match &outcome {
            PlanOutcome::Found(route) => route.clone(),
            _ => vec![],
        };
        self.next_waypoint = 0;
        info!(
            "Agent {}: planned route of {} nodes",
            self.agent_id,
            self.route.len()
        );
        outcome
    }

    /// Reacts to an edited obstacle set: the current position becomes the new
    /// start, roadmap edges are recomputed on the existing nodes and the route
    /// is planned again.
    pub fn on_obstacles_changed(&mut self, obstacles: &[Circle]) -> PlanOutcome {
        self.start_position = self.position;
        self.roadmap.connect_neighbours(obstacles);
        self.replan(obstacles)
    }

    /// Skips the current subgoal when the one after it (or the goal, if the
    /// current subgoal is the last node) is directly visible.
    fn try_shortcut(&mut self, obstacles: &[Circle]) -> bool {
        let remaining = self.remaining_path();
        if remaining.is_empty() {
            return false;
        }
        let target = match remaining.get(1) {
            Some(node) => self.roadmap.nodes()[*node],
            None => self.goal_position,
        };
        if segment_is_clear(obstacles, &self.position, &target) {
            self.next_waypoint += 1;
            return true;
        }
        false
    }

    /// Computes this frame's acceleration from the goal force and, unless the
    /// agent is settling on a subgoal, the avoidance force.
    ///
    /// `nearby_agents` must be the pre-tick snapshot; `obstacles` must be
    /// inflated by this agent's radius.
    pub fn compute_acceleration(
        &mut self,
        nearby_agents: &[AgentState],
        obstacles: &[Circle],
        local_planner: &dyn LocalPlanner,
        arrival_threshold: f64,
    ) -> Vec2f {
        let subgoal = self.current_subgoal();
        let to_subgoal = subgoal - self.position;

        let mut desired_vel = to_subgoal;
        let desired_speed = desired_vel.norm();
        if desired_speed > self.max_goal_speed {
            desired_vel *= self.max_goal_speed / desired_speed;
        }
        let mut acceleration = (desired_vel - self.velocity) * self.goal_gain;

        let took_shortcut = self.try_shortcut(obstacles);
        let settling = to_subgoal.norm() < arrival_threshold;
        if !(took_shortcut || settling) {
            acceleration +=
                local_planner.avoidance_force(&self.state(), nearby_agents, self.avoidance_gain);
        }

        self.acceleration = acceleration;
        acceleration
    }

    /// One semi-implicit Euler step: velocity first, then position.
    pub fn update(
        &mut self,
        nearby_agents: &[AgentState],
        obstacles: &[Circle],
        local_planner: &dyn LocalPlanner,
        arrival_threshold: f64,
        dt: f64,
    ) {
        let acceleration =
            self.compute_acceleration(nearby_agents, obstacles, local_planner, arrival_threshold);
        self.velocity += acceleration * dt;
        self.position += self.velocity * dt;
        trace!(
            "Agent {}: pos {:?} vel {:?}",
            self.agent_id,
            self.position,
            self.velocity
        );
    }
}
