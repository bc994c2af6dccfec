use std::collections::BTreeMap;
use std::time::Duration;

pub extern crate nalgebra as na;
use log::{debug, info, warn};
use na::Vector2;
use rand::rngs::SmallRng;
use rand::SeedableRng;

pub mod agent;
pub mod config;
pub mod error;
pub mod geometry;
pub mod highlevel_planners;
pub mod local_planners;
pub mod map_representation;

pub use crate::agent::{Agent, AgentProfile, AgentState};
pub use crate::config::SimulationParameters;
pub use crate::error::{CrowdSimError, CrowdSimResult};
pub use crate::geometry::{Circle, Obstacle};
pub use crate::highlevel_planners::{PlanOutcome, Roadmap};
pub use crate::local_planners::LocalPlanner;
pub use crate::map_representation::{ObstacleMap, WorldBounds};

use crate::highlevel_planners::FreeSpaceSampler;
use crate::local_planners::TtcAvoidance;

/// Agent  ID
pub type AgentId = usize;

/// Point
pub type Point = Vector2<f64>;

/// 2-vector
pub type Vec2f = Vector2<f64>;

/// A representation of a simulation session
pub struct Simulation {
    /// All active agents, iterated in id order
    agents: BTreeMap<AgentId, Agent>,
    /// Static obstacles and world bounds
    map: ObstacleMap,
    /// Local avoidance strategy shared by every agent
    local_planner: Box<dyn LocalPlanner>,
    params: SimulationParameters,
    /// Source of every random draw in the session
    rng: SmallRng,
    /// Simulation time
    sim_time: Duration,
    /// Get last allocated agent id
    last_alloc_agent_id: usize,
    /// Pre-tick copy of every agent, reused between steps
    snapshot: Vec<AgentState>,
}

impl Simulation {
    /// Create a new simulation environment with no agents. The random number
    /// generator is seeded from `params.seed`.
    pub fn new(
        map: ObstacleMap,
        local_planner: Box<dyn LocalPlanner>,
        params: SimulationParameters,
    ) -> Self {
        let rng = SmallRng::seed_from_u64(params.seed);
        Self {
            agents: BTreeMap::new(),
            map,
            local_planner,
            params,
            rng,
            sim_time: Duration::new(0, 0),
            last_alloc_agent_id: 0,
            snapshot: vec![],
        }
    }

    /// Builds a full scenario: random obstacles, then `num_agents` agents with
    /// random start and goal, each with its own roadmap and route.
    pub fn from_parameters(params: SimulationParameters) -> CrowdSimResult<Self> {
        params.validate()?;
        let bounds = WorldBounds::new(params.width, params.height)?;
        let mut simulation = Simulation::new(
            ObstacleMap::new(bounds),
            Box::new(TtcAvoidance::new()),
            params,
        );
        simulation.setup()?;
        Ok(simulation)
    }

    fn setup(&mut self) -> CrowdSimResult<()> {
        self.map.place_random_obstacles(
            &mut self.rng,
            self.params.num_obstacles,
            self.params.min_obstacle_radius,
            self.params.max_obstacle_radius,
            self.params.sample_epsilon,
            self.params.max_sample_attempts,
        )?;
        for _ in 0..self.params.num_agents {
            self.add_random_agent()?;
        }
        info!(
            "Scenario ready: {} obstacles, {} agents",
            self.map.obstacles().len(),
            self.agents.len()
        );
        Ok(())
    }

    /// Drops every agent and obstacle and runs the scenario setup again. The
    /// random number generator is not reseeded, so the new scenario differs
    /// from the previous one.
    ///
    /// If the setup fails the previous agents, obstacles and simulation time
    /// are restored.
    pub fn reset(&mut self) -> CrowdSimResult<()> {
        let previous_agents = std::mem::take(&mut self.agents);
        let previous_obstacles = self.map.obstacles().to_vec();
        self.map.clear();

        if let Err(e) = self.setup() {
            warn!("Reset failed, keeping the previous scenario: {}", e);
            self.agents = previous_agents;
            self.map = ObstacleMap::with_obstacles(*self.map.bounds(), previous_obstacles);
            return Err(e);
        }
        self.snapshot.clear();
        self.sim_time = Duration::new(0, 0);
        Ok(())
    }

    pub fn params(&self) -> &SimulationParameters {
        &self.params
    }

    pub fn map(&self) -> &ObstacleMap {
        &self.map
    }

    pub fn sim_time(&self) -> Duration {
        self.sim_time
    }

    pub fn agents(&self) -> impl Iterator<Item = &Agent> {
        self.agents.values()
    }

    pub fn agent(&self, agent_id: AgentId) -> Option<&Agent> {
        self.agents.get(&agent_id)
    }

    pub fn num_agents(&self) -> usize {
        self.agents.len()
    }

    /// Adds an agent travelling from `start` to `goal`, samples its roadmap and
    /// plans its route. A failed plan is not an error: the agent is still
    /// added and heads straight for its goal.
    pub fn add_agent(&mut self, start: Point, goal: Point) -> CrowdSimResult<AgentId> {
        let agent_id = self.last_alloc_agent_id;
        let mut agent = Agent::new(agent_id, start, goal, AgentProfile::from(&self.params));

        let inflated = self.map.inflated(agent.radius);
        let sampler = FreeSpaceSampler::new(self.map.bounds(), &inflated, agent.radius)
            .with_epsilon(self.params.sample_epsilon)
            .with_max_attempts(self.params.max_sample_attempts);
        let outcome = agent.build_roadmap(&sampler, self.params.num_nodes, &mut self.rng)?;
        debug!("Agent {}: {:?}", agent_id, outcome);

        self.last_alloc_agent_id += 1;
        self.agents.insert(agent_id, agent);
        Ok(agent_id)
    }

    /// Adds an agent whose start and goal are both sampled from free space.
    pub fn add_random_agent(&mut self) -> CrowdSimResult<AgentId> {
        let radius = self.params.agent_radius;
        let inflated = self.map.inflated(radius);
        let sampler = FreeSpaceSampler::new(self.map.bounds(), &inflated, radius)
            .with_epsilon(self.params.sample_epsilon)
            .with_max_attempts(self.params.max_sample_attempts);
        let start = sampler.sample(&mut self.rng)?;
        let goal = sampler.sample(&mut self.rng)?;
        self.add_agent(start, goal)
    }

    pub fn remove_agent(&mut self, agent_id: AgentId) -> CrowdSimResult<Agent> {
        self.agents
            .remove(&agent_id)
            .ok_or(CrowdSimError::AgentNotFound(agent_id))
    }

    pub fn add_obstacle(&mut self, obstacle: Obstacle) {
        self.map.add_obstacle(obstacle);
        self.on_obstacles_changed();
    }

    pub fn remove_obstacle(&mut self, index: usize) -> CrowdSimResult<Obstacle> {
        let obstacle = self.map.remove_obstacle(index)?;
        self.on_obstacles_changed();
        Ok(obstacle)
    }

    /// Recomputes every agent's roadmap edges and replans from where the agent
    /// currently stands. Must be called between steps.
    pub fn on_obstacles_changed(&mut self) {
        info!(
            "Obstacle set changed to {} obstacles, replanning {} agents",
            self.map.obstacles().len(),
            self.agents.len()
        );
        for agent in self.agents.values_mut() {
            let inflated = self.map.inflated(agent.radius);
            agent.on_obstacles_changed(&inflated);
        }
    }

    /// Advances every agent by `dur`. All agents read the same pre-tick
    /// snapshot of the roster, so the update order does not matter.
    pub fn step(&mut self, dur: Duration) {
        let dt = dur.as_secs_f64();
        self.snapshot.clear();
        self.snapshot
            .extend(self.agents.values().map(|agent| agent.state()));

        for agent in self.agents.values_mut() {
            let inflated = self.map.inflated(agent.radius);
            agent.update(
                &self.snapshot,
                &inflated,
                self.local_planner.as_ref(),
                self.params.arrival_threshold,
                dt,
            );
        }
        self.sim_time += dur;
    }
}
