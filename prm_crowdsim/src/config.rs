//! Simulation parameters and scenario loading.
//!
//! A scenario file is a flat YAML mapping. Every key is optional:
//!
//! ```yaml
//! num_obstacles: 50
//! num_nodes: 100
//! num_agents: 2
//! width: 500
//! height: 500
//! k_goal: 50
//! k_avoid: 100
//! goal_speed: 200
//! seed: 7
//! ```

use yaml_rust::{Yaml, YamlLoader};

use crate::error::{CrowdSimError, CrowdSimResult};

/// Tunables for one simulation run.
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationParameters {
    /// Obstacles placed at random on setup
    pub num_obstacles: usize,
    /// Roadmap samples per agent
    pub num_nodes: usize,
    /// Agents spawned on setup
    pub num_agents: usize,
    /// World extent along x, centered on the origin
    pub width: f64,
    /// World extent along y, centered on the origin
    pub height: f64,
    /// Goal attraction gain
    pub k_goal: f64,
    /// Avoidance gain
    pub k_avoid: f64,
    /// Maximum speed requested by the goal force
    pub goal_speed: f64,
    pub agent_radius: f64,
    /// Random obstacles draw their radius from `[min_obstacle_radius, max_obstacle_radius)`
    pub min_obstacle_radius: f64,
    pub max_obstacle_radius: f64,
    /// Safety margin that keeps samples clear of obstacle surfaces
    pub sample_epsilon: f64,
    /// Distance to a subgoal below which avoidance is switched off
    pub arrival_threshold: f64,
    /// Rejection sampling gives up after this many draws
    pub max_sample_attempts: usize,
    pub seed: u64,
    /// Ticks run by the headless driver
    pub ticks: usize,
    /// Seconds per tick for the headless driver
    pub dt: f64,
}

impl Default for SimulationParameters {
    fn default() -> Self {
        SimulationParameters {
            num_obstacles: 50,
            num_nodes: 100,
            num_agents: 2,
            width: 500f64,
            height: 500f64,
            k_goal: 50f64,
            k_avoid: 100f64,
            goal_speed: 200f64,
            agent_radius: 1f64,
            min_obstacle_radius: 10f64,
            max_obstacle_radius: 20f64,
            sample_epsilon: 2f64,
            arrival_threshold: 5f64,
            max_sample_attempts: 10_000,
            seed: 0,
            ticks: 600,
            dt: 1f64 / 60f64,
        }
    }
}

fn read_f64(doc: &Yaml, key: &str, target: &mut f64) -> CrowdSimResult<()> {
    match &doc[key] {
        Yaml::BadValue | Yaml::Null => Ok(()),
        Yaml::Integer(value) => {
            *target = *value as f64;
            Ok(())
        }
        Yaml::Real(_) => {
            // as_f64 only fails on malformed reals
            *target = doc[key].as_f64().ok_or_else(|| {
                CrowdSimError::Config(format!("`{}` is not a valid number", key))
            })?;
            Ok(())
        }
        _ => Err(CrowdSimError::Config(format!("`{}` must be a number", key))),
    }
}

fn read_usize(doc: &Yaml, key: &str, target: &mut usize) -> CrowdSimResult<()> {
    match &doc[key] {
        Yaml::BadValue | Yaml::Null => Ok(()),
        Yaml::Integer(value) if *value >= 0 => {
            *target = *value as usize;
            Ok(())
        }
        _ => Err(CrowdSimError::Config(format!(
            "`{}` must be a non-negative integer",
            key
        ))),
    }
}

impl SimulationParameters {
    /// Parses a scenario. Keys that are absent keep their default value.
    pub fn from_yaml(yaml_str: &str) -> CrowdSimResult<Self> {
        let docs = YamlLoader::load_from_str(yaml_str)?;
        let mut params = SimulationParameters::default();
        let doc = match docs.first() {
            Some(doc) => doc,
            None => return Ok(params),
        };
        if !matches!(doc, Yaml::Hash(_)) {
            return Err(CrowdSimError::Config(
                "scenario must be a YAML mapping".to_owned(),
            ));
        }

        read_usize(doc, "num_obstacles", &mut params.num_obstacles)?;
        read_usize(doc, "num_nodes", &mut params.num_nodes)?;
        read_usize(doc, "num_agents", &mut params.num_agents)?;
        read_f64(doc, "width", &mut params.width)?;
        read_f64(doc, "height", &mut params.height)?;
        read_f64(doc, "k_goal", &mut params.k_goal)?;
        read_f64(doc, "k_avoid", &mut params.k_avoid)?;
        read_f64(doc, "goal_speed", &mut params.goal_speed)?;
        read_f64(doc, "agent_radius", &mut params.agent_radius)?;
        read_f64(doc, "min_obstacle_radius", &mut params.min_obstacle_radius)?;
        read_f64(doc, "max_obstacle_radius", &mut params.max_obstacle_radius)?;
        read_f64(doc, "sample_epsilon", &mut params.sample_epsilon)?;
        read_f64(doc, "arrival_threshold", &mut params.arrival_threshold)?;
        read_usize(doc, "max_sample_attempts", &mut params.max_sample_attempts)?;
        let mut seed = params.seed as usize;
        read_usize(doc, "seed", &mut seed)?;
        params.seed = seed as u64;
        read_usize(doc, "ticks", &mut params.ticks)?;
        read_f64(doc, "dt", &mut params.dt)?;

        params.validate()?;
        Ok(params)
    }

    /// Rejects parameter combinations the planners cannot work with.
    pub fn validate(&self) -> CrowdSimResult<()> {
        let real_fields = [
            ("width", self.width),
            ("height", self.height),
            ("k_goal", self.k_goal),
            ("k_avoid", self.k_avoid),
            ("goal_speed", self.goal_speed),
            ("agent_radius", self.agent_radius),
            ("min_obstacle_radius", self.min_obstacle_radius),
            ("max_obstacle_radius", self.max_obstacle_radius),
            ("sample_epsilon", self.sample_epsilon),
            ("arrival_threshold", self.arrival_threshold),
            ("dt", self.dt),
        ];
        for (key, value) in real_fields {
            if !value.is_finite() {
                return Err(CrowdSimError::Config(format!(
                    "`{}` must be finite, got {}",
                    key, value
                )));
            }
        }
        if !(self.width > 0f64 && self.height > 0f64) {
            return Err(CrowdSimError::Config(
                "world width and height must be positive".to_owned(),
            ));
        }
        if self.agent_radius < 0f64 {
            return Err(CrowdSimError::Config(
                "agent radius must not be negative".to_owned(),
            ));
        }
        if self.width <= 2f64 * self.agent_radius || self.height <= 2f64 * self.agent_radius {
            return Err(CrowdSimError::Config(
                "world is too small to hold an agent".to_owned(),
            ));
        }
        if self.min_obstacle_radius <= 0f64 || self.max_obstacle_radius < self.min_obstacle_radius
        {
            return Err(CrowdSimError::Config(format!(
                "invalid obstacle radius range [{}, {})",
                self.min_obstacle_radius, self.max_obstacle_radius
            )));
        }
        if self.k_goal < 0f64 || self.k_avoid < 0f64 || self.goal_speed < 0f64 {
            return Err(CrowdSimError::Config(
                "gains and goal speed must not be negative".to_owned(),
            ));
        }
        if self.sample_epsilon < 0f64 || self.arrival_threshold < 0f64 {
            return Err(CrowdSimError::Config(
                "sampling margin and arrival threshold must not be negative".to_owned(),
            ));
        }
        if self.max_sample_attempts == 0 {
            return Err(CrowdSimError::Config(
                "max_sample_attempts must be at least 1".to_owned(),
            ));
        }
        if !(self.dt > 0f64) {
            return Err(CrowdSimError::Config("dt must be positive".to_owned()));
        }
        Ok(())
    }
}
