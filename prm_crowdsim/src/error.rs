//! Crate error type.
//!
//! Planning failures (unreachable start/goal, exhausted search) are not errors:
//! they are reported as a [`PlanOutcome`](crate::highlevel_planners::PlanOutcome)
//! and the agent falls back to steering straight at its goal.

use thiserror::Error;

use crate::AgentId;

#[derive(Debug, Error)]
pub enum CrowdSimError {
    #[error("no free position found after {attempts} samples; obstacle density too high")]
    SamplingExhausted { attempts: usize },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] yaml_rust::ScanError),

    #[error("agent {0} not found")]
    AgentNotFound(AgentId),

    #[error("obstacle {0} not found")]
    ObstacleNotFound(usize),
}

pub type CrowdSimResult<T> = Result<T, CrowdSimError>;
