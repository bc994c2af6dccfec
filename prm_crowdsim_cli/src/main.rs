use std::env;
use std::fs;
use std::process;
use std::time::Duration;

use log::{error, info};
use prm_crowdsim::{Agent, CrowdSimError, CrowdSimResult, Simulation, SimulationParameters};
use statrs::statistics::Statistics;

/// Reads the scenario named by the first argument, or falls back to defaults.
fn load_parameters() -> CrowdSimResult<SimulationParameters> {
    match env::args().nth(1) {
        Some(path) => {
            info!("Loading scenario {}", path);
            let yaml = fs::read_to_string(&path)
                .map_err(|e| CrowdSimError::Config(format!("cannot read {}: {}", path, e)))?;
            SimulationParameters::from_yaml(&yaml)
        }
        None => {
            info!("No scenario given, using defaults");
            Ok(SimulationParameters::default())
        }
    }
}

fn planned_length(agent: &Agent) -> f64 {
    agent
        .path_segments()
        .iter()
        .map(|(from, to)| (to - from).norm())
        .sum()
}

/// Smallest centre distance minus combined radii over all agent pairs.
fn min_clearance(simulation: &Simulation) -> f64 {
    let agents: Vec<&Agent> = simulation.agents().collect();
    let mut clearance = f64::INFINITY;
    for (i, a) in agents.iter().enumerate() {
        for b in agents.iter().skip(i + 1) {
            let gap = (a.position - b.position).norm() - a.radius - b.radius;
            clearance = clearance.min(gap);
        }
    }
    clearance
}

fn run() -> CrowdSimResult<()> {
    let params = load_parameters()?;
    let ticks = params.ticks;
    let dt = Duration::from_secs_f64(params.dt);
    let arrival_threshold = params.arrival_threshold;

    let mut simulation = Simulation::from_parameters(params)?;
    for agent in simulation.agents() {
        info!(
            "Agent {}: {:?} -> {:?} via {} roadmap nodes",
            agent.agent_id,
            agent.start_position,
            agent.goal_position,
            agent.route().len()
        );
    }

    let report_every = (ticks / 10).max(1);
    let mut worst_clearance = f64::INFINITY;
    for tick in 1..=ticks {
        simulation.step(dt);
        worst_clearance = worst_clearance.min(min_clearance(&simulation));
        if tick % report_every == 0 {
            let arrived = simulation
                .agents()
                .filter(|agent| agent.has_arrived(arrival_threshold))
                .count();
            info!(
                "t = {:.2}s: {}/{} agents arrived",
                simulation.sim_time().as_secs_f64(),
                arrived,
                simulation.num_agents()
            );
        }
    }

    let remaining: Vec<f64> = simulation
        .agents()
        .map(|agent| (agent.goal_position - agent.position).norm())
        .collect();
    let lengths: Vec<f64> = simulation.agents().map(planned_length).collect();

    println!(
        "{} agents, {} obstacles, {:.2}s simulated",
        simulation.num_agents(),
        simulation.map().obstacles().len(),
        simulation.sim_time().as_secs_f64()
    );
    if !remaining.is_empty() {
        println!(
            "distance to goal: mean {:.2} max {:.2}",
            Statistics::mean(&remaining),
            Statistics::max(&remaining)
        );
        println!(
            "planned path length: mean {:.2} std dev {:.2}",
            Statistics::mean(&lengths),
            Statistics::std_dev(&lengths)
        );
    }
    if worst_clearance.is_finite() {
        println!("worst agent clearance: {:.3}", worst_clearance);
    }
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        error!("{}", e);
        process::exit(1);
    }
}
