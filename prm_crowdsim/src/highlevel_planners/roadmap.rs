//! Probabilistic roadmap: random collision free samples joined by collision
//! free straight edges.

use log::debug;
use rand::Rng;

use crate::error::{CrowdSimError, CrowdSimResult};
use crate::geometry::{point_inside_any_circle, segment_is_clear, Circle};
use crate::map_representation::WorldBounds;
use crate::Point;

/// Default safety margin between a sample and an inflated obstacle surface.
pub const DEFAULT_SAMPLE_EPSILON: f64 = 2f64;

/// Default number of rejected draws before sampling gives up.
pub const DEFAULT_MAX_SAMPLE_ATTEMPTS: usize = 10_000;

/// Rejection sampler over the free space of one agent.
///
/// `obstacles` must already be inflated by the agent radius. Samples are kept
/// `agent_radius` away from the world edges.
pub struct FreeSpaceSampler<'a> {
    bounds: &'a WorldBounds,
    obstacles: &'a [Circle],
    agent_radius: f64,
    epsilon: f64,
    max_attempts: usize,
}

impl<'a> FreeSpaceSampler<'a> {
    pub fn new(bounds: &'a WorldBounds, obstacles: &'a [Circle], agent_radius: f64) -> Self {
        FreeSpaceSampler {
            bounds,
            obstacles,
            agent_radius,
            epsilon: DEFAULT_SAMPLE_EPSILON,
            max_attempts: DEFAULT_MAX_SAMPLE_ATTEMPTS,
        }
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn obstacles(&self) -> &[Circle] {
        self.obstacles
    }

    /// Draws uniformly until a point lands outside every obstacle.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> CrowdSimResult<Point> {
        for _ in 0..self.max_attempts {
            let candidate = self.bounds.sample(rng, self.agent_radius)?;
            if !point_inside_any_circle(&candidate, self.obstacles, self.epsilon) {
                return Ok(candidate);
            }
        }
        Err(CrowdSimError::SamplingExhausted {
            attempts: self.max_attempts,
        })
    }
}

/// Roadmap nodes plus an adjacency list per node.
///
/// Adjacency is symmetric and never contains self loops. Each neighbour list is
/// sorted by node index.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Roadmap {
    nodes: Vec<Point>,
    adjacency: Vec<Vec<usize>>,
}

impl Roadmap {
    /// Samples `node_count` free nodes and connects every visible pair.
    pub fn build<R: Rng + ?Sized>(
        sampler: &FreeSpaceSampler,
        node_count: usize,
        rng: &mut R,
    ) -> CrowdSimResult<Self> {
        let mut nodes = Vec::with_capacity(node_count);
        for _ in 0..node_count {
            nodes.push(sampler.sample(rng)?);
        }
        Ok(Self::from_nodes(nodes, sampler.obstacles()))
    }

    /// Connects a fixed set of nodes against `obstacles`.
    pub fn from_nodes(nodes: Vec<Point>, obstacles: &[Circle]) -> Self {
        let mut roadmap = Roadmap {
            nodes,
            adjacency: vec![],
        };
        roadmap.connect_neighbours(obstacles);
        roadmap
    }

    /// Recomputes every edge, keeping the nodes. An edge exists iff the segment
    /// between its nodes misses every (inflated) obstacle.
    ///
    /// Each unordered pair is tested once and stored in both directions.
    pub fn connect_neighbours(&mut self, obstacles: &[Circle]) {
        let n = self.nodes.len();
        self.adjacency = vec![vec![]; n];
        for i in 0..n {
            for j in (i + 1)..n {
                if segment_is_clear(obstacles, &self.nodes[i], &self.nodes[j]) {
                    self.adjacency[i].push(j);
                    self.adjacency[j].push(i);
                }
            }
        }
        debug!(
            "Connected roadmap: {} nodes, {} edges",
            n,
            self.edge_count()
        );
    }

    /// Index of the nearest node that can be reached from `point` in a straight
    /// line. A node only replaces the incumbent when strictly closer.
    pub fn closest_reachable_node(&self, obstacles: &[Circle], point: &Point) -> Option<usize> {
        let mut closest = None;
        let mut min_dist = f64::INFINITY;
        for (index, node) in self.nodes.iter().enumerate() {
            let dist = (node - point).norm();
            if dist < min_dist && segment_is_clear(obstacles, point, node) {
                closest = Some(index);
                min_dist = dist;
            }
        }
        closest
    }

    pub fn nodes(&self) -> &[Point] {
        &self.nodes
    }

    pub fn node(&self, index: usize) -> Option<&Point> {
        self.nodes.get(index)
    }

    pub fn neighbours(&self, index: usize) -> &[usize] {
        self.adjacency
            .get(index)
            .map(|list| list.as_slice())
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of undirected edges.
    pub fn edge_count(&self) -> usize {
        self.adjacency.iter().map(|list| list.len()).sum::<usize>() / 2
    }
}
