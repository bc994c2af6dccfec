//! A* over a [`Roadmap`].
//!
//! Nodes are marked visited when they are first discovered and their parent is
//! never revised afterwards, so the search is fast but not guaranteed optimal
//! on roadmaps with detours. The frontier is a plain vector scanned for the
//! lowest `g + h`; on ties the earliest entry wins.

use log::{debug, warn};

use crate::geometry::Circle;
use crate::highlevel_planners::roadmap::Roadmap;
use crate::Point;

/// Per-search scratch state. Built by [`AStarSearch::run`] and dropped once the
/// path has been extracted.
#[derive(Clone, Debug)]
pub struct AStarSearch {
    visited: Vec<bool>,
    parent: Vec<Option<usize>>,
    g_cost: Vec<f64>,
    heuristic: Vec<f64>,
    start: usize,
    goal: usize,
    reached_goal: bool,
}

impl AStarSearch {
    /// Searches from node `start` to node `goal`. Halts as soon as the goal is
    /// popped. `None` if either index is not a node of `roadmap`.
    pub fn run(roadmap: &Roadmap, start: usize, goal: usize) -> Option<Self> {
        let n = roadmap.len();
        if start >= n || goal >= n {
            return None;
        }
        let nodes = roadmap.nodes();
        let mut search = AStarSearch {
            visited: vec![false; n],
            parent: vec![None; n],
            g_cost: vec![f64::INFINITY; n],
            heuristic: vec![f64::INFINITY; n],
            start,
            goal,
            reached_goal: false,
        };

        search.visited[start] = true;
        search.g_cost[start] = 0f64;
        search.heuristic[start] = (nodes[start] - nodes[goal]).norm();
        let mut frontier = vec![start];

        while !frontier.is_empty() {
            let mut best = 0;
            let mut best_f = f64::INFINITY;
            for (position, node) in frontier.iter().enumerate() {
                let f = search.g_cost[*node] + search.heuristic[*node];
                if f < best_f {
                    best_f = f;
                    best = position;
                }
            }
            let current = frontier.remove(best);

            if current == goal {
                search.reached_goal = true;
                break;
            }

            for neighbour in roadmap.neighbours(current) {
                let neighbour = *neighbour;
                if search.visited[neighbour] {
                    continue;
                }
                search.visited[neighbour] = true;
                search.parent[neighbour] = Some(current);
                search.g_cost[neighbour] =
                    search.g_cost[current] + (nodes[current] - nodes[neighbour]).norm();
                search.heuristic[neighbour] = (nodes[neighbour] - nodes[goal]).norm();
                frontier.push(neighbour);
            }
        }
        Some(search)
    }

    pub fn reached_goal(&self) -> bool {
        self.reached_goal
    }

    pub fn is_visited(&self, node: usize) -> bool {
        self.visited.get(node).copied().unwrap_or(false)
    }

    /// Cost from the start to `node` along the search tree. Infinite for
    /// undiscovered nodes.
    pub fn g_cost(&self, node: usize) -> f64 {
        self.g_cost.get(node).copied().unwrap_or(f64::INFINITY)
    }

    pub fn parent(&self, node: usize) -> Option<usize> {
        self.parent.get(node).copied().flatten()
    }

    /// Start to goal node sequence. `None` unless the goal was reached, so a
    /// broken parent chain is never mistaken for a path.
    pub fn path(&self) -> Option<Vec<usize>> {
        if !self.reached_goal {
            return None;
        }
        let mut path = vec![self.goal];
        let mut current = self.goal;
        while let Some(previous) = self.parent[current] {
            path.push(previous);
            current = previous;
        }
        path.reverse();
        debug_assert_eq!(path.first(), Some(&self.start));
        Some(path)
    }
}

/// Result of planning between two free points.
#[derive(Clone, Debug, PartialEq)]
pub enum PlanOutcome {
    /// Node sequence from the node nearest the start to the node nearest the goal
    Found(Vec<usize>),
    /// No roadmap node is visible from the start point
    StartUnreachable,
    /// No roadmap node is visible from the goal point
    GoalUnreachable,
    /// The frontier ran dry before the goal node was reached
    SearchExhausted,
}

impl PlanOutcome {
    pub fn is_found(&self) -> bool {
        matches!(self, PlanOutcome::Found(_))
    }

    /// The node route. Every failure maps to an empty route, which agents treat
    /// as "steer straight for the goal".
    pub fn into_route(self) -> Vec<usize> {
        match self {
            PlanOutcome::Found(route) => route,
            _ => vec![],
        }
    }
}

/// Plans a roadmap route from `start` to `goal`. `obstacles` must be inflated
/// by the agent radius.
pub fn plan_path(roadmap: &Roadmap, obstacles: &[Circle], start: &Point, goal: &Point) -> PlanOutcome {
    let start_id = match roadmap.closest_reachable_node(obstacles, start) {
        Some(id) => id,
        None => {
            warn!("No roadmap node reachable from start {:?}", start);
            return PlanOutcome::StartUnreachable;
        }
    };
    let goal_id = match roadmap.closest_reachable_node(obstacles, goal) {
        Some(id) => id,
        None => {
            warn!("No roadmap node reachable from goal {:?}", goal);
            return PlanOutcome::GoalUnreachable;
        }
    };
    debug!(
        "Closest start node {} at {:?}, closest goal node {} at {:?}",
        start_id,
        roadmap.nodes()[start_id],
        goal_id,
        roadmap.nodes()[goal_id]
    );

    match AStarSearch::run(roadmap, start_id, goal_id).and_then(|search| search.path()) {
        Some(path) => PlanOutcome::Found(path),
        None => {
            warn!(
                "Roadmap search from node {} never reached node {}",
                start_id, goal_id
            );
            PlanOutcome::SearchExhausted
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Five nodes near the origin, with two small blockers cutting the
    /// diagonals, plus node 5 walled off by a large obstacle.
    ///
    /// ```text
    ///  0 --- 1 --- 2    (0 - 2 also joined)
    ///        |     |
    ///        3 --- 4          5
    /// ```
    fn line_roadmap() -> Roadmap {
        let nodes = vec![
            Point::new(0f64, 0f64),
            Point::new(10f64, 0f64),
            Point::new(20f64, 0f64),
            Point::new(10f64, -10f64),
            Point::new(20f64, -10f64),
            Point::new(200f64, 200f64),
        ];
        // blockers that carve the roadmap into the shape above
        let obstacles = vec![
            Circle::new(Point::new(15f64, -5f64), 3f64),
            Circle::new(Point::new(5f64, -5f64), 3f64),
            Circle::new(Point::new(110f64, 100f64), 120f64),
        ];
        Roadmap::from_nodes(nodes, &obstacles)
    }

    #[test]
    fn test_search_finds_route() {
        let roadmap = line_roadmap();
        let search = AStarSearch::run(&roadmap, 0, 4).unwrap();
        assert!(search.reached_goal());
        let path = search.path().unwrap();
        assert_eq!(path.first(), Some(&0));
        assert_eq!(path.last(), Some(&4));
        for pair in path.windows(2) {
            assert!(roadmap.neighbours(pair[0]).contains(&pair[1]));
        }
    }

    #[test]
    fn test_costs_non_decreasing_along_path() {
        let roadmap = line_roadmap();
        let search = AStarSearch::run(&roadmap, 0, 4).unwrap();
        let path = search.path().unwrap();
        assert_eq!(search.g_cost(0), 0f64);
        for pair in path.windows(2) {
            assert!(search.g_cost(pair[1]) >= search.g_cost(pair[0]));
        }
    }

    #[test]
    fn test_start_equals_goal() {
        let roadmap = line_roadmap();
        let search = AStarSearch::run(&roadmap, 2, 2).unwrap();
        assert_eq!(search.path(), Some(vec![2]));
    }

    #[test]
    fn test_unreachable_goal_has_no_path() {
        let roadmap = line_roadmap();
        assert!(roadmap.neighbours(5).is_empty());
        let search = AStarSearch::run(&roadmap, 0, 5).unwrap();
        assert!(!search.reached_goal());
        assert!(!search.is_visited(5));
        assert_eq!(search.parent(5), None);
        assert_eq!(search.path(), None);
    }

    #[test]
    fn test_invalid_nodes_do_not_search() {
        let roadmap = line_roadmap();
        assert!(AStarSearch::run(&roadmap, 0, 6).is_none());
        assert!(AStarSearch::run(&roadmap, 9, 0).is_none());
        assert!(AStarSearch::run(&Roadmap::default(), 0, 0).is_none());
    }

    #[test]
    fn test_plan_path_direct_line() {
        let nodes = vec![
            Point::new(-90f64, -90f64),
            Point::new(0f64, 50f64),
            Point::new(90f64, 90f64),
        ];
        let roadmap = Roadmap::from_nodes(nodes, &[]);
        let outcome = plan_path(
            &roadmap,
            &[],
            &Point::new(-100f64, -100f64),
            &Point::new(100f64, 100f64),
        );
        // complete graph: the goal node is the cheapest frontier entry
        assert_eq!(outcome, PlanOutcome::Found(vec![0, 2]));
    }

    #[test]
    fn test_plan_path_failures() {
        let nodes = vec![Point::new(0f64, 0f64), Point::new(100f64, 0f64)];
        let wall = vec![Circle::new(Point::new(50f64, 0f64), 10f64)];
        let roadmap = Roadmap::from_nodes(nodes, &wall);

        let empty = Roadmap::default();
        assert_eq!(
            plan_path(&empty, &[], &Point::new(0f64, 0f64), &Point::new(1f64, 1f64)),
            PlanOutcome::StartUnreachable
        );

        let goal_blocked = vec![
            Circle::new(Point::new(50f64, 0f64), 10f64),
            Circle::new(Point::new(100f64, 50f64), 60f64),
        ];
        assert_eq!(
            plan_path(
                &roadmap,
                &goal_blocked,
                &Point::new(-10f64, 0f64),
                &Point::new(100f64, 30f64)
            ),
            PlanOutcome::GoalUnreachable
        );

        let outcome = plan_path(
            &roadmap,
            &wall,
            &Point::new(-10f64, 0f64),
            &Point::new(110f64, 0f64),
        );
        assert_eq!(outcome, PlanOutcome::SearchExhausted);
        assert!(outcome.into_route().is_empty());
    }
}
