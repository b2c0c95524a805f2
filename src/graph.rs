//! Complete travel graph over the working set.
//!
//! Node 0 is the virtual start, node 1 the virtual end, followed by every
//! attraction in the pool. Costs are symmetric, so each unordered pair is
//! estimated exactly once and stored in a packed triangle.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::model::{Attraction, GeoPoint, RouteNode};
use crate::traits::{TravelEstimate, TravelTimeEstimator};

pub const START: usize = 0;
pub const END: usize = 1;

#[derive(Debug, Clone, PartialEq)]
pub struct GraphNode {
    pub node: RouteNode,
    pub location: GeoPoint,
}

/// Immutable after construction; shared read-only by every theme.
#[derive(Debug, Clone)]
pub struct RouteGraph {
    nodes: Vec<GraphNode>,
    index: HashMap<String, usize>,
    /// Pair `(i, j)` with `i < j` lives at `j * (j - 1) / 2 + i`.
    edges: Vec<TravelEstimate>,
}

impl RouteGraph {
    pub fn build<'a, I, E>(start: GeoPoint, end: GeoPoint, attractions: I, estimator: &E) -> Self
    where
        I: IntoIterator<Item = &'a Attraction>,
        E: TravelTimeEstimator + ?Sized,
    {
        let mut nodes = vec![
            GraphNode {
                node: RouteNode::Start,
                location: start,
            },
            GraphNode {
                node: RouteNode::End,
                location: end,
            },
        ];
        let mut index = HashMap::new();
        for attraction in attractions {
            if index.contains_key(&attraction.id) {
                debug!(id = %attraction.id, "attraction already in graph");
                continue;
            }
            index.insert(attraction.id.clone(), nodes.len());
            nodes.push(GraphNode {
                node: RouteNode::Attraction(attraction.id.clone()),
                location: attraction.location,
            });
        }

        let n = nodes.len();
        let mut edges = Vec::with_capacity(n * (n - 1) / 2);
        for j in 1..n {
            for i in 0..j {
                edges.push(estimator.estimate(nodes[i].location, nodes[j].location));
            }
        }

        let graph = Self { nodes, index, edges };
        info!(nodes = graph.node_count(), edges = graph.edge_count(), "route graph");
        graph
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of undirected edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn node(&self, index: usize) -> Option<&GraphNode> {
        self.nodes.get(index)
    }

    pub fn index_of_attraction(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn index_of(&self, node: &RouteNode) -> Option<usize> {
        match node {
            RouteNode::Start => Some(START),
            RouteNode::End => Some(END),
            RouteNode::Attraction(id) => self.index_of_attraction(id),
        }
    }

    pub fn location(&self, index: usize) -> Option<GeoPoint> {
        self.nodes.get(index).map(|node| node.location)
    }

    /// Travel between two nodes in either direction. `None` for unknown nodes.
    pub fn edge(&self, a: usize, b: usize) -> Option<TravelEstimate> {
        let n = self.nodes.len();
        if a >= n || b >= n {
            return None;
        }
        if a == b {
            return Some(TravelEstimate {
                seconds: 0,
                distance_km: 0.0,
            });
        }
        let (i, j) = if a < b { (a, b) } else { (b, a) };
        self.edges.get(j * (j - 1) / 2 + i).copied()
    }

    pub fn seconds(&self, a: usize, b: usize) -> Option<u32> {
        self.edge(a, b).map(|edge| edge.seconds)
    }
}
