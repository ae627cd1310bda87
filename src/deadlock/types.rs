// Resource Allocation Graph Types
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    Allocation,
    Request,
}

/// Directed process -> resource edge.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub from: String,
    pub to: String,
    pub kind: EdgeKind,
}

impl Edge {
    pub fn allocation(from: impl Into<String>, to: impl Into<String>) -> Self {
        Edge {
            from: from.into(),
            to: to.into(),
            kind: EdgeKind::Allocation,
        }
    }

    pub fn request(from: impl Into<String>, to: impl Into<String>) -> Self {
        Edge {
            from: from.into(),
            to: to.into(),
            kind: EdgeKind::Request,
        }
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let arrow = match self.kind {
            EdgeKind::Allocation => "holds",
            EdgeKind::Request => "requests",
        };
        write!(f, "{} {} {}", self.from, arrow, self.to)
    }
}

/// Input to a detection run: counts plus raw `(from, to)` pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionInput {
    pub process_count: Option<usize>,
    pub resource_count: Option<usize>,
    pub allocations: Vec<(String, String)>,
    pub requests: Vec<(String, String)>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResourceAllocationGraph {
    pub processes: Vec<String>,
    pub resources: Vec<String>,

    // Raw edge lists, undeclared labels included
    pub allocations: Vec<Edge>,
    pub requests: Vec<Edge>,

    pub(crate) adjacency: BTreeMap<String, Vec<Edge>>,
    pub(crate) holders: BTreeMap<String, Vec<String>>,
    pub(crate) requesters: BTreeMap<String, Vec<String>>,
}

impl ResourceAllocationGraph {
    /// Outgoing edges of a node, in insertion order.
    pub fn edges_from(&self, node: &str) -> &[Edge] {
        self.adjacency.get(node).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Processes currently allocated `resource`.
    pub fn holders(&self, resource: &str) -> &[String] {
        self.holders.get(resource).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Processes requesting `resource`.
    pub fn requesters(&self, resource: &str) -> &[String] {
        self.requesters.get(resource).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_process(&self, label: &str) -> bool {
        self.processes.iter().any(|p| p == label)
    }

    pub fn is_resource(&self, label: &str) -> bool {
        self.resources.iter().any(|r| r == label)
    }

    /// First declared resource that `waiter` requests while `holder` holds it.
    pub fn contested_resource(&self, waiter: &str, holder: &str) -> Option<&str> {
        self.resources
            .iter()
            .find(|res| {
                self.holders(res).iter().any(|p| p == holder)
                    && self.requesters(res).iter().any(|p| p == waiter)
            })
            .map(String::as_str)
    }
}

/// Process -> processes it waits for. Neighbour lists keep first-insertion
/// order and never hold duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WaitForGraph {
    pub(crate) edges: BTreeMap<String, Vec<String>>,
}

impl WaitForGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, node: &str) {
        self.edges.entry(node.to_string()).or_default();
    }

    /// Returns false if the edge was already present.
    pub fn add_edge(&mut self, waiter: &str, holder: &str) -> bool {
        let targets = self.edges.entry(waiter.to_string()).or_default();
        if targets.iter().any(|t| t == holder) {
            return false;
        }
        targets.push(holder.to_string());
        true
    }

    pub fn waits_for(&self, node: &str) -> &[String] {
        self.edges.get(node).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(Vec::len).sum()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.edges.keys().map(String::as_str)
    }
}

/// Closed RAG cycle alternating process and resource labels. The first
/// element is implicitly repeated at the end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cycle(pub Vec<String>);

impl Cycle {
    pub fn nodes(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Participant-set key: sorted labels. Cycles over the same nodes
    /// collapse even when their edge order differs.
    pub fn dedup_key(&self) -> Vec<String> {
        let mut key = self.0.clone();
        key.sort();
        key
    }

    /// Process labels of the cycle, in cycle order.
    pub fn processes<'a>(&'a self, graph: &'a ResourceAllocationGraph) -> impl Iterator<Item = &'a str> {
        self.0
            .iter()
            .map(String::as_str)
            .filter(move |n| !graph.is_resource(n))
    }
}

impl fmt::Display for Cycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for node in &self.0 {
            write!(f, "{} -> ", node)?;
        }
        match self.0.first() {
            Some(first) => write!(f, "{}", first),
            None => Ok(()),
        }
    }
}
