// Resource Allocation Graph construction
use super::types::*;
use std::collections::BTreeMap;
use tracing::debug;

pub const DEFAULT_NODE_COUNT: usize = 3;

pub struct GraphBuilder;

impl GraphBuilder {
    /// Build a RAG with processes `P1..Pn` and resources `R1..Rm`.
    ///
    /// Absent counts fall back to [`DEFAULT_NODE_COUNT`]. Every edge lands in
    /// the raw edge lists and the adjacency list, but only edges whose both
    /// endpoints are declared feed the holder and requester lists.
    pub fn build(
        process_count: Option<usize>,
        resource_count: Option<usize>,
        allocations: &[(String, String)],
        requests: &[(String, String)],
    ) -> ResourceAllocationGraph {
        let n = process_count.unwrap_or(DEFAULT_NODE_COUNT);
        let m = resource_count.unwrap_or(DEFAULT_NODE_COUNT);

        let processes: Vec<String> = (1..=n).map(|i| format!("P{}", i)).collect();
        let resources: Vec<String> = (1..=m).map(|i| format!("R{}", i)).collect();

        let mut adjacency: BTreeMap<String, Vec<Edge>> = processes
            .iter()
            .chain(resources.iter())
            .map(|node| (node.clone(), Vec::new()))
            .collect();
        let mut holders: BTreeMap<String, Vec<String>> =
            resources.iter().map(|r| (r.clone(), Vec::new())).collect();
        let mut requesters = holders.clone();

        let allocation_edges: Vec<Edge> = allocations
            .iter()
            .map(|(from, to)| Edge::allocation(from.as_str(), to.as_str()))
            .collect();
        let request_edges: Vec<Edge> = requests
            .iter()
            .map(|(from, to)| Edge::request(from.as_str(), to.as_str()))
            .collect();

        for edge in allocation_edges.iter().chain(request_edges.iter()) {
            adjacency
                .entry(edge.from.clone())
                .or_insert_with(Vec::new)
                .push(edge.clone());

            if !processes.contains(&edge.from) {
                continue;
            }
            let side = match edge.kind {
                EdgeKind::Allocation => &mut holders,
                EdgeKind::Request => &mut requesters,
            };
            if let Some(list) = side.get_mut(&edge.to) {
                list.push(edge.from.clone());
            }
        }

        debug!(
            "Built RAG with {} processes, {} resources, {} allocations, {} requests",
            n,
            m,
            allocation_edges.len(),
            request_edges.len()
        );

        ResourceAllocationGraph {
            processes,
            resources,
            allocations: allocation_edges,
            requests: request_edges,
            adjacency,
            holders,
            requesters,
        }
    }

    pub fn from_input(input: &DetectionInput) -> ResourceAllocationGraph {
        Self::build(
            input.process_count,
            input.resource_count,
            &input.allocations,
            &input.requests,
        )
    }
}
