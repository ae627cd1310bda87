// Deadlock Detection
use super::graph::GraphBuilder;
use super::types::*;
use crate::session::Replay;
use ahash::AHashSet;
use serde::Serialize;
use tracing::{debug, trace};

/// Shortest RAG cycle worth reporting: two processes, two resource hops.
pub const MIN_CYCLE_LEN: usize = 4;

/// Result of one detection run.
#[derive(Debug, Clone, Serialize)]
pub struct Detection {
    pub graph: ResourceAllocationGraph,
    pub wait_for: WaitForGraph,
    pub cycles: Vec<Cycle>,
}

impl Detection {
    pub fn is_deadlocked(&self) -> bool {
        !self.cycles.is_empty()
    }

    /// Distinct processes across all cycles, in first-appearance order.
    pub fn deadlocked_processes(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for cycle in &self.cycles {
            for process in cycle.processes(&self.graph) {
                if !out.iter().any(|p| p == process) {
                    out.push(process.to_string());
                }
            }
        }
        out
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CycleDetector;

impl CycleDetector {
    pub fn detect(graph: ResourceAllocationGraph) -> Detection {
        let wait_for = Self::wait_for_graph(&graph);
        let cycles = Self::cycles_in(&graph, &wait_for);

        debug!(
            "Deadlock detection: {} wait-for edges, {} cycles",
            wait_for.edge_count(),
            cycles.len()
        );

        Detection {
            graph,
            wait_for,
            cycles,
        }
    }

    pub fn find_cycles(graph: &ResourceAllocationGraph) -> Vec<Cycle> {
        let wait_for = Self::wait_for_graph(graph);
        Self::cycles_in(graph, &wait_for)
    }

    /// A requester waits for every other process holding the same resource.
    pub fn wait_for_graph(graph: &ResourceAllocationGraph) -> WaitForGraph {
        let mut wait_for = WaitForGraph::new();
        for process in &graph.processes {
            wait_for.add_node(process);
        }

        for resource in &graph.resources {
            for holder in graph.holders(resource) {
                for requester in graph.requesters(resource) {
                    if holder != requester {
                        wait_for.add_edge(requester, holder);
                    }
                }
            }
        }

        wait_for
    }

    fn cycles_in(graph: &ResourceAllocationGraph, wait_for: &WaitForGraph) -> Vec<Cycle> {
        let mut seen: AHashSet<Vec<String>> = AHashSet::new();
        let mut cycles = Vec::new();

        for path in Self::wait_for_cycles(wait_for, &graph.processes) {
            let cycle = Self::to_rag_cycle(graph, &path);
            if cycle.len() < MIN_CYCLE_LEN {
                continue;
            }
            if seen.insert(cycle.dedup_key()) {
                trace!("Found deadlock cycle: {}", cycle);
                cycles.push(cycle);
            }
        }

        cycles
    }

    /// Iterative DFS over the wait-for graph from each root in order.
    ///
    /// Nodes reached by an earlier root are not used as roots again, but a
    /// search may re-enter them along a different path. A neighbour already
    /// on the DFS stack closes a cycle, reported as the stack slice from that
    /// neighbour to the top.
    pub fn wait_for_cycles<'a>(wait_for: &'a WaitForGraph, roots: &'a [String]) -> Vec<Vec<String>> {
        let mut finished: AHashSet<&'a str> = AHashSet::new();
        let mut on_stack: AHashSet<&'a str> = AHashSet::new();
        let mut cycles = Vec::new();

        for root in roots {
            let root = root.as_str();
            if finished.contains(root) {
                continue;
            }

            let mut path: Vec<&'a str> = vec![root];
            let mut cursors: Vec<usize> = vec![0];
            on_stack.insert(root);

            while let Some(&node) = path.last() {
                let depth = path.len() - 1;
                let neighbours = wait_for.waits_for(node);
                let index = cursors[depth];

                if index < neighbours.len() {
                    cursors[depth] += 1;
                    let next = neighbours[index].as_str();

                    if on_stack.contains(next) {
                        if let Some(start) = path.iter().position(|n| *n == next) {
                            cycles.push(path[start..].iter().map(|n| n.to_string()).collect());
                        }
                    } else {
                        on_stack.insert(next);
                        path.push(next);
                        cursors.push(0);
                    }
                } else {
                    on_stack.remove(node);
                    finished.insert(node);
                    path.pop();
                    cursors.pop();
                }
            }
        }

        cycles
    }

    /// Splice resource labels between consecutive waiters of a wait-for cycle.
    /// For each hop `waiter -> holder` the first declared resource the waiter
    /// requests and the holder holds is used.
    pub fn to_rag_cycle(graph: &ResourceAllocationGraph, path: &[String]) -> Cycle {
        let mut nodes = Vec::with_capacity(path.len() * 2);
        for (i, waiter) in path.iter().enumerate() {
            let holder = &path[(i + 1) % path.len()];
            if let Some(resource) = graph.contested_resource(waiter, holder) {
                nodes.push(waiter.clone());
                nodes.push(resource.to_string());
            }
        }
        Cycle(nodes)
    }
}

impl Replay for CycleDetector {
    type Input = DetectionInput;
    type Outcome = Detection;
    type Step = Cycle;

    fn compute(&self, input: &DetectionInput) -> Detection {
        Self::detect(GraphBuilder::from_input(input))
    }

    fn steps<'o>(&self, outcome: &'o Detection) -> &'o [Cycle] {
        &outcome.cycles
    }

    // A deadlock-free graph still takes one step to reveal.
    fn total_steps(&self, outcome: &Detection) -> usize {
        outcome.cycles.len().max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SimulationSession;

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter()
            .map(|(a, b)| (a.to_string(), b.to_string()))
            .collect()
    }

    fn classic() -> ResourceAllocationGraph {
        GraphBuilder::build(
            Some(3),
            Some(3),
            &pairs(&[("P1", "R1"), ("P2", "R2"), ("P3", "R3")]),
            &pairs(&[("P1", "R2"), ("P2", "R3"), ("P3", "R1")]),
        )
    }

    #[test]
    fn test_wait_for_edges() {
        let wait_for = CycleDetector::wait_for_graph(&classic());
        assert_eq!(wait_for.waits_for("P1"), &["P2".to_string()]);
        assert_eq!(wait_for.waits_for("P2"), &["P3".to_string()]);
        assert_eq!(wait_for.waits_for("P3"), &["P1".to_string()]);
    }

    #[test]
    fn test_wait_for_edges_deduplicated() {
        let graph = GraphBuilder::build(
            Some(2),
            Some(2),
            &pairs(&[("P1", "R1"), ("P1", "R2")]),
            &pairs(&[("P2", "R1"), ("P2", "R2")]),
        );
        let wait_for = CycleDetector::wait_for_graph(&graph);
        assert_eq!(wait_for.waits_for("P2"), &["P1".to_string()]);
        assert_eq!(wait_for.edge_count(), 1);
    }

    #[test]
    fn test_classic_cycle() {
        let cycles = CycleDetector::find_cycles(&classic());
        assert_eq!(cycles.len(), 1);
        assert_eq!(
            cycles[0].nodes(),
            &["P1", "R2", "P2", "R3", "P3", "R1"].map(String::from)
        );
    }

    #[test]
    fn test_self_hold_is_not_a_cycle() {
        let graph = GraphBuilder::build(
            Some(1),
            Some(1),
            &pairs(&[("P1", "R1")]),
            &pairs(&[("P1", "R1")]),
        );
        assert!(CycleDetector::find_cycles(&graph).is_empty());
    }

    #[test]
    fn test_chain_without_cycle() {
        let graph = GraphBuilder::build(
            Some(3),
            Some(2),
            &pairs(&[("P2", "R1"), ("P3", "R2")]),
            &pairs(&[("P1", "R1"), ("P2", "R2")]),
        );
        let detection = CycleDetector::detect(graph);
        assert!(!detection.is_deadlocked());
        assert_eq!(detection.wait_for.edge_count(), 2);
    }

    #[test]
    fn test_two_disjoint_cycles() {
        let graph = GraphBuilder::build(
            Some(4),
            Some(4),
            &pairs(&[("P1", "R1"), ("P2", "R2"), ("P3", "R3"), ("P4", "R4")]),
            &pairs(&[("P1", "R2"), ("P2", "R1"), ("P3", "R4"), ("P4", "R3")]),
        );
        let detection = CycleDetector::detect(graph);
        assert_eq!(detection.cycles.len(), 2);
        assert_eq!(
            detection.deadlocked_processes(),
            vec!["P1", "P2", "P3", "P4"]
        );
    }

    #[test]
    fn test_cycles_sharing_a_node() {
        // P1 waits for P2 and P3, both wait for P4, P4 waits for P1.
        let graph = GraphBuilder::build(
            Some(4),
            Some(4),
            &pairs(&[("P1", "R1"), ("P2", "R2"), ("P3", "R3"), ("P4", "R4")]),
            &pairs(&[("P1", "R2"), ("P1", "R3"), ("P2", "R4"), ("P3", "R4"), ("P4", "R1")]),
        );
        let detection = CycleDetector::detect(graph);

        assert_eq!(detection.cycles.len(), 2);
        assert_eq!(
            detection.cycles[0].nodes(),
            &["P1", "R2", "P2", "R4", "P4", "R1"].map(String::from)
        );
        assert_eq!(
            detection.cycles[1].nodes(),
            &["P1", "R3", "P3", "R4", "P4", "R1"].map(String::from)
        );
        assert_eq!(
            detection.deadlocked_processes(),
            vec!["P1", "P2", "P4", "P3"]
        );
    }

    #[test]
    fn test_detection_session_steps() {
        let input = DetectionInput {
            process_count: Some(3),
            resource_count: Some(3),
            allocations: pairs(&[("P1", "R1"), ("P2", "R2"), ("P3", "R3")]),
            requests: pairs(&[("P1", "R2"), ("P2", "R3"), ("P3", "R1")]),
        };
        let mut session = SimulationSession::new(CycleDetector, input).unwrap();

        assert_eq!(session.total_steps(), 1);
        assert!(session.visible_steps().is_empty());
        session.step();
        assert_eq!(session.visible_steps().len(), 1);
        assert!(session.is_complete());
    }
}
