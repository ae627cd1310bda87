// CPU Scheduling Engine
use super::types::*;
use std::collections::VecDeque;
use tracing::{debug, warn};

/// Working state of one simulation run.
struct Run {
    processes: Vec<Process>,
    timeline: Vec<Slot>,
    time: u32,
}

impl Run {
    fn new(specs: &[ProcessSpec]) -> Self {
        Run {
            processes: specs.iter().map(Process::from_spec).collect(),
            timeline: Vec::new(),
            time: 0,
        }
    }

    fn idle(&mut self) {
        self.timeline.push(Slot::Idle);
        self.time += 1;
    }

    fn dispatch(&mut self, i: usize) {
        let p = &mut self.processes[i];
        if p.start.is_none() {
            p.start = Some(self.time);
        }
    }

    fn tick(&mut self, i: usize) {
        self.dispatch(i);
        let p = &mut self.processes[i];
        self.timeline.push(Slot::Busy(p.name.clone()));
        p.remaining = p.remaining.saturating_sub(1);
        self.time += 1;
    }

    /// Run to completion without preemption.
    fn run_out(&mut self, i: usize) {
        self.dispatch(i);
        while self.processes[i].remaining > 0 {
            self.tick(i);
        }
        self.processes[i].complete(self.time);
    }

    /// Complete arrived processes with nothing left to run, at the current
    /// time and without using a tick.
    fn complete_empty(&mut self) {
        let now = self.time;
        for p in self.processes.iter_mut() {
            if !p.completed && p.has_arrived(now) && p.remaining == 0 {
                p.start.get_or_insert(now);
                p.complete(now);
            }
        }
    }

    fn pending(&self) -> bool {
        self.processes.iter().any(|p| !p.completed)
    }

    /// Arrived and incomplete, in collection order.
    fn ready(&self) -> Vec<usize> {
        self.processes
            .iter()
            .enumerate()
            .filter(|(_, p)| p.has_arrived(self.time) && !p.completed)
            .map(|(i, _)| i)
            .collect()
    }

    fn finish(self, algorithm: Algorithm) -> SchedulerResult {
        let stats = Stats::compute(&self.processes, &self.timeline);
        let result = SchedulerResult {
            algorithm,
            name: algorithm.name(),
            timeline: self.timeline,
            processes: self.processes,
            stats,
        };

        if !result.all_completed() {
            warn!(
                "{}: iteration cap reached with {} processes unfinished",
                result.name,
                result.processes.iter().filter(|p| !p.completed).count()
            );
        }
        debug!(
            "{}: {} ticks, {} idle",
            result.name,
            result.timeline.len(),
            result.idle_ticks()
        );
        result
    }
}

/// First ready index minimising `key`; ties keep the earlier process.
fn first_min_by<K: PartialOrd>(ready: &[usize], mut key: impl FnMut(usize) -> K) -> Option<usize> {
    let mut best: Option<(usize, K)> = None;
    for &i in ready {
        let k = key(i);
        let replace = match &best {
            None => true,
            Some((_, bk)) => k < *bk,
        };
        if replace {
            best = Some((i, k));
        }
    }
    best.map(|(i, _)| i)
}

/// First ready index maximising `key`; ties keep the earlier process.
fn first_max_by<K: PartialOrd>(ready: &[usize], mut key: impl FnMut(usize) -> K) -> Option<usize> {
    let mut best: Option<(usize, K)> = None;
    for &i in ready {
        let k = key(i);
        let replace = match &best {
            None => true,
            Some((_, bk)) => k > *bk,
        };
        if replace {
            best = Some((i, k));
        }
    }
    best.map(|(i, _)| i)
}

/// Simulates the scheduling disciplines over one process set. Every run
/// starts from a fresh copy of the specs.
#[derive(Debug, Clone, Default)]
pub struct SchedulerEngine {
    specs: Vec<ProcessSpec>,
}

impl SchedulerEngine {
    pub fn new(specs: Vec<ProcessSpec>) -> Self {
        SchedulerEngine { specs }
    }

    pub fn specs(&self) -> &[ProcessSpec] {
        &self.specs
    }

    fn total_burst(&self) -> u32 {
        self.specs
            .iter()
            .fold(0u32, |acc, p| acc.saturating_add(p.burst))
    }

    fn last_arrival(&self) -> u32 {
        self.specs.iter().map(|p| p.arrival).max().unwrap_or(0)
    }

    pub fn run(&self, algorithm: Algorithm) -> SchedulerResult {
        match algorithm {
            Algorithm::Fcfs => self.fcfs(),
            Algorithm::RoundRobin { quantum } => self.round_robin(quantum),
            Algorithm::Spn => self.spn(),
            Algorithm::Srt => self.srt(),
            Algorithm::Hrrn => self.hrrn(),
            Algorithm::Priority {
                aging_rate,
                context_switch,
            } => self.priority(aging_rate, context_switch),
        }
    }

    pub fn run_all(&self, algorithms: &[Algorithm]) -> Vec<SchedulerResult> {
        algorithms.iter().map(|a| self.run(*a)).collect()
    }

    /// First Come First Serve. Results list processes in arrival order.
    pub fn fcfs(&self) -> SchedulerResult {
        let mut order: Vec<usize> = (0..self.specs.len()).collect();
        order.sort_by_key(|&i| self.specs[i].arrival);
        let sorted: Vec<ProcessSpec> = order.iter().map(|&i| self.specs[i].clone()).collect();

        let mut run = Run::new(&sorted);
        for i in 0..run.processes.len() {
            while run.time < run.processes[i].arrival {
                run.idle();
            }
            run.run_out(i);
        }
        run.finish(Algorithm::Fcfs)
    }

    /// Round Robin with a FIFO ready queue. Arrivals are enqueued before a
    /// slice and again after it, ahead of the preempted process.
    pub fn round_robin(&self, quantum: u32) -> SchedulerResult {
        let quantum = quantum.max(1);
        let mut run = Run::new(&self.specs);
        let cap = 50u32.max(self.total_burst().saturating_mul(2));

        let mut queue: VecDeque<usize> = VecDeque::new();
        let mut added = vec![false; run.processes.len()];

        let enqueue_arrivals = |run: &Run, queue: &mut VecDeque<usize>, added: &mut Vec<bool>| {
            for (i, p) in run.processes.iter().enumerate() {
                if p.has_arrived(run.time) && !added[i] && !p.completed {
                    queue.push_back(i);
                    added[i] = true;
                }
            }
        };

        while run.time < cap && run.pending() {
            enqueue_arrivals(&run, &mut queue, &mut added);

            let Some(current) = queue.pop_front() else {
                run.idle();
                continue;
            };

            run.dispatch(current);
            let slice = quantum.min(run.processes[current].remaining);
            for _ in 0..slice {
                run.tick(current);
            }

            enqueue_arrivals(&run, &mut queue, &mut added);

            if run.processes[current].remaining > 0 {
                queue.push_back(current);
            } else {
                run.processes[current].complete(run.time);
            }
        }

        run.finish(Algorithm::RoundRobin { quantum })
    }

    /// Shortest Process Next: non-preemptive, minimum total burst.
    pub fn spn(&self) -> SchedulerResult {
        let mut run = Run::new(&self.specs);

        while run.pending() {
            let ready = run.ready();
            let selected = first_min_by(&ready, |i| run.processes[i].burst);
            match selected {
                Some(i) => run.run_out(i),
                None => run.idle(),
            }
        }

        run.finish(Algorithm::Spn)
    }

    /// Shortest Remaining Time: preemptive, re-evaluated every tick.
    pub fn srt(&self) -> SchedulerResult {
        let mut run = Run::new(&self.specs);
        let cap = self.total_burst().saturating_add(self.last_arrival());

        loop {
            run.complete_empty();
            if run.time >= cap || !run.pending() {
                break;
            }
            let ready = run.ready();
            let Some(i) = first_min_by(&ready, |i| run.processes[i].remaining) else {
                run.idle();
                continue;
            };

            run.tick(i);
            if run.processes[i].remaining == 0 {
                run.processes[i].complete(run.time);
            }
        }

        run.finish(Algorithm::Srt)
    }

    /// Highest Response Ratio Next: non-preemptive,
    /// ratio = 1 + (now - arrival) / burst. A zero burst ranks first.
    pub fn hrrn(&self) -> SchedulerResult {
        let mut run = Run::new(&self.specs);

        while run.pending() {
            let ready = run.ready();
            let now = run.time as f64;
            let selected = first_max_by(&ready, |i| {
                let p = &run.processes[i];
                if p.burst == 0 {
                    f64::INFINITY
                } else {
                    1.0 + (now - p.arrival as f64) / p.burst as f64
                }
            });
            match selected {
                Some(i) => run.run_out(i),
                None => run.idle(),
            }
        }

        run.finish(Algorithm::Hrrn)
    }

    /// Preemptive priority with aging. Each tick every ready process other
    /// than the previous runner gains `aging_rate`; the highest dynamic
    /// priority runs one tick and drops back to its base priority. Switching
    /// to a different process first costs `context_switch` idle ticks.
    pub fn priority(&self, aging_rate: i64, context_switch: u32) -> SchedulerResult {
        let mut run = Run::new(&self.specs);
        let cap = self.total_burst().saturating_add(self.last_arrival());
        let mut last: Option<usize> = None;

        loop {
            run.complete_empty();
            if run.time >= cap || !run.pending() {
                break;
            }
            let now = run.time;
            for (i, p) in run.processes.iter_mut().enumerate() {
                if !p.completed && p.has_arrived(now) && last != Some(i) {
                    p.dynamic_priority = p.dynamic_priority.saturating_add(aging_rate);
                }
            }

            let ready = run.ready();
            let Some(selected) = first_max_by(&ready, |i| run.processes[i].dynamic_priority) else {
                run.idle();
                continue;
            };

            if matches!(last, Some(prev) if prev != selected) {
                for _ in 0..context_switch {
                    run.idle();
                }
            }

            let p = &mut run.processes[selected];
            p.dynamic_priority = p.base_priority;
            run.tick(selected);
            last = Some(selected);

            if run.processes[selected].remaining == 0 {
                run.processes[selected].complete(run.time);
            }
        }

        run.finish(Algorithm::Priority {
            aging_rate,
            context_switch,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(result: &SchedulerResult) -> Vec<&str> {
        result.timeline.iter().map(Slot::label).collect()
    }

    fn textbook() -> SchedulerEngine {
        SchedulerEngine::new(vec![
            ProcessSpec::new("P1", 0, 5),
            ProcessSpec::new("P2", 1, 3),
            ProcessSpec::new("P3", 2, 8),
        ])
    }

    #[test]
    fn test_fcfs_textbook() {
        let result = textbook().fcfs();
        let mut expected = vec!["P1"; 5];
        expected.extend(vec!["P2"; 3]);
        expected.extend(vec!["P3"; 8]);
        assert_eq!(names(&result), expected);
        assert_eq!(result.process("P1").unwrap().waiting, 0);
        assert_eq!(result.process("P2").unwrap().waiting, 4);
        assert_eq!(result.process("P3").unwrap().waiting, 6);
        assert_eq!(result.stats.unwrap().cpu_utilization, 100.0);
    }

    #[test]
    fn test_fcfs_idle_gap_and_order() {
        let engine = SchedulerEngine::new(vec![
            ProcessSpec::new("B", 3, 1),
            ProcessSpec::new("A", 0, 1),
        ]);
        let result = engine.fcfs();
        assert_eq!(names(&result), vec!["A", "IDLE", "IDLE", "B"]);
        assert_eq!(result.processes[0].name, "A");
        assert_eq!(result.stats.unwrap().cpu_utilization, 50.0);
    }

    #[test]
    fn test_round_robin_quantum_two() {
        let result = textbook().round_robin(2);
        assert_eq!(
            names(&result),
            vec!["P1", "P1", "P2", "P2", "P3", "P3", "P1", "P1", "P2", "P3", "P3", "P1", "P3", "P3", "P3", "P3"]
        );
        assert!(result.all_completed());
        assert_eq!(result.process("P2").unwrap().finish, 9);
    }

    #[test]
    fn test_round_robin_zero_quantum_is_clamped() {
        let result = textbook().round_robin(0);
        assert!(result.all_completed());
        assert_eq!(result.algorithm, Algorithm::RoundRobin { quantum: 1 });
    }

    #[test]
    fn test_spn_picks_shortest_burst() {
        let engine = SchedulerEngine::new(vec![
            ProcessSpec::new("P1", 0, 3),
            ProcessSpec::new("P2", 1, 6),
            ProcessSpec::new("P3", 2, 2),
        ]);
        let result = engine.spn();
        let order: Vec<&str> = names(&result).into_iter().collect();
        assert_eq!(&order[..5], &["P1", "P1", "P1", "P3", "P3"]);
        assert_eq!(result.process("P2").unwrap().start, Some(5));
    }

    #[test]
    fn test_srt_preempts() {
        let engine = SchedulerEngine::new(vec![
            ProcessSpec::new("P1", 0, 5),
            ProcessSpec::new("P2", 1, 2),
        ]);
        let result = engine.srt();
        assert_eq!(names(&result), vec!["P1", "P2", "P2", "P1", "P1", "P1", "P1"]);
        assert_eq!(result.process("P1").unwrap().waiting, 2);
    }

    #[test]
    fn test_srt_ties_keep_collection_order() {
        let engine = SchedulerEngine::new(vec![
            ProcessSpec::new("P1", 0, 2),
            ProcessSpec::new("P2", 0, 2),
        ]);
        assert_eq!(names(&engine.srt()), vec!["P1", "P1", "P2", "P2"]);
    }

    #[test]
    fn test_hrrn_favours_long_waiters() {
        let engine = SchedulerEngine::new(vec![
            ProcessSpec::new("P1", 0, 3),
            ProcessSpec::new("P2", 1, 6),
            ProcessSpec::new("P3", 2, 5),
        ]);
        let result = engine.hrrn();
        // At t=3: P2 ratio 1 + 2/6, P3 ratio 1 + 1/5
        assert_eq!(result.process("P2").unwrap().start, Some(3));
        assert_eq!(result.process("P3").unwrap().start, Some(9));
    }

    #[test]
    fn test_priority_runs_highest_first() {
        let engine = SchedulerEngine::new(vec![
            ProcessSpec::new("Low", 0, 2).with_priority(1),
            ProcessSpec::new("High", 0, 2).with_priority(5),
        ]);
        let result = engine.priority(0, 0);
        assert_eq!(names(&result), vec!["High", "High", "Low", "Low"]);
    }

    #[test]
    fn test_priority_aging_lets_waiter_in() {
        let engine = SchedulerEngine::new(vec![
            ProcessSpec::new("Low", 0, 3).with_priority(0),
            ProcessSpec::new("High", 0, 3).with_priority(3),
        ]);
        let result = engine.priority(1, 0);
        // t0: Low 1, High 4 -> High. t1: Low 2, High 3 -> High.
        // t2: Low 3 ties High 3 -> Low, the earlier process.
        assert_eq!(
            names(&result),
            vec!["High", "High", "Low", "High", "Low", "Low"]
        );
        assert!(result.all_completed());
    }

    #[test]
    fn test_priority_context_switch_inserts_idle() {
        let engine = SchedulerEngine::new(vec![
            ProcessSpec::new("A", 0, 1).with_priority(2),
            ProcessSpec::new("B", 0, 1).with_priority(1),
        ]);
        let result = engine.priority(0, 1);
        assert_eq!(names(&result), vec!["A", "IDLE", "B"]);
        let b = result.process("B").unwrap();
        assert_eq!(b.start, Some(2));
        assert_eq!(b.waiting, 2);
    }

    #[test]
    fn test_empty_process_set() {
        let engine = SchedulerEngine::new(Vec::new());
        for kind in AlgorithmKind::ALL {
            let result = engine.run(kind.with_params(3, 1, 0));
            assert!(result.stats.is_none());
            assert!(result.processes.is_empty());
        }
    }

    #[test]
    fn test_priority_context_switch_hits_cap() {
        let engine = SchedulerEngine::new(vec![
            ProcessSpec::new("A", 0, 2).with_priority(1),
            ProcessSpec::new("B", 0, 2).with_priority(1),
        ]);
        let result = engine.priority(1, 1);

        // Cap is 4 ticks; two switches push A's finish to 5 and strand B.
        assert_eq!(names(&result), vec!["A", "IDLE", "B", "IDLE", "A"]);
        assert!(!result.all_completed());
        assert_eq!(result.process("A").unwrap().finish, 5);
        assert_eq!(result.process("B").unwrap().remaining, 1);
        assert_eq!(result.stats.unwrap().completed, 1);
    }

    #[test]
    fn test_round_robin_stops_at_cap() {
        let engine = SchedulerEngine::new(vec![
            ProcessSpec::new("P1", 0, 1),
            ProcessSpec::new("P2", 100, 1),
        ]);
        let result = engine.round_robin(2);

        assert_eq!(result.timeline.len(), 50);
        assert_eq!(result.idle_ticks(), 49);
        assert!(result.process("P1").unwrap().completed);
        assert!(!result.process("P2").unwrap().completed);
    }

    #[test]
    fn test_zero_burst_completes_immediately() {
        let engine = SchedulerEngine::new(vec![
            ProcessSpec::new("Z", 0, 0),
            ProcessSpec::new("P", 0, 2),
        ]);
        for kind in AlgorithmKind::ALL {
            let result = engine.run(kind.with_params(3, 1, 0));
            assert_eq!(names(&result), vec!["P", "P"], "{}", result.name);
            assert!(result.all_completed(), "{}", result.name);
            let z = result.process("Z").unwrap();
            assert_eq!(z.finish, 0, "{}", result.name);
            assert_eq!(z.start, Some(0), "{}", result.name);
            assert_eq!(result.process("P").unwrap().finish, 2, "{}", result.name);
        }
    }

    #[test]
    fn test_all_zero_bursts() {
        let engine = SchedulerEngine::new(vec![
            ProcessSpec::new("Z1", 0, 0),
            ProcessSpec::new("Z2", 0, 0),
        ]);
        for kind in AlgorithmKind::ALL {
            let result = engine.run(kind.with_params(3, 1, 0));
            assert!(result.timeline.is_empty(), "{}", result.name);
            assert!(result.all_completed(), "{}", result.name);
            assert_eq!(result.stats.unwrap().cpu_utilization, 0.0);
        }
    }

    #[test]
    fn test_hrrn_zero_burst_ranks_first() {
        let engine = SchedulerEngine::new(vec![
            ProcessSpec::new("P", 0, 2),
            ProcessSpec::new("Z", 0, 0),
        ]);
        let result = engine.hrrn();
        assert_eq!(result.process("Z").unwrap().finish, 0);
        assert_eq!(result.process("P").unwrap().waiting, 0);
    }

    #[test]
    fn test_aging_saturates() {
        let engine = SchedulerEngine::new(vec![
            ProcessSpec::new("P1", 0, 2).with_priority(i64::MAX),
            ProcessSpec::new("P2", 0, 2),
        ]);
        let result = engine.priority(1, 0);
        assert_eq!(names(&result), vec!["P1", "P1", "P2", "P2"]);
        assert!(result.all_completed());
    }

    #[test]
    fn test_total_burst_saturates() {
        let engine = SchedulerEngine::new(vec![
            ProcessSpec::new("A", 0, u32::MAX),
            ProcessSpec::new("B", 0, 1),
        ]);
        assert_eq!(engine.total_burst(), u32::MAX);
    }

    #[test]
    fn test_run_all_without_algorithms() {
        assert!(textbook().run_all(&[]).is_empty());
    }

    #[test]
    fn test_runs_are_independent() {
        let engine = textbook();
        let first = engine.srt();
        let _ = engine.round_robin(1);
        assert_eq!(engine.srt(), first);
    }
}
