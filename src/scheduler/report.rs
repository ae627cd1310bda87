//! Text renderings of scheduler results: ASCII Gantt chart, Markdown
//! export, and a side-by-side comparison of several runs.

use super::types::*;
use serde::Serialize;
use std::fmt::Write;

/// Ticks shown by [`gantt_chart`] before truncating.
pub const GANTT_WIDTH: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AlgorithmInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub complexity: &'static str,
    pub advantages: &'static [&'static str],
    pub disadvantages: &'static [&'static str],
}

const CATALOG: [AlgorithmInfo; 6] = [
    AlgorithmInfo {
        name: "FCFS (First Come First Serve)",
        description: "Processes are executed in the order they arrive. Simple but can cause convoy effect.",
        complexity: "O(n)",
        advantages: &["Simple to implement", "No starvation", "Fair scheduling"],
        disadvantages: &[
            "Poor average waiting time",
            "Convoy effect",
            "Not optimal for short processes",
        ],
    },
    AlgorithmInfo {
        name: "Round Robin",
        description: "Each process gets a fixed time slice (quantum). Preemptive scheduling.",
        complexity: "O(n)",
        advantages: &["Fair to all processes", "Good response time", "No starvation"],
        disadvantages: &[
            "Context switching overhead",
            "Performance depends on quantum size",
        ],
    },
    AlgorithmInfo {
        name: "SPN (Shortest Process Next)",
        description: "Processes with shortest burst time are executed first. Non-preemptive.",
        complexity: "O(n²)",
        advantages: &[
            "Optimal average waiting time",
            "Minimal average turnaround time",
        ],
        disadvantages: &[
            "Starvation of long processes",
            "Difficult to predict burst time",
        ],
    },
    AlgorithmInfo {
        name: "SRT (Shortest Remaining Time)",
        description: "Preemptive version of SPN. Process with shortest remaining time runs.",
        complexity: "O(n²)",
        advantages: &["Better than SPN", "Optimal for short processes"],
        disadvantages: &[
            "Complex implementation",
            "Starvation possible",
            "Context switching overhead",
        ],
    },
    AlgorithmInfo {
        name: "HRRN (Highest Response Ratio Next)",
        description: "Scheduling based on response ratio = (waiting time + burst time) / burst time.",
        complexity: "O(n²)",
        advantages: &["No starvation", "Considers both waiting and burst time"],
        disadvantages: &["Complex calculation", "Not optimal for all cases"],
    },
    AlgorithmInfo {
        name: "Priority (Preemptive + Aging)",
        description: "Preemptive priority scheduling with dynamic aging to prevent starvation. Optional context switch overhead included.",
        complexity: "O(n²) naive (select each tick)",
        advantages: &[
            "Respects priorities",
            "Aging mitigates starvation",
            "Preemptive responsiveness",
        ],
        disadvantages: &["Frequent preemptions", "Needs careful parameter tuning"],
    },
];

impl AlgorithmKind {
    pub fn info(&self) -> &'static AlgorithmInfo {
        let idx = match self {
            AlgorithmKind::Fcfs => 0,
            AlgorithmKind::RoundRobin => 1,
            AlgorithmKind::Spn => 2,
            AlgorithmKind::Srt => 3,
            AlgorithmKind::Hrrn => 4,
            AlgorithmKind::Priority => 5,
        };
        &CATALOG[idx]
    }
}

/// ASCII Gantt chart of the first [`GANTT_WIDTH`] ticks.
pub fn gantt_chart(timeline: &[Slot]) -> String {
    let shown = timeline.len().min(GANTT_WIDTH);
    let truncated = timeline.len() > GANTT_WIDTH;
    let margin = "      ";
    let mut out = String::new();

    out.push_str("GANTT CHART:\n");
    out.push_str(&"─".repeat(80));
    out.push('\n');

    out.push_str("Time: ");
    for i in 0..shown {
        let _ = write!(out, "{:>4}", i);
    }
    if truncated {
        out.push_str("...");
    }
    out.push('\n');

    out.push_str("Proc: ");
    for slot in &timeline[..shown] {
        let _ = write!(out, "{:>4}", slot.label());
    }
    if truncated {
        out.push_str("...");
    }
    out.push('\n');

    let border = format!("{}{}\n", margin, "+---".repeat(shown + 1));
    out.push_str(&border);

    out.push_str(margin);
    for slot in &timeline[..shown] {
        let cell = match slot.process() {
            Some(name) => format!(" {} ", name),
            None => "   ".to_string(),
        };
        let _ = write!(out, "|{:<3}", cell);
    }
    out.push_str("|\n");
    out.push_str(&border);

    out.push_str(margin);
    for i in 0..=shown {
        let _ = write!(out, "{:>4}", i);
    }
    out.push('\n');

    out
}

fn fmt_stat(stats: Option<&Stats>, pick: impl Fn(&Stats) -> f64, suffix: &str) -> String {
    match stats {
        Some(s) => format!("{:.2}{}", pick(s), suffix),
        None => "n/a".to_string(),
    }
}

pub fn export_markdown(results: &[SchedulerResult]) -> String {
    let mut out = String::from("# CPU Scheduling Simulation Results\n\n");
    for result in results {
        let stats = result.stats.as_ref();
        let _ = writeln!(out, "## {}\n", result.name);
        let _ = writeln!(
            out,
            "**Average Turnaround Time:** {}",
            fmt_stat(stats, |s| s.avg_turnaround, "")
        );
        let _ = writeln!(
            out,
            "**Average Waiting Time:** {}",
            fmt_stat(stats, |s| s.avg_waiting, "")
        );
        let _ = writeln!(
            out,
            "**CPU Utilization:** {}\n",
            fmt_stat(stats, |s| s.cpu_utilization, "%")
        );
    }
    out
}

/// Per-process table of completed processes.
pub fn process_table(result: &SchedulerResult) -> String {
    let mut out = format!(
        "{:<10} {:>7} {:>5} {:>5} {:>6} {:>10} {:>7}\n",
        "Process", "Arrival", "Burst", "Start", "Finish", "Turnaround", "Waiting"
    );
    for p in result.processes.iter().filter(|p| p.completed) {
        let start = p.start.map(|s| s.to_string()).unwrap_or_else(|| "-".to_string());
        let _ = writeln!(
            out,
            "{:<10} {:>7} {:>5} {:>5} {:>6} {:>10} {:>7}",
            p.name, p.arrival, p.burst, start, p.finish, p.turnaround, p.waiting
        );
    }
    out
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRow {
    pub name: String,
    pub stats: Stats,
    pub best_turnaround: bool,
    pub best_waiting: bool,
    pub best_utilization: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    pub best_turnaround: f64,
    pub best_waiting: f64,
    pub best_utilization: f64,
    pub rows: Vec<ComparisonRow>,
}

/// Compare runs that produced statistics. Needs at least two of them.
pub fn compare(results: &[SchedulerResult]) -> Option<Comparison> {
    let scored: Vec<(&str, Stats)> = results
        .iter()
        .filter_map(|r| r.stats.map(|s| (r.name.as_str(), s)))
        .collect();
    if scored.len() < 2 {
        return None;
    }

    let best_turnaround = scored
        .iter()
        .map(|(_, s)| s.avg_turnaround)
        .fold(f64::INFINITY, f64::min);
    let best_waiting = scored
        .iter()
        .map(|(_, s)| s.avg_waiting)
        .fold(f64::INFINITY, f64::min);
    let best_utilization = scored
        .iter()
        .map(|(_, s)| s.cpu_utilization)
        .fold(f64::NEG_INFINITY, f64::max);

    let rows = scored
        .into_iter()
        .map(|(name, stats)| ComparisonRow {
            name: name.to_string(),
            best_turnaround: stats.avg_turnaround == best_turnaround,
            best_waiting: stats.avg_waiting == best_waiting,
            best_utilization: stats.cpu_utilization == best_utilization,
            stats,
        })
        .collect();

    Some(Comparison {
        best_turnaround,
        best_waiting,
        best_utilization,
        rows,
    })
}
