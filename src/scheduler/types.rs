// CPU Scheduling Types
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Parsed `name,arrival,burst[,priority]` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessSpec {
    pub name: String,
    pub arrival: u32,
    pub burst: u32,
    #[serde(default)]
    pub priority: i64,
}

impl ProcessSpec {
    pub fn new(name: impl Into<String>, arrival: u32, burst: u32) -> Self {
        ProcessSpec {
            name: name.into(),
            arrival,
            burst,
            priority: 0,
        }
    }

    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = priority;
        self
    }
}

/// Per-run process state. Larger priority values run first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Process {
    pub name: String,
    pub arrival: u32,
    pub burst: u32,
    pub remaining: u32,
    pub base_priority: i64,
    pub dynamic_priority: i64,
    pub start: Option<u32>,
    pub finish: u32,
    pub turnaround: u32,
    pub waiting: u32,
    pub completed: bool,
}

impl Process {
    pub fn from_spec(spec: &ProcessSpec) -> Self {
        Process {
            name: spec.name.clone(),
            arrival: spec.arrival,
            burst: spec.burst,
            remaining: spec.burst,
            base_priority: spec.priority,
            dynamic_priority: spec.priority,
            start: None,
            finish: 0,
            turnaround: 0,
            waiting: 0,
            completed: false,
        }
    }

    pub fn reset(&mut self) {
        self.remaining = self.burst;
        self.dynamic_priority = self.base_priority;
        self.start = None;
        self.finish = 0;
        self.turnaround = 0;
        self.waiting = 0;
        self.completed = false;
    }

    pub fn has_arrived(&self, time: u32) -> bool {
        self.arrival <= time
    }

    pub(crate) fn complete(&mut self, time: u32) {
        self.finish = time;
        self.turnaround = time.saturating_sub(self.arrival);
        self.waiting = self.turnaround.saturating_sub(self.burst);
        self.completed = true;
    }
}

/// One tick of the model clock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Slot {
    Idle,
    Busy(String),
}

impl Slot {
    pub fn is_idle(&self) -> bool {
        matches!(self, Slot::Idle)
    }

    pub fn process(&self) -> Option<&str> {
        match self {
            Slot::Idle => None,
            Slot::Busy(name) => Some(name),
        }
    }

    pub fn label(&self) -> &str {
        self.process().unwrap_or("IDLE")
    }
}

/// Parameterless discipline selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlgorithmKind {
    Fcfs,
    #[serde(rename = "rr")]
    RoundRobin,
    Spn,
    Srt,
    Hrrn,
    Priority,
}

impl AlgorithmKind {
    pub const ALL: [AlgorithmKind; 6] = [
        AlgorithmKind::Fcfs,
        AlgorithmKind::RoundRobin,
        AlgorithmKind::Spn,
        AlgorithmKind::Srt,
        AlgorithmKind::Hrrn,
        AlgorithmKind::Priority,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            AlgorithmKind::Fcfs => "fcfs",
            AlgorithmKind::RoundRobin => "rr",
            AlgorithmKind::Spn => "spn",
            AlgorithmKind::Srt => "srt",
            AlgorithmKind::Hrrn => "hrrn",
            AlgorithmKind::Priority => "priority",
        }
    }

    /// Attach run parameters.
    pub fn with_params(self, quantum: u32, aging_rate: i64, context_switch: u32) -> Algorithm {
        match self {
            AlgorithmKind::Fcfs => Algorithm::Fcfs,
            AlgorithmKind::RoundRobin => Algorithm::RoundRobin { quantum },
            AlgorithmKind::Spn => Algorithm::Spn,
            AlgorithmKind::Srt => Algorithm::Srt,
            AlgorithmKind::Hrrn => Algorithm::Hrrn,
            AlgorithmKind::Priority => Algorithm::Priority {
                aging_rate,
                context_switch,
            },
        }
    }
}

impl std::str::FromStr for AlgorithmKind {
    type Err = Error;

    // Accepts the short codes, "round-robin", and the numeric selectors 1-6.
    fn from_str(s: &str) -> Result<Self> {
        let key = s.trim().to_ascii_lowercase();
        if let Ok(n) = key.parse::<usize>() {
            return n
                .checked_sub(1)
                .and_then(|i| AlgorithmKind::ALL.get(i).copied())
                .ok_or_else(|| Error::UnknownAlgorithm(s.to_string()));
        }
        match key.as_str() {
            "round-robin" | "roundrobin" => Ok(AlgorithmKind::RoundRobin),
            _ => AlgorithmKind::ALL
                .into_iter()
                .find(|k| k.code() == key)
                .ok_or_else(|| Error::UnknownAlgorithm(s.to_string())),
        }
    }
}

impl fmt::Display for AlgorithmKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Algorithm {
    Fcfs,
    #[serde(rename = "rr")]
    RoundRobin { quantum: u32 },
    Spn,
    Srt,
    Hrrn,
    Priority { aging_rate: i64, context_switch: u32 },
}

impl Algorithm {
    pub fn kind(&self) -> AlgorithmKind {
        match self {
            Algorithm::Fcfs => AlgorithmKind::Fcfs,
            Algorithm::RoundRobin { .. } => AlgorithmKind::RoundRobin,
            Algorithm::Spn => AlgorithmKind::Spn,
            Algorithm::Srt => AlgorithmKind::Srt,
            Algorithm::Hrrn => AlgorithmKind::Hrrn,
            Algorithm::Priority { .. } => AlgorithmKind::Priority,
        }
    }

    pub fn name(&self) -> String {
        match self {
            Algorithm::Fcfs => "FCFS (First Come First Serve)".to_string(),
            Algorithm::RoundRobin { quantum } => format!("Round Robin (Quantum = {})", quantum),
            Algorithm::Spn => "SPN (Shortest Process Next)".to_string(),
            Algorithm::Srt => "SRT (Shortest Remaining Time)".to_string(),
            Algorithm::Hrrn => "HRRN (Highest Response Ratio Next)".to_string(),
            Algorithm::Priority { .. } => "Priority (Preemptive + Aging)".to_string(),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub avg_turnaround: f64,
    pub avg_waiting: f64,
    pub cpu_utilization: f64,
    pub completed: usize,
}

impl Stats {
    /// `None` when no process completed.
    pub fn compute(processes: &[Process], timeline: &[Slot]) -> Option<Stats> {
        let completed: Vec<&Process> = processes.iter().filter(|p| p.completed).collect();
        if completed.is_empty() {
            return None;
        }

        let count = completed.len() as f64;
        let total_turnaround: u64 = completed.iter().map(|p| p.turnaround as u64).sum();
        let total_waiting: u64 = completed.iter().map(|p| p.waiting as u64).sum();

        let busy = timeline.iter().filter(|s| !s.is_idle()).count();
        let cpu_utilization = if timeline.is_empty() {
            0.0
        } else {
            busy as f64 / timeline.len() as f64 * 100.0
        };

        Some(Stats {
            avg_turnaround: total_turnaround as f64 / count,
            avg_waiting: total_waiting as f64 / count,
            cpu_utilization,
            completed: completed.len(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchedulerResult {
    pub algorithm: Algorithm,
    pub name: String,
    pub timeline: Vec<Slot>,
    pub processes: Vec<Process>,
    pub stats: Option<Stats>,
}

impl SchedulerResult {
    pub fn process(&self, name: &str) -> Option<&Process> {
        self.processes.iter().find(|p| p.name == name)
    }

    pub fn idle_ticks(&self) -> usize {
        self.timeline.iter().filter(|s| s.is_idle()).count()
    }

    pub fn all_completed(&self) -> bool {
        self.processes.iter().all(|p| p.completed)
    }
}
