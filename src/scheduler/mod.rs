// CPU Scheduling Module
// FCFS, Round Robin, SPN, SRT, HRRN, preemptive priority with aging

pub mod engine;
pub mod report;
pub mod types;

pub use engine::*;
pub use report::{compare, export_markdown, gantt_chart, AlgorithmInfo, Comparison};
pub use types::*;
