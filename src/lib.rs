//! OS Algorithm Simulator Core
//!
//! Deterministic engines for resource-allocation-graph deadlock detection,
//! the Banker's safety algorithm, deadlock prevention policies and six CPU
//! scheduling disciplines. Every engine is a pure computation over in-memory
//! inputs; rendering is left to callers.

pub mod config;
pub mod deadlock;
pub mod error;
pub mod parse;
pub mod scheduler;
pub mod session;

pub use config::{ConfigBuilder, SimulatorConfig};
pub use deadlock::{
    BankersInput, CycleDetector, GraphBuilder, Policy, PreventionSimulator, SafetyEngine,
};
pub use error::{Error, Result};
pub use scheduler::{Algorithm, AlgorithmKind, SchedulerEngine, SchedulerResult};
pub use session::{InputSignature, Replay, SimulationSession};

/// Get version information
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
