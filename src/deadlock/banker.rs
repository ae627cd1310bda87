// Banker's Algorithm - safety check with a full audit trace
use super::vector::{self, ResourceVector};
use crate::error::{Error, Result};
use crate::session::Replay;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub const DEFAULT_MAX_PASSES: usize = 100;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankersInput {
    pub available: ResourceVector,
    pub max: Vec<ResourceVector>,
    pub allocation: Vec<ResourceVector>,
}

impl BankersInput {
    pub fn new(
        available: ResourceVector,
        max: Vec<ResourceVector>,
        allocation: Vec<ResourceVector>,
    ) -> Self {
        BankersInput {
            available,
            max,
            allocation,
        }
    }

    /// Process count is taken from the allocation matrix.
    pub fn process_count(&self) -> usize {
        self.allocation.len()
    }

    pub fn resource_count(&self) -> usize {
        self.available.len()
    }

    /// Need = Max - Allocation. A missing Max row is treated as empty.
    pub fn need(&self) -> Vec<ResourceVector> {
        self.allocation
            .iter()
            .enumerate()
            .map(|(i, alloc)| {
                let max = self.max.get(i).map(Vec::as_slice).unwrap_or(&[]);
                vector::sub(max, alloc)
            })
            .collect()
    }

    /// Shape check for callers that want to reject degenerate input. The
    /// safety engine itself never calls this.
    pub fn validate(&self) -> Result<()> {
        let m = self.resource_count();
        if self.max.len() != self.allocation.len() {
            return Err(Error::ShapeMismatch(format!(
                "Max has {} rows but Allocation has {}",
                self.max.len(),
                self.allocation.len()
            )));
        }
        for (name, matrix) in [("Max", &self.max), ("Allocation", &self.allocation)] {
            if let Some((i, row)) = matrix.iter().enumerate().find(|(_, r)| r.len() != m) {
                return Err(Error::ShapeMismatch(format!(
                    "{} row {} has {} columns, expected {}",
                    name,
                    i,
                    row.len(),
                    m
                )));
            }
        }
        if let Some((i, j)) = self.need().iter().enumerate().find_map(|(i, row)| {
            row.iter().position(|v| *v < 0).map(|j| (i, j))
        }) {
            return Err(Error::ShapeMismatch(format!(
                "Allocation exceeds Max for P{} on resource R{}",
                i,
                j + 1
            )));
        }
        Ok(())
    }
}

/// One attempt to grant a process during a safety pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyStep {
    pub process: usize,
    pub need: ResourceVector,
    pub work_before: ResourceVector,
    pub allocation: ResourceVector,
    pub work_after: ResourceVector,
    pub finished: bool,
}

impl SafetyStep {
    pub fn label(&self) -> String {
        format!("P{}", self.process)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SafetyOutcome {
    pub need: Vec<ResourceVector>,
    pub steps: Vec<SafetyStep>,
    pub sequence: Vec<String>,
    pub safe: bool,
    pub final_work: ResourceVector,
    pub passes: usize,
}

impl SafetyOutcome {
    /// Processes granted within the first `visible` steps of the trace.
    pub fn completed_within(&self, visible: usize) -> Vec<String> {
        self.steps
            .iter()
            .take(visible)
            .filter(|s| s.finished)
            .map(SafetyStep::label)
            .collect()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SafetyEngine {
    max_passes: usize,
}

impl Default for SafetyEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SafetyEngine {
    pub fn new() -> Self {
        SafetyEngine {
            max_passes: DEFAULT_MAX_PASSES,
        }
    }

    pub fn with_max_passes(max_passes: usize) -> Self {
        SafetyEngine { max_passes }
    }

    pub fn max_passes(&self) -> usize {
        self.max_passes
    }

    /// Repeated left-to-right passes until a pass grants nothing.
    pub fn check(&self, input: &BankersInput) -> SafetyOutcome {
        let need = input.need();
        let n = input.process_count();

        let mut work = input.available.clone();
        let mut finish = vec![false; n];
        let mut sequence = Vec::new();
        let mut steps = Vec::new();

        let mut progress = true;
        let mut passes = 0;

        while progress && passes < self.max_passes {
            passes += 1;
            progress = false;

            for i in 0..n {
                if finish[i] {
                    continue;
                }
                let allocation = input.allocation[i].clone();

                if vector::leq(&need[i], &work) {
                    let work_after = vector::add(&work, &allocation);
                    finish[i] = true;
                    sequence.push(format!("P{}", i));
                    progress = true;
                    steps.push(SafetyStep {
                        process: i,
                        need: need[i].clone(),
                        work_before: work,
                        allocation,
                        work_after: work_after.clone(),
                        finished: true,
                    });
                    work = work_after;
                } else {
                    steps.push(SafetyStep {
                        process: i,
                        need: need[i].clone(),
                        work_before: work.clone(),
                        allocation,
                        work_after: work.clone(),
                        finished: false,
                    });
                }
            }
        }

        if progress && passes >= self.max_passes {
            warn!("Safety check stopped at the {} pass limit", self.max_passes);
        }

        let safe = finish.iter().all(|f| *f);
        debug!(
            "Safety check: safe={} sequence=[{}] passes={}",
            safe,
            sequence.join(", "),
            passes
        );

        SafetyOutcome {
            need,
            steps,
            sequence,
            safe,
            final_work: work,
            passes,
        }
    }
}

impl Replay for SafetyEngine {
    type Input = BankersInput;
    type Outcome = SafetyOutcome;
    type Step = SafetyStep;

    fn compute(&self, input: &BankersInput) -> SafetyOutcome {
        self.check(input)
    }

    fn steps<'o>(&self, outcome: &'o SafetyOutcome) -> &'o [SafetyStep] {
        &outcome.steps
    }
}
