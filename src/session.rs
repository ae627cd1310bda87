//! Step-by-step replay sessions
//!
//! A session owns its input and a fully precomputed outcome. Stepping only
//! moves a cursor over the outcome's steps, so resetting and stepping again
//! always shows the same trace. An [`InputSignature`] lets callers tell when
//! a cached session no longer matches the current input.

use crate::error::{Error, Result};
use serde::Serialize;
use std::fmt;
use tracing::debug;
use xxhash_rust::xxh3::xxh3_64;

/// Structural hash of an engine input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InputSignature(u64);

impl InputSignature {
    pub fn of<T: Serialize>(input: &T) -> Result<Self> {
        let bytes =
            bincode::serialize(input).map_err(|e| Error::SerializationError(e.to_string()))?;
        Ok(InputSignature(xxh3_64(&bytes)))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for InputSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// An engine whose result can be replayed one step at a time.
pub trait Replay {
    type Input: Serialize;
    type Outcome;
    type Step;

    fn compute(&self, input: &Self::Input) -> Self::Outcome;

    fn steps<'o>(&self, outcome: &'o Self::Outcome) -> &'o [Self::Step];

    fn total_steps(&self, outcome: &Self::Outcome) -> usize {
        self.steps(outcome).len()
    }
}

pub struct SimulationSession<R: Replay> {
    engine: R,
    input: R::Input,
    signature: InputSignature,
    outcome: R::Outcome,
    cursor: usize,
}

impl<R: Replay> SimulationSession<R> {
    pub fn new(engine: R, input: R::Input) -> Result<Self> {
        let signature = InputSignature::of(&input)?;
        let outcome = engine.compute(&input);
        Ok(SimulationSession {
            engine,
            input,
            signature,
            outcome,
            cursor: 0,
        })
    }

    pub fn input(&self) -> &R::Input {
        &self.input
    }

    pub fn signature(&self) -> InputSignature {
        self.signature
    }

    pub fn outcome(&self) -> &R::Outcome {
        &self.outcome
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn total_steps(&self) -> usize {
        self.engine.total_steps(&self.outcome)
    }

    pub fn is_complete(&self) -> bool {
        self.cursor >= self.total_steps()
    }

    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    /// Advance one step, saturating at the end. Returns the new cursor.
    pub fn step(&mut self) -> usize {
        self.cursor = (self.cursor + 1).min(self.total_steps());
        self.cursor
    }

    pub fn run_to_completion(&mut self) -> usize {
        self.cursor = self.total_steps();
        self.cursor
    }

    /// Steps revealed so far.
    pub fn visible_steps(&self) -> &[R::Step] {
        let steps = self.engine.steps(&self.outcome);
        &steps[..self.cursor.min(steps.len())]
    }

    pub fn is_stale(&self, input: &R::Input) -> Result<bool> {
        Ok(InputSignature::of(input)? != self.signature)
    }

    /// Recompute from `input` unless it matches the cached signature.
    /// Returns true if the session was rebuilt (cursor back at zero).
    pub fn refresh(&mut self, input: R::Input) -> Result<bool> {
        let signature = InputSignature::of(&input)?;
        if signature == self.signature {
            return Ok(false);
        }
        debug!("Session input changed ({} -> {}), recomputing", self.signature, signature);
        self.outcome = self.engine.compute(&input);
        self.input = input;
        self.signature = signature;
        self.cursor = 0;
        Ok(true)
    }
}

impl<R: Replay> fmt::Debug for SimulationSession<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimulationSession")
            .field("signature", &self.signature)
            .field("cursor", &self.cursor)
            .field("total_steps", &self.total_steps())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Countdown;

    impl Replay for Countdown {
        type Input = u32;
        type Outcome = Vec<u32>;
        type Step = u32;

        fn compute(&self, input: &u32) -> Vec<u32> {
            (0..*input).rev().collect()
        }

        fn steps<'o>(&self, outcome: &'o Vec<u32>) -> &'o [u32] {
            outcome
        }
    }

    #[test]
    fn test_signature_is_structural() {
        let a = InputSignature::of(&vec![1u32, 2, 3]).unwrap();
        let b = InputSignature::of(&vec![1u32, 2, 3]).unwrap();
        let c = InputSignature::of(&vec![3u32, 2, 1]).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_step_saturates() {
        let mut session = SimulationSession::new(Countdown, 2).unwrap();
        assert_eq!(session.step(), 1);
        assert_eq!(session.step(), 2);
        assert_eq!(session.step(), 2);
        assert!(session.is_complete());
        assert_eq!(session.visible_steps(), &[1, 0]);
    }

    #[test]
    fn test_reset_replays_identically() {
        let mut session = SimulationSession::new(Countdown, 3).unwrap();
        session.run_to_completion();
        let first: Vec<u32> = session.visible_steps().to_vec();
        session.reset();
        assert!(session.visible_steps().is_empty());
        session.run_to_completion();
        assert_eq!(session.visible_steps(), first.as_slice());
    }

    #[test]
    fn test_refresh_only_on_change() {
        let mut session = SimulationSession::new(Countdown, 3).unwrap();
        session.step();
        assert!(!session.refresh(3).unwrap());
        assert_eq!(session.cursor(), 1);

        assert!(session.is_stale(&5).unwrap());
        assert!(session.refresh(5).unwrap());
        assert_eq!(session.cursor(), 0);
        assert_eq!(session.total_steps(), 5);
    }
}
