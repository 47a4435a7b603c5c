//! Orchestration layer: driving a wave plan through delivery agents.
//!
//! The executor issues every task of a wave together and joins on the
//! whole wave before moving on. How a task is actually performed (code
//! generation, review, deployment) is up to the caller's runner.

mod executor;

pub use executor::{ExecutorEvent, TaskOutput, WaveExecutor, WaveReport};
