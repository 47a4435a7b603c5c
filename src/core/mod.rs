//! Core domain models for planning.
//!
//! This module contains the task model of a planning request and the
//! validated dependency graph built from it.

pub mod graph;
pub mod task;

pub use graph::TaskGraph;
pub use task::{AgentKind, Complexity, Effort, Priority, Task, TaskId};
