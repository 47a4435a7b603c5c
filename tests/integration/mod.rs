//! Integration test suite for waveplan.
//!
//! These tests drive the public API end to end: a JSON task list is
//! planned into waves, the waves are executed, and every metered call made
//! by a task runner goes through the economic governor.
//!
//! # Test Categories
//!
//! - `planning_e2e`: Wave planning, critical path and efficiency properties
//! - `governor_flow`: Circuit breaker lifecycle over a simulated hour
//! - `execution`: Wave execution gated by the governor
//!
//! # CI Compatibility
//!
//! No test talks to a real service. Time is driven by a manual clock, so
//! nothing sleeps for the length of a cooldown.

mod fixtures;

mod execution;
mod governor_flow;
