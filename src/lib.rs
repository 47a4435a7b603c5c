//! Wave planning and cost governance for automated delivery agents.
//!
//! - [`planning`] turns a flat list of dependent tasks into parallel waves,
//!   finds the critical path and scores the parallel speed-up.
//! - [`orchestration`] executes a wave plan with all-or-nothing joins.
//! - [`governor`] meters metered external calls and trips a circuit breaker
//!   once the hourly cost or request budget is spent.

pub mod config;
pub mod core;
pub mod error;
pub mod governor;
pub mod log;
pub mod orchestration;
pub mod planning;

pub use crate::core::{Task, TaskGraph, TaskId};
pub use error::{Error, Result};
pub use governor::{Admission, CircuitState, EconomicGovernor, PricingTable};
pub use planning::{analyze, DagAnalysis, Wave};
