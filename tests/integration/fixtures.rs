//! Test fixtures for integration tests.
//!
//! Provides helpers for:
//! - Predefined task sets (chain, diamond, fan-out, the delivery example)
//! - A governor driven by a manual clock

use chrono::{TimeZone, Utc};
use std::sync::Arc;

use waveplan::config::GovernorConfig;
use waveplan::core::{AgentKind, Effort, Priority, Task};
use waveplan::governor::{EconomicGovernor, ManualClock, PricingTable};

/// Create a task with the given id, effort and dependencies.
pub fn task(id: &str, effort: Effort, deps: &[&str]) -> Task {
    Task::new(id, &format!("Task {}", id), effort).with_dependencies(deps.iter().copied())
}

/// Linear chain: 1 <- 2 <- ... <- n, one day each.
pub fn chain(n: usize) -> Vec<Task> {
    (1..=n)
        .map(|i| {
            let id = i.to_string();
            let prev = (i - 1).to_string();
            if i == 1 {
                task(&id, Effort::OneDay, &[])
            } else {
                task(&id, Effort::OneDay, &[prev.as_str()])
            }
        })
        .collect()
}

/// Diamond: a -> {b, c} -> d.
pub fn diamond() -> Vec<Task> {
    vec![
        task("a", Effort::FourHours, &[]),
        task("b", Effort::OneDay, &["a"]),
        task("c", Effort::ThreeDays, &["a"]),
        task("d", Effort::FourHours, &["b", "c"]),
    ]
}

/// `n` independent tasks of the same effort.
pub fn independent(n: usize, effort: Effort) -> Vec<Task> {
    (1..=n).map(|i| task(&format!("t{}", i), effort, &[])).collect()
}

/// Three-task delivery request: setup and API in parallel, UI after the API.
pub fn delivery_request() -> Vec<Task> {
    vec![
        Task::new("1", "Project setup", Effort::OneDay)
            .with_agent(AgentKind::Coordinator)
            .with_priority(Priority::Critical),
        Task::new("2", "REST API", Effort::OneWeek).with_priority(Priority::High),
        Task::new("3", "Web UI", Effort::ThreeDays)
            .with_dependencies(["2"])
            .with_acceptance_criteria(&["renders task list", "talks to the API"]),
    ]
}

/// JSON form of [`delivery_request`] as a caller would send it.
pub const DELIVERY_REQUEST_JSON: &str = r#"[
  {"id": "1", "title": "Project setup", "dependencies": [], "complexity": "small",
   "effort": "1d", "priority": "P0-Critical", "agent": "coordinator"},
  {"id": "2", "title": "REST API", "dependencies": [], "complexity": "large",
   "effort": "1w", "priority": "P1-High", "agent": "codegen"},
  {"id": "3", "title": "Web UI", "dependencies": ["2"], "complexity": "medium",
   "effort": "3d", "priority": "P2-Medium", "agent": "codegen",
   "acceptanceCriteria": ["renders task list"]}
]"#;

/// Tight limits: $1 and 10 calls per hour, 1 minute cooldown.
pub fn strict_config() -> GovernorConfig {
    GovernorConfig {
        max_cost_per_hour: 1.0,
        max_requests_per_hour: 10,
        cooldown_minutes: 1,
        warning_threshold: 0.8,
    }
}

/// A governor and a handle to the clock it reads.
pub struct GovernorHarness {
    pub governor: Arc<EconomicGovernor<ManualClock>>,
    pub clock: ManualClock,
}

impl GovernorHarness {
    pub fn new(config: GovernorConfig) -> Self {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 1, 6, 9, 0, 0).unwrap());
        let governor = EconomicGovernor::with_clock(config, PricingTable::anthropic(), clock.clone());
        Self {
            governor: Arc::new(governor),
            clock,
        }
    }

    pub fn strict() -> Self {
        Self::new(strict_config())
    }
}
