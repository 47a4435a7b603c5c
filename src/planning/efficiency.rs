//! Parallel speed-up scoring.

use crate::core::task::Task;
use crate::planning::waves::Wave;
use serde::{Deserialize, Serialize};

/// Sequential vs. wave-parallel effort of a plan.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Efficiency {
    /// Sum of every task's hours.
    pub sequential_hours: u32,
    /// Sum over waves of each wave's longest task.
    pub parallel_hours: u32,
    /// `(sequential - parallel) / sequential`, or 0 for an empty plan.
    pub ratio: f64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EfficiencyCalculator;

impl EfficiencyCalculator {
    pub fn new() -> Self {
        Self
    }

    pub fn calculate(&self, waves: &[Wave]) -> Efficiency {
        let sequential_hours: u32 = waves
            .iter()
            .flat_map(|wave| wave.tasks.iter())
            .map(Task::hours)
            .sum();
        let parallel_hours: u32 = waves.iter().map(Wave::hours).sum();

        let ratio = if sequential_hours == 0 {
            0.0
        } else {
            f64::from(sequential_hours - parallel_hours) / f64::from(sequential_hours)
        };

        Efficiency {
            sequential_hours,
            parallel_hours,
            ratio,
        }
    }
}

/// Render a wave-parallel hour count as an approximate calendar duration.
///
/// A week is 40 working hours and a day 8.
pub fn format_total_duration(hours: u32) -> String {
    let weeks = hours / 40;
    let days = (hours % 40) / 8;

    match (weeks, days) {
        (0, 0) => format!("~{} {}", hours, plural(hours, "hour")),
        (0, d) => format!("~{} {}", d, plural(d, "day")),
        (w, 0) => format!("~{} {}", w, plural(w, "week")),
        (w, d) => format!("~{} {} {} {}", w, plural(w, "week"), d, plural(d, "day")),
    }
}

fn plural(n: u32, unit: &str) -> String {
    if n == 1 {
        unit.to_string()
    } else {
        format!("{}s", unit)
    }
}
