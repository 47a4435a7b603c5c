//! Full planning pipeline: graph, waves, critical path and efficiency.

use crate::core::graph::TaskGraph;
use crate::core::task::{Task, TaskId};
use crate::error::Result;
use crate::planning::critical_path::CriticalPathAnalyzer;
use crate::planning::efficiency::{format_total_duration, EfficiencyCalculator};
use crate::planning::waves::{Wave, WaveScheduler};
use serde::{Deserialize, Serialize};

/// Read-only result of one planning call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DagAnalysis {
    pub tasks: Vec<Task>,
    pub waves: Vec<Wave>,
    pub critical_path: Vec<TaskId>,
    pub total_duration: String,
    /// Fraction of sequential effort saved by running waves in parallel.
    pub efficiency: f64,
}

impl DagAnalysis {
    /// Parse a JSON task array and analyse it.
    pub fn from_json(json: &str) -> Result<Self> {
        let tasks: Vec<Task> = serde_json::from_str(json)?;
        analyze(tasks)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Analyse a planning request.
///
/// Fails on duplicate ids, unknown dependencies and cycles; an invalid
/// request is a caller error and is never retried.
pub fn analyze(tasks: Vec<Task>) -> Result<DagAnalysis> {
    let graph = TaskGraph::build(tasks)?;
    let waves = WaveScheduler::new().plan_waves(&graph)?;
    let critical_path = CriticalPathAnalyzer::new().analyze(&graph)?;
    let efficiency = EfficiencyCalculator::new().calculate(&waves);

    tracing::info!(
        tasks = graph.task_count(),
        waves = waves.len(),
        critical_path_hours = critical_path.hours,
        efficiency = efficiency.ratio,
        "planning complete"
    );

    Ok(DagAnalysis {
        tasks: graph.into_tasks(),
        waves,
        critical_path: critical_path.tasks,
        total_duration: format_total_duration(efficiency.parallel_hours),
        efficiency: efficiency.ratio,
    })
}

impl std::fmt::Display for DagAnalysis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Tasks: {}", self.tasks.len())?;
        for task in &self.tasks {
            if task.dependencies.is_empty() {
                writeln!(f, "  {}: {} (no dependencies)", task.id, task.title)?;
            } else {
                let deps: Vec<&str> = task.dependencies.iter().map(TaskId::as_str).collect();
                writeln!(f, "  {}: {} (depends on: {})", task.id, task.title, deps.join(", "))?;
            }
            writeln!(
                f,
                "      Agent: {} | Complexity: {} | Effort: {}",
                task.agent, task.complexity, task.effort
            )?;
        }

        writeln!(f)?;
        writeln!(f, "Waves: {}", self.waves.len())?;
        for wave in &self.waves {
            let mode = if wave.can_run_in_parallel {
                "parallel"
            } else {
                "sequential"
            };
            writeln!(f, "  Wave {} ({}) - {}", wave.id, mode, wave.estimated_duration)?;
            for task in &wave.tasks {
                writeln!(f, "    - {}: {}", task.id, task.title)?;
            }
            if !wave.dependencies.is_empty() {
                let deps: Vec<&str> = wave.dependencies.iter().map(TaskId::as_str).collect();
                writeln!(f, "    Dependencies: {}", deps.join(", "))?;
            }
        }

        writeln!(f)?;
        let path: Vec<&str> = self.critical_path.iter().map(TaskId::as_str).collect();
        writeln!(f, "Critical path: {}", path.join(" -> "))?;
        writeln!(f, "Total duration: {}", self.total_duration)?;
        write!(
            f,
            "Efficiency: {:.1}% reduction (parallel vs sequential)",
            self.efficiency * 100.0
        )
    }
}
