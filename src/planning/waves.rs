//! Wave planning.
//!
//! A wave is the maximal set of not-yet-scheduled tasks whose dependencies
//! all belong to earlier waves. Tasks inside a wave are logically concurrent.

use crate::core::graph::TaskGraph;
use crate::core::task::{Task, TaskId};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A group of tasks that can run at the same time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wave {
    /// 1-based position in the plan.
    pub id: usize,
    pub tasks: Vec<Task>,
    /// Every dependency referenced by a task of this wave, de-duplicated.
    pub dependencies: Vec<TaskId>,
    pub estimated_duration: String,
    pub can_run_in_parallel: bool,
}

impl Wave {
    fn new(id: usize, tasks: Vec<Task>) -> Self {
        let dependencies = {
            let mut seen = HashSet::new();
            tasks
                .iter()
                .flat_map(|task| task.dependencies.iter())
                .filter(|dep| seen.insert(*dep))
                .cloned()
                .collect()
        };
        let hours = max_hours(&tasks);

        Self {
            id,
            can_run_in_parallel: tasks.len() > 1,
            tasks,
            dependencies,
            estimated_duration: duration_bucket(hours).to_string(),
        }
    }

    /// Wall-clock hours of the wave: its longest task.
    pub fn hours(&self) -> u32 {
        max_hours(&self.tasks)
    }

    pub fn task_ids(&self) -> Vec<&TaskId> {
        self.tasks.iter().map(|task| &task.id).collect()
    }

    pub fn contains(&self, id: &TaskId) -> bool {
        self.tasks.iter().any(|task| &task.id == id)
    }
}

fn max_hours(tasks: &[Task]) -> u32 {
    tasks.iter().map(Task::hours).max().unwrap_or(0)
}

/// Human-readable bucket for a number of working hours.
pub fn duration_bucket(hours: u32) -> &'static str {
    match hours {
        80.. => "2 weeks",
        40.. => "1 week",
        24.. => "3 days",
        8.. => "1 day",
        4.. => "4 hours",
        _ => "1 hour",
    }
}

/// Partitions a validated task graph into waves.
#[derive(Debug, Clone, Copy, Default)]
pub struct WaveScheduler;

impl WaveScheduler {
    pub fn new() -> Self {
        Self
    }

    /// Plan the waves of a graph.
    ///
    /// The number of waves equals the length of the graph's longest
    /// dependency chain. Tasks within a wave keep request order.
    pub fn plan_waves(&self, graph: &TaskGraph) -> Result<Vec<Wave>> {
        plan(&graph.tasks().collect::<Vec<_>>())
    }
}

fn plan(tasks: &[&Task]) -> Result<Vec<Wave>> {
    let known: HashSet<&TaskId> = tasks.iter().map(|task| &task.id).collect();
    for task in tasks {
        if let Some(dep) = task.dependencies.iter().find(|dep| !known.contains(dep)) {
            return Err(Error::UnknownDependency {
                task: task.id.clone(),
                dependency: dep.clone(),
            });
        }
    }

    let mut waves = Vec::new();
    let mut scheduled: HashSet<&TaskId> = HashSet::with_capacity(tasks.len());

    while scheduled.len() < tasks.len() {
        let ready: Vec<&Task> = tasks
            .iter()
            .copied()
            .filter(|task| !scheduled.contains(&task.id))
            .filter(|task| task.dependencies.iter().all(|dep| scheduled.contains(dep)))
            .collect();

        if ready.is_empty() {
            let remaining = tasks
                .iter()
                .filter(|task| !scheduled.contains(&task.id))
                .map(|task| task.id.clone())
                .collect();
            return Err(Error::Deadlock { remaining });
        }

        scheduled.extend(ready.iter().map(|task| &task.id));
        let wave = Wave::new(waves.len() + 1, ready.into_iter().cloned().collect());
        tracing::debug!(
            wave = wave.id,
            tasks = wave.tasks.len(),
            duration = %wave.estimated_duration,
            "planned wave"
        );
        waves.push(wave);
    }

    Ok(waves)
}
