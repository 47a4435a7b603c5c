//! Wave executor.
//!
//! Runs a wave plan in order. All tasks of a wave are issued together and
//! joined as a whole; the next wave starts only once every task of the
//! current one has settled. A wave with any failed task stops the run.
//! Retries, timeouts and cancellation belong to the task runner.

use crate::core::task::{Task, TaskId};
use crate::error::{Error, Result};
use crate::planning::Wave;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::future::Future;
use tokio::sync::mpsc;

/// Events emitted by the executor for wave and task lifecycle changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutorEvent {
    /// All tasks of a wave have been issued.
    WaveStarted {
        wave: usize,
        tasks: Vec<TaskId>,
    },
    TaskCompleted {
        task_id: TaskId,
        output: String,
    },
    TaskFailed {
        task_id: TaskId,
        error: String,
    },
    /// Every task of the wave succeeded.
    WaveCompleted {
        wave: usize,
    },
    AllWavesComplete,
}

/// Output of one successfully executed task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskOutput {
    pub task_id: TaskId,
    pub output: String,
}

/// Outputs of a completed wave, in the wave's task order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaveReport {
    pub wave: usize,
    pub outputs: Vec<TaskOutput>,
}

/// Executes waves with all-or-nothing join semantics.
///
/// # Example
///
/// ```ignore
/// let executor = WaveExecutor::new();
/// let reports = executor
///     .execute(&analysis.waves, |task| async move { run_agent(task).await })
///     .await?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct WaveExecutor {
    event_tx: Option<mpsc::Sender<ExecutorEvent>>,
}

impl WaveExecutor {
    pub fn new() -> Self {
        Self { event_tx: None }
    }

    /// Create an executor that reports progress on the given channel.
    ///
    /// Events are sent without waiting; size the channel for the plan or
    /// drain it concurrently, otherwise events past its capacity are lost.
    pub fn with_events(event_tx: mpsc::Sender<ExecutorEvent>) -> Self {
        Self {
            event_tx: Some(event_tx),
        }
    }

    /// Run every wave in order.
    ///
    /// `runner` is invoked once per task and returns the task's output or an
    /// error message. Returns one report per wave, or `Error::WaveFailed`
    /// naming the first wave with failures (later waves are not started).
    pub async fn execute<F, Fut>(&self, waves: &[Wave], runner: F) -> Result<Vec<WaveReport>>
    where
        F: Fn(Task) -> Fut,
        Fut: Future<Output = std::result::Result<String, String>>,
    {
        let mut reports = Vec::with_capacity(waves.len());

        for wave in waves {
            reports.push(self.execute_wave(wave, &runner).await?);
        }

        self.emit(ExecutorEvent::AllWavesComplete);
        Ok(reports)
    }

    async fn execute_wave<F, Fut>(&self, wave: &Wave, runner: &F) -> Result<WaveReport>
    where
        F: Fn(Task) -> Fut,
        Fut: Future<Output = std::result::Result<String, String>>,
    {
        tracing::info!(wave = wave.id, tasks = wave.tasks.len(), "starting wave");

        let pending: Vec<_> = wave.tasks.iter().cloned().map(runner).collect();
        self.emit(ExecutorEvent::WaveStarted {
            wave: wave.id,
            tasks: wave.tasks.iter().map(|task| task.id.clone()).collect(),
        });

        let results = join_all(pending).await;

        let mut outputs = Vec::with_capacity(results.len());
        let mut failures = Vec::new();
        for (task, result) in wave.tasks.iter().zip(results) {
            match result {
                Ok(output) => {
                    self.emit(ExecutorEvent::TaskCompleted {
                        task_id: task.id.clone(),
                        output: output.clone(),
                    });
                    outputs.push(TaskOutput {
                        task_id: task.id.clone(),
                        output,
                    });
                }
                Err(error) => {
                    tracing::warn!(wave = wave.id, task = %task.id, %error, "task failed");
                    self.emit(ExecutorEvent::TaskFailed {
                        task_id: task.id.clone(),
                        error: error.clone(),
                    });
                    failures.push((task.id.clone(), error));
                }
            }
        }

        if !failures.is_empty() {
            tracing::error!(wave = wave.id, failed = failures.len(), "wave failed");
            return Err(Error::WaveFailed {
                wave: wave.id,
                failures,
            });
        }

        self.emit(ExecutorEvent::WaveCompleted { wave: wave.id });
        Ok(WaveReport {
            wave: wave.id,
            outputs,
        })
    }

    /// Events never block execution: when the channel is full or closed
    /// the event is dropped.
    fn emit(&self, event: ExecutorEvent) {
        if let Some(tx) = &self.event_tx {
            if let Err(err) = tx.try_send(event) {
                tracing::debug!(error = %err, "executor event dropped");
            }
        }
    }
}
