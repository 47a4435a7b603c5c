//! Planning: turning a task list into ordered, parallel waves.
//!
//! The pipeline is TaskGraph -> waves -> {critical path, efficiency} and is
//! pure and synchronous; see [`analyze`].

mod analysis;
mod critical_path;
mod efficiency;
mod waves;

pub use analysis::{analyze, DagAnalysis};
pub use critical_path::{CriticalPath, CriticalPathAnalyzer};
pub use efficiency::{format_total_duration, Efficiency, EfficiencyCalculator};
pub use waves::{duration_bucket, Wave, WaveScheduler};
