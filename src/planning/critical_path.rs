//! Critical path analysis.
//!
//! The critical path is the longest duration-weighted chain of dependent
//! tasks. It is computed over the dependency edges in topological order,
//! so consecutive tasks on the path are always dependency-linked.

use crate::core::graph::TaskGraph;
use crate::core::task::TaskId;
use crate::error::Result;
use petgraph::graph::NodeIndex;
use petgraph::Direction;
use serde::{Deserialize, Serialize};

/// The longest chain of dependent tasks and its accumulated duration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CriticalPath {
    /// Task identifiers from source to sink.
    pub tasks: Vec<TaskId>,
    pub hours: u32,
}

/// Longest chain ending at a node: accumulated hours and the chain itself.
#[derive(Debug, Clone)]
struct Chain {
    hours: u32,
    path: Vec<TaskId>,
}

impl Chain {
    /// Longer chains win; among equal lengths the lexicographically
    /// smallest identifier sequence wins.
    fn beats(&self, other: &Chain) -> bool {
        self.hours > other.hours || (self.hours == other.hours && self.path < other.path)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CriticalPathAnalyzer;

impl CriticalPathAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Compute the critical path of a validated graph.
    ///
    /// A task's accumulated duration is its own hours plus the largest
    /// accumulated duration among its direct dependencies. An empty graph
    /// has an empty path.
    pub fn analyze(&self, graph: &TaskGraph) -> Result<CriticalPath> {
        let dag = graph.graph();
        let order = graph.topological_order()?;
        let mut chains: Vec<Option<Chain>> = vec![None; dag.node_count()];
        let mut best: Option<Chain> = None;

        for task in order {
            let Some(index) = graph.get_node_index(&task.id) else {
                continue;
            };

            let mut longest_dep: Option<&Chain> = None;
            for dep in dag.neighbors_directed(index, Direction::Incoming) {
                if let Some(chain) = chains[dep.index()].as_ref() {
                    if longest_dep.map_or(true, |current| chain.beats(current)) {
                        longest_dep = Some(chain);
                    }
                }
            }

            let chain = match longest_dep {
                Some(dep) => {
                    let mut path = dep.path.clone();
                    path.push(task.id.clone());
                    Chain {
                        hours: dep.hours + task.hours(),
                        path,
                    }
                }
                None => Chain {
                    hours: task.hours(),
                    path: vec![task.id.clone()],
                },
            };

            if best.as_ref().map_or(true, |current| chain.beats(current)) {
                best = Some(chain.clone());
            }
            store(&mut chains, index, chain);
        }

        Ok(best
            .map(|chain| CriticalPath {
                tasks: chain.path,
                hours: chain.hours,
            })
            .unwrap_or_default())
    }
}

fn store(chains: &mut [Option<Chain>], index: NodeIndex, chain: Chain) {
    if let Some(slot) = chains.get_mut(index.index()) {
        *slot = Some(chain);
    }
}
