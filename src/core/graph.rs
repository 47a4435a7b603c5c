//! Task dependency graph.
//!
//! This module provides the TaskGraph structure that indexes a planning
//! request's tasks by identifier and validates that the "depends on"
//! relation is acyclic.

use crate::core::task::{Task, TaskId};
use crate::error::{Error, Result};
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{depth_first_search, Control, DfsEvent, Reversed};
use std::collections::HashMap;

/// The validated task dependency graph.
///
/// Nodes are tasks. An edge `a -> b` means `b` depends on `a`, so `a` must
/// complete before `b` can start. The graph is built once per planning
/// request and never mutated afterwards.
pub struct TaskGraph {
    graph: DiGraph<Task, ()>,
    /// Index mapping from TaskId to NodeIndex for fast lookups.
    task_index: HashMap<TaskId, NodeIndex>,
}

impl TaskGraph {
    /// Build and validate a graph from a planning request.
    ///
    /// Fails on duplicate identifiers, on dependencies naming a task that is
    /// not part of the request, and on cycles. Nothing is returned on
    /// failure; the build is all-or-nothing.
    pub fn build(tasks: Vec<Task>) -> Result<Self> {
        let mut graph = DiGraph::with_capacity(tasks.len(), tasks.len());
        let mut task_index = HashMap::with_capacity(tasks.len());

        for task in tasks {
            if task_index.contains_key(&task.id) {
                return Err(Error::DuplicateTask(task.id));
            }
            let id = task.id.clone();
            let index = graph.add_node(task);
            task_index.insert(id, index);
        }

        let mut edges = Vec::new();
        for index in graph.node_indices() {
            let task = &graph[index];
            for dep in &task.dependencies {
                let dep_index = task_index.get(dep).ok_or_else(|| Error::UnknownDependency {
                    task: task.id.clone(),
                    dependency: dep.clone(),
                })?;
                edges.push((*dep_index, index));
            }
        }
        for (from, to) in edges {
            graph.add_edge(from, to, ());
        }

        let dag = Self { graph, task_index };
        dag.detect_cycles()?;
        tracing::debug!(
            tasks = dag.task_count(),
            dependencies = dag.dependency_count(),
            "task graph built"
        );
        Ok(dag)
    }

    /// Depth-first search along "depends on" links from every task in
    /// request order. Reaching a task that is still on the DFS stack is a
    /// back edge, which names the cycle's closing dependency.
    fn detect_cycles(&self) -> Result<()> {
        let depends_on = Reversed(&self.graph);
        let back_edge = depth_first_search(depends_on, self.graph.node_indices(), |event| {
            if let DfsEvent::BackEdge(task, dependency) = event {
                return Control::Break((task, dependency));
            }
            Control::Continue
        })
        .break_value();

        match back_edge {
            Some((task, dependency)) => Err(Error::CyclicDependency {
                task: self.graph[task].id.clone(),
                depends_on: self.graph[dependency].id.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Get a reference to a task by its ID.
    pub fn get_task(&self, id: &TaskId) -> Option<&Task> {
        self.task_index
            .get(id)
            .and_then(|&index| self.graph.node_weight(index))
    }

    /// Get the NodeIndex for a task by its ID.
    pub fn get_node_index(&self, id: &TaskId) -> Option<NodeIndex> {
        self.task_index.get(id).copied()
    }

    /// Check if the graph contains a task.
    pub fn contains_task(&self, id: &TaskId) -> bool {
        self.task_index.contains_key(id)
    }

    pub fn task_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of dependency edges.
    pub fn dependency_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// All tasks, in the order of the planning request.
    pub fn tasks(&self) -> impl Iterator<Item = &Task> + '_ {
        self.graph.node_weights()
    }

    /// Get tasks in topological order (every task after its dependencies).
    pub fn topological_order(&self) -> Result<Vec<&Task>> {
        let sorted = toposort(&self.graph, None).map_err(|cycle| {
            let id = self.graph[cycle.node_id()].id.clone();
            Error::CyclicDependency {
                task: id.clone(),
                depends_on: id,
            }
        })?;

        Ok(sorted
            .into_iter()
            .filter_map(|index| self.graph.node_weight(index))
            .collect())
    }

    /// Get the underlying graph for advanced operations.
    pub fn graph(&self) -> &DiGraph<Task, ()> {
        &self.graph
    }

    /// Consume the graph and return the tasks in request order.
    pub fn into_tasks(self) -> Vec<Task> {
        let (nodes, _) = self.graph.into_nodes_edges();
        nodes.into_iter().map(|node| node.weight).collect()
    }
}

impl std::fmt::Debug for TaskGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskGraph")
            .field("tasks", &self.task_count())
            .field("dependencies", &self.dependency_count())
            .finish()
    }
}
