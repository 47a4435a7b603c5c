//! Task data model for planning requests.
//!
//! Tasks are the atomic units of work handed to delivery agents. They are
//! immutable once deserialised; planning only reads them.

use serde::{Deserialize, Serialize};

/// Identifier of a task within one planning request (e.g. `"2.1"`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub String);

impl TaskId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for TaskId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Estimated effort of a task.
///
/// The set is closed: any other tag is a deserialisation error rather than
/// a silent zero-hour task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Effort {
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "4h")]
    FourHours,
    #[serde(rename = "1d")]
    OneDay,
    #[serde(rename = "3d")]
    ThreeDays,
    #[serde(rename = "1w")]
    OneWeek,
    #[serde(rename = "2w")]
    TwoWeeks,
}

impl Effort {
    /// Working hours for this effort bucket (a day is 8h, a week 40h).
    pub const fn hours(self) -> u32 {
        match self {
            Effort::OneHour => 1,
            Effort::FourHours => 4,
            Effort::OneDay => 8,
            Effort::ThreeDays => 24,
            Effort::OneWeek => 40,
            Effort::TwoWeeks => 80,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Effort::OneHour => "1h",
            Effort::FourHours => "4h",
            Effort::OneDay => "1d",
            Effort::ThreeDays => "3d",
            Effort::OneWeek => "1w",
            Effort::TwoWeeks => "2w",
        }
    }
}

impl std::fmt::Display for Effort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Task complexity. Informational only; it does not affect scheduling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Small,
    Medium,
    Large,
    Xlarge,
}

impl std::fmt::Display for Complexity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Complexity::Small => write!(f, "small"),
            Complexity::Medium => write!(f, "medium"),
            Complexity::Large => write!(f, "large"),
            Complexity::Xlarge => write!(f, "xlarge"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Priority {
    #[serde(rename = "P0-Critical")]
    Critical,
    #[serde(rename = "P1-High")]
    High,
    #[serde(rename = "P2-Medium")]
    Medium,
    #[serde(rename = "P3-Low")]
    Low,
}

/// Kind of delivery agent expected to execute a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentKind {
    Coordinator,
    Codegen,
    Review,
    Pr,
    Test,
    Deployment,
}

impl std::fmt::Display for AgentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgentKind::Coordinator => write!(f, "coordinator"),
            AgentKind::Codegen => write!(f, "codegen"),
            AgentKind::Review => write!(f, "review"),
            AgentKind::Pr => write!(f, "pr"),
            AgentKind::Test => write!(f, "test"),
            AgentKind::Deployment => write!(f, "deployment"),
        }
    }
}

/// A single unit of work in a planning request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Identifiers of tasks that must finish first. Order is irrelevant.
    #[serde(default)]
    pub dependencies: Vec<TaskId>,
    pub complexity: Complexity,
    pub effort: Effort,
    pub priority: Priority,
    pub agent: AgentKind,
    #[serde(default)]
    pub acceptance_criteria: Vec<String>,
}

impl Task {
    /// Create a task with medium complexity, P2 priority and the codegen agent.
    ///
    /// Use the `with_*` builders to adjust the remaining fields.
    pub fn new(id: impl Into<TaskId>, title: &str, effort: Effort) -> Self {
        Self {
            id: id.into(),
            title: title.to_string(),
            description: String::new(),
            dependencies: Vec::new(),
            complexity: Complexity::Medium,
            effort,
            priority: Priority::Medium,
            agent: AgentKind::Codegen,
            acceptance_criteria: Vec::new(),
        }
    }

    pub fn with_dependencies<I, T>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<TaskId>,
    {
        self.dependencies = deps.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn with_agent(mut self, agent: AgentKind) -> Self {
        self.agent = agent;
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_complexity(mut self, complexity: Complexity) -> Self {
        self.complexity = complexity;
        self
    }

    pub fn with_acceptance_criteria(mut self, criteria: &[&str]) -> Self {
        self.acceptance_criteria = criteria.iter().map(|c| c.to_string()).collect();
        self
    }

    /// Effort of this task in working hours.
    pub fn hours(&self) -> u32 {
        self.effort.hours()
    }
}
