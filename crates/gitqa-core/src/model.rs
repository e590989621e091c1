use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The five question families the task generator mines a repository for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    BugPatterns,
    TimelineQuestions,
    SystemInteractions,
    PeopleProcess,
    PerformanceEvolution,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::BugPatterns,
        Category::TimelineQuestions,
        Category::SystemInteractions,
        Category::PeopleProcess,
        Category::PerformanceEvolution,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::BugPatterns => "bug_patterns",
            Category::TimelineQuestions => "timeline_questions",
            Category::SystemInteractions => "system_interactions",
            Category::PeopleProcess => "people_process",
            Category::PerformanceEvolution => "performance_evolution",
        }
    }

    /// Most task ids embed the category name; hand-written seed tasks used
    /// `pattern_recognition_` for bug patterns. Other ids carry no category.
    pub fn infer_from_task_id(task_id: &str) -> Option<Category> {
        if let Some(c) = Self::ALL.iter().find(|c| task_id.contains(c.as_str())) {
            return Some(*c);
        }
        if task_id.starts_with("pattern_recognition") {
            return Some(Category::BugPatterns);
        }
        None
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|c| c.as_str() == s)
            .copied()
            .ok_or_else(|| {
                let known: Vec<_> = Self::ALL.iter().map(|c| c.as_str()).collect();
                format!("unknown category '{}' (expected one of: {})", s, known.join(", "))
            })
    }
}

/// A benchmark question. Immutable once loaded into the catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Task {
    pub task_id: String,
    pub prompt: String,
    pub success_criteria: String,
    pub category: Category,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir_name: Option<String>,
}

/// Human-authored ground truth for a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferenceAnswer {
    pub task_id: String,
    pub body: String,
    /// URLs, `#123` issue/PR references and commit hashes, in order of first appearance.
    pub evidence_links: Vec<String>,
}

/// An agent's answer for one evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateAnswer {
    pub task_id: String,
    pub body: String,
}

impl CandidateAnswer {
    pub fn new(task_id: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            body: body.into(),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.body.trim().is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    pub text: String,
    pub provider: String,
    pub model: String,
    #[serde(default)]
    pub meta: serde_json::Value,
}
