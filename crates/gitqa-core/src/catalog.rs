//! Task catalog: the ordered question list produced by the task generator.

use crate::errors::{EvalError, EvalResult};
use crate::model::{Category, Task};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::warn;

/// File name of the catalog inside a dataset directory.
pub const CATALOG_FILE: &str = "questions.json";

#[derive(Debug, Deserialize)]
struct RawTask {
    task_id: String,
    #[serde(alias = "prompt")]
    task: String,
    #[serde(default)]
    success_criteria: Option<String>,
    #[serde(default)]
    category: Option<Category>,
    #[serde(default)]
    ms: Option<u64>,
    #[serde(default)]
    dir_name: Option<String>,
}

impl RawTask {
    fn into_task(self) -> Result<Task, RejectedTask> {
        let category = match self.category.or_else(|| Category::infer_from_task_id(&self.task_id)) {
            Some(c) => c,
            None => {
                return Err(RejectedTask {
                    task_id: self.task_id,
                    reason: "no category given and none can be inferred from the task id".into(),
                })
            }
        };
        Ok(Task {
            task_id: self.task_id,
            prompt: self.task,
            success_criteria: self.success_criteria.unwrap_or_default(),
            category,
            ms: self.ms,
            dir_name: self.dir_name,
        })
    }
}

/// A catalog entry that cannot be evaluated. It is kept out of the task list
/// but stays addressable, so lookups fail for that task alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedTask {
    pub task_id: String,
    pub reason: String,
}

impl RejectedTask {
    pub fn to_error(&self) -> EvalError {
        EvalError::InvalidTask {
            task_id: self.task_id.clone(),
            message: self.reason.clone(),
        }
    }
}

/// Read-only, ordered set of tasks with unique ids.
#[derive(Debug, Clone, Default)]
pub struct TaskCatalog {
    tasks: Vec<Task>,
    by_id: HashMap<String, usize>,
    rejected: Vec<RejectedTask>,
}

impl TaskCatalog {
    pub fn load(path: &Path) -> EvalResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| EvalError::io(path, e))?;
        Self::from_json_str(&raw).map_err(|e| match e {
            EvalError::Config { message } => {
                EvalError::config(format!("{}: {}", path.display(), message))
            }
            other => other,
        })
    }

    pub fn from_json_str(raw: &str) -> EvalResult<Self> {
        let raw_tasks: Vec<RawTask> = serde_json::from_str(raw)
            .map_err(|e| EvalError::config(format!("failed to parse task catalog: {}", e)))?;

        let mut tasks = Vec::with_capacity(raw_tasks.len());
        let mut rejected = Vec::new();
        for raw in raw_tasks {
            match raw.into_task() {
                Ok(task) => tasks.push(task),
                Err(r) => {
                    warn!(task_id = %r.task_id, reason = %r.reason, "task set aside");
                    rejected.push(r);
                }
            }
        }

        let mut catalog = Self::from_tasks(tasks)?;
        for r in &rejected {
            if catalog.by_id.contains_key(&r.task_id)
                || catalog.rejected.iter().any(|o| o.task_id == r.task_id)
            {
                return Err(EvalError::config(format!(
                    "duplicate task id '{}' in catalog",
                    r.task_id
                )));
            }
            catalog.rejected.push(r.clone());
        }
        Ok(catalog)
    }

    pub fn from_tasks(tasks: Vec<Task>) -> EvalResult<Self> {
        let mut by_id = HashMap::with_capacity(tasks.len());
        for (idx, task) in tasks.iter().enumerate() {
            if by_id.insert(task.task_id.clone(), idx).is_some() {
                return Err(EvalError::config(format!(
                    "duplicate task id '{}' in catalog",
                    task.task_id
                )));
            }
        }
        Ok(Self {
            tasks,
            by_id,
            rejected: Vec::new(),
        })
    }

    pub fn get(&self, task_id: &str) -> EvalResult<&Task> {
        if let Some(&idx) = self.by_id.get(task_id) {
            return Ok(&self.tasks[idx]);
        }
        match self.rejected.iter().find(|r| r.task_id == task_id) {
            Some(r) => Err(r.to_error()),
            None => Err(EvalError::task_not_found(task_id)),
        }
    }

    /// Entries set aside at load time, in file order.
    pub fn rejected(&self) -> &[RejectedTask] {
        &self.rejected
    }

    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter()
    }

    pub fn in_category(&self, category: Category) -> impl Iterator<Item = &Task> {
        self.tasks.iter().filter(move |t| t.category == category)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
