use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;

use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Todo {
    pub id: i64,
    pub task: String,
    pub done: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewTodoRequest {
    pub task: Option<String>,
    #[serde(default, deserialize_with = "coerce_bool")]
    pub done: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTodoRequest {
    pub task: Option<String>,
    #[serde(default, deserialize_with = "coerce_bool")]
    pub done: Option<bool>,
}

/// A create request that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTodo {
    pub task: String,
    pub done: bool,
}

/// The fields an update actually touches. At least one is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoChanges {
    pub task: Option<String>,
    pub done: Option<bool>,
}

impl NewTodoRequest {
    pub fn validate(self) -> Result<NewTodo, AppError> {
        let task = self
            .task
            .ok_or_else(|| AppError::BadRequest("Task is required".to_string()))?;

        Ok(NewTodo {
            task: non_empty_task(&task)?,
            done: self.done.unwrap_or(false),
        })
    }
}

impl UpdateTodoRequest {
    pub fn validate(self) -> Result<TodoChanges, AppError> {
        let task = self.task.as_deref().map(non_empty_task).transpose()?;

        if task.is_none() && self.done.is_none() {
            return Err(AppError::BadRequest("No fields to update".to_string()));
        }

        Ok(TodoChanges {
            task,
            done: self.done,
        })
    }
}

fn non_empty_task(task: &str) -> Result<String, AppError> {
    let trimmed = task.trim();
    if trimmed.is_empty() {
        return Err(AppError::BadRequest("Task cannot be empty".to_string()));
    }
    Ok(trimmed.to_string())
}

/// Accepts `true`/`false`, numbers (non-zero is true) and `null`.
fn coerce_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::Bool(b) => Ok(Some(b)),
        serde_json::Value::Number(n) => Ok(Some(n.as_f64().is_some_and(|v| v != 0.0))),
        other => Err(D::Error::custom(format!(
            "done: expected a boolean, got {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_new(json: &str) -> NewTodoRequest {
        serde_json::from_str(json).expect("valid request json")
    }

    fn parse_update(json: &str) -> UpdateTodoRequest {
        serde_json::from_str(json).expect("valid request json")
    }

    #[test]
    fn new_todo_defaults_done_to_false_and_trims_task() {
        let new = parse_new(r#"{"task":"  Buy milk  "}"#).validate().unwrap();
        assert_eq!(new.task, "Buy milk");
        assert!(!new.done);
    }

    #[test]
    fn new_todo_requires_task() {
        let err = parse_new(r#"{"done":true}"#).validate().unwrap_err();
        assert!(matches!(err, AppError::BadRequest(msg) if msg == "Task is required"));

        let err = parse_new(r#"{"task":null}"#).validate().unwrap_err();
        assert!(matches!(err, AppError::BadRequest(msg) if msg == "Task is required"));
    }

    #[test]
    fn whitespace_task_is_rejected() {
        let err = parse_new(r#"{"task":"   "}"#).validate().unwrap_err();
        assert!(matches!(err, AppError::BadRequest(msg) if msg == "Task cannot be empty"));
    }

    #[test]
    fn done_is_coerced_from_numbers() {
        assert_eq!(parse_new(r#"{"task":"a","done":1}"#).done, Some(true));
        assert_eq!(parse_new(r#"{"task":"a","done":0}"#).done, Some(false));
        assert_eq!(parse_new(r#"{"task":"a","done":null}"#).done, None);
    }

    #[test]
    fn done_rejects_strings() {
        let result = serde_json::from_str::<NewTodoRequest>(r#"{"task":"a","done":"yes"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn empty_update_is_rejected() {
        let err = parse_update("{}").validate().unwrap_err();
        assert!(matches!(err, AppError::BadRequest(msg) if msg == "No fields to update"));
    }

    #[test]
    fn update_with_blank_task_is_rejected() {
        let err = parse_update(r#"{"task":" ","done":true}"#)
            .validate()
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(msg) if msg == "Task cannot be empty"));
    }

    #[test]
    fn done_only_update_leaves_task_untouched() {
        let changes = parse_update(r#"{"done":true}"#).validate().unwrap();
        assert_eq!(
            changes,
            TodoChanges {
                task: None,
                done: Some(true)
            }
        );
    }
}
