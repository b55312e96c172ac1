use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;

/// How a task repeats. Governs expansion only; never re-evaluated afterwards.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Repeat {
    #[default]
    None,
    Daily,
    Weekly,
    Monthly,
}

impl FromStr for Repeat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" => Ok(Repeat::None),
            "daily" => Ok(Repeat::Daily),
            "weekly" => Ok(Repeat::Weekly),
            "monthly" => Ok(Repeat::Monthly),
            _ => Err(Error::UnknownRepeat(s.to_string())),
        }
    }
}

impl fmt::Display for Repeat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Repeat::None => "none",
            Repeat::Daily => "daily",
            Repeat::Weekly => "weekly",
            Repeat::Monthly => "monthly",
        };
        f.write_str(s)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[default]
    Normal,
    Important,
    Urgent,
}

impl FromStr for Priority {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "normal" => Ok(Priority::Normal),
            "important" => Ok(Priority::Important),
            "urgent" => Ok(Priority::Urgent),
            _ => Err(Error::UnknownPriority(s.to_string())),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Priority::Normal => "normal",
            Priority::Important => "important",
            Priority::Urgent => "urgent",
        };
        f.write_str(s)
    }
}

/// A single task as persisted under the `@tasks` key.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique identifier, never reused.
    pub id: Uuid,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Due instant, kept with the UTC offset it was entered in.
    pub due_date: DateTime<FixedOffset>,
    #[serde(default)]
    pub repeat: Repeat,
    #[serde(default)]
    pub completed: bool,
    /// Set once, on the first transition to completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_date: Option<DateTime<FixedOffset>>,
    /// Minutes before the due date to remind. Falls back to the preference default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder_before: Option<u32>,
    /// Minutes after the due date to remind. Falls back to the preference default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder_after: Option<u32>,
    #[serde(default)]
    pub priority: Priority,
    /// Category id. May dangle if the category was deleted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl Task {
    /// Short form of the id shown in tables.
    pub fn short_id(&self) -> String {
        self.id.simple().to_string()[..8].to_string()
    }
}

/// Everything needed to create a task; the first occurrence of a recurring task.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskTemplate {
    pub title: String,
    pub description: Option<String>,
    pub address: Option<String>,
    pub due_date: DateTime<FixedOffset>,
    pub repeat: Repeat,
    pub reminder_before: Option<u32>,
    pub reminder_after: Option<u32>,
    pub priority: Priority,
    pub category: Option<String>,
}

impl TaskTemplate {
    pub fn new(title: impl Into<String>, due_date: DateTime<FixedOffset>) -> Self {
        TaskTemplate {
            title: title.into(),
            description: None,
            address: None,
            due_date,
            repeat: Repeat::None,
            reminder_before: None,
            reminder_after: None,
            priority: Priority::Normal,
            category: None,
        }
    }

    /// Builds a fresh, incomplete task from this template with the given due date.
    pub fn instantiate(&self, due_date: DateTime<FixedOffset>) -> Task {
        Task {
            id: Uuid::new_v4(),
            title: self.title.clone(),
            description: self.description.clone(),
            address: self.address.clone(),
            due_date,
            repeat: self.repeat,
            completed: false,
            completed_date: None,
            reminder_before: self.reminder_before,
            reminder_after: self.reminder_after,
            priority: self.priority,
            category: self.category.clone(),
        }
    }
}

/// A user-defined task category, persisted under `@task_categories`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: String,
    pub name: String,
    /// Display color token, e.g. `#4285F4`.
    pub color: String,
}
