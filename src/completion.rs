use chrono::{DateTime, FixedOffset};

use crate::models::Task;

/// Returns a copy of `task` marked as completed at `now`.
///
/// The first completion wins: completing an already-completed task leaves its
/// original `completed_date` untouched.
pub fn complete(task: &Task, now: DateTime<FixedOffset>) -> Task {
    let mut done = task.clone();
    if !done.completed || done.completed_date.is_none() {
        done.completed_date = Some(now);
    }
    done.completed = true;
    done
}
