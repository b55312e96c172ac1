use chrono::{DateTime, Duration, FixedOffset};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::Preferences;
use crate::error::Result;
use crate::models::Task;
use crate::storage::{load_json, save_json, KvStore, NOTIFICATIONS_KEY};

pub const REMINDER_TITLE: &str = "Task reminder";

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReminderKind {
    Before,
    After,
}

/// A notification the caller should schedule for a task.
#[derive(Debug, Clone, PartialEq)]
pub struct Reminder {
    pub kind: ReminderKind,
    pub fire_at: DateTime<FixedOffset>,
    pub title: String,
    pub body: String,
}

/// Computes the reminders of `task`: `due - before` and `due + after` minutes.
///
/// Offsets missing on the task fall back to `prefs`. Completed tasks get none.
pub fn plan(task: &Task, prefs: &Preferences) -> Vec<Reminder> {
    if task.completed {
        return Vec::new();
    }
    let before = task.reminder_before.unwrap_or(prefs.reminder_before);
    let after = task.reminder_after.unwrap_or(prefs.reminder_after);
    vec![
        Reminder {
            kind: ReminderKind::Before,
            fire_at: task.due_date - Duration::minutes(i64::from(before)),
            title: REMINDER_TITLE.to_string(),
            body: format!("Task \"{}\" is due in {} minutes!", task.title, before),
        },
        Reminder {
            kind: ReminderKind::After,
            fire_at: task.due_date + Duration::minutes(i64::from(after)),
            title: REMINDER_TITLE.to_string(),
            body: format!("Task \"{}\" was due {} minutes ago.", task.title, after),
        },
    ]
}

/// Opaque handle returned by [`Scheduler::schedule`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct NotificationHandle(pub String);

/// A local notification backend.
pub trait Scheduler {
    fn schedule(
        &mut self,
        task_id: Uuid,
        fire_at: DateTime<FixedOffset>,
        title: &str,
        body: &str,
    ) -> Result<NotificationHandle>;

    /// Cancels every pending notification of `task_id`.
    fn cancel(&mut self, task_id: Uuid) -> Result<()>;
}

/// Cancels the task's pending notifications, then schedules the ones still in the future.
///
/// Must be called after every edit of a task so no stale notification fires.
/// Returns the number of notifications scheduled.
pub fn reschedule(
    scheduler: &mut dyn Scheduler,
    task: &Task,
    prefs: &Preferences,
    now: DateTime<FixedOffset>,
) -> Result<usize> {
    scheduler.cancel(task.id)?;
    let mut scheduled = 0;
    for r in plan(task, prefs).into_iter().filter(|r| r.fire_at > now) {
        scheduler.schedule(task.id, r.fire_at, &r.title, &r.body)?;
        scheduled += 1;
    }
    debug!(task = %task.id, scheduled, "rescheduled reminders");
    Ok(scheduled)
}

/// A notification waiting in the queue.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledNotification {
    pub handle: NotificationHandle,
    pub task_id: Uuid,
    pub fire_at: DateTime<FixedOffset>,
    pub title: String,
    pub body: String,
}

/// Scheduler persisting pending notifications under `@notifications`.
///
/// Nothing fires by itself: the shell polls [`NotificationQueue::take_due`].
pub struct NotificationQueue<'a> {
    store: &'a dyn KvStore,
}

impl<'a> NotificationQueue<'a> {
    pub fn new(store: &'a dyn KvStore) -> Self {
        NotificationQueue { store }
    }

    pub fn pending(&self) -> Result<Vec<ScheduledNotification>> {
        Ok(load_json(self.store, NOTIFICATIONS_KEY)?.unwrap_or_default())
    }

    /// Removes and returns every notification whose fire time is at or before `now`,
    /// earliest first.
    pub fn take_due(&mut self, now: DateTime<FixedOffset>) -> Result<Vec<ScheduledNotification>> {
        let (mut due, rest): (Vec<_>, Vec<_>) =
            self.pending()?.into_iter().partition(|n| n.fire_at <= now);
        if due.is_empty() {
            return Ok(due);
        }
        save_json(self.store, NOTIFICATIONS_KEY, &rest)?;
        due.sort_by_key(|n| n.fire_at);
        info!(count = due.len(), "delivering due notifications");
        Ok(due)
    }

    /// Drops everything queued.
    pub fn clear(&mut self) -> Result<()> {
        self.store.remove(NOTIFICATIONS_KEY)
    }
}

impl Scheduler for NotificationQueue<'_> {
    fn schedule(
        &mut self,
        task_id: Uuid,
        fire_at: DateTime<FixedOffset>,
        title: &str,
        body: &str,
    ) -> Result<NotificationHandle> {
        let mut pending = self.pending()?;
        let handle = NotificationHandle(Uuid::new_v4().to_string());
        pending.push(ScheduledNotification {
            handle: handle.clone(),
            task_id,
            fire_at,
            title: title.to_string(),
            body: body.to_string(),
        });
        save_json(self.store, NOTIFICATIONS_KEY, &pending)?;
        debug!(task = %task_id, %fire_at, "notification scheduled");
        Ok(handle)
    }

    fn cancel(&mut self, task_id: Uuid) -> Result<()> {
        let mut pending = self.pending()?;
        let len_before = pending.len();
        pending.retain(|n| n.task_id != task_id);
        if pending.len() != len_before {
            save_json(self.store, NOTIFICATIONS_KEY, &pending)?;
            debug!(task = %task_id, cancelled = len_before - pending.len(), "notifications cancelled");
        }
        Ok(())
    }
}
