use chrono::{DateTime, FixedOffset};
use uuid::Uuid;

use remindust::completion::complete;
use remindust::config::Preferences;
use remindust::models::{Task, TaskTemplate};
use remindust::reminders::{plan, reschedule, NotificationHandle, NotificationQueue, ReminderKind, Scheduler};
use remindust::storage::MemoryStore;

fn at(s: &str) -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339(s).unwrap()
}

fn task(due: &str) -> Task {
    TaskTemplate::new("Dentist", at(due)).instantiate(at(due))
}

/// Records calls instead of delivering anything.
#[derive(Default)]
struct Recorder {
    scheduled: Vec<(Uuid, DateTime<FixedOffset>)>,
    cancelled: Vec<Uuid>,
}

impl Scheduler for Recorder {
    fn schedule(
        &mut self,
        task_id: Uuid,
        fire_at: DateTime<FixedOffset>,
        _title: &str,
        _body: &str,
    ) -> remindust::Result<NotificationHandle> {
        self.scheduled.push((task_id, fire_at));
        Ok(NotificationHandle(self.scheduled.len().to_string()))
    }

    fn cancel(&mut self, task_id: Uuid) -> remindust::Result<()> {
        self.cancelled.push(task_id);
        Ok(())
    }
}

#[test]
fn test_plan_uses_task_offsets_then_defaults() {
    let prefs = Preferences::default();
    let mut t = task("2024-06-10T10:00:00+00:00");
    t.reminder_before = Some(15);

    let reminders = plan(&t, &prefs);
    assert_eq!(reminders.len(), 2);
    assert_eq!(reminders[0].kind, ReminderKind::Before);
    assert_eq!(reminders[0].fire_at, at("2024-06-10T09:45:00+00:00"));
    assert!(reminders[0].body.contains("15 minutes"));
    assert_eq!(reminders[1].kind, ReminderKind::After);
    assert_eq!(reminders[1].fire_at, at("2024-06-10T10:30:00+00:00"));
}

#[test]
fn test_plan_skips_completed_tasks() {
    let t = complete(&task("2024-06-10T10:00:00+00:00"), at("2024-06-10T08:00:00+00:00"));
    assert!(plan(&t, &Preferences::default()).is_empty());
}

#[test]
fn test_reschedule_cancels_then_schedules_future_only() {
    let t = task("2024-06-10T10:00:00+00:00");
    let mut rec = Recorder::default();

    // Between the two fire times: only the "after" reminder remains.
    let n = reschedule(&mut rec, &t, &Preferences::default(), at("2024-06-10T10:00:00+00:00")).unwrap();
    assert_eq!(n, 1);
    assert_eq!(rec.cancelled, vec![t.id]);
    assert_eq!(rec.scheduled, vec![(t.id, at("2024-06-10T10:30:00+00:00"))]);

    let n = reschedule(&mut rec, &t, &Preferences::default(), at("2024-06-11T00:00:00+00:00")).unwrap();
    assert_eq!(n, 0);
    assert_eq!(rec.cancelled.len(), 2);
}

#[test]
fn test_queue_take_due_and_cancel() {
    let store = MemoryStore::new();
    let mut queue = NotificationQueue::new(&store);
    let prefs = Preferences::default();
    let a = task("2024-06-10T10:00:00+00:00");
    let b = task("2024-06-12T10:00:00+00:00");
    let now = at("2024-06-01T00:00:00+00:00");

    assert_eq!(reschedule(&mut queue, &a, &prefs, now).unwrap(), 2);
    assert_eq!(reschedule(&mut queue, &b, &prefs, now).unwrap(), 2);
    assert_eq!(queue.pending().unwrap().len(), 4);

    // Rescheduling replaces instead of duplicating.
    reschedule(&mut queue, &a, &prefs, now).unwrap();
    assert_eq!(queue.pending().unwrap().len(), 4);

    let due = queue.take_due(at("2024-06-10T10:30:00+00:00")).unwrap();
    assert_eq!(due.len(), 2);
    assert!(due.iter().all(|n| n.task_id == a.id));
    assert!(due[0].fire_at < due[1].fire_at);
    assert_eq!(queue.pending().unwrap().len(), 2);

    queue.cancel(b.id).unwrap();
    assert!(queue.pending().unwrap().is_empty());
    assert!(queue.take_due(at("2030-01-01T00:00:00+00:00")).unwrap().is_empty());
}
