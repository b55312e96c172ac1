use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, TimeZone};

use crate::models::Task;

/// One of the four mutually exclusive task classifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    Overdue,
    DueToday,
    Upcoming,
    Completed,
}

impl Bucket {
    pub const ALL: [Bucket; 4] = [
        Bucket::Overdue,
        Bucket::DueToday,
        Bucket::Upcoming,
        Bucket::Completed,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Bucket::Overdue => "Overdue",
            Bucket::DueToday => "Today",
            Bucket::Upcoming => "Upcoming",
            Bucket::Completed => "Completed",
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Tasks partitioned by [`Bucket`]. Each bucket keeps input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Buckets {
    pub overdue: Vec<Task>,
    pub due_today: Vec<Task>,
    pub upcoming: Vec<Task>,
    pub completed: Vec<Task>,
}

impl Buckets {
    pub fn get(&self, bucket: Bucket) -> &[Task] {
        match bucket {
            Bucket::Overdue => &self.overdue,
            Bucket::DueToday => &self.due_today,
            Bucket::Upcoming => &self.upcoming,
            Bucket::Completed => &self.completed,
        }
    }

    /// Sections in display order.
    pub fn sections(&self) -> impl Iterator<Item = (Bucket, &[Task])> {
        Bucket::ALL.into_iter().map(move |b| (b, self.get(b)))
    }

    pub fn len(&self) -> usize {
        self.overdue.len() + self.due_today.len() + self.upcoming.len() + self.completed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Determines the bucket of a single task relative to `now`.
///
/// Completed tasks are always [`Bucket::Completed`]. Otherwise the due date is
/// viewed in `now`'s time zone: falling on the same calendar day as `now`
/// makes it [`Bucket::DueToday`] even if the due time has already passed.
pub fn bucket_of<Tz: TimeZone>(task: &Task, now: &DateTime<Tz>) -> Bucket {
    if task.completed {
        return Bucket::Completed;
    }
    let due_local = task.due_date.with_timezone(&now.timezone());
    if due_local.date_naive() == now.date_naive() {
        Bucket::DueToday
    } else if task.due_date < *now {
        Bucket::Overdue
    } else {
        Bucket::Upcoming
    }
}

/// Partitions `tasks` into overdue, due-today, upcoming and completed.
///
/// With `category` set, only tasks referencing that category id are kept
/// before partitioning. Every kept task lands in exactly one bucket.
pub fn classify<Tz: TimeZone>(tasks: &[Task], now: &DateTime<Tz>, category: Option<&str>) -> Buckets {
    let mut buckets = Buckets::default();
    for task in tasks
        .iter()
        .filter(|t| category.map_or(true, |c| t.category.as_deref() == Some(c)))
    {
        let target = match bucket_of(task, now) {
            Bucket::Overdue => &mut buckets.overdue,
            Bucket::DueToday => &mut buckets.due_today,
            Bucket::Upcoming => &mut buckets.upcoming,
            Bucket::Completed => &mut buckets.completed,
        };
        target.push(task.clone());
    }
    buckets
}

/// Groups tasks by the calendar day they fall due on in `tz`.
pub fn group_by_day<'a, Tz: TimeZone>(tasks: &'a [Task], tz: &Tz) -> BTreeMap<NaiveDate, Vec<&'a Task>> {
    let mut days: BTreeMap<NaiveDate, Vec<&Task>> = BTreeMap::new();
    for t in tasks {
        days.entry(t.due_date.with_timezone(tz).date_naive()).or_default().push(t);
    }
    days
}

