use chrono::{DateTime, Duration, FixedOffset};

use remindust::buckets::{bucket_of, classify, group_by_day, Bucket};
use remindust::completion::complete;
use remindust::models::{Task, TaskTemplate};

fn at(s: &str) -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339(s).unwrap()
}

fn task(title: &str, due: &str) -> Task {
    TaskTemplate::new(title, at(due)).instantiate(at(due))
}

fn now() -> DateTime<FixedOffset> {
    at("2024-06-10T15:00:00+00:00")
}

#[test]
fn test_earlier_today_is_due_today_not_overdue() {
    let t = task("Morning run", "2024-06-10T09:00:00+00:00");
    assert_eq!(bucket_of(&t, &now()), Bucket::DueToday);

    let buckets = classify(&[t], &now(), None);
    assert_eq!(buckets.due_today.len(), 1);
    assert!(buckets.overdue.is_empty());
}

#[test]
fn test_yesterday_is_overdue_tomorrow_is_upcoming() {
    let late = task("Late", "2024-06-09T23:59:00+00:00");
    let soon = task("Soon", "2024-06-11T00:01:00+00:00");
    let buckets = classify(&[late.clone(), soon.clone()], &now(), None);
    assert_eq!(buckets.overdue, vec![late]);
    assert_eq!(buckets.upcoming, vec![soon]);
}

#[test]
fn test_later_today_is_due_today() {
    let t = task("Evening", "2024-06-10T23:59:00+00:00");
    assert_eq!(bucket_of(&t, &now()), Bucket::DueToday);
}

#[test]
fn test_completed_wins_over_date() {
    let old = complete(&task("Old", "2020-01-01T00:00:00+00:00"), now());
    let future = complete(&task("Future", "2030-01-01T00:00:00+00:00"), now());
    let buckets = classify(&[old, future], &now(), None);
    assert_eq!(buckets.completed.len(), 2);
    assert_eq!(buckets.len(), 2);
}

#[test]
fn test_calendar_day_uses_now_time_zone() {
    // 22:30 UTC on the 10th is already the 11th at UTC+02:00.
    let now_plus2 = at("2024-06-10T20:00:00+02:00");
    let t = task("Late call", "2024-06-10T22:30:00+00:00");
    assert_eq!(bucket_of(&t, &now_plus2), Bucket::Upcoming);

    // 23:30 UTC on the 9th is 01:30 on the 10th at UTC+02:00.
    let t = task("Early call", "2024-06-09T23:30:00+00:00");
    assert_eq!(bucket_of(&t, &now_plus2), Bucket::DueToday);
}

#[test]
fn test_partition_is_complete_and_stable() {
    let base = at("2024-06-01T08:00:00+00:00");
    let mut tasks: Vec<Task> = (0..40)
        .map(|i| {
            let due = base + Duration::hours(i * 7);
            TaskTemplate::new(format!("t{i}"), due).instantiate(due)
        })
        .collect();
    for t in tasks.iter_mut().step_by(3) {
        *t = complete(t, now());
    }

    let buckets = classify(&tasks, &now(), None);
    assert_eq!(buckets.len(), tasks.len());

    let mut seen: Vec<_> = buckets.sections().flat_map(|(_, ts)| ts.iter().map(|t| t.id)).collect();
    seen.sort();
    let mut expected: Vec<_> = tasks.iter().map(|t| t.id).collect();
    expected.sort();
    assert_eq!(seen, expected);

    // Input order is kept inside each bucket.
    for (_, section) in buckets.sections() {
        let positions: Vec<_> = section
            .iter()
            .map(|s| tasks.iter().position(|t| t.id == s.id).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }
}

#[test]
fn test_category_filter() {
    let mut work = task("Report", "2024-06-10T10:00:00+00:00");
    work.category = Some("work".into());
    let mut home = task("Dishes", "2024-06-12T10:00:00+00:00");
    home.category = Some("home".into());
    let none = task("Misc", "2024-06-01T10:00:00+00:00");
    let tasks = vec![work.clone(), home, none];

    let filtered = classify(&tasks, &now(), Some("work"));
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered.due_today, vec![work]);

    let unfiltered = classify(&tasks, &now(), None);
    assert_eq!(unfiltered.len(), 3);
    assert!(classify(&tasks, &now(), Some("missing")).is_empty());
}

#[test]
fn test_sections_in_display_order() {
    let buckets = classify(&[], &now(), None);
    let order: Vec<_> = buckets.sections().map(|(b, _)| b).collect();
    assert_eq!(order, Bucket::ALL.to_vec());
}

#[test]
fn test_group_by_day() {
    let tasks = vec![
        task("a", "2024-06-10T09:00:00+00:00"),
        task("b", "2024-06-10T18:00:00+00:00"),
        task("c", "2024-06-12T09:00:00+00:00"),
    ];
    let utc = FixedOffset::east_opt(0).unwrap();
    let days = group_by_day(&tasks, &utc);
    assert_eq!(days.len(), 2);
    assert_eq!(days.values().next().unwrap().len(), 2);

    // At UTC+08:00 the 18:00 task moves to the 11th.
    let east = FixedOffset::east_opt(8 * 3600).unwrap();
    assert_eq!(group_by_day(&tasks, &east).len(), 3);
}

#[test]
fn test_complete_sets_date_once() {
    let t = task("Pay rent", "2024-06-01T09:00:00+00:00");
    let first = at("2024-06-01T10:00:00+00:00");
    let done = complete(&t, first);
    assert!(done.completed);
    assert_eq!(done.completed_date, Some(first));
    assert!(!t.completed, "input is left untouched");

    let again = complete(&done, at("2024-06-05T10:00:00+00:00"));
    assert!(again.completed);
    assert_eq!(again.completed_date, Some(first));
}
