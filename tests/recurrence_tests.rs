use chrono::{
    DateTime, Duration, FixedOffset, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Utc,
};
use std::collections::HashSet;

use remindust::buckets::{bucket_of, Bucket};
use remindust::models::{Priority, Repeat, Task, TaskTemplate};
use remindust::recurrence::{expand, occurrence};
use remindust::Error;

fn at(s: &str) -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339(s).unwrap()
}

/// Central European time during 2024: UTC+1, and UTC+2 from 2024-03-31 01:00 UTC
/// until 2024-10-27 01:00 UTC.
#[derive(Clone, Copy, Debug)]
struct Cet2024;

fn cet() -> FixedOffset {
    FixedOffset::east_opt(3600).unwrap()
}

fn cest() -> FixedOffset {
    FixedOffset::east_opt(2 * 3600).unwrap()
}

fn utc_at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(h, 0, 0).unwrap()
}

impl TimeZone for Cet2024 {
    type Offset = FixedOffset;

    fn from_offset(_offset: &FixedOffset) -> Self {
        Cet2024
    }

    fn offset_from_local_date(&self, local: &NaiveDate) -> LocalResult<FixedOffset> {
        self.offset_from_local_datetime(&local.and_hms_opt(12, 0, 0).unwrap())
    }

    fn offset_from_local_datetime(&self, local: &NaiveDateTime) -> LocalResult<FixedOffset> {
        let winter = self.offset_from_utc_datetime(&(*local - Duration::hours(1))) == cet();
        let summer = self.offset_from_utc_datetime(&(*local - Duration::hours(2))) == cest();
        match (summer, winter) {
            (true, true) => LocalResult::Ambiguous(cest(), cet()),
            (true, false) => LocalResult::Single(cest()),
            (false, true) => LocalResult::Single(cet()),
            (false, false) => LocalResult::None,
        }
    }

    fn offset_from_utc_date(&self, utc: &NaiveDate) -> FixedOffset {
        self.offset_from_utc_datetime(&utc.and_hms_opt(0, 0, 0).unwrap())
    }

    fn offset_from_utc_datetime(&self, utc: &NaiveDateTime) -> FixedOffset {
        if *utc >= utc_at(2024, 3, 31, 1) && *utc < utc_at(2024, 10, 27, 1) {
            cest()
        } else {
            cet()
        }
    }
}

fn local_dues(tasks: &[Task]) -> Vec<String> {
    tasks
        .iter()
        .map(|t| t.due_date.with_timezone(&Cet2024).format("%Y-%m-%dT%H:%M%:z").to_string())
        .collect()
}

fn template(repeat: Repeat) -> TaskTemplate {
    let mut t = TaskTemplate::new("Water plants", at("2024-01-31T10:00:00+00:00"));
    t.repeat = repeat;
    t.description = Some("Balcony and kitchen".into());
    t.address = Some("Home".into());
    t.reminder_before = Some(15);
    t.reminder_after = Some(60);
    t.priority = Priority::Important;
    t.category = Some("cat-1".into());
    t
}

fn dues(tasks: &[Task]) -> Vec<String> {
    tasks.iter().map(|t| t.due_date.format("%Y-%m-%dT%H:%M").to_string()).collect()
}

#[test]
fn test_daily_expansion() {
    let tasks = expand(&template(Repeat::Daily), 3, &Utc).unwrap();
    assert_eq!(dues(&tasks), vec!["2024-01-31T10:00", "2024-02-01T10:00", "2024-02-02T10:00"]);
}

#[test]
fn test_weekly_expansion() {
    let tasks = expand(&template(Repeat::Weekly), 3, &Utc).unwrap();
    assert_eq!(dues(&tasks), vec!["2024-01-31T10:00", "2024-02-07T10:00", "2024-02-14T10:00"]);
}

#[test]
fn test_monthly_expansion_clamps_to_month_end() {
    let tasks = expand(&template(Repeat::Monthly), 3, &Utc).unwrap();
    // February 2024 has 29 days; March is computed from January, not from February.
    assert_eq!(dues(&tasks), vec!["2024-01-31T10:00", "2024-02-29T10:00", "2024-03-31T10:00"]);
}

#[test]
fn test_monthly_expansion_non_leap_year() {
    let mut t = template(Repeat::Monthly);
    t.due_date = at("2023-01-30T08:30:00-03:00");
    let tasks = expand(&t, 4, &t.due_date.timezone()).unwrap();
    assert_eq!(
        dues(&tasks),
        vec!["2023-01-30T08:30", "2023-02-28T08:30", "2023-03-30T08:30", "2023-04-30T08:30"]
    );
    assert!(tasks.iter().all(|t| t.due_date.offset().local_minus_utc() == -3 * 3600));
}

#[test]
fn test_none_produces_single_instance() {
    let tasks = expand(&template(Repeat::None), 10, &Utc).unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].due_date, at("2024-01-31T10:00:00+00:00"));
}

#[test]
fn test_count_one_with_repeat() {
    let tasks = expand(&template(Repeat::Weekly), 1, &Utc).unwrap();
    assert_eq!(tasks.len(), 1);
}

#[test]
fn test_exact_count_for_repeating_rules() {
    for repeat in [Repeat::Daily, Repeat::Weekly, Repeat::Monthly] {
        for count in [1, 2, 5, 30] {
            assert_eq!(expand(&template(repeat), count, &Utc).unwrap().len(), count as usize);
        }
    }
}

#[test]
fn test_zero_count_is_rejected() {
    let err = expand(&template(Repeat::Daily), 0, &Utc).unwrap_err();
    assert!(matches!(err, Error::InvalidCount(0)));
}

#[test]
fn test_instances_copy_template_fields() {
    let tmpl = template(Repeat::Daily);
    let tasks = expand(&tmpl, 5, &Utc).unwrap();
    for t in &tasks {
        assert_eq!(t.title, tmpl.title);
        assert_eq!(t.description, tmpl.description);
        assert_eq!(t.address, tmpl.address);
        assert_eq!(t.repeat, tmpl.repeat);
        assert_eq!(t.priority, tmpl.priority);
        assert_eq!(t.category, tmpl.category);
        assert_eq!(t.reminder_before, tmpl.reminder_before);
        assert_eq!(t.reminder_after, tmpl.reminder_after);
        assert!(!t.completed);
        assert!(t.completed_date.is_none());
    }
    let ids: HashSet<_> = tasks.iter().map(|t| t.id).collect();
    assert_eq!(ids.len(), tasks.len());
}

#[test]
fn test_occurrence_zero_is_base() {
    let base = at("2024-05-15T12:00:00+02:00");
    assert_eq!(occurrence(base, Repeat::Monthly, 0, &Utc), Some(base));
    assert_eq!(occurrence(base, Repeat::None, 1, &Utc), None);
}

#[test]
fn test_unknown_repeat_is_rejected() {
    let err = "fortnightly".parse::<Repeat>().unwrap_err();
    assert!(matches!(err, Error::UnknownRepeat(ref s) if s == "fortnightly"));
    assert_eq!("Weekly".parse::<Repeat>().unwrap(), Repeat::Weekly);

    let json = r#"{"id":"7f0c6b1e-3f7a-4c39-9a55-2b4b2d0f6a11","title":"x","dueDate":"2024-01-01T00:00:00Z","repeat":"yearly"}"#;
    assert!(serde_json::from_str::<Task>(json).is_err());
}

#[test]
fn test_daily_keeps_wall_clock_across_spring_forward() {
    let mut t = template(Repeat::Daily);
    t.due_date = at("2024-03-30T23:30:00+01:00");
    let tasks = expand(&t, 3, &Cet2024).unwrap();
    assert_eq!(
        local_dues(&tasks),
        vec!["2024-03-30T23:30+01:00", "2024-03-31T23:30+02:00", "2024-04-01T23:30+02:00"]
    );

    // March 31 has its own occurrence.
    let noon = Cet2024.with_ymd_and_hms(2024, 3, 31, 12, 0, 0).unwrap();
    assert_eq!(bucket_of(&tasks[1], &noon), Bucket::DueToday);
    assert_eq!(bucket_of(&tasks[2], &noon), Bucket::Upcoming);
}

#[test]
fn test_weekly_and_monthly_keep_wall_clock_across_dst() {
    let mut t = template(Repeat::Weekly);
    t.due_date = at("2024-03-25T08:00:00+01:00");
    let tasks = expand(&t, 2, &Cet2024).unwrap();
    assert_eq!(local_dues(&tasks), vec!["2024-03-25T08:00+01:00", "2024-04-01T08:00+02:00"]);

    let mut t = template(Repeat::Monthly);
    t.due_date = at("2024-09-27T21:00:00+02:00");
    let tasks = expand(&t, 3, &Cet2024).unwrap();
    assert_eq!(
        local_dues(&tasks),
        vec!["2024-09-27T21:00+02:00", "2024-10-27T21:00+01:00", "2024-11-27T21:00+01:00"]
    );
}

#[test]
fn test_skipped_and_repeated_local_times() {
    // 02:30 does not exist on March 31; the occurrence moves past the gap.
    let base = at("2024-03-30T02:30:00+01:00");
    let next = occurrence(base, Repeat::Daily, 1, &Cet2024).unwrap();
    assert_eq!(next, at("2024-03-31T03:30:00+02:00"));

    // 02:30 happens twice on October 27; the earlier one is taken.
    let base = at("2024-10-26T02:30:00+02:00");
    let next = occurrence(base, Repeat::Daily, 1, &Cet2024).unwrap();
    assert_eq!(next, at("2024-10-27T02:30:00+02:00"));
}
