use chrono::{DateTime, Days, Duration, FixedOffset, Months, NaiveDateTime, TimeZone};
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{Repeat, Task, TaskTemplate};

/// Computes the due date of occurrence `index` of a task first due at `base`.
///
/// Occurrence `0` is `base` itself. Later occurrences are offset from `base`
/// (never from the previous occurrence, never from "now") on the wall clock
/// of `tz`, so a repeat keeps its local time of day across DST changes:
/// - **Daily**: `index` calendar days later, same time of day.
/// - **Weekly**: `index * 7` calendar days later.
/// - **Monthly**: `index` months later, same day-of-month and time of day. When
///   the target month is shorter than the original day-of-month, the date is
///   clamped to the last day of that month (Jan 31 -> Feb 29 -> Mar 31).
/// - **None**: only occurrence `0` exists.
///
/// A local time that falls twice resolves to the earlier instant; one skipped
/// by a forward jump moves one hour later.
///
/// Returns `None` when the occurrence does not exist or falls outside the
/// representable date range.
pub fn occurrence<Tz: TimeZone>(
    base: DateTime<FixedOffset>,
    repeat: Repeat,
    index: u32,
    tz: &Tz,
) -> Option<DateTime<FixedOffset>> {
    if index == 0 {
        return Some(base);
    }
    let local = base.with_timezone(tz).naive_local();
    let shifted = match repeat {
        Repeat::None => None,
        Repeat::Daily => local.checked_add_days(Days::new(u64::from(index))),
        Repeat::Weekly => local.checked_add_days(Days::new(u64::from(index) * 7)),
        Repeat::Monthly => local.checked_add_months(Months::new(index)),
    }?;
    resolve_local(tz, shifted)
}

fn resolve_local<Tz: TimeZone>(tz: &Tz, local: NaiveDateTime) -> Option<DateTime<FixedOffset>> {
    let resolved = match tz.from_local_datetime(&local).earliest() {
        Some(dt) => dt,
        // In a DST gap
        None => tz
            .from_local_datetime(&local.checked_add_signed(Duration::hours(1))?)
            .earliest()?,
    };
    Some(resolved.fixed_offset())
}

/// Expands a task template into its concrete occurrences, doing the calendar
/// arithmetic in the time zone `tz`.
///
/// Produces exactly `count` tasks when the template repeats, and exactly one
/// when `repeat` is [`Repeat::None`] regardless of `count`. Every task gets a
/// fresh id; all fields other than `id` and `due_date` are copied verbatim.
///
/// # Errors
/// - [`Error::InvalidCount`] if `count` is zero.
/// - [`Error::DateOutOfRange`] if an occurrence cannot be represented.
///
/// No partial list is returned on error.
pub fn expand<Tz: TimeZone>(template: &TaskTemplate, count: u32, tz: &Tz) -> Result<Vec<Task>> {
    if count < 1 {
        return Err(Error::InvalidCount(count));
    }
    let count = if template.repeat == Repeat::None { 1 } else { count };

    let tasks = (0..count)
        .map(|i| {
            occurrence(template.due_date, template.repeat, i, tz)
                .map(|due| template.instantiate(due))
                .ok_or(Error::DateOutOfRange(i))
        })
        .collect::<Result<Vec<_>>>()?;

    debug!(
        title = %template.title,
        repeat = %template.repeat,
        instances = tasks.len(),
        "expanded task template"
    );
    Ok(tasks)
}
