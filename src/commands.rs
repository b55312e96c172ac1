use std::io::{self, Write};

use chrono::{DateTime, Datelike, FixedOffset, Local, NaiveDate, NaiveDateTime, TimeZone};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};
use tracing::{error, info};

use crate::buckets::{classify, group_by_day, Bucket};
use crate::categories::{CategoryRegistry, PALETTE};
use crate::completion::complete;
use crate::config::Preferences;
use crate::error::{Error, Result};
use crate::models::{Category, Priority, Repeat, Task, TaskTemplate};
use crate::recurrence::expand;
use crate::reminders::{reschedule, NotificationQueue, Scheduler};
use crate::storage::{delete_database, find_task, load_tasks, save_tasks, KvStore};

/// Options for creating a task. Strings are parsed by [`add_tasks`].
#[derive(Debug, Clone, Default)]
pub struct AddArgs {
    pub title: String,
    pub due: String,
    pub description: Option<String>,
    pub address: Option<String>,
    pub repeat: Option<String>,
    pub count: Option<u32>,
    pub before: Option<u32>,
    pub after: Option<u32>,
    pub priority: Option<String>,
    pub category: Option<String>,
}

/// Field changes for an existing task. `None` leaves a field untouched; an
/// empty string clears an optional field.
#[derive(Debug, Clone, Default)]
pub struct EditArgs {
    pub title: Option<String>,
    pub due: Option<String>,
    pub description: Option<String>,
    pub address: Option<String>,
    pub before: Option<u32>,
    pub after: Option<u32>,
    pub priority: Option<String>,
    pub category: Option<String>,
}

/// The current instant in the local time zone.
pub fn now() -> DateTime<FixedOffset> {
    Local::now().fixed_offset()
}

/// Parses a due date entered by the user, interpreted in the local time zone.
///
/// Accepts `YYYY-MM-DD HH:MM`, `YYYY-MM-DDTHH:MM`, a bare `YYYY-MM-DD`
/// (taken as 09:00) or a full RFC 3339 timestamp.
pub fn parse_due(input: &str) -> Result<DateTime<FixedOffset>> {
    let s = input.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt);
    }
    let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(9, 0, 0))
        })
        .ok_or_else(|| Error::InvalidDate(input.to_string()))?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.fixed_offset())
        .ok_or_else(|| Error::InvalidDate(input.to_string()))
}

/// Resolves a category name to its id. An empty name means "no category".
fn resolve_category(store: &dyn KvStore, name: Option<&str>) -> Result<Option<String>> {
    match name.map(str::trim) {
        None | Some("") => Ok(None),
        Some(n) => CategoryRegistry::new(store)
            .find_by_name(n)?
            .map(|c| Some(c.id))
            .ok_or_else(|| Error::CategoryNotFound(n.to_string())),
    }
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn report(err: &Error, silent: bool) {
    error!(%err, "command failed");
    if !silent {
        eprintln!("Error: {}", err);
    }
}

/// Creates a task and, if it repeats, its later occurrences. Schedules their reminders.
pub fn add_tasks(store: &dyn KvStore, args: AddArgs) -> Result<Vec<Task>> {
    let title = args.title.trim().to_string();
    if title.is_empty() {
        return Err(Error::EmptyTitle);
    }
    let prefs = Preferences::load(store)?;
    let repeat = match args.repeat.as_deref() {
        Some(r) => r.parse::<Repeat>()?,
        None => Repeat::None,
    };
    let priority = match args.priority.as_deref() {
        Some(p) => p.parse::<Priority>()?,
        None => Priority::Normal,
    };

    let template = TaskTemplate {
        title,
        description: non_empty(args.description),
        address: non_empty(args.address),
        due_date: parse_due(&args.due)?,
        repeat,
        reminder_before: args.before,
        reminder_after: args.after,
        priority,
        category: resolve_category(store, args.category.as_deref())?,
    };
    let new_tasks = expand(&template, args.count.unwrap_or(prefs.repeat_count), &Local)?;

    let mut tasks = load_tasks(store)?;
    tasks.extend(new_tasks.iter().cloned());
    save_tasks(store, &tasks)?;

    let mut queue = NotificationQueue::new(store);
    let now = now();
    for t in &new_tasks {
        reschedule(&mut queue, t, &prefs, now)?;
    }
    info!(count = new_tasks.len(), "tasks added");
    Ok(new_tasks)
}

/// Adds a new task (and its repetitions) to the database.
pub fn cmd_add(store: &dyn KvStore, args: AddArgs, silent: bool) {
    match add_tasks(store, args) {
        Ok(added) => {
            if !silent {
                if let [only] = added.as_slice() {
                    println!("Task added (id = {})", only.short_id());
                } else {
                    println!("{} tasks added:", added.len());
                    for t in &added {
                        println!("  {}  {}", t.short_id(), t.due_date.format("%Y-%m-%d %H:%M"));
                    }
                }
            }
        }
        Err(e) => report(&e, silent),
    }
}

/// Marks a task as complete and cancels its reminders.
pub fn complete_task(store: &dyn KvStore, id: &str) -> Result<Task> {
    let mut tasks = load_tasks(store)?;
    let idx = find_task(&tasks, id)?;
    tasks[idx] = complete(&tasks[idx], now());
    save_tasks(store, &tasks)?;
    NotificationQueue::new(store).cancel(tasks[idx].id)?;
    info!(task = %tasks[idx].id, "task completed");
    Ok(tasks[idx].clone())
}

/// Marks a task as complete by ID.
pub fn cmd_complete(store: &dyn KvStore, id: &str, silent: bool) {
    match complete_task(store, id) {
        Ok(t) => {
            if !silent {
                println!("Task {} marked as complete.", t.short_id());
            }
        }
        Err(e) => report(&e, silent),
    }
}

/// Removes a task and its pending reminders.
pub fn remove_task(store: &dyn KvStore, id: &str) -> Result<Task> {
    let mut tasks = load_tasks(store)?;
    let idx = find_task(&tasks, id)?;
    let removed = tasks.remove(idx);
    save_tasks(store, &tasks)?;
    NotificationQueue::new(store).cancel(removed.id)?;
    info!(task = %removed.id, "task removed");
    Ok(removed)
}

/// Removes a task from the database by ID.
pub fn cmd_remove(store: &dyn KvStore, id: &str, silent: bool) {
    match remove_task(store, id) {
        Ok(t) => {
            if !silent {
                println!("Task {} removed.", t.short_id());
            }
        }
        Err(e) => report(&e, silent),
    }
}

/// Applies `args` to a task, then cancels and reschedules its reminders.
pub fn edit_task(store: &dyn KvStore, id: &str, args: EditArgs) -> Result<Task> {
    let mut tasks = load_tasks(store)?;
    let idx = find_task(&tasks, id)?;
    let category = match args.category.as_deref() {
        Some(name) => Some(resolve_category(store, Some(name))?),
        None => None,
    };

    let t = &mut tasks[idx];
    if let Some(title) = args.title {
        if title.trim().is_empty() {
            return Err(Error::EmptyTitle);
        }
        t.title = title.trim().to_string();
    }
    if let Some(d) = args.due {
        t.due_date = parse_due(&d)?;
    }
    if let Some(d) = args.description {
        t.description = non_empty(Some(d));
    }
    if let Some(a) = args.address {
        t.address = non_empty(Some(a));
    }
    if let Some(b) = args.before {
        t.reminder_before = Some(b);
    }
    if let Some(a) = args.after {
        t.reminder_after = Some(a);
    }
    if let Some(p) = args.priority {
        t.priority = p.parse()?;
    }
    if let Some(c) = category {
        t.category = c;
    }
    let edited = t.clone();
    save_tasks(store, &tasks)?;

    let prefs = Preferences::load(store)?;
    reschedule(&mut NotificationQueue::new(store), &edited, &prefs, now())?;
    info!(task = %edited.id, "task updated");
    Ok(edited)
}

/// Edits an existing task's details.
pub fn cmd_edit(store: &dyn KvStore, id: &str, args: EditArgs, silent: bool) {
    match edit_task(store, id, args) {
        Ok(t) => {
            if !silent {
                println!("Task {} updated.", t.short_id());
            }
        }
        Err(e) => report(&e, silent),
    }
}

fn priority_color(p: Priority) -> Color {
    match p {
        Priority::Normal => Color::Reset,
        Priority::Important => Color::Yellow,
        Priority::Urgent => Color::Red,
    }
}

fn bucket_color(b: Bucket) -> Color {
    match b {
        Bucket::Overdue => Color::Red,
        Bucket::DueToday => Color::Yellow,
        Bucket::Upcoming => Color::Green,
        Bucket::Completed => Color::Grey,
    }
}

fn category_cell(task: &Task, categories: &[Category]) -> String {
    task.category
        .as_ref()
        .and_then(|id| categories.iter().find(|c| &c.id == id))
        .map(|c| c.name.clone())
        .unwrap_or_default()
}

/// Lists tasks grouped into overdue, today and upcoming sections.
///
/// Completed tasks are only shown when `all` is true. With `category`, only
/// tasks in that category (matched by name, ignoring case) are listed.
pub fn cmd_list(store: &dyn KvStore, category: Option<String>, all: bool) {
    let result = (|| -> Result<()> {
        let tasks = load_tasks(store)?;
        let categories = CategoryRegistry::new(store).list()?;
        let filter = resolve_category(store, category.as_deref())?;
        let buckets = classify(&tasks, &Local::now(), filter.as_deref());

        let visible = buckets
            .sections()
            .filter(|(b, ts)| !ts.is_empty() && (all || *b != Bucket::Completed))
            .collect::<Vec<_>>();
        if visible.is_empty() {
            println!("No tasks found.");
            return Ok(());
        }

        for (bucket, section) in visible {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec![
                    Cell::new("ID").add_attribute(Attribute::Bold),
                    Cell::new("Title").add_attribute(Attribute::Bold),
                    Cell::new("Due").add_attribute(Attribute::Bold),
                    Cell::new("Priority").add_attribute(Attribute::Bold),
                    Cell::new("Category").add_attribute(Attribute::Bold),
                    Cell::new("Repeat").add_attribute(Attribute::Bold),
                ]);
            for t in section {
                let due = match (bucket, t.completed_date) {
                    (Bucket::Completed, Some(done)) => format!("done {}", done.format("%Y-%m-%d")),
                    _ => t.due_date.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string(),
                };
                table.add_row(vec![
                    Cell::new(t.short_id()),
                    Cell::new(&t.title),
                    Cell::new(due).fg(bucket_color(bucket)),
                    Cell::new(t.priority).fg(priority_color(t.priority)),
                    Cell::new(category_cell(t, &categories)),
                    Cell::new(t.repeat),
                ]);
            }
            println!("{} ({})", bucket.title(), section.len());
            println!("{table}");
        }
        Ok(())
    })();
    if let Err(e) = result {
        report(&e, false);
    }
}

/// Shows, day by day, the tasks due in a month (`YYYY-MM`, default: current month).
pub fn cmd_calendar(store: &dyn KvStore, month: Option<String>) {
    let result = (|| -> Result<()> {
        let first = match month.as_deref() {
            Some(m) => NaiveDate::parse_from_str(&format!("{}-01", m.trim()), "%Y-%m-%d")
                .map_err(|_| Error::InvalidDate(m.to_string()))?,
            None => {
                let today = Local::now().date_naive();
                today.with_day(1).unwrap_or(today)
            }
        };
        let tasks = load_tasks(store)?;
        let days = group_by_day(&tasks, &Local);

        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec!["Day", "Pending", "Done", "Tasks"]);
        let mut any = false;
        for (day, day_tasks) in days
            .range(first..)
            .take_while(|(d, _)| d.year() == first.year() && d.month() == first.month())
        {
            any = true;
            let done = day_tasks.iter().filter(|t| t.completed).count();
            let titles = day_tasks
                .iter()
                .map(|t| t.title.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            table.add_row(vec![
                Cell::new(day.format("%a %Y-%m-%d")),
                Cell::new(day_tasks.len() - done),
                Cell::new(done),
                Cell::new(titles),
            ]);
        }
        if any {
            println!("{}", first.format("%B %Y"));
            println!("{table}");
        } else {
            println!("No tasks in {}.", first.format("%B %Y"));
        }
        Ok(())
    })();
    if let Err(e) = result {
        report(&e, false);
    }
}

/// Prints and dequeues every reminder whose time has come.
pub fn cmd_notify(store: &dyn KvStore) {
    match NotificationQueue::new(store).take_due(now()) {
        Ok(due) if due.is_empty() => println!("No reminders due."),
        Ok(due) => {
            for n in due {
                println!("[{}] {}: {}", n.fire_at.format("%Y-%m-%d %H:%M"), n.title, n.body);
            }
        }
        Err(e) => report(&e, false),
    }
}

/// Adds a new category. The color defaults to the first palette entry.
pub fn cmd_category_add(store: &dyn KvStore, name: String, color: Option<String>, silent: bool) {
    let color = color.unwrap_or_else(|| PALETTE[0].to_string());
    match CategoryRegistry::new(store).add(&name, &color) {
        Ok(Some(c)) => {
            if !silent {
                println!("Category '{}' added.", c.name);
            }
        }
        Ok(None) => {
            if !silent {
                eprintln!("A category named '{}' already exists.", name);
            }
        }
        Err(e) => report(&e, silent),
    }
}

/// Lists all categories with the number of tasks referencing each.
pub fn cmd_category_list(store: &dyn KvStore) {
    let result = (|| -> Result<()> {
        let categories = CategoryRegistry::new(store).list()?;
        if categories.is_empty() {
            println!("No categories found.");
            return Ok(());
        }
        let tasks = load_tasks(store)?;
        let mut table = Table::new();
        table.load_preset(UTF8_FULL).set_header(vec!["Name", "Color", "Tasks"]);
        for c in categories {
            let count = tasks.iter().filter(|t| t.category.as_deref() == Some(c.id.as_str())).count();
            table.add_row(vec![Cell::new(&c.name), Cell::new(&c.color), Cell::new(count)]);
        }
        println!("{table}");
        Ok(())
    })();
    if let Err(e) = result {
        report(&e, false);
    }
}

/// Renames and/or recolors a category found by name.
pub fn cmd_category_edit(
    store: &dyn KvStore,
    name: String,
    new_name: Option<String>,
    color: Option<String>,
    silent: bool,
) {
    let registry = CategoryRegistry::new(store);
    let result = registry.find_by_name(&name).and_then(|found| {
        let c = found.ok_or_else(|| Error::CategoryNotFound(name.clone()))?;
        registry.update(
            &c.id,
            new_name.as_deref().unwrap_or(&c.name),
            color.as_deref().unwrap_or(&c.color),
        )
    });
    match result {
        Ok(true) => {
            if !silent {
                println!("Category '{}' updated.", name);
            }
        }
        Ok(false) => {
            if !silent {
                eprintln!("Could not update category '{}': name already in use.", name);
            }
        }
        Err(e) => report(&e, silent),
    }
}

/// Removes the category named `name` (ignoring case). Tasks keep their
/// stale category id.
pub fn remove_category(store: &dyn KvStore, name: &str) -> Result<bool> {
    let registry = CategoryRegistry::new(store);
    let c = registry
        .find_by_name(name)?
        .ok_or_else(|| Error::CategoryNotFound(name.to_string()))?;
    registry.remove(&c.id)
}

pub fn cmd_category_remove(store: &dyn KvStore, name: String, silent: bool) {
    match remove_category(store, &name) {
        Ok(true) => {
            if !silent {
                println!("Category '{}' removed.", name);
            }
        }
        Ok(false) => {
            if !silent {
                eprintln!("Category '{}' was already gone.", name);
            }
        }
        Err(e) => report(&e, silent),
    }
}

pub fn cmd_settings_show(store: &dyn KvStore) {
    match Preferences::load(store) {
        Ok(p) => {
            let mut table = Table::new();
            table.load_preset(UTF8_FULL).set_header(vec!["Setting", "Value"]);
            table.add_row(vec!["Repeat count".to_string(), p.repeat_count.to_string()]);
            table.add_row(vec!["Reminder before (min)".to_string(), p.reminder_before.to_string()]);
            table.add_row(vec!["Reminder after (min)".to_string(), p.reminder_after.to_string()]);
            println!("{table}");
        }
        Err(e) => report(&e, false),
    }
}

pub fn cmd_settings_set(
    store: &dyn KvStore,
    repeat_count: Option<u32>,
    before: Option<u32>,
    after: Option<u32>,
    silent: bool,
) {
    let result = (|| -> Result<()> {
        let mut p = Preferences::load(store)?;
        if let Some(c) = repeat_count {
            if c < 1 {
                return Err(Error::InvalidCount(c));
            }
            p.repeat_count = c;
        }
        if let Some(b) = before {
            p.reminder_before = b;
        }
        if let Some(a) = after {
            p.reminder_after = a;
        }
        p.save(store)
    })();
    match result {
        Ok(()) => {
            if !silent {
                println!("Settings saved.");
            }
        }
        Err(e) => report(&e, silent),
    }
}

/// Resets the database by deleting tasks, categories, settings and reminders.
pub fn cmd_reset(store: &dyn KvStore, force: bool) {
    if !force {
        print!("Are you sure you want to delete all tasks and categories? This cannot be undone. [y/N] ");
        let _ = io::stdout().flush();
        let mut input = String::new();
        if io::stdin().read_line(&mut input).is_err() || input.trim().to_lowercase() != "y" {
            println!("Aborted.");
            return;
        }
    }

    if let Err(e) = delete_database(store) {
        eprintln!("Failed to reset database: {}", e);
    } else {
        println!("Database reset successfully.");
    }
}
