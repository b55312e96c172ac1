use chrono::Local;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table},
    Frame,
};

use crate::buckets::Bucket;
use crate::models::Priority;
use super::app::{App, DisplayItem, InputField, InputMode, ViewMode};

fn bucket_color(bucket: Bucket) -> Color {
    match bucket {
        Bucket::Overdue => Color::Red,
        Bucket::DueToday => Color::Yellow,
        Bucket::Upcoming => Color::Green,
        Bucket::Completed => Color::DarkGray,
    }
}

/// Parses `#RRGGBB` into a terminal color.
fn swatch(token: &str) -> Color {
    let hex = token.trim_start_matches('#');
    if hex.len() == 6 {
        if let Ok(v) = u32::from_str_radix(hex, 16) {
            return Color::Rgb((v >> 16) as u8, (v >> 8) as u8, v as u8);
        }
    }
    Color::Reset
}

pub fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),    // Table
            Constraint::Length(3)  // Help
        ].as_ref())
        .split(f.area());

    match app.view_mode {
        ViewMode::Tasks => {
            let mut current = Bucket::Overdue;
            let rows: Vec<Row> = app
                .display_items
                .iter()
                .map(|item| match item {
                    DisplayItem::BucketHeader(bucket, count) => {
                        current = *bucket;
                        Row::new(vec![
                            Cell::from(""),
                            Cell::from(format!("{} ({})", bucket.title(), count)),
                        ])
                        .style(Style::default().fg(bucket_color(*bucket)).add_modifier(Modifier::BOLD))
                    }
                    DisplayItem::Task(t) => {
                        let due = t.due_date.with_timezone(&Local);
                        let when = if current == Bucket::DueToday {
                            due.format("%H:%M").to_string()
                        } else {
                            due.format("%Y-%m-%d %H:%M").to_string()
                        };
                        let priority_style = match t.priority {
                            Priority::Normal => Style::default(),
                            Priority::Important => Style::default().fg(Color::LightRed),
                            Priority::Urgent => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                        };
                        Row::new(vec![
                            Cell::from(t.short_id()),
                            Cell::from(t.title.clone()),
                            Cell::from(when).style(Style::default().fg(bucket_color(current))),
                            Cell::from(t.priority.to_string()).style(priority_style),
                            Cell::from(app.category_name(t).to_string()),
                            Cell::from(t.repeat.to_string()),
                        ])
                    }
                })
                .collect();

            let widths = [
                Constraint::Length(9),
                Constraint::Min(20),
                Constraint::Length(17),
                Constraint::Length(10),
                Constraint::Length(12),
                Constraint::Length(8),
            ];

            let title = format!("Remindust - Tasks [{}]", app.filter_name());
            let table = Table::new(rows, widths)
                .header(Row::new(vec!["ID", "Title", "Due", "Priority", "Category", "Repeat"])
                    .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
                    .bottom_margin(1))
                .block(Block::default().borders(Borders::ALL).title(title))
                .row_highlight_style(Style::default().add_modifier(Modifier::BOLD).bg(Color::DarkGray))
                .highlight_symbol(">> ");

            f.render_stateful_widget(table, chunks[0], &mut app.state);
        }
        ViewMode::Categories => {
            let rows: Vec<Row> = app
                .categories
                .iter()
                .map(|c| {
                    Row::new(vec![
                        Cell::from("●").style(Style::default().fg(swatch(&c.color))),
                        Cell::from(c.name.clone()),
                        Cell::from(c.color.clone()),
                    ])
                })
                .collect();

            let widths = [
                Constraint::Length(2),
                Constraint::Min(20),
                Constraint::Length(10),
            ];

            let table = Table::new(rows, widths)
                .header(Row::new(vec!["", "Name", "Color"])
                    .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
                    .bottom_margin(1))
                .block(Block::default().borders(Borders::ALL).title("Remindust - Categories"))
                .row_highlight_style(Style::default().add_modifier(Modifier::BOLD).bg(Color::DarkGray))
                .highlight_symbol(">> ");

            f.render_stateful_widget(table, chunks[0], &mut app.category_state);
        }
    }

    let help_text = match (&app.message, &app.input_mode) {
        (Some(msg), InputMode::Normal) => msg.as_str(),
        (_, InputMode::Normal) => match app.view_mode {
            ViewMode::Tasks => "q: Quit | a: Add | e: Title | t: Due | Space: Done | d: Del | c: Toggle Done | f: Filter | v: Categories",
            ViewMode::Categories => "q: Quit | a: Add | d: Del | v: View Tasks",
        },
        (_, InputMode::Editing) => "Enter: Save | Esc: Cancel",
        (_, InputMode::Adding) => "Enter: Next Step | Esc: Cancel",
    };

    let help = Paragraph::new(help_text)
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().borders(Borders::ALL));

    f.render_widget(help, chunks[1]);

    // Render Input Box if needed
    if app.input_mode != InputMode::Normal {
        let area = centered_rect(60, 3, f.area());
        f.render_widget(Clear, area);

        let title = match app.input_mode {
            InputMode::Adding => match app.view_mode {
                ViewMode::Tasks => match app.add_state.step {
                    0 => "Add Task: Enter Title",
                    1 => "Add Task: Enter Due (YYYY-MM-DD HH:MM)",
                    2 => "Add Task: Enter Repeat (none/daily/weekly/monthly)",
                    3 => "Add Task: Enter Priority (normal/important/urgent)",
                    _ => "Add Task",
                },
                ViewMode::Categories => match app.add_state.step {
                    0 => "Add Category: Enter Name",
                    1 => "Add Category: Enter Color (#RRGGBB, optional)",
                    _ => "Add Category",
                },
            },
            InputMode::Editing => match app.input_field {
                InputField::Title => "Edit Title",
                InputField::Due => "Edit Due (YYYY-MM-DD HH:MM)",
                InputField::None => "Edit",
            },
            InputMode::Normal => "",
        };

        let input = Paragraph::new(app.input_buffer.as_str())
            .style(Style::default().fg(Color::Yellow))
            .block(Block::default().borders(Borders::ALL).title(title));

        f.render_widget(input, area);
    }
}

fn centered_rect(percent_x: u16, height: u16, r: Rect) -> Rect {
    let margin = r.height.saturating_sub(height) / 2;
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(margin),
            Constraint::Length(height),
            Constraint::Length(margin),
        ].as_ref())
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ].as_ref())
        .split(popup_layout[1])[1]
}
