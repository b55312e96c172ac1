use chrono::{DateTime, Local};
use ratatui::widgets::TableState;

use crate::buckets::{classify, Bucket};
use crate::categories::{CategoryRegistry, PALETTE};
use crate::commands::{add_tasks, complete_task, edit_task, remove_task, AddArgs, EditArgs};
use crate::error::Result;
use crate::models::{Category, Task};
use crate::storage::{load_tasks, KvStore};

#[derive(PartialEq)]
pub enum InputMode {
    Normal,
    Editing,
    Adding,
}

pub enum ViewMode {
    Tasks,
    Categories,
}

pub enum InputField {
    None,
    Title,
    Due,
}

pub enum DisplayItem {
    Task(Task),
    BucketHeader(Bucket, usize),
}

pub struct App<'a> {
    store: &'a dyn KvStore,
    pub display_items: Vec<DisplayItem>,
    pub categories: Vec<Category>,
    pub state: TableState,
    pub category_state: TableState,
    pub view_mode: ViewMode,
    pub input_mode: InputMode,
    pub input_field: InputField,
    pub input_buffer: String,
    pub target_id: Option<String>,
    pub add_state: AddState,
    pub show_completed: bool,
    /// Category id the task list is restricted to.
    pub category_filter: Option<String>,
    /// Last error or confirmation, shown in the help bar.
    pub message: Option<String>,
}

/// State for the multi-step "Add" wizards.
#[derive(Default)]
pub struct AddState {
    pub title: String,
    pub due: String,
    pub repeat: Option<String>,
    pub step: usize, // tasks: 0 Title, 1 Due, 2 Repeat, 3 Priority; categories: 0 Name, 1 Color
}

impl<'a> App<'a> {
    pub fn new(store: &'a dyn KvStore) -> App<'a> {
        let mut app = App {
            store,
            display_items: Vec::new(),
            categories: Vec::new(),
            state: TableState::default(),
            category_state: TableState::default(),
            view_mode: ViewMode::Tasks,
            input_mode: InputMode::Normal,
            input_field: InputField::None,
            input_buffer: String::new(),
            target_id: None,
            add_state: AddState::default(),
            show_completed: false,
            category_filter: None,
            message: None,
        };
        app.reload();
        app
    }

    pub fn now(&self) -> DateTime<Local> {
        Local::now()
    }

    /// Name of the category a task references, empty if none or dangling.
    pub fn category_name(&self, task: &Task) -> &str {
        task.category
            .as_ref()
            .and_then(|id| self.categories.iter().find(|c| &c.id == id))
            .map(|c| c.name.as_str())
            .unwrap_or("")
    }

    pub fn filter_name(&self) -> &str {
        self.category_filter
            .as_ref()
            .and_then(|id| self.categories.iter().find(|c| &c.id == id))
            .map(|c| c.name.as_str())
            .unwrap_or("All")
    }

    fn check<T>(&mut self, result: Result<T>) -> Option<T> {
        match result {
            Ok(v) => Some(v),
            Err(e) => {
                self.message = Some(e.to_string());
                None
            }
        }
    }

    /// Selects the next item in the current list.
    pub fn next(&mut self) {
        let (len, state) = self.current_list();
        if len == 0 {
            return;
        }
        let i = match state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        state.select(Some(i));
    }

    /// Selects the previous item in the current list.
    pub fn previous(&mut self) {
        let (len, state) = self.current_list();
        if len == 0 {
            return;
        }
        let i = match state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        state.select(Some(i));
    }

    fn current_list(&mut self) -> (usize, &mut TableState) {
        match self.view_mode {
            ViewMode::Tasks => (self.display_items.len(), &mut self.state),
            ViewMode::Categories => (self.categories.len(), &mut self.category_state),
        }
    }

    fn selected_task(&self) -> Option<&Task> {
        match self.state.selected().and_then(|i| self.display_items.get(i)) {
            Some(DisplayItem::Task(t)) => Some(t),
            _ => None,
        }
    }

    /// Marks the currently selected task as complete.
    pub fn complete_selected(&mut self) {
        if let ViewMode::Categories = self.view_mode {
            return;
        }
        if let Some(id) = self.selected_task().map(|t| t.id.to_string()) {
            let result = complete_task(self.store, &id);
            if let Some(t) = self.check(result) {
                self.message = Some(format!("Completed \"{}\"", t.title));
            }
            self.reload();
        }
    }

    /// Deletes the currently selected task or category.
    pub fn delete_selected(&mut self) {
        match self.view_mode {
            ViewMode::Tasks => {
                if let Some(id) = self.selected_task().map(|t| t.id.to_string()) {
                    let result = remove_task(self.store, &id);
                    self.check(result);
                    self.reload();
                }
            }
            ViewMode::Categories => {
                let selected = self.category_state.selected().and_then(|i| self.categories.get(i));
                if let Some(id) = selected.map(|c| c.id.clone()) {
                    if self.category_filter.as_deref() == Some(id.as_str()) {
                        self.category_filter = None;
                    }
                    let result = CategoryRegistry::new(self.store).remove(&id);
                    self.check(result);
                    self.reload();
                }
            }
        }
    }

    /// Reloads tasks and categories from storage and rebuilds the bucketed display list.
    pub fn reload(&mut self) {
        let tasks = load_tasks(self.store);
        let tasks = self.check(tasks).unwrap_or_default();
        let categories = CategoryRegistry::new(self.store).list();
        self.categories = self.check(categories).unwrap_or_default();

        let buckets = classify(&tasks, &self.now(), self.category_filter.as_deref());
        self.display_items.clear();
        for (bucket, section) in buckets.sections() {
            if section.is_empty() || (bucket == Bucket::Completed && !self.show_completed) {
                continue;
            }
            self.display_items.push(DisplayItem::BucketHeader(bucket, section.len()));
            self.display_items
                .extend(section.iter().cloned().map(DisplayItem::Task));
        }

        clamp_selection(&mut self.state, self.display_items.len());
        clamp_selection(&mut self.category_state, self.categories.len());
    }

    /// Toggles the visibility of completed tasks.
    pub fn toggle_completed(&mut self) {
        self.show_completed = !self.show_completed;
        self.reload();
    }

    /// Restricts the task list to the next category, wrapping back to all.
    pub fn cycle_category_filter(&mut self) {
        let pos = self
            .category_filter
            .as_ref()
            .and_then(|id| self.categories.iter().position(|c| &c.id == id));
        self.category_filter = match pos {
            None => self.categories.first().map(|c| c.id.clone()),
            Some(i) => self.categories.get(i + 1).map(|c| c.id.clone()),
        };
        self.reload();
    }

    /// Toggles between Task and Category views.
    pub fn toggle_view(&mut self) {
        self.view_mode = match self.view_mode {
            ViewMode::Tasks => ViewMode::Categories,
            ViewMode::Categories => ViewMode::Tasks,
        };
    }

    /// Initiates the "Add" wizard for the current view.
    pub fn start_add(&mut self) {
        self.input_mode = InputMode::Adding;
        self.add_state = AddState::default();
        self.input_buffer.clear();
        self.message = None;
    }

    /// Initiates editing of a specific field for the selected task.
    pub fn start_edit(&mut self, field: InputField) {
        if let ViewMode::Categories = self.view_mode {
            return;
        }
        let Some(t) = self.selected_task() else { return };
        let (id, buffer) = match field {
            InputField::Title => (t.id.to_string(), t.title.clone()),
            InputField::Due => (
                t.id.to_string(),
                t.due_date.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string(),
            ),
            InputField::None => return,
        };
        self.target_id = Some(id);
        self.input_buffer = buffer;
        self.input_field = field;
        self.input_mode = InputMode::Editing;
        self.message = None;
    }

    /// Handles text input based on the current mode.
    pub fn handle_input(&mut self) {
        match self.input_mode {
            InputMode::Adding => match self.view_mode {
                ViewMode::Tasks => self.handle_task_adding(),
                ViewMode::Categories => self.handle_category_adding(),
            },
            InputMode::Editing => self.handle_editing_input(),
            InputMode::Normal => {}
        }
    }

    fn handle_task_adding(&mut self) {
        let input = std::mem::take(&mut self.input_buffer);
        match self.add_state.step {
            0 => {
                if !input.trim().is_empty() {
                    self.add_state.title = input;
                    self.add_state.step += 1;
                }
            }
            1 => {
                if !input.trim().is_empty() {
                    self.add_state.due = input;
                    self.add_state.step += 1;
                }
            }
            2 => {
                if !input.trim().is_empty() {
                    self.add_state.repeat = Some(input);
                }
                self.add_state.step += 1;
            }
            3 => {
                let args = AddArgs {
                    title: self.add_state.title.clone(),
                    due: self.add_state.due.clone(),
                    repeat: self.add_state.repeat.clone(),
                    priority: Some(input).filter(|p| !p.trim().is_empty()),
                    category: self.category_filter.clone().and_then(|id| {
                        self.categories.iter().find(|c| c.id == id).map(|c| c.name.clone())
                    }),
                    ..AddArgs::default()
                };
                let result = add_tasks(self.store, args);
                if let Some(added) = self.check(result) {
                    self.message = Some(format!("Added {} task(s)", added.len()));
                }
                self.input_mode = InputMode::Normal;
                self.reload();
            }
            _ => {}
        }
    }

    fn handle_category_adding(&mut self) {
        let input = std::mem::take(&mut self.input_buffer);
        match self.add_state.step {
            0 => {
                if !input.trim().is_empty() {
                    self.add_state.title = input;
                    self.add_state.step += 1;
                }
            }
            1 => {
                let color = if input.trim().is_empty() {
                    PALETTE[self.categories.len() % PALETTE.len()].to_string()
                } else {
                    input.trim().to_string()
                };
                let result = CategoryRegistry::new(self.store).add(&self.add_state.title, &color);
                match self.check(result) {
                    Some(Some(c)) => self.message = Some(format!("Category '{}' added", c.name)),
                    Some(None) => {
                        self.message = Some(format!(
                            "A category named '{}' already exists",
                            self.add_state.title
                        ))
                    }
                    None => {}
                }
                self.input_mode = InputMode::Normal;
                self.reload();
            }
            _ => {}
        }
    }

    /// Handles input for the "Edit Task" mode.
    fn handle_editing_input(&mut self) {
        if let Some(id) = self.target_id.take() {
            let input = std::mem::take(&mut self.input_buffer);
            let args = match self.input_field {
                InputField::Title => EditArgs { title: Some(input), ..EditArgs::default() },
                InputField::Due => EditArgs { due: Some(input), ..EditArgs::default() },
                InputField::None => EditArgs::default(),
            };
            let result = edit_task(self.store, &id, args);
            self.check(result);
        }
        self.input_mode = InputMode::Normal;
        self.input_field = InputField::None;
        self.reload();
    }
}

fn clamp_selection(state: &mut TableState, len: usize) {
    if len == 0 {
        state.select(None);
    } else if let Some(i) = state.selected() {
        if i >= len {
            state.select(Some(len - 1));
        }
    } else {
        state.select(Some(0));
    }
}
