use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{Category, Task};
use crate::storage::{load_json, save_json, KvStore, CATEGORIES_KEY};

/// Categories seeded on first run.
pub const DEFAULT_CATEGORIES: [(&str, &str); 5] = [
    ("Work", "#4285F4"),
    ("Personal", "#EA4335"),
    ("Health", "#34A853"),
    ("Shopping", "#FBBC05"),
    ("Studies", "#9C27B0"),
];

/// Color palette offered when creating a category.
pub const PALETTE: [&str; 15] = [
    "#4285F4", "#EA4335", "#34A853", "#FBBC05", "#9C27B0", "#3F51B5", "#03A9F4", "#00BCD4",
    "#009688", "#8BC34A", "#CDDC39", "#FFC107", "#FF9800", "#FF5722", "#795548",
];

/// CRUD over the category list stored under `@task_categories`.
///
/// Names are unique ignoring case. Uniqueness is checked when a category is
/// added or renamed; removing a category never touches tasks referencing it.
pub struct CategoryRegistry<'a> {
    store: &'a dyn KvStore,
}

impl<'a> CategoryRegistry<'a> {
    pub fn new(store: &'a dyn KvStore) -> Self {
        CategoryRegistry { store }
    }

    /// Seeds [`DEFAULT_CATEGORIES`] if no category list has been stored yet.
    pub fn initialize(&self) -> Result<()> {
        if self.store.get(CATEGORIES_KEY)?.is_some() {
            return Ok(());
        }
        let defaults: Vec<Category> = DEFAULT_CATEGORIES
            .iter()
            .map(|(name, color)| Category {
                id: Uuid::new_v4().to_string(),
                name: name.to_string(),
                color: color.to_string(),
            })
            .collect();
        info!(count = defaults.len(), "seeding default categories");
        self.save(&defaults)
    }

    pub fn list(&self) -> Result<Vec<Category>> {
        Ok(load_json(self.store, CATEGORIES_KEY)?.unwrap_or_default())
    }

    pub fn get(&self, id: &str) -> Result<Option<Category>> {
        Ok(self.list()?.into_iter().find(|c| c.id == id))
    }

    /// Finds a category by name, ignoring case.
    pub fn find_by_name(&self, name: &str) -> Result<Option<Category>> {
        let name = name.trim().to_lowercase();
        Ok(self.list()?.into_iter().find(|c| c.name.to_lowercase() == name))
    }

    /// Adds a category. Returns `None` if the name is already taken.
    pub fn add(&self, name: &str, color: &str) -> Result<Option<Category>> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::EmptyCategoryName);
        }
        let mut categories = self.list()?;
        if name_taken(&categories, name, None) {
            debug!(name, "category name already taken");
            return Ok(None);
        }
        let category = Category {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            color: color.to_string(),
        };
        categories.push(category.clone());
        self.save(&categories)?;
        info!(id = %category.id, name, "category added");
        Ok(Some(category))
    }

    /// Renames and recolors a category.
    ///
    /// Returns `false` if `id` is unknown or `name` collides with another category.
    pub fn update(&self, id: &str, name: &str, color: &str) -> Result<bool> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::EmptyCategoryName);
        }
        let mut categories = self.list()?;
        if name_taken(&categories, name, Some(id)) {
            debug!(id, name, "category name already taken");
            return Ok(false);
        }
        match categories.iter_mut().find(|c| c.id == id) {
            Some(c) => {
                c.name = name.to_string();
                c.color = color.to_string();
            }
            None => return Ok(false),
        }
        self.save(&categories)?;
        info!(id, name, "category updated");
        Ok(true)
    }

    /// Removes a category. Returns `false` if `id` is unknown.
    pub fn remove(&self, id: &str) -> Result<bool> {
        let mut categories = self.list()?;
        let len_before = categories.len();
        categories.retain(|c| c.id != id);
        if categories.len() == len_before {
            return Ok(false);
        }
        self.save(&categories)?;
        info!(id, "category removed");
        Ok(true)
    }

    /// Resolves a task's category. A dangling reference yields `None`.
    pub fn category_of(&self, task: &Task) -> Result<Option<Category>> {
        match &task.category {
            Some(id) => self.get(id),
            None => Ok(None),
        }
    }

    fn save(&self, categories: &[Category]) -> Result<()> {
        save_json(self.store, CATEGORIES_KEY, categories)
    }
}

fn name_taken(categories: &[Category], name: &str, except_id: Option<&str>) -> bool {
    let name = name.to_lowercase();
    categories
        .iter()
        .filter(|c| except_id != Some(c.id.as_str()))
        .any(|c| c.name.to_lowercase() == name)
}
