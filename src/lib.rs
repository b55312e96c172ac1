pub mod buckets;
pub mod categories;
pub mod commands;
pub mod completion;
pub mod config;
pub mod error;
pub mod models;
pub mod recurrence;
pub mod reminders;
pub mod storage;
pub mod tui;

pub use error::{Error, Result};
