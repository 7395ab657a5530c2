//! Storage layer: per-user JSON calculation history.

mod error;
mod history;

pub use error::StoreError;
pub use history::{HistoryEntry, HistoryStore, MAX_ENTRIES_PER_USER};
