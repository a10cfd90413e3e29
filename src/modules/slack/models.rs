use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A book on the reading list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookRecord {
    pub bookid: String,
    pub title: String,
    /// Display string, already joined by the reading list.
    pub authors: String,
    #[serde(default)]
    pub pages: u32,
    /// May carry inline HTML from the catalog.
    #[serde(default)]
    pub description: String,
}

/// A book a user marked as completed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub completed: DateTime<Utc>,
    pub book: BookRecord,
}

/// Username to completed books, ordered by username.
pub type UserBooksMap = BTreeMap<String, Vec<Completion>>;
