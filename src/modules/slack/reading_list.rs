//! Reading list lookups backing the slash command.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use serde::Deserialize;

use super::models::{BookRecord, Completion, UserBooksMap};

/// Queries the bot can run against the reading list.
#[async_trait]
pub trait ReadingList: Send + Sync {
    /// Every user with their completed books.
    async fn users(&self) -> anyhow::Result<UserBooksMap>;

    /// The book `username` completed most recently.
    async fn user_last_book(&self, username: &str) -> anyhow::Result<Option<BookRecord>>;

    /// A random book, optionally restricted to titles or authors containing `filter`.
    async fn random_book(&self, filter: Option<&str>) -> anyhow::Result<Option<BookRecord>>;
}

/// On-disk shape of the reading list seed file.
#[derive(Debug, Deserialize)]
pub struct ReadingListSeed {
    #[serde(default)]
    pub books: Vec<BookRecord>,
    #[serde(default)]
    pub users: BTreeMap<String, Vec<SeedCompletion>>,
}

#[derive(Debug, Deserialize)]
pub struct SeedCompletion {
    pub bookid: String,
    pub completed: DateTime<Utc>,
}

/// Reading list held in memory, loaded once at startup.
#[derive(Debug, Default)]
pub struct InMemoryReadingList {
    books: Vec<BookRecord>,
    users: UserBooksMap,
}

impl InMemoryReadingList {
    pub fn new(books: Vec<BookRecord>, users: UserBooksMap) -> Self {
        Self { books, users }
    }

    /// Resolve seed completions against the seed books.
    pub fn from_seed(seed: ReadingListSeed) -> anyhow::Result<Self> {
        let by_id: HashMap<&str, &BookRecord> = seed
            .books
            .iter()
            .map(|book| (book.bookid.as_str(), book))
            .collect();

        let mut users = UserBooksMap::new();
        for (username, completions) in &seed.users {
            let mut resolved = Vec::with_capacity(completions.len());
            for completion in completions {
                let book = by_id.get(completion.bookid.as_str()).with_context(|| {
                    format!(
                        "user '{}' completed unknown book '{}'",
                        username, completion.bookid
                    )
                })?;
                resolved.push(Completion {
                    completed: completion.completed,
                    book: (*book).clone(),
                });
            }
            users.insert(username.clone(), resolved);
        }

        Ok(Self::new(seed.books, users))
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read reading list seed {}", path.display()))?;
        let seed: ReadingListSeed = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse reading list seed {}", path.display()))?;
        let list = Self::from_seed(seed)?;

        tracing::info!(
            path = %path.display(),
            books = list.books.len(),
            users = list.users.len(),
            "reading list loaded"
        );
        Ok(list)
    }
}

fn matches_filter(book: &BookRecord, needle: &str) -> bool {
    book.title.to_lowercase().contains(needle) || book.authors.to_lowercase().contains(needle)
}

#[async_trait]
impl ReadingList for InMemoryReadingList {
    async fn users(&self) -> anyhow::Result<UserBooksMap> {
        Ok(self.users.clone())
    }

    async fn user_last_book(&self, username: &str) -> anyhow::Result<Option<BookRecord>> {
        Ok(self
            .users
            .get(username)
            .and_then(|completions| completions.iter().max_by_key(|c| c.completed))
            .map(|c| c.book.clone()))
    }

    async fn random_book(&self, filter: Option<&str>) -> anyhow::Result<Option<BookRecord>> {
        let candidates: Vec<&BookRecord> = match filter {
            Some(filter) => {
                let needle = filter.to_lowercase();
                self.books
                    .iter()
                    .filter(|book| matches_filter(book, &needle))
                    .collect()
            }
            None => self.books.iter().collect(),
        };

        Ok(candidates
            .choose(&mut rand::thread_rng())
            .map(|book| (*book).clone()))
    }
}
