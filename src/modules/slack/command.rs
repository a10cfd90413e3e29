use std::sync::Arc;

use super::models::{BookRecord, UserBooksMap};
use super::reading_list::ReadingList;

pub const HELP_TEXT: &str = concat!(
    "```",
    "/book help          -> print this help message\n",
    "/book               -> get a random book from the reading list\n",
    "/book grep          -> get a random book filtered on \"grep\" (if added)\n",
    "/book user          -> get a list of usernames using the app\n",
    "/book user username -> get the last book \"username\" completed\n",
    "```",
);

/// A parsed `/book` command line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChatCommand {
    Help,
    ListUsers,
    UserLastBook { username: String },
    Random { filter: Option<String> },
}

impl ChatCommand {
    /// Classify by token count and first token only. Reserved words win over
    /// filters: `user` alone lists users and `user <name>` is always a lookup.
    pub fn parse(text: &str) -> Self {
        let tokens: Vec<&str> = text.split_whitespace().collect();

        match tokens.as_slice() {
            ["help"] => ChatCommand::Help,
            ["user"] => ChatCommand::ListUsers,
            [] => ChatCommand::Random { filter: None },
            ["user", username] => ChatCommand::UserLastBook {
                username: (*username).to_owned(),
            },
            _ => ChatCommand::Random {
                filter: Some(tokens.join(" ")),
            },
        }
    }
}

/// What a dispatched command produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CommandOutcome {
    Help,
    Users(UserBooksMap),
    Book(Option<BookRecord>),
}

/// Sends each command to exactly one reading list query.
#[derive(Clone)]
pub struct CommandRouter {
    reading_list: Arc<dyn ReadingList>,
}

impl CommandRouter {
    pub fn new(reading_list: Arc<dyn ReadingList>) -> Self {
        Self { reading_list }
    }

    pub async fn route(&self, command: &ChatCommand) -> anyhow::Result<CommandOutcome> {
        let outcome = match command {
            ChatCommand::Help => CommandOutcome::Help,
            ChatCommand::ListUsers => CommandOutcome::Users(self.reading_list.users().await?),
            ChatCommand::UserLastBook { username } => {
                CommandOutcome::Book(self.reading_list.user_last_book(username).await?)
            }
            ChatCommand::Random { filter } => {
                CommandOutcome::Book(self.reading_list.random_book(filter.as_deref()).await?)
            }
        };
        Ok(outcome)
    }
}
