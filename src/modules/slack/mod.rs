//! `/book` slash command: token check, command routing, chat formatting.

pub mod command;
pub mod message;
pub mod models;
pub mod payload;
pub mod reading_list;

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{rejection::FormRejection, State},
    routing::{get, post},
    Form, Json, Router,
};
use chrono::{NaiveDate, Utc};
use readlist_http::error::{AppError, NOT_FOUND_MESSAGE};
use readlist_kernel::settings::{BotSettings, ReadingListSettings};
use readlist_kernel::{InitCtx, Module};
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::json;
use subtle::ConstantTimeEq;

use crate::utils::title_case;
use command::{ChatCommand, CommandOutcome, CommandRouter, HELP_TEXT};
use payload::ChatPayload;
use reading_list::{InMemoryReadingList, ReadingList};

const NO_MATCH: &str = "No matching book found.";

/// Form fields posted by the chat platform.
#[derive(Debug, Default, Deserialize)]
pub struct CommandForm {
    pub token: Option<String>,
    pub text: Option<String>,
}

#[derive(Clone)]
pub struct SlackState {
    router: CommandRouter,
    bot: Arc<BotSettings>,
}

impl SlackState {
    pub fn new(reading_list: Arc<dyn ReadingList>, bot: BotSettings) -> Self {
        Self {
            router: CommandRouter::new(reading_list),
            bot: Arc::new(bot),
        }
    }

    /// Only an exact match of a configured secret gets past; every other case
    /// looks like a missing route.
    pub fn authenticate(&self, token: Option<&str>) -> Result<(), AppError> {
        let expected = self.bot.verification_token.expose_secret();
        match token {
            Some(token)
                if !expected.is_empty()
                    && bool::from(token.as_bytes().ct_eq(expected.as_bytes())) =>
            {
                Ok(())
            }
            _ => {
                tracing::warn!(
                    token_present = token.is_some(),
                    "slash command rejected"
                );
                Err(AppError::not_found(NOT_FOUND_MESSAGE))
            }
        }
    }

    /// Parse, look up and format one command line.
    pub async fn respond(&self, text: &str, today: NaiveDate) -> anyhow::Result<ChatPayload> {
        let command = ChatCommand::parse(text);
        tracing::debug!(?command, "slash command parsed");

        let headline = self.headline(&command);
        let payload = match self.router.route(&command).await? {
            CommandOutcome::Help => ChatPayload::in_channel(headline, HELP_TEXT),
            CommandOutcome::Users(users) => ChatPayload::in_channel(
                headline,
                message::user_listing(&users, &self.bot.home_url, today),
            ),
            CommandOutcome::Book(Some(book)) => ChatPayload::in_channel(
                format!("{}\n{}{}", headline, self.bot.books_url, book.bookid),
                message::book_message(&book),
            ),
            CommandOutcome::Book(None) => ChatPayload::in_channel(headline, NO_MATCH),
        };
        Ok(payload)
    }

    fn headline(&self, command: &ChatCommand) -> String {
        match command {
            ChatCommand::Help => "Command syntax:".to_string(),
            ChatCommand::ListUsers => format!("{} readers:", self.bot.list_name),
            ChatCommand::UserLastBook { username } => {
                format!("Last book {} read:", title_case(username))
            }
            ChatCommand::Random { filter: None } => {
                "Here is a random title for your reading list:".to_string()
            }
            ChatCommand::Random {
                filter: Some(filter),
            } => format!("Here is a \"{}\" title for your reading list:", filter),
        }
    }
}

pub struct SlackModule {
    state: SlackState,
}

impl SlackModule {
    pub fn new(state: SlackState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Module for SlackModule {
    fn name(&self) -> &'static str {
        "slack"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        if self.state.bot.verification_token.expose_secret().is_empty() {
            tracing::warn!(
                module = self.name(),
                "no verification token configured, every slash command will be rejected"
            );
        }
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            books_url = %self.state.bot.books_url,
            "slack module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/", post(handle_command))
            .route("/health", get(health_check))
            .with_state(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(json!({
            "paths": {
                "/": {
                    "post": {
                        "summary": "Run a /book slash command",
                        "tags": ["Slack"],
                        "requestBody": {
                            "content": {
                                "application/x-www-form-urlencoded": {
                                    "schema": { "$ref": "#/components/schemas/SlashCommand" }
                                }
                            }
                        },
                        "responses": {
                            "200": {
                                "description": "Message posted in channel",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/ChatPayload" }
                                    }
                                }
                            },
                            "404": {
                                "description": "Unknown or unauthenticated request",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                                    }
                                }
                            }
                        }
                    }
                },
                "/health": {
                    "get": {
                        "summary": "Slack module health check",
                        "tags": ["Slack"],
                        "responses": { "200": { "description": "OK" } }
                    }
                }
            },
            "components": {
                "schemas": {
                    "SlashCommand": {
                        "type": "object",
                        "properties": {
                            "token": { "type": "string" },
                            "text": { "type": "string" }
                        },
                        "required": ["token"]
                    },
                    "ChatPayload": {
                        "type": "object",
                        "properties": {
                            "response_type": { "type": "string" },
                            "text": { "type": "string" },
                            "color": { "type": "string" },
                            "image_url": { "type": "string" },
                            "attachments": {
                                "type": "array",
                                "items": {
                                    "type": "object",
                                    "properties": { "text": { "type": "string" } }
                                }
                            }
                        }
                    }
                }
            }
        }))
    }
}

async fn health_check() -> &'static str {
    "slack module is healthy"
}

async fn handle_command(
    State(state): State<SlackState>,
    form: Result<Form<CommandForm>, FormRejection>,
) -> Result<Json<ChatPayload>, AppError> {
    let form = match form {
        Ok(Form(form)) => form,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "unreadable slash command form");
            CommandForm::default()
        }
    };

    state.authenticate(form.token.as_deref())?;

    let text = form.text.unwrap_or_default();
    tracing::info!(text = %text, "slash command received");

    let payload = state.respond(&text, Utc::now().date_naive()).await?;
    Ok(Json(payload))
}

/// Build the slack module with a reading list loaded from the configured seed.
pub fn create_module(
    bot: &BotSettings,
    reading_list: &ReadingListSettings,
) -> anyhow::Result<Arc<dyn Module>> {
    let list = InMemoryReadingList::load(&reading_list.seed_path)?;
    let state = SlackState::new(Arc::new(list), bot.clone());
    Ok(Arc::new(SlackModule::new(state)))
}
