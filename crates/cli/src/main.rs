use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use readlist_app::modules::search::{
    catalog::{GoogleBooksClient, SearchContext},
    SearchState,
};
use readlist_app::modules::slack::{reading_list::InMemoryReadingList, SlackState};
use readlist_kernel::settings::{LogFormat, Settings};

#[derive(Debug, Parser)]
#[command(name = "readlist", version, about = "Reading list book search and chat bot")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP server
    Serve,
    /// Print the effective configuration, secrets redacted
    Config,
    /// Query the book catalog and print the autocomplete snippets
    Search {
        /// Search term
        #[arg(required = true)]
        term: Vec<String>,
    },
    /// Answer a `/book` command from the local reading list and print the payload
    #[command(name = "command")]
    SlashCommand {
        /// Command line, as typed after `/book`
        text: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut settings = Settings::load().with_context(|| "failed to load readlist settings")?;

    // Keep stdout clean for the one-shot commands.
    if !matches!(cli.command, Command::Serve) {
        settings.telemetry.log_format = LogFormat::Pretty;
        settings.telemetry.filter = "warn".to_string();
    }
    readlist_telemetry::init(&settings.telemetry)?;

    match cli.command {
        Command::Serve => readlist_app::run(settings).await,
        Command::Config => {
            println!("{:#?}", settings);
            Ok(())
        }
        Command::Search { term } => {
            let catalog = GoogleBooksClient::new(&settings.search)?;
            let state = SearchState::new(Arc::new(catalog), settings.search.default_thumbnail());
            let body = state
                .query(&term.join(" "), &SearchContext::default())
                .await;
            println!("{}", body);
            Ok(())
        }
        Command::SlashCommand { text } => {
            let list = InMemoryReadingList::load(&settings.reading_list.seed_path)?;
            let state = SlackState::new(Arc::new(list), settings.bot.clone());
            let payload = state
                .respond(&text.join(" "), chrono::Utc::now().date_naive())
                .await?;
            println!("{}", serde_json::to_string_pretty(&payload)?);
            Ok(())
        }
    }
}
