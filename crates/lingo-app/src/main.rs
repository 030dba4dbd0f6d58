use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use lingo_core::board::SortOrder;
use tracing_subscriber::EnvFilter;

mod commands;
mod controller;
mod events;
mod io;
mod notifier;
mod picker;
mod profile;
mod review_view;
mod state;


use self::state::AppState;

#[derive(Parser)]
#[command(name = "lingo")]
#[command(about = "Capture English vocabulary while reading and review it on schedule")]
#[command(version, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Profile to load from the config directory
    #[arg(long, global = true, default_value = "main")]
    profile: String,

    /// Word store API key, overrides the configured one
    #[arg(long, global = true)]
    account: Option<String>,

    /// Use a throwaway in-memory store
    #[arg(long, global = true)]
    memory: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch the clipboard or WebSocket and capture selections
    Watch,

    /// Capture one selection
    Capture {
        text: String,
        #[arg(long)]
        url: Option<String>,
        #[arg(long)]
        title: Option<String>,
    },

    /// Add a single word
    Add { word: String },

    /// Fetch pronunciation and meanings for a saved word again
    Enrich { word: String },

    /// Show words due today and overdue reviews
    Review,

    /// Mark today's review of a word as done
    Mark {
        word: String,
        /// Remove today's review instead
        #[arg(long)]
        undo: bool,
    },

    /// Set or clear the note on one of a word's sentences
    Note {
        word: String,
        sentence: String,
        /// Markdown text, omit to clear the note
        markdown: Option<String>,
    },

    /// List saved words
    List {
        #[arg(long, default_value = "")]
        query: String,
        /// newest, oldest, alpha or alpha-desc
        #[arg(long, default_value = "newest")]
        sort: SortOrder,
    },

    /// Write every saved word to a JSON file
    Export { path: PathBuf },

    /// Manage profiles
    Profile {
        #[command(subcommand)]
        command: ProfileCommand,
    },
}

#[derive(Subcommand)]
enum ProfileCommand {
    /// Create the main profile from the current environment
    Init,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    if let Commands::Profile {
        command: ProfileCommand::Init,
    } = cli.command
    {
        let path = profile::init_user_config()?;
        println!("Main profile at {}", path.display());
        return Ok(());
    }

    let config = profile::load_user_profile(&cli.profile)?;
    let state = Arc::new(AppState::new(config, cli.account, cli.memory)?);

    match cli.command {
        Commands::Watch => commands::watch(state).await,
        Commands::Capture { text, url, title } => commands::capture(&state, text, url, title).await,
        Commands::Add { word } => commands::add(&state, &word).await,
        Commands::Enrich { word } => commands::enrich(&state, &word).await,
        Commands::Review => commands::review(&state).await,
        Commands::Mark { word, undo } => commands::mark(&state, &word, undo).await,
        Commands::Note {
            word,
            sentence,
            markdown,
        } => commands::note(&state, &word, &sentence, markdown).await,
        Commands::List { query, sort } => commands::list(&state, &query, sort).await,
        Commands::Export { path } => commands::export(&state, &path).await,
        Commands::Profile { .. } => Ok(()),
    }
}
