//! Dearly command-line client.

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use dearly::chat::{ChatSession, SendOutcome};
use dearly::config::ClientConfig;
use dearly::diary::export_diary;
use dearly::session::{group_sessions, SessionSummary};
use dearly::state::SessionState;
use dearly::store::{DiaryEntry, DiaryStore, HttpDiaryStore};

#[derive(Parser, Debug)]
#[command(name = "dearly", about = "AI diary companion", version)]
struct Cli {
    /// Path to the config file
    #[arg(long, global = true, env = "DEARLY_CONFIG")]
    config: Option<PathBuf>,

    /// Gateway server base URL
    #[arg(long, global = true, env = "DEARLY_GATEWAY_URL")]
    gateway_url: Option<String>,

    /// Hosted store base URL
    #[arg(long, global = true, env = "DEARLY_STORE_URL")]
    store_url: Option<String>,

    /// Public client key for the hosted store
    #[arg(long, global = true, env = "DEARLY_STORE_API_KEY", hide_env_values = true)]
    store_api_key: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start an interactive chat (the default)
    Chat,
    /// List past sessions
    Sessions,
    /// Start a fresh session
    New,
    /// Switch to an existing session by id
    Select { session_id: String },
    /// Print the current session's diary
    Diary,
    /// Export the current session's diary to a text file
    Export {
        /// Directory to write the export into
        #[arg(long = "out", default_value = ".")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "dearly=debug" } else { "dearly=info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(fmt::layer())
        .init();

    let config = ClientConfig::resolve(
        cli.config.as_deref(),
        cli.gateway_url,
        cli.store_url,
        cli.store_api_key,
    )?;
    debug!(gateway_url = %config.gateway_url, "resolved configuration");

    let store = build_store(&config)?;
    let state_file = SessionState::new(SessionState::default_path()?);

    match cli.command.unwrap_or(Command::Chat) {
        Command::Chat => {
            let mut session = ChatSession::resume(config.gateway_url, store, state_file)?;
            chat_loop(&mut session).await
        }
        Command::Sessions => {
            let sessions = list_sessions(store.as_ref()).await?;
            print_sessions(&sessions);
            Ok(())
        }
        Command::New => {
            let mut session = ChatSession::resume(config.gateway_url, store, state_file)?;
            session.new_session()?;
            println!("Started session {}", session.session_id());
            Ok(())
        }
        Command::Select { session_id } => {
            let mut session = ChatSession::resume(config.gateway_url, store, state_file)?;
            session.select_session(&session_id).await?;
            println!(
                "Switched to session {} ({} messages)",
                session.session_id(),
                session.messages().len()
            );
            Ok(())
        }
        Command::Diary => {
            // An unset session id means there is nothing to fetch.
            let entries = match state_file.load() {
                Some(id) => store
                    .entries_for_session(&id)
                    .await
                    .context("loading diary entries")?,
                None => Vec::new(),
            };
            print_diary(&entries);
            Ok(())
        }
        Command::Export { out } => {
            let entries = match state_file.load() {
                Some(id) => store
                    .entries_for_session(&id)
                    .await
                    .context("loading diary entries")?,
                None => Vec::new(),
            };
            match export_diary(&entries, &out) {
                Ok(path) => {
                    println!("Exported diary to {}", path.display());
                    Ok(())
                }
                Err(err) => {
                    eprintln!("{err}");
                    Ok(())
                }
            }
        }
    }
}

fn build_store(config: &ClientConfig) -> Result<Arc<dyn DiaryStore>> {
    if config.store_url.is_empty() {
        bail!("store_url is not configured; set it in config.toml or pass --store-url");
    }
    Ok(Arc::new(HttpDiaryStore::new(
        config.store_url.clone(),
        config.store_api_key.clone(),
    )))
}

async fn list_sessions(store: &dyn DiaryStore) -> Result<Vec<SessionSummary>> {
    let entries = store.all_entries().await.context("loading diary entries")?;
    Ok(group_sessions(&entries))
}

fn print_sessions(sessions: &[SessionSummary]) {
    if sessions.is_empty() {
        println!("No past sessions.");
        return;
    }
    for (index, session) in sessions.iter().enumerate() {
        println!(
            "{:>3}. {}  {}",
            index + 1,
            session.created_at.with_timezone(&Local).format("%b %-d, %Y"),
            session.preview
        );
    }
}

fn print_diary(entries: &[DiaryEntry]) {
    if entries.is_empty() {
        println!("Your diary is empty");
        println!("Start chatting to create your first entry!");
        return;
    }
    for entry in entries {
        let local = entry.created_at.with_timezone(&Local);
        println!("{}", local.format("%A, %B %-d, %Y %I:%M %p"));
        println!();
        println!("Me: {}", entry.user_message);
        println!();
        println!("AI Companion: {}", entry.ai_response);
        println!();
    }
    let noun = if entries.len() == 1 { "entry" } else { "entries" };
    println!("{} {} in your diary", entries.len(), noun);
}

/// Interactive chat loop. Lines starting with `/` are commands; everything
/// else is sent to the companion.
async fn chat_loop(session: &mut ChatSession) -> Result<()> {
    println!("Dearly. Type /quit to leave, /new for a fresh session,");
    println!("/sessions to browse, /switch <n> to resume, /diary to read back.");
    println!();

    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    // Last listing shown by /sessions, so /switch <n> can refer to it.
    let mut listed: Vec<SessionSummary> = Vec::new();

    loop {
        print!("you> ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();

        match line {
            "" => continue,
            "/quit" => break,
            "/new" => {
                session.new_session()?;
                println!("Started a fresh session.");
            }
            "/sessions" => {
                listed = list_sessions(session.store()).await?;
                print_sessions(&listed);
            }
            "/diary" => {
                let entries = session
                    .store()
                    .entries_for_session(session.session_id())
                    .await
                    .context("loading diary entries")?;
                print_diary(&entries);
            }
            command if command.starts_with("/switch") => {
                match parse_switch(command, &listed) {
                    Some(id) => {
                        session.select_session(&id).await?;
                        println!("Resumed session ({} messages).", session.messages().len());
                    }
                    None => println!("Usage: /sessions, then /switch <n>."),
                }
            }
            command if command.starts_with('/') => {
                println!("Unknown command: {command}");
            }
            text => {
                match session
                    .send_message(text, |token| {
                        print!("{token}");
                        let _ = std::io::stdout().flush();
                    })
                    .await
                {
                    Ok(SendOutcome::Sent(_)) => println!(),
                    Ok(SendOutcome::Rejected) => {}
                    Err(err) => eprintln!("{err}"),
                }
            }
        }
    }

    Ok(())
}

/// Resolve `/switch <n>` against the most recent `/sessions` listing.
fn parse_switch(command: &str, listed: &[SessionSummary]) -> Option<String> {
    let index: usize = command.strip_prefix("/switch")?.trim().parse().ok()?;
    let session = listed.get(index.checked_sub(1)?)?;
    Some(session.session_id.clone())
}
