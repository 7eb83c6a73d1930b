//! CLI for the Slate director.
//!
//! `slate chat` runs an interactive brief-collection session; the other
//! subcommands drive single operations and print JSON.

use crate::config::AppConfig;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use slate_core::{DirectorOrchestrator, Library, SessionStore};
use slate_gen::TemplateGenerator;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

/// Slate Director CLI
#[derive(Parser, Debug)]
#[command(name = "slate")]
#[command(about = "Conversational director for short-form video briefs")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Interactive brief-collection conversation (default)
    Chat {
        /// Resume a session by id or client token
        #[arg(long)]
        session: Option<String>,
    },
    /// Send one message and print the turn response as JSON
    Say {
        /// Message text
        text: String,
        /// Session id or client token
        #[arg(long)]
        session: Option<String>,
    },
    /// Commit a ready brief and print the creative options
    Commit {
        /// Session id or client token
        session: String,
    },
    /// Build a shot blueprint from a session's current slots
    Blueprint {
        /// Session id
        session: Uuid,
    },
    /// Build a storyboard for a chosen creative option
    Select {
        /// Project id from a committed brief
        project: Uuid,
        /// Option index (0-based)
        index: usize,
        /// Session to advance, if any
        #[arg(long)]
        session: Option<Uuid>,
    },
    /// Archive the current session and start fresh
    Reset {
        /// Session id to archive
        #[arg(long)]
        session: Option<Uuid>,
    },
    /// Print a session's transcript
    Transcript {
        /// Session id
        session: Uuid,
    },
}

async fn build_orchestrator(config: &AppConfig) -> Result<DirectorOrchestrator> {
    let store = SessionStore::from_path(Path::new(&config.database.path))
        .await
        .context("Failed to open session store")?;
    let library = Library::load_or_default(config.library.path.as_deref().map(Path::new))
        .context("Failed to load reference library")?;
    Ok(DirectorOrchestrator::new(
        store,
        Arc::new(TemplateGenerator),
        Arc::new(library),
    ))
}

/// Run the CLI command
pub async fn run(cli: Cli, config: AppConfig) -> Result<()> {
    let orchestrator = build_orchestrator(&config).await?;
    let user = config.director.default_user.clone();

    match cli.command {
        None | Some(Commands::Chat { session: None }) => {
            chat_loop(&orchestrator, &user, None).await
        }
        Some(Commands::Chat { session }) => chat_loop(&orchestrator, &user, session).await,
        Some(Commands::Say { text, session }) => {
            let resp = orchestrator.chat(&user, session.as_deref(), &text).await?;
            println!("{}", serde_json::to_string_pretty(&resp)?);
            Ok(())
        }
        Some(Commands::Commit { session }) => {
            let resp = orchestrator.commit_brief(&user, &session, None).await?;
            println!("{}", serde_json::to_string_pretty(&resp)?);
            Ok(())
        }
        Some(Commands::Blueprint { session }) => {
            let blueprint = orchestrator.blueprint(session).await?;
            println!("{}", serde_json::to_string_pretty(&blueprint)?);
            Ok(())
        }
        Some(Commands::Select {
            project,
            index,
            session,
        }) => {
            let storyboard = orchestrator.select_creative(session, project, index).await?;
            println!("{}", serde_json::to_string_pretty(&storyboard)?);
            Ok(())
        }
        Some(Commands::Reset { session }) => {
            let fresh = orchestrator.reset(&user, session).await?;
            println!("New session: {}", fresh.id);
            Ok(())
        }
        Some(Commands::Transcript { session }) => {
            let messages = orchestrator
                .transcript(session, config.director.transcript_limit)
                .await?;
            for message in messages {
                println!("[{}] {}", message.role, message.content);
            }
            Ok(())
        }
    }
}

async fn chat_loop(
    orchestrator: &DirectorOrchestrator,
    user: &str,
    session: Option<String>,
) -> Result<()> {
    println!("Slate director. Describe the video you want; 'exit' to quit.");
    let mut token = session;
    let stdin = std::io::stdin();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let mut line = String::new();
        if stdin.read_line(&mut line)? == 0 {
            break;
        }
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        if text.eq_ignore_ascii_case("exit") || text.eq_ignore_ascii_case("quit") {
            break;
        }

        let resp = orchestrator.chat(user, token.as_deref(), text).await?;
        token = Some(resp.session_id.to_string());

        println!("\n{}\n", resp.message);
        if !resp.recommendation.is_empty() {
            println!("  ({})", resp.recommendation);
        }
        if !resp.quick_replies.is_empty() {
            println!("  Suggestions: {}", resp.quick_replies.join(" | "));
        }
        if let Some(blueprint) = &resp.blueprint {
            println!("{}", serde_json::to_string_pretty(blueprint)?);
        }
        println!();
    }
    Ok(())
}
