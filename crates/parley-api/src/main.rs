//! Parley CLI and REST API entry point.
//!
//! Binary name: `parley`
//!
//! Parses CLI arguments, initializes tracing, the database and services,
//! then dispatches to a command handler or starts the REST API server.

mod cli;
mod http;
mod state;

use clap::Parser;
use clap_complete::generate;
use parley_observe::tracing_setup::{directive_for, init_tracing, shutdown_tracing};

use cli::{Cli, Commands, ConversationCommand, UserCommand};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Err(e) = init_tracing(cli.otel, directive_for(cli.verbose, cli.quiet)) {
        eprintln!("Warning: failed to initialize tracing: {e}");
    }

    // Shell completions don't need app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "parley", &mut std::io::stdout());
        return Ok(());
    }

    let state = AppState::init().await?;
    let result = run(cli, &state).await;

    state.db_pool.close().await;
    shutdown_tracing();
    result
}

async fn run(cli: Cli, state: &AppState) -> anyhow::Result<()> {
    let json = cli.json;

    match cli.command {
        Commands::Serve { port, host } => serve(state, host, port).await?,

        Commands::User { action } => match action {
            UserCommand::Create { name, email } => {
                cli::user::create_user(state, name, &email, json).await?;
            }
            UserCommand::List => cli::user::list_users(state, json).await?,
        },

        Commands::Conversation { action } => match action {
            ConversationCommand::List {
                user,
                limit,
                offset,
            } => {
                cli::conversation::list_conversations(state, user, limit, offset, json).await?;
            }
            ConversationCommand::Show { id, user } => {
                cli::conversation::show_conversation(state, user, id, json).await?;
            }
        },

        Commands::Send {
            user,
            conversation,
            message,
        } => cli::message::send(state, user, conversation, &message, json).await?,

        Commands::Edit {
            user,
            message_id,
            content,
        } => cli::message::edit(state, user, message_id, &content, json).await?,

        Commands::Regenerate { user, message_id } => {
            cli::message::regenerate(state, user, message_id, json).await?;
        }

        Commands::Versions { user, message_id } => {
            cli::message::versions(state, user, message_id, json).await?;
        }

        Commands::Completions { .. } => {}
    }

    Ok(())
}

async fn serve(state: &AppState, host: Option<String>, port: Option<u16>) -> anyhow::Result<()> {
    let host = host.unwrap_or_else(|| state.config.server.host.clone());
    let port = port.unwrap_or(state.config.server.port);
    let addr = format!("{host}:{port}");

    let router = http::router::build_router(state.clone());
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    println!(
        "  {} Parley API listening on {}",
        console::style("⚡").bold(),
        console::style(format!("http://{addr}")).cyan()
    );
    println!(
        "  {} model {}",
        console::style("·").dim(),
        console::style(state.chat_service.gateway().model()).cyan()
    );
    println!(
        "  {} data {}",
        console::style("·").dim(),
        console::style(state.data_dir.display()).dim()
    );
    println!();

    tracing::info!(%addr, "HTTP server started");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    println!("\n  Server stopped.");
    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
