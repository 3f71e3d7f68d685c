//! Send, edit, regenerate and version-history commands.

use std::time::Duration;

use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use parley_types::error::ChatError;
use uuid::Uuid;

use super::conversation::print_message;
use super::preview;
use crate::state::AppState;

/// Spinner shown while the gateway works. Hidden for `--json` output.
fn spinner(message: &str, hidden: bool) -> anyhow::Result<ProgressBar> {
    if hidden {
        return Ok(ProgressBar::hidden());
    }
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(80));
    Ok(spinner)
}

/// Tell the user their edit or message survived a failed generation.
fn explain_failure(err: &ChatError, json: bool) {
    if json {
        return;
    }
    if let ChatError::PartialFailure { message, .. } = err {
        eprintln!();
        eprintln!(
            "  {} Message {} was saved, but no reply was generated.",
            style("!").yellow().bold(),
            style(message.id).cyan()
        );
        eprintln!(
            "  {}",
            style(format!("Retry with: parley regenerate {}", message.id)).dim()
        );
        eprintln!();
    }
}

/// Send a message, creating a conversation when none is given.
pub async fn send(
    state: &AppState,
    user_id: Uuid,
    conversation_id: Option<Uuid>,
    message: &str,
    json: bool,
) -> anyhow::Result<()> {
    let progress = spinner("Waiting for reply...", json)?;
    let result = state
        .chat_service
        .send_message(user_id, conversation_id, message)
        .await;
    progress.finish_and_clear();

    let exchange = result.inspect_err(|e| explain_failure(e, json))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&exchange)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} {}",
        style(&exchange.conversation.title).bold(),
        style(exchange.conversation.id).dim()
    );
    println!();
    print_message(&exchange.user_message);
    print_message(&exchange.reply);

    Ok(())
}

/// Edit a user message and regenerate its reply if there is one.
pub async fn edit(
    state: &AppState,
    user_id: Uuid,
    message_id: Uuid,
    content: &str,
    json: bool,
) -> anyhow::Result<()> {
    let progress = spinner("Editing and regenerating...", json)?;
    let result = state
        .chat_service
        .edit_message(user_id, message_id, content)
        .await;
    progress.finish_and_clear();

    let outcome = result.inspect_err(|e| explain_failure(e, json))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    println!();
    print_message(&outcome.user_message);
    match &outcome.reply {
        Some(reply) => print_message(reply),
        None => println!("  {}\n", style("No reply follows this message.").dim()),
    }

    Ok(())
}

/// Regenerate the reply to a user message.
pub async fn regenerate(
    state: &AppState,
    user_id: Uuid,
    message_id: Uuid,
    json: bool,
) -> anyhow::Result<()> {
    let progress = spinner("Regenerating reply...", json)?;
    let result = state.chat_service.regenerate(user_id, message_id).await;
    progress.finish_and_clear();

    let outcome = result?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    println!();
    print_message(&outcome.user_message);
    print_message(&outcome.reply);

    Ok(())
}

/// Show a message's version history and neighbours.
pub async fn versions(
    state: &AppState,
    user_id: Uuid,
    message_id: Uuid,
    json: bool,
) -> anyhow::Result<()> {
    let view = state
        .chat_service
        .message_versions(user_id, message_id)
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    println!();
    print_message(&view.current_message);

    if view.versions.is_empty() {
        println!("  {}", style("Never edited.").dim());
    } else {
        let mut table = Table::new();
        table.load_preset(presets::UTF8_FULL_CONDENSED);
        table.set_content_arrangement(ContentArrangement::Dynamic);

        table.set_header(vec![
            Cell::new("Version").fg(Color::White),
            Cell::new("Content").fg(Color::White),
            Cell::new("At").fg(Color::White),
        ]);

        for version in &view.versions {
            let label = if version.is_current {
                format!("v{} (current)", version.version)
            } else if version.is_original {
                format!("v{} (original)", version.version)
            } else {
                format!("v{}", version.version)
            };
            table.add_row(vec![
                Cell::new(label).fg(Color::Cyan),
                Cell::new(preview(&version.content, 80)),
                Cell::new(version.timestamp.format("%Y-%m-%d %H:%M").to_string())
                    .fg(Color::DarkGrey),
            ]);
        }

        println!("{table}");
    }

    let nav = &view.navigation;
    println!();
    if let Some(prev) = nav.previous_message_id {
        println!("  {} {}", style("previous").dim(), prev);
    }
    if let Some(next) = nav.next_message_id {
        println!("  {} {}", style("next    ").dim(), next);
    }
    println!();

    Ok(())
}
