//! Conversation listing and transcript commands.

use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use parley_types::chat::{Message, MessageRole};
use uuid::Uuid;

use crate::state::AppState;

/// List a user's conversations.
pub async fn list_conversations(
    state: &AppState,
    user_id: Uuid,
    limit: i64,
    offset: i64,
    json: bool,
) -> anyhow::Result<()> {
    let conversations = state
        .chat_service
        .list_conversations(user_id, Some(limit), Some(offset))
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&conversations)?);
        return Ok(());
    }

    if conversations.is_empty() {
        println!();
        println!(
            "  No conversations. Start one with {}",
            style("parley send <message>").cyan()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("ID").fg(Color::White),
        Cell::new("Title").fg(Color::White),
        Cell::new("Updated").fg(Color::White),
    ]);

    for conversation in &conversations {
        table.add_row(vec![
            Cell::new(conversation.id.to_string()).fg(Color::DarkGrey),
            Cell::new(&conversation.title).fg(Color::Cyan),
            Cell::new(conversation.updated_at.format("%Y-%m-%d %H:%M").to_string())
                .fg(Color::DarkGrey),
        ]);
    }

    println!();
    println!("{table}");
    println!();

    Ok(())
}

/// Print a conversation transcript in order.
pub async fn show_conversation(
    state: &AppState,
    user_id: Uuid,
    conversation_id: Uuid,
    json: bool,
) -> anyhow::Result<()> {
    let transcript = state
        .chat_service
        .get_transcript(user_id, conversation_id)
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&transcript)?);
        return Ok(());
    }

    println!();
    println!("  {}", style(&transcript.conversation.title).bold());
    println!(
        "  {}",
        style(format!(
            "{} · {} messages",
            transcript.conversation.id,
            transcript.messages.len()
        ))
        .dim()
    );
    println!();

    for message in &transcript.messages {
        print_message(message);
    }

    Ok(())
}

/// One transcript entry with role, id and edit marker.
pub(crate) fn print_message(message: &Message) {
    let speaker = match message.role {
        MessageRole::User => style("you").green().bold(),
        MessageRole::Assistant => style("ai").magenta().bold(),
    };
    let edited = if message.is_edited {
        format!(" (edited, v{})", message.version_number)
    } else {
        String::new()
    };

    println!(
        "  {} {}{}",
        speaker,
        style(message.id).dim(),
        style(edited).yellow()
    );
    for line in message.content.lines() {
        println!("    {line}");
    }
    println!();
}
