//! User management commands.

use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use crate::http::extractors::auth::{generate_api_key, hash_api_key};
use crate::state::AppState;

/// Create a user and print a freshly generated API key.
///
/// Only the key's hash is stored; the plaintext is shown here once.
pub async fn create_user(
    state: &AppState,
    name: Option<String>,
    email: &str,
    json: bool,
) -> anyhow::Result<()> {
    let user = state.user_service.create_user(name, email).await?;

    let api_key = generate_api_key();
    state
        .user_service
        .register_api_key(user.id, hash_api_key(&api_key), "default")
        .await?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "user": user,
                "api_key": api_key,
            }))?
        );
        return Ok(());
    }

    println!();
    println!(
        "  {} Created user {}",
        style("✓").green().bold(),
        style(&user.email).cyan().bold()
    );
    println!("  {}  {}", style("ID").dim(), user.id);
    println!();
    println!(
        "  {} API key (save this, it won't be shown again):",
        style("🔑").bold()
    );
    println!("  {}", style(&api_key).yellow());
    println!();
    println!(
        "  {}",
        style(format!("export PARLEY_USER={}", user.id)).dim()
    );
    println!();

    Ok(())
}

/// List all users.
pub async fn list_users(state: &AppState, json: bool) -> anyhow::Result<()> {
    let users = state.user_service.list_users().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&users)?);
        return Ok(());
    }

    if users.is_empty() {
        println!();
        println!(
            "  No users yet. Create one with {}",
            style("parley user create --email <email>").cyan()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("ID").fg(Color::White),
        Cell::new("Email").fg(Color::White),
        Cell::new("Name").fg(Color::White),
        Cell::new("Created").fg(Color::White),
    ]);

    for user in &users {
        table.add_row(vec![
            Cell::new(user.id.to_string()).fg(Color::DarkGrey),
            Cell::new(&user.email).fg(Color::Cyan),
            Cell::new(user.name.as_deref().unwrap_or("-")),
            Cell::new(user.created_at.format("%Y-%m-%d").to_string()).fg(Color::DarkGrey),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    println!(
        "  {} user{}",
        style(users.len()).bold(),
        if users.len() == 1 { "" } else { "s" }
    );
    println!();

    Ok(())
}
