//! Run command - the interactive chat view.

use std::collections::HashMap;

use chrono::Local;
use console::style;
use dialoguer::{Input, Select};
use tracing::warn;

use mc_core::config::{ConfigHandle, DisplayConfig};
use mc_core::error::{McError, McResult};
use mc_models::{CoId, Message, Resolved};
use mc_services::{should_show_auth_overlay, AppRoot};

/// Run the interactive chat.
pub async fn run(
    config: ConfigHandle,
    chat: Option<String>,
    username: Option<String>,
) -> McResult<()> {
    let chat_id = chat.as_deref().map(CoId::parse).transpose()?;
    let mut app = super::compose_app(&config).await?;

    let pb = super::spinner("Connecting...");
    let started = app.start().await;
    pb.finish_and_clear();
    let report = match started {
        Ok(report) => report,
        Err(e) => {
            println!("  {} Startup failed: {e}", style("FAIL").red().bold());
            app.shutdown().await?;
            return Err(e);
        }
    };

    if let Some(user) = report.session.as_ref().and_then(|s| s.user.as_ref()) {
        println!(
            "  {} Launched by {}",
            style("HOST").cyan().bold(),
            user.display_name()
        );
    }
    let summary = report.settle().await;
    if !summary.all_mounted() {
        println!("{}", super::widget_table(&summary));
    }

    let result = chat_loop(&app, chat_id, username).await;
    if let Err(e) = &result {
        app.error_handler().report("chat view", e);
    }
    app.shutdown().await?;
    result
}

async fn chat_loop(app: &AppRoot, chat_id: Option<CoId>, username: Option<String>) -> McResult<()> {
    sign_in(app, username).await?;

    let display = app.config().read().await.display.clone();
    let chats = app.chats().read().await;
    let chat = chats.open_or_create(chat_id.as_ref()).await?;
    println!(
        "  {} Chat {} (reopen with --chat {})",
        style("CHAT").cyan().bold(),
        style(&chat.id).bold(),
        chat.id
    );
    println!("  {}", style("Type a message, /history, /logout or /quit").dim());

    let names = usernames(app).await?;
    for entry in chats.recent(&chat.id, display.history_limit).await? {
        print_entry(&entry, &names, &display);
    }

    loop {
        let line = match Input::<String>::new().with_prompt(">").allow_empty(true).interact_text() {
            Ok(line) => line,
            // Closed stdin or interrupted prompt ends the session.
            Err(_) => break,
        };

        match line.trim() {
            "" => continue,
            "/quit" | "/exit" => break,
            "/history" => {
                let names = usernames(app).await?;
                for entry in chats.history(&chat.id).await? {
                    print_entry(&entry, &names, &display);
                }
            }
            "/logout" => {
                app.auth().write().await.log_out().await?;
                sign_in(app, None).await?;
            }
            _ => match chats.send(&chat.id, &line).await {
                Ok(message) => {
                    let names = usernames(app).await?;
                    print_message(&message, &names, &display);
                }
                Err(e) => {
                    warn!("send failed: {e}");
                    println!("  {} {e}", style("FAIL").red().bold());
                }
            },
        }
    }
    Ok(())
}

/// Show the auth overlay until someone is signed in.
async fn sign_in(app: &AppRoot, username: Option<String>) -> McResult<()> {
    let mut auth = app.auth().write().await;

    if let Some(name) = username {
        let existing = auth.current().existing_users.iter().any(|u| u == name.trim());
        if existing {
            auth.log_in(&name).await?;
        } else {
            auth.sign_up(&name).await?;
        }
    }

    while should_show_auth_overlay(&auth.current()) {
        let state = auth.current();
        let mut choices = vec!["Sign up".to_string()];
        choices.extend(state.existing_users.iter().map(|u| format!("Log in as {u}")));

        let choice = Select::new()
            .with_prompt("Sign in to chat")
            .items(&choices)
            .default(0)
            .interact()
            .map_err(|e| McError::Internal(e.to_string()))?;

        let result = if choice == 0 {
            let name: String = Input::new()
                .with_prompt("Username")
                .interact_text()
                .map_err(|e| McError::Internal(e.to_string()))?;
            auth.sign_up(&name).await
        } else {
            auth.log_in(&state.existing_users[choice - 1]).await
        };
        if let Err(e) = result {
            println!("  {} {e}", style("FAIL").red().bold());
        }
    }

    if let Some(account) = auth.account() {
        println!("  {} Signed in as {}", style("OK").green().bold(), account.username);
    }
    Ok(())
}

/// Account id to username, for rendering authors.
async fn usernames(app: &AppRoot) -> McResult<HashMap<String, String>> {
    let accounts = app.context().provider()?.list_accounts().await?;
    Ok(accounts
        .into_iter()
        .map(|a| (a.id.to_string(), a.username))
        .collect())
}

fn print_entry(entry: &Resolved, names: &HashMap<String, String>, display: &DisplayConfig) {
    match entry {
        Resolved::Loaded(message) => print_message(message, names, display),
        Resolved::Pending(id) => println!("  {}", style(format!("[loading {id}]")).dim()),
    }
}

fn print_message(message: &Message, names: &HashMap<String, String>, display: &DisplayConfig) {
    let author = message
        .author
        .as_ref()
        .and_then(|id| names.get(id))
        .map(String::as_str)
        .unwrap_or("unknown");

    let mut line = String::from("  ");
    if display.show_timestamps {
        let format = if display.use_24hr_format { "%H:%M" } else { "%I:%M %p" };
        let at = message.created_at.with_timezone(&Local).format(format);
        line.push_str(&style(format!("{at} ")).dim().to_string());
    }
    line.push_str(&style(author).bold().to_string());
    line.push_str(": ");
    line.push_str(&message.text);
    println!("{line}");
}
