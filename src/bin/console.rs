//! Line-oriented console shell for the Trove client core.
//!
//! Drives the full navigation/chat stack against a running portal backend,
//! rendering pages as plain text. Useful for poking at a deployment without
//! a browser:
//!
//! ```text
//! nav /items/lost
//! login ada@example.com secret
//! nav /chat
//! open u7
//! send did you find my wallet?
//! ```

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};

use trove_client::chat::ChatView;
use trove_client::shell::PageContent;
use trove_client::types::{ChatMessage, Conversation, Credentials, SignupProfile};
use trove_client::{
    ClientConfig, HttpGateway, Navigator, Notice, Route, Session, SessionStore, Shell,
};

/// Prints every render hook as a line of text.
struct ConsoleSurface;

impl Shell for ConsoleSurface {
    fn show_notice(&self, notice: Notice) {
        println!("[{:?}] {}", notice.level, notice.text);
    }

    fn render_chrome(&self, route: &Route, session: Option<&Session>) {
        let who = session
            .map(|s| s.identity.username.clone())
            .unwrap_or_else(|| "anonymous".to_owned());
        println!("── {} ({who}) ──", route.location());
    }

    fn render_page(&self, content: PageContent) {
        match content {
            PageContent::Login => println!("login form"),
            PageContent::Signup => println!("signup form"),
            PageContent::PostItem(kind) => println!("report form: {}", kind.as_str()),
            PageContent::Dashboard(summary) => {
                println!(
                    "dashboard: {} items total, {} recent lost, {} recent found",
                    summary.total_items,
                    summary.recent_lost.len(),
                    summary.recent_found.len()
                );
            }
            PageContent::Items { page, filter } => {
                println!(
                    "items ({}): {} of {}",
                    filter.as_deref().unwrap_or("all"),
                    page.items.len(),
                    page.total
                );
                for item in &page.items {
                    println!("  [{}] {} — {}", item.item_type.as_str(), item.name, item.location);
                }
            }
            PageContent::ItemDetail { item, matches } => {
                println!("item: {} ({})", item.name, item.item_type.as_str());
                println!("  {}", item.description);
                for candidate in &matches {
                    println!("  match {:.0}%: {}", candidate.score, candidate.item.name);
                }
            }
            PageContent::MyItems(items) => println!("my items: {}", items.len()),
            PageContent::Matches(matches) => {
                for candidate in &matches {
                    println!("match {:.0}%: {}", candidate.score, candidate.item.name);
                }
            }
            PageContent::Claims { received, mine } => {
                println!("claims: {} received, {} mine", received.len(), mine.len());
            }
            PageContent::Profile(identity) => {
                println!("profile: {} ({:?})", identity.username, identity.role);
            }
            PageContent::Admin(overview) => {
                println!(
                    "admin: {} users, {} items, {} claims",
                    overview.users.len(),
                    overview.items.len(),
                    overview.claims.len()
                );
            }
            PageContent::AdminClaims(claims) => println!("admin claims: {}", claims.len()),
            PageContent::Chat => println!("chat"),
            PageContent::Error { message } => println!("error: {message}"),
        }
    }
}

impl ChatView for ConsoleSurface {
    fn render_conversations(&self, conversations: &[Conversation]) {
        if conversations.is_empty() {
            println!("no conversations yet");
            return;
        }
        for conv in conversations {
            let unread = if conv.unread_count > 0 {
                format!(" ({} unread)", conv.unread_count)
            } else {
                String::new()
            };
            println!("  {} {}{unread}: {}", conv.partner_id, conv.partner_username, conv.last_message);
        }
    }

    fn render_conversation_list_error(&self) {
        println!("error loading conversations");
    }

    fn mark_active_conversation(&self, partner_id: &str) {
        println!("* {partner_id}");
    }

    fn show_partner(&self, label: &str) {
        println!("chat with {label}");
    }

    fn show_message_loading(&self) {
        println!("loading…");
    }

    fn render_messages(&self, messages: &[ChatMessage]) {
        for msg in messages {
            let arrow = if msg.is_mine { ">" } else { "<" };
            println!("{arrow} {}", msg.content);
        }
    }

    fn render_empty_conversation(&self) {
        println!("no messages yet, say hello");
    }

    fn render_message_load_error(&self) {
        println!("error loading messages");
    }

    // A text console has no scrollback of its own; always follow the tail.
    fn is_near_bottom(&self) -> bool {
        true
    }

    fn scroll_to_bottom(&self) {}

    fn clear_input(&self) {}

    fn restore_input(&self, content: &str) {
        println!("(unsent) {content}");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = ClientConfig::load()?;
    let session = Arc::new(SessionStore::new());
    let gateway = Arc::new(HttpGateway::new(&config.api, Arc::clone(&session)));
    let surface = Arc::new(ConsoleSurface);
    let mut navigator = Navigator::new(
        config,
        session,
        gateway,
        Arc::clone(&surface) as Arc<dyn Shell>,
        surface as Arc<dyn ChatView>,
    );

    navigator.navigate("/").await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
        match command {
            "" => {}
            "quit" | "exit" => break,
            "nav" => navigator.navigate(rest).await,
            "login" => {
                let Some((email, password)) = rest.split_once(' ') else {
                    println!("usage: login <email> <password>");
                    continue;
                };
                let credentials = Credentials {
                    email: email.to_owned(),
                    password: password.to_owned(),
                };
                if let Err(error) = navigator.login(&credentials).await {
                    println!("login failed: {}", error.user_message());
                }
            }
            "signup" => {
                let parts: Vec<&str> = rest.split_whitespace().collect();
                let [username, email, password] = parts.as_slice() else {
                    println!("usage: signup <username> <email> <password>");
                    continue;
                };
                let profile = SignupProfile {
                    username: (*username).to_owned(),
                    email: (*email).to_owned(),
                    full_name: None,
                    phone: None,
                    password: (*password).to_owned(),
                };
                if let Err(error) = navigator.signup(&profile).await {
                    println!("signup failed: {}", error.user_message());
                }
            }
            "logout" => navigator.logout().await,
            "open" => match navigator.chat_engine() {
                Some(engine) => {
                    let label = engine.partner_label(rest).unwrap_or_default();
                    if let Err(error) = engine.open_conversation(rest, &label).await {
                        println!("open failed: {}", error.user_message());
                    }
                }
                None => println!("not on the chat page (try `nav /chat`)"),
            },
            "send" => match navigator.chat_engine() {
                Some(engine) => {
                    if let Err(error) = engine.send(rest).await {
                        println!("send failed: {}", error.user_message());
                    }
                }
                None => println!("not on the chat page (try `nav /chat`)"),
            },
            other => println!("unknown command: {other}"),
        }
    }

    Ok(())
}
