mod commands;

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use matchmate_client::RandomUserClient;
use matchmate_core::{Config, FeedModel, FeedState, ProfileRepository};
use matchmate_db::Database;

use crate::commands::{Command, HELP};

/// Cards shown per screen.
const PAGE_SIZE: usize = 10;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Logs go to stderr so they don't interleave with the feed on stdout.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    "matchmate=debug,matchmate_core=debug,matchmate_client=debug,matchmate_db=debug".into()
                }),
        )
        .init();

    let config = Config::from_env()?;
    info!(
        "Using {} (batch size {}), cache at {}",
        config.api_url,
        config.batch_size,
        config.db_path.display()
    );

    let db = Arc::new(Database::open(&config.db_path)?);
    let client = RandomUserClient::new(config.api_url.clone(), config.http_timeout)?;
    let model = FeedModel::new(ProfileRepository::new(db, client, config.batch_size));

    // Error channel: print whatever the model reports.
    let mut errors = model.errors();
    tokio::spawn(async move {
        while let Ok(message) = errors.recv().await {
            eprintln!("! {}", message);
        }
    });

    model.load_profiles(true).await?;
    let mut cursor = 0usize;
    print_page(&model.state(), cursor);
    println!("type 'help' for commands");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let cmd = match commands::parse(&line) {
            Ok(cmd) => cmd,
            Err(e) => {
                eprintln!("{}", e);
                continue;
            }
        };

        match cmd {
            Command::List => print_page(&model.state(), cursor),
            Command::Next => {
                let total = model.state().profiles.len();
                cursor = (cursor + PAGE_SIZE).min(total.saturating_sub(1));
                let visible = PAGE_SIZE.min(total.saturating_sub(cursor));
                let first_visible = (total > 0).then_some(cursor);
                if model.should_load_more(visible, first_visible, total) {
                    if let Some(handle) = model.load_more() {
                        println!("loading more...");
                        handle.await?;
                    }
                }
                print_page(&model.state(), cursor);
            }
            Command::More => match model.load_more() {
                Some(handle) => {
                    handle.await?;
                    print_page(&model.state(), cursor);
                }
                None => println!("already loading"),
            },
            Command::Decide(decision, target) => {
                let uids: Vec<String> = page(&model.state(), cursor)
                    .iter()
                    .map(|p| p.uid.clone())
                    .collect();
                let uid = commands::resolve_target(&target, &uids);
                if let Some(handle) = model.decide(&uid, decision) {
                    handle.await?;
                    let total = model.state().profiles.len();
                    cursor = cursor.min(total.saturating_sub(1));
                    print_page(&model.state(), cursor);
                }
            }
            Command::History => {
                model.load_history().await?;
                print_history(&model.state());
            }
            Command::Refresh => match model.refresh() {
                Some(handle) => {
                    handle.await?;
                    cursor = 0;
                    print_page(&model.state(), cursor);
                }
                None => println!("already loading"),
            },
            Command::Help => println!("{}", HELP),
            Command::Quit => break,
        }
    }

    model.close();
    info!("Bye");
    Ok(())
}

fn page(state: &FeedState, cursor: usize) -> &[matchmate_types::models::Profile] {
    let start = cursor.min(state.profiles.len());
    let end = (start + PAGE_SIZE).min(state.profiles.len());
    &state.profiles[start..end]
}

fn print_page(state: &FeedState, cursor: usize) {
    if state.profiles.is_empty() {
        println!("Nothing here. Try 'more' or 'refresh'.");
        return;
    }

    for (i, p) in page(state, cursor).iter().enumerate() {
        println!(
            "{:>3}. {:<24} {:<7} {}, {}  [{}]",
            i + 1,
            p.full_name(),
            p.gender,
            p.city,
            p.state,
            p.uid
        );
    }
    println!(
        "-- {}-{} of {} --",
        cursor + 1,
        (cursor + PAGE_SIZE).min(state.profiles.len()),
        state.profiles.len()
    );
}

fn print_history(state: &FeedState) {
    if state.history.is_empty() {
        println!("No decisions yet.");
        return;
    }

    for h in &state.history {
        println!(
            "{}  {:<8} {:<24} {}, {}",
            h.decided_at.format("%Y-%m-%d %H:%M"),
            h.profile.interaction_status.as_str(),
            h.profile.full_name(),
            h.profile.city,
            h.profile.state
        );
    }
}
