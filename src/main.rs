// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Bank-Session CLI
//!
//! Inspects the persisted banking session: shows the derived auth state,
//! evaluates route guards for a path, and fetches the extended profile.

use bank_session::{
    api::HttpProfileApi,
    config::Config,
    guard::{Decision, RouteTable},
    storage::FileStorage,
    Session,
};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "bank-session", about = "Inspect and drive the banking client session")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the stored session's auth state
    Status,
    /// Evaluate navigation to a view path
    Check { path: String },
    /// Store a session token issued by the backend
    SignIn {
        #[arg(env = "BANK_SESSION_TOKEN")]
        token: String,
    },
    /// Clear the stored session
    SignOut,
    /// Fetch the extended profile for the stored session
    Profile,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    tracing::debug!(dir = %config.storage_dir.display(), "Using session storage");

    let storage = Arc::new(FileStorage::new(config.storage_dir.clone()));
    let api = HttpProfileApi::new(&config)?;
    let session = Session::new(config, storage, api);

    match cli.command {
        Command::Status => {
            let state = session.auth.snapshot();
            match session.auth.session() {
                Ok(claims) => {
                    println!("authenticated: true");
                    println!("user: {} ({})", claims.display_name(), claims.sub);
                    println!("roles: {}", claims.roles.join(", "));
                    if let Some(role) = state.primary_role {
                        println!("primary role: {}", role);
                    }
                    if let Some(expires) = claims.expires_at() {
                        println!("expires: {}", expires.to_rfc3339());
                    }
                }
                Err(e) => {
                    println!("authenticated: false");
                    println!("reason: {}", e);
                }
            }
        }
        Command::Check { path } => {
            let routes = &session.config.routes;
            let table = RouteTable::banking(routes);
            match table.check(&session.auth.snapshot(), &path, routes) {
                Decision::Allow => println!("allow {}", path),
                Decision::RedirectTo(redirect) => println!("redirect {}", redirect.location()),
            }
        }
        Command::SignIn { token } => {
            session.auth.sign_in(token.trim());
            if !session.auth.is_authenticated() {
                tracing::warn!("Stored token does not describe a live session");
            }
            println!("signed in");
        }
        Command::SignOut => {
            session.auth.sign_out();
            session.profile.clear_profile();
            println!("signed out");
        }
        Command::Profile => match session.profile.fetch_profile().await {
            Ok(outcome) => {
                tracing::debug!(?outcome, "Profile fetch finished");
                match session.profile.profile() {
                    Some(profile) => println!("{}", serde_json::to_string_pretty(&profile)?),
                    None => println!("no profile ({:?})", outcome),
                }
            }
            Err(e) => {
                let message = e.user_message().unwrap_or_else(|| e.to_string());
                eprintln!("{}", message);
                std::process::exit(1);
            }
        },
    }

    Ok(())
}

/// Initialize structured JSON logging on stderr.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("bank_session=info,warn"));

    tracing_subscriber::registry().with(filter).with(format).init();
}
