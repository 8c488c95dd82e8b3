//! Qryti Admin Console
//!
//! Drives the admin tables (users, assessments, certificates) from the
//! terminal. Each stdin line is one command:
//!
//! ```text
//! login <email> <password>
//! users filter status completed
//! assessments filter search acme
//! certificates page 2
//! users limit 25
//! users refresh
//! logout
//! quit
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `QRYTI_CONFIG` | - | Path to a TOML config file |
//! | `QRYTI_API_BASE_URL` | `http://localhost:5000` | API base URL |
//! | `QRYTI_SESSION_STORE_PATH` | `./data/session.json` | Persisted session file |
//! | `QRYTI_LIST_PAGE_SIZE` | `10` | Rows per page |
//! | `LOG_FORMAT` | `text` | `text` or `json` |
//! | `RUST_LOG` | `info` | Log filter |

mod render;

use anyhow::{Context, Result};
use clap::Parser;
use qr_client::list::ListSettings;
use qr_client::{
    AssessmentsAdapter, AuthApi, CertificatesAdapter, ClientConfig, Dispatcher, FileStore, ListViewController,
    RequestGateway, Session, SessionEvent, Table, UsersAdapter,
};
use qr_config::{AppConfig, ConfigLoader};
use render::TableRenderer;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "qr-console")]
#[command(about = "Qryti admin console - users, assessments and certificates from the terminal")]
struct Args {
    /// Config file (overrides QRYTI_CONFIG and the standard locations)
    #[arg(long, short)]
    config: Option<String>,

    /// API base URL
    #[arg(long, env = "QRYTI_API_BASE_URL")]
    base_url: Option<String>,

    /// Print an example config file and exit
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.print_config {
        println!("{}", AppConfig::example_toml());
        return Ok(());
    }

    let loader = match &args.config {
        Some(path) => ConfigLoader::with_path(path),
        None => ConfigLoader::new(),
    };
    let mut config = loader.load().context("failed to load configuration")?;
    if let Some(base_url) = args.base_url {
        config.api.base_url = base_url;
    }

    qr_common::logging::init_logging(&config.logging.level, &config.logging.format);
    info!(base_url = %config.api.base_url, "Starting Qryti console");

    let store = FileStore::open(&config.session.store_path)
        .with_context(|| format!("failed to open session store {}", config.session.store_path))?;
    let session = Arc::new(Session::restore(Arc::new(store))?);
    if let Some(user) = session.user_profile() {
        info!(email = %user.email, "Restored session");
    }

    let client_config = ClientConfig::new(&config.api.base_url)
        .with_timeout(Duration::from_millis(config.api.timeout_ms))
        .with_user_agent(&config.api.user_agent)
        .with_refresh_path(&config.api.refresh_path);
    let gateway = Arc::new(RequestGateway::new(client_config, session.clone())?);
    let auth = AuthApi::new(gateway.clone(), session.clone());

    let settings = ListSettings {
        page_size: NonZeroU32::new(config.list.page_size).unwrap_or(qr_client::resources::DEFAULT_PAGE_SIZE),
        text_debounce: Duration::from_millis(config.list.text_debounce_ms),
        discrete_debounce: Duration::from_millis(config.list.discrete_debounce_ms),
    };
    let dispatcher = Dispatcher::new(
        session.clone(),
        ListViewController::with_settings(
            UsersAdapter,
            gateway.clone(),
            Arc::new(TableRenderer::new("Users")),
            settings.clone(),
        ),
        ListViewController::with_settings(
            AssessmentsAdapter,
            gateway.clone(),
            Arc::new(TableRenderer::new("Assessments")),
            settings.clone(),
        ),
        ListViewController::with_settings(
            CertificatesAdapter,
            gateway.clone(),
            Arc::new(TableRenderer::new("Certificates")),
            settings,
        ),
    );

    let mut events = gateway.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("Type 'help' for commands.");

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if !handle_line(line.trim(), &dispatcher, &auth).await {
                    break;
                }
            }
            event = events.recv() => {
                if let Ok(SessionEvent::Expired) = event {
                    warn!("Session expired");
                    eprintln!("Your session has expired. Please log in again.");
                }
            }
            _ = signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        }
    }

    for table in Table::ALL {
        dispatcher.controller(table).dispose();
    }
    info!("Console stopped");
    Ok(())
}

/// Returns `false` when the console should exit
async fn handle_line(line: &str, dispatcher: &Dispatcher, auth: &AuthApi) -> bool {
    let mut words = line.split_whitespace();
    match words.next() {
        None => {}
        Some("quit" | "exit") => return false,
        Some("help") => print_help(),
        Some("login") => {
            let (Some(email), Some(password)) = (words.next(), words.next()) else {
                eprintln!("usage: login <email> <password>");
                return true;
            };
            match auth.login(email, password).await {
                Ok(Some(user)) => println!("Welcome, {}", user.display_name()),
                Ok(None) => println!("Logged in"),
                Err(e) => eprintln!("Login failed: {}", e.user_message()),
            }
        }
        Some("whoami") => match current_user(auth) {
            Some(name) => println!("{}", name),
            None => println!("Not logged in"),
        },
        Some(_) => {
            if let Err(e) = dispatcher.dispatch_line(line).await {
                eprintln!("{}", e.user_message());
            }
        }
    }
    true
}

fn current_user(auth: &AuthApi) -> Option<String> {
    auth.session()
        .user_profile()
        .map(|user| format!("{} <{}>", user.display_name(), user.email))
}

fn print_help() {
    println!(
        "Commands:
  login <email> <password>
  <table> filter <name> [value]   (empty value clears the filter)
  <table> page <n>
  <table> limit <n>
  <table> refresh
  whoami | logout | quit
Tables: users, assessments, certificates"
    );
}
