//! session-cleaner demo binary.
//!
//! Creates a session, stores a value in it, reads it back, and then waits
//! until the store evicts the idle session or Ctrl-C is pressed.

use std::process::ExitCode;
use std::time::{Duration, Instant};

use serde_json::json;
use session_cleaner::cli::{self, Args};
use session_cleaner::config::Config;
use session_cleaner::{logging, SessionData, SessionId, SessionStore};
use tracing::{error, info, warn};

/// How often the demo checks whether its session is gone.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[tokio::main]
async fn main() -> ExitCode {
    let args = match cli::parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("error: {}", e);
            eprintln!("Run with --help for usage.");
            return ExitCode::from(2);
        }
    };

    if args.help {
        cli::print_help();
        return ExitCode::SUCCESS;
    }

    if args.version {
        cli::print_version();
        return ExitCode::SUCCESS;
    }

    match run(&args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: &Args) -> session_cleaner::Result<()> {
    let config = Config::load(args)?;
    if logging::init_with_filter(config.log_filter()).is_err() {
        eprintln!("warning: logging already initialized");
    }

    info!("session-cleaner v{}", env!("CARGO_PKG_VERSION"));

    let store = config.store_builder()?.build()?;
    info!(
        idle_timeout = ?store.idle_timeout(),
        policy = %store.policy(),
        "session store initialized"
    );

    let id = store.create_session()?;
    let created = Instant::now();
    info!(session_id = %id, "created new session");

    let mut data = SessionData::new();
    data.insert("website".to_string(), json!("longhoang.de"));
    store.update_session_data(&id, data)?;
    info!("updated session data, set website to longhoang.de");

    let data = store.get_session_data(&id)?;
    info!(data = ?data, "got session data");

    tokio::select! {
        result = wait_for_eviction(&store, &id) => {
            result?;
            info!(
                session_id = %id,
                elapsed = ?created.elapsed(),
                "session evicted after idle window"
            );
        }
        signal = tokio::signal::ctrl_c() => {
            if let Err(e) = signal {
                warn!("failed to listen for Ctrl-C: {}", e);
            }
            info!(sessions = store.count(), "interrupted, shutting down");
        }
    }

    Ok(())
}

async fn wait_for_eviction(store: &SessionStore, id: &SessionId) -> session_cleaner::Result<()> {
    let mut tick = tokio::time::interval(POLL_INTERVAL);
    while store.contains(id)? {
        tick.tick().await;
    }
    Ok(())
}
