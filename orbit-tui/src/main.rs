use anyhow::Result;
use clap::Parser;
use crossterm::event::{self, Event, KeyEventKind};
use orbit::api::ApiClient;
use orbit::app::{App, StatusKind};
use orbit::logging::{self, LogConfig};
use orbit::server_config::ServerConfigManager;
use orbit::session::SessionContext;
use orbit::storage::FileStorageAdapter;
use orbit::{terminal, ui};
use std::sync::Arc;
use std::time::Duration;

/// Orbit - a keyboard-driven terminal client for photo and video sharing
#[derive(Parser)]
#[command(name = "orbit")]
#[command(about = "Browse, like, comment on and upload media from the terminal")]
#[command(version)]
struct Cli {
    /// API base URL (e.g. http://localhost:7071/api)
    #[arg(long, short, env = "ORBIT_API_BASE")]
    server: Option<String>,

    /// Enable verbose logging
    #[arg(long, short, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(long, short)]
    quiet: bool,

    /// Open this user's profile after startup
    #[arg(long)]
    profile: Option<String>,
}

// Load environment variables from a .env file so ORBIT_API_BASE can live there
fn load_env() {
    let _ = dotenv::dotenv();
}

fn session_context() -> SessionContext {
    match FileStorageAdapter::new() {
        Ok(adapter) => SessionContext::new(Arc::new(adapter)),
        Err(e) => {
            log::warn!("Session file unavailable, keeping session in memory: {}", e);
            SessionContext::in_memory()
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    load_env();

    let log_config = if cli.verbose {
        LogConfig::verbose()
    } else if cli.quiet {
        LogConfig::quiet()
    } else {
        LogConfig::default()
    };
    logging::init_logging(&log_config)?;

    let server_config_manager = ServerConfigManager::new()?;
    let server_url = server_config_manager.determine_server_url(cli.server);
    log::info!(
        "Using API base {} ({})",
        server_url,
        ServerConfigManager::server_description(&server_url)
    );

    let session = session_context();
    let client = ApiClient::new(server_url, session.clone());
    let mut app = App::new(Arc::new(client), session)
        .with_config(server_config_manager.config_manager().clone(), log_config);

    let mut tui = terminal::init()?;

    app.start(cli.profile);

    while app.running {
        app.tick().await;

        tui.draw(|frame| ui::render(&mut app, frame))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                // Ignore key release events on platforms that report them
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if let Some(action) = app.handle_key_event(key)? {
                    if let Err(e) = app.dispatch(action).await {
                        log::error!("Action failed: {}", e);
                        app.set_status(format!("Error: {}", e), StatusKind::Error);
                    }
                }
            }
        }
    }

    terminal::restore()?;
    Ok(())
}
