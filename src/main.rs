use anyhow::{Context, Result};
use cfai_chat::{App, Error, FileCredentialStore, Settings, WorkersAiClient};
use cfai_chat::ui::TerminalUI;
use colored::*;
use tracing_subscriber::EnvFilter;

fn init_logging(filter: &str) {
    let filter = EnvFilter::try_new(filter)
        .unwrap_or_else(|_| EnvFilter::new(cfai_chat::config::DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(settings: &Settings) -> Result<usize> {
    let store = FileCredentialStore::new(settings.credentials_file.clone());
    let client = WorkersAiClient::from_settings(settings).context("failed to build HTTP client")?;
    let mut ui = TerminalUI::new()?;
    ui.show_welcome_message()?;

    let turns = App::new(&store, &client, &mut ui, rand::thread_rng())
        .with_settings(settings)
        .run()
        .await?;
    Ok(turns)
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{}", format!("Error: {e}").red());
            std::process::exit(1);
        }
    };
    init_logging(&settings.log_filter);
    tracing::info!("cfai-chat v{} starting", env!("CARGO_PKG_VERSION"));

    match run(&settings).await {
        Ok(turns) => tracing::info!(turns, "exiting"),
        Err(e) if matches!(e.downcast_ref::<Error>(), Some(Error::UserExit)) => {
            tracing::info!("setup cancelled by user");
        }
        Err(e) => {
            eprintln!("{}", format!("Error: {e:#}").red());
            std::process::exit(1);
        }
    }
}
