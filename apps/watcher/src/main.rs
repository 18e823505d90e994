mod alarm;
mod config;
mod game;
mod gif;
mod scheduler;
mod telegram;

use alarm::LocalAlarm;
use config::{DEFAULT_CONFIG_PATH, WatcherConfig};
use gif::GifSource;
use pagewatch::{AlertFanout, HttpFetcher, TargetId, TargetRegistry, Watcher};
use scheduler::PassScheduler;
use std::sync::Arc;
use telegram::{CommandContext, CommandInterface};
use tokio::sync::Mutex;
use tracing::{error, info, warn};

const ADMIN_CHAT_ENV: &str = "PAGEWATCH_ADMIN_CHAT";
const GIPHY_KEY_ENV: &str = "GIPHY_API_KEY";

fn load_config() -> Result<WatcherConfig, config::WatcherError> {
    let config_path =
        std::env::var("CONFIG_PATH").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

    config::load_config(&config_path)
}

fn admin_target() -> Option<TargetId> {
    let raw = std::env::var(ADMIN_CHAT_ENV).ok()?;
    match raw.trim().parse::<i64>() {
        Ok(id) => Some(TargetId(id)),
        Err(e) => {
            warn!("Ignoring {}={}: {}", ADMIN_CHAT_ENV, raw, e);
            None
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("pagewatch=info".parse()?)
                .add_directive("pagewatch_watcher=info".parse()?),
        )
        .init();

    info!("Starting pagewatch");

    let config = match load_config() {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load config: {}", e);
            return Err(e.into());
        }
    };

    let resources = config.resolve_resources(|key| std::env::var(key).ok())?;
    info!(
        resources = resources.len(),
        schedule = %config.schedule,
        "Loaded config"
    );

    let registry = TargetRegistry::new();
    let interface = CommandInterface::from_env();

    let mut notifier = AlertFanout::new(interface.broadcaster(), registry.clone())
        .with_alarm(Arc::new(LocalAlarm::new(&config.alarm)));
    if let Some(admin) = admin_target() {
        info!(target_id = %admin, "Fetch failures will be reported to admin chat");
        notifier = notifier.with_admin(admin);
    }

    let fetcher = HttpFetcher::new(&config.fetch_options())?;
    let watcher = Watcher::new(&resources, Arc::new(fetcher), Arc::new(notifier))?;
    let watcher = Arc::new(Mutex::new(watcher));

    let mut handles = Vec::new();

    let context = CommandContext {
        registry,
        resources: Arc::new(resources),
        gifs: Arc::new(GifSource::new(
            &config.gif,
            std::env::var(GIPHY_KEY_ENV).ok(),
        )?),
    };
    if let Some(handle) = interface.spawn(context) {
        handles.push(handle);
        info!("Telegram bot task spawned");
    }

    // Seed every resource before the first scheduled tick
    scheduler::run_guarded_pass(&watcher).await;

    let scheduler = PassScheduler::new(Arc::clone(&watcher)).await?;
    scheduler.start(&config.schedule).await?;
    if let Some(next) = config::next_tick(&config.schedule) {
        info!(next = %next.format("%H:%M:%S UTC"), "Next pass scheduled");
    }

    info!("pagewatch running, waiting for shutdown signal");

    tokio::signal::ctrl_c().await?;

    info!("Received shutdown signal, stopping...");

    scheduler.shutdown().await;
    for handle in handles {
        handle.abort();
    }

    info!("pagewatch stopped");
    Ok(())
}
