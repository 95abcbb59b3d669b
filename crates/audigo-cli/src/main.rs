// SPDX-License-Identifier: GPL-3.0-or-later
use anyhow::{Context, Result};
use audigo_config::{load as load_config, AppConfig};
use audigo_spotify::{Album, SpotifyClient};
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEMO_ALBUM_IDS: [&str; 3] = [
    "6guJZpZ52v4MrJKIH7tASl",
    "41MnTivkwTO3UUJ8DrqEJJ",
    "6UXCm6bOO4gFlDQZV5yL37",
];

#[tokio::main]
async fn main() -> Result<()> {
    let dotenv_loaded = dotenv::dotenv().is_ok();

    let config = load_config(None)?;
    init_tracing(&config.telemetry.log_level);
    log_loaded_config(&config);

    if !dotenv_loaded {
        warn!(target: "cli", "no .env file found");
    }

    let client = build_client(&config)?;
    client
        .authenticate()
        .await
        .context("failed to authenticate with Spotify")?;

    let albums = client.get_albums(&DEMO_ALBUM_IDS).await?;
    info!(target: "cli", count = albums.len(), "albums fetched");

    for line in album_lines(&DEMO_ALBUM_IDS, &albums) {
        println!("{line}");
    }

    Ok(())
}

fn init_tracing(default_level: &str) {
    let fmt_layer = fmt::layer().with_target(true).with_level(true);
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

/// Configuration is loaded before the subscriber exists, so its load event
/// is reported here once logging is up.
fn log_loaded_config(config: &AppConfig) {
    info!(
        target: "config",
        api = %config.api.base_url,
        accounts = %config.api.accounts_url,
        timeout_secs = config.api.timeout_secs,
        "configuration loaded"
    );
}

fn build_client(config: &AppConfig) -> Result<SpotifyClient> {
    let (client_id, client_secret) = config.credentials()?;

    let client = SpotifyClient::builder(client_id, client_secret)
        .api_base_url(&config.api.base_url)
        .accounts_base_url(&config.api.accounts_url)
        .timeout(config.api.timeout())
        .build()?;

    Ok(client)
}

fn album_lines(ids: &[&str], albums: &[Option<Album>]) -> Vec<String> {
    ids.iter()
        .zip(albums)
        .map(|(id, album)| match album {
            Some(album) => format!("{id}  {}", album.name),
            None => format!("{id}  (not found)"),
        })
        .collect()
}
