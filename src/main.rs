mod config;
mod engine;
mod error;
mod formats;
mod library;
mod mpris;
mod playlist;
mod runtime;
mod scrobble;
mod track;

use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    runtime::run()
}
