//! Process configuration: command-line flags, each backed by an environment
//! variable.
//!
//! A `.env` file in the working directory is loaded first (see `main.rs`), so
//! every key below can live there during development.

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// NPS survey service: campaigns, WhatsApp delivery and response collection.
#[derive(Parser, Debug, Clone)]
#[command(name = "nps-backend")]
#[command(about = "NPS survey dispatch, response and webhook service")]
pub struct Config {
    /// Address to bind the HTTP server to
    #[arg(long, env = "NPS_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to bind the HTTP server to
    #[arg(long, env = "NPS_PORT", default_value = "8080")]
    pub port: u16,

    /// SQLite database file
    #[arg(long, env = "NPS_DATABASE_PATH", default_value = "nps.sqlite")]
    pub database_path: PathBuf,

    /// Base URL of the WhatsApp provider API
    #[arg(long, env = "WHATSAPP_API_URL", default_value = "http://localhost:8081")]
    pub whatsapp_api_url: String,

    /// Provider API key. Absent or blank switches delivery to simulated mode
    #[arg(long, env = "WHATSAPP_API_KEY")]
    pub whatsapp_api_key: Option<String>,

    /// Provider instance (sender) identifier
    #[arg(long, env = "WHATSAPP_INSTANCE", default_value = "default")]
    pub whatsapp_instance: String,

    /// Public URL response links are built from (`<base>/nps/<token>`).
    /// Defaults to `http://<host>:<port>`
    #[arg(long, env = "NPS_PUBLIC_BASE_URL")]
    pub public_base_url: Option<String>,

    /// Timeout of one provider request, in seconds
    #[arg(
        long,
        env = "DELIVERY_TIMEOUT_SECS",
        default_value = "15",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub delivery_timeout_secs: u64,

    /// Deliveries in flight per campaign execution
    #[arg(
        long,
        env = "DISPATCH_CONCURRENCY",
        default_value = "4",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub dispatch_concurrency: u64,

    /// Lifetime of response tokens in hours. Unset: tokens only end when used
    #[arg(
        long,
        env = "TOKEN_TTL_HOURS",
        value_parser = clap::value_parser!(i64).range(1..)
    )]
    pub token_ttl_hours: Option<i64>,

    /// Poll period of the due-campaign scheduler in seconds; 0 disables it
    #[arg(long, env = "SCHEDULER_INTERVAL_SECS", default_value = "60")]
    pub scheduler_interval_secs: u64,
}

impl Config {
    /// Reads flags and environment, exiting with usage on invalid values.
    pub fn from_env() -> Self {
        Config::parse()
    }

    pub fn whatsapp_api_url(&self) -> &str {
        self.whatsapp_api_url.trim_end_matches('/')
    }

    pub fn whatsapp_api_key(&self) -> Option<String> {
        self.whatsapp_api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
    }

    pub fn public_base_url(&self) -> String {
        match self.public_base_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => url.trim_end_matches('/').to_string(),
            _ => format!("http://{}:{}", self.host, self.port),
        }
    }

    pub fn delivery_timeout(&self) -> Duration {
        Duration::from_secs(self.delivery_timeout_secs)
    }

    pub fn dispatch_concurrency(&self) -> usize {
        usize::try_from(self.dispatch_concurrency).unwrap_or(usize::MAX)
    }

    pub fn token_ttl(&self) -> Option<chrono::Duration> {
        self.token_ttl_hours.map(chrono::Duration::hours)
    }

    /// `None` when the scheduler is disabled.
    pub fn scheduler_interval(&self) -> Option<Duration> {
        (self.scheduler_interval_secs > 0).then(|| Duration::from_secs(self.scheduler_interval_secs))
    }
}
