//! Command-line / environment configuration.
//!
//! Every flag can also be supplied through a `TERMCHAT_*` environment
//! variable, which is how a launcher or shell profile sets a default nick.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use reqwest::Url;

use crate::poll::REFRESH_INTERVAL;

#[derive(Parser, Debug, Clone)]
#[command(name = "termchat", version, about = "Poll a chat server and talk to it from the terminal")]
pub struct Config {
    /// Chat server host name or address.
    #[arg(long, env = "TERMCHAT_HOST", default_value = "localhost")]
    pub host: String,

    /// Chat server port.
    #[arg(long, env = "TERMCHAT_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Nickname your messages are posted under.
    #[arg(long, env = "TERMCHAT_NICK", default_value = "!undef!")]
    pub nick: String,

    /// Milliseconds between refreshes while the window has focus.
    #[arg(
        long,
        env = "TERMCHAT_REFRESH_MS",
        default_value_t = REFRESH_INTERVAL.as_millis() as u64,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub refresh_ms: u64,

    /// File that receives the log (the terminal belongs to the UI).
    #[arg(long, env = "TERMCHAT_LOG_FILE", default_value = "termchat.log")]
    pub log_file: PathBuf,
}

impl Config {
    /// Root URL of the chat server, e.g. `http://localhost:8080/`.
    pub fn base_url(&self) -> Result<Url> {
        let host = self.host.trim();
        anyhow::ensure!(!host.is_empty(), "server host must not be empty");
        Url::parse(&format!("http://{host}:{}/", self.port))
            .with_context(|| format!("invalid server address {host}:{}", self.port))
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_ms)
    }
}
