//! CLI definition using clap derive.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use gwwatch_source_opnsense::{DEFAULT_TIMEOUT_MS, normalize_router_url};

/// Longest debounce delay accepted on the command line (60 minutes).
pub const MAX_DELAY_SECS: u64 = 3600;

#[derive(Parser, Debug)]
#[command(name = "gwwatch", about = "debounced OPNsense gateway status monitor")]
pub struct Cli {
    #[command(flatten)]
    pub router: RouterOpts,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Poll gateways forever, printing one JSON line per status change
    Watch(WatchOpts),
    /// Run a single poll cycle for one gateway
    Check(CheckOpts),
    /// List gateways known to the router
    List,
    /// Check that the router answers with the given credentials
    Verify,
    /// Show persisted debounce state
    State(StateOpts),
    /// Forget persisted debounce state for one gateway
    Reset(ResetOpts),
}

#[derive(clap::Args, Debug, Clone)]
pub struct RouterOpts {
    /// Router URL, e.g. https://192.168.1.1
    #[arg(long, env = "GWWATCH_ROUTER_URL", global = true)]
    pub router_url: Option<String>,

    /// OPNsense API key
    #[arg(long, env = "GWWATCH_API_KEY", global = true, hide_env_values = true, default_value = "")]
    pub api_key: String,

    /// OPNsense API secret
    #[arg(long, env = "GWWATCH_API_SECRET", global = true, hide_env_values = true, default_value = "")]
    pub api_secret: String,

    /// Request timeout in milliseconds
    #[arg(long, global = true, default_value_t = DEFAULT_TIMEOUT_MS)]
    pub timeout_ms: u64,

    /// Accept invalid (e.g. self-signed) TLS certificates
    #[arg(long, env = "GWWATCH_INSECURE", global = true)]
    pub insecure: bool,
}

#[derive(clap::Args, Debug, Clone)]
pub struct StoreOpts {
    /// SQLite file holding debounce state
    #[arg(long, env = "GWWATCH_STATE_DB", default_value_os_t = default_state_path())]
    pub state_db: PathBuf,

    /// State namespace (default: the normalized router URL)
    #[arg(long)]
    pub namespace: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct WatchOpts {
    /// Gateway name to monitor (repeatable)
    #[arg(long = "gateway", short = 'g', required = true)]
    pub gateways: Vec<String>,

    /// Seconds a status must stay unchanged before it is reported
    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u64).range(0..=MAX_DELAY_SECS))]
    pub delay_secs: u64,

    /// Seconds between poll ticks
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u64).range(1..))]
    pub interval_secs: u64,

    #[command(flatten)]
    pub store: StoreOpts,
}

#[derive(clap::Args, Debug)]
pub struct CheckOpts {
    /// Gateway name to check
    #[arg(long, short = 'g')]
    pub gateway: String,

    /// Seconds a status must stay unchanged before it is reported
    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u64).range(0..=MAX_DELAY_SECS))]
    pub delay_secs: u64,

    #[command(flatten)]
    pub store: StoreOpts,
}

#[derive(clap::Args, Debug)]
pub struct StateOpts {
    /// Only show this gateway
    #[arg(long, short = 'g')]
    pub gateway: Option<String>,

    #[command(flatten)]
    pub store: StoreOpts,
}

#[derive(clap::Args, Debug)]
pub struct ResetOpts {
    /// Gateway whose state is dropped
    #[arg(long, short = 'g')]
    pub gateway: String,

    #[command(flatten)]
    pub store: StoreOpts,
}

impl RouterOpts {
    pub fn require_router_url(&self) -> anyhow::Result<&str> {
        self.router_url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| anyhow::anyhow!("--router-url (or GWWATCH_ROUTER_URL) is required"))
    }
}

impl StoreOpts {
    /// Explicit namespace, else the normalized router URL.
    pub fn resolve_namespace(&self, router: &RouterOpts) -> anyhow::Result<String> {
        match &self.namespace {
            Some(ns) => Ok(ns.clone()),
            None => Ok(normalize_router_url(router.require_router_url()?)),
        }
    }
}

/// Default state file: `$XDG_STATE_HOME/gwwatch/state.db`, falling back to
/// `$HOME/.local/state/gwwatch/state.db`, then the working directory.
pub fn default_state_path() -> PathBuf {
    if let Ok(dir) = std::env::var("XDG_STATE_HOME") {
        return PathBuf::from(dir).join("gwwatch/state.db");
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".local/state/gwwatch/state.db");
    }
    PathBuf::from("gwwatch-state.db")
}
