use std::{env, env::VarError};

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(version, about = "Affiliate cashback order sync and operator tools")]
pub struct Arguments {
    /// Runs the sync scheduler when no command is given
    #[command(subcommand)]
    pub command: Option<Command>,
    /// Print command results as JSON
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the periodic order sync until interrupted
    #[clap(name = "run")]
    Run,
    /// Sync orders from every enabled marketplace once and exit
    #[clap(name = "sync-now")]
    SyncNow,
    /// Convert a Shopee or TikTok Shop product URL into an affiliate link for a user
    #[clap(name = "convert")]
    Convert {
        /// The user the link is tracked to
        #[arg(short, long)]
        user: String,
        /// The product or share link
        url: String,
    },
    /// Register a user so that their orders can be attributed
    #[clap(name = "add-user")]
    AddUser { user: String },
    /// Print a user's balances and order counts
    #[clap(name = "balance")]
    Balance { user: String },
    /// Print the non-secret configuration variables
    #[clap(name = "env")]
    Env,
}

impl Arguments {
    pub fn selected_command(&self) -> &Command {
        self.command.as_ref().unwrap_or(&Command::Run)
    }
}

pub fn display_envs() {
    // Be explicit about which envars to print, so as to avoid accidentally exposing secrets
    const DISPLAY_ENVS: [&str; 15] = [
        "RUST_LOG",
        "CBK_DATABASE_URL",
        "CBK_CASHBACK_RATE",
        "CBK_ESTIMATE_SHARE",
        "CBK_SYNC_INTERVAL_MINS",
        "CBK_SYNC_LOOKBACK_DAYS",
        "CBK_HTTP_TIMEOUT_SECS",
        "CBK_SHOPEE_ENABLED",
        "CBK_SHOPEE_APP_ID",
        "CBK_SHOPEE_API_URL",
        "CBK_TIKTOK_ENABLED",
        "CBK_TIKTOK_APP_KEY",
        "CBK_TIKTOK_SHOP_CIPHER",
        "CBK_TIKTOK_API_URL",
        "CBK_TIKTOK_API_VERSION",
    ];

    println!("Current environment values (EXCLUDING variables that contain secrets):");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    })
}
