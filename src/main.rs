mod archive;
mod client;
mod merge;
mod plan;
mod sync;
mod utils;

use clap::Parser;
use eyre::{Context, Result, eyre};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Back up Rocket.Chat direct-message history to local JSON archives.
/// One file per chat, incremental on repeated runs with -i.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Rocket.Chat username to back up messages for.
    /// The password is prompted interactively and never stored.
    #[arg(value_name = "USERNAME")]
    username: String,

    /// Only fetch messages not already present in an existing archive file.
    #[arg(short, long)]
    incremental: bool,

    /// Rocket.Chat server URL (e.g. https://chat.example.org).
    /// Required here or in the config file.
    #[arg(long, value_name = "URL")]
    server: Option<String>,

    /// Directory to store archive files.
    /// Defaults to ./rocketchat_saved_ims if not set in config.
    #[arg(long, value_name = "DIR")]
    storage_dir: Option<PathBuf>,

    /// Path to a specific configuration file.
    /// Defaults to $XDG_CONFIG_HOME/rocketchat-im-backup/config.toml
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Print each skipped chat and its reason.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress standard output (progress bar, per-chat lines).
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Deserialize, Default)]
struct FileConfig {
    server_url: Option<String>,
    storage_dir: Option<PathBuf>,
}

fn load_file_config(explicit_path: Option<&Path>) -> Result<FileConfig> {
    let path = if let Some(p) = explicit_path {
        if !p.exists() {
            return Err(eyre!("Config file not found: {}", p.display()));
        }
        Some(p.to_path_buf())
    } else {
        // Search: XDG/OS config dir, then nothing
        dirs::config_dir()
            .map(|d| d.join("rocketchat-im-backup/config.toml"))
            .filter(|p| p.exists())
    };

    match path {
        None => Ok(FileConfig::default()),
        Some(p) => {
            let content = fs::read_to_string(&p)
                .wrap_err_with(|| format!("Failed to read config: {}", p.display()))?;
            toml::from_str(&content)
                .wrap_err_with(|| format!("Failed to parse config: {}", p.display()))
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1. Load config file (CLI path > default path)
    let file_cfg = load_file_config(cli.config.as_deref())?;

    // 2. Resolve server URL (CLI > Config)
    let server_url = cli.server.or(file_cfg.server_url).ok_or_else(|| {
        eyre!("No server URL given.\nUse --server, or set server_url in config.toml.")
    })?;

    // 3. Resolve storage_dir (CLI > Config > Default)
    let storage_dir = cli
        .storage_dir
        .or(file_cfg.storage_dir)
        .unwrap_or_else(|| PathBuf::from("rocketchat_saved_ims"));

    // 4. Authenticate; invalid credentials abort the whole run
    let password = rpassword::prompt_password(format!(
        "Provide password for Rocket.Chat user '{}': ",
        cli.username
    ))
    .wrap_err("Failed to read password")?;
    let client = client::RocketChatClient::login(&server_url, &cli.username, &password)?;

    if !cli.quiet {
        eprintln!(
            "{}acking up Rocket.Chat ('{}') IM messages for '{}' to '{}'",
            if cli.incremental { "Incrementally b" } else { "B" },
            server_url,
            cli.username,
            storage_dir.display()
        );
    }

    // 5. Build the Backup Config
    let config = utils::BackupConfig {
        storage_dir,
        username: cli.username,
        incremental: cli.incremental,
        verbose: cli.verbose,
        quiet: cli.quiet,
    };

    // 6. Run the Business Logic
    sync::execute(&client, &config)
}
