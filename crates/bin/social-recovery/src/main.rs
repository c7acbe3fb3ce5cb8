//! social-recovery - split a wallet secret among friends
//!
//! usage:
//!   social-recovery create --total 5 --needed 3 --delay 30d --label family
//!   social-recovery reconstruct SHARE SHARE SHARE
//!   social-recovery inspect SHARE
//!   social-recovery backup USER_BACKUP_HEX
//!
//! wallet tunables are read from a toml file given by --config or
//! SOCIAL_RECOVERY_CONFIG.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rand::rngs::OsRng;
use social_recovery::timelock::{format_duration, remaining_delay, unix_now};
use social_recovery::{
    create_wallet_with, reconstruct_at, Share, UserBackup, WalletConfig, WalletRequest,
};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "social-recovery")]
#[command(about = "split a wallet secret into k-of-n recovery shares")]
#[command(version)]
struct Cli {
    /// wallet config file (toml)
    #[arg(short, long, global = true, env = "SOCIAL_RECOVERY_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// create a new secret, its user backup and the recovery shares
    Create {
        /// number of shares to hand out
        #[arg(short, long)]
        total: u32,

        /// shares needed to recover
        #[arg(short, long)]
        needed: u32,

        /// delay before the emergency share works, e.g. 0, 3600, 30d, "2 weeks"
        #[arg(short, long, default_value = "0")]
        delay: String,

        /// name printed above each share
        #[arg(short, long)]
        label: Option<String>,

        /// print json instead of text
        #[arg(long)]
        json: bool,
    },

    /// recover the secret from shares
    Reconstruct {
        /// share strings
        #[arg(required = true)]
        shares: Vec<String>,

        /// evaluate time locks at this unix time instead of now
        #[arg(long)]
        at: Option<u64>,
    },

    /// show what a share contains without recovering anything
    Inspect {
        share: String,
    },

    /// read the secret back out of a user backup
    Backup {
        hex: String,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "social_recovery=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Create {
            total,
            needed,
            delay,
            label,
            json,
        } => {
            let config = load_config(cli.config.as_deref())?;
            cmd_create(&config, total, needed, &delay, label, json)
        }
        Commands::Reconstruct { shares, at } => cmd_reconstruct(&shares, at),
        Commands::Inspect { share } => cmd_inspect(&share),
        Commands::Backup { hex } => cmd_backup(&hex),
    }
}

/// load wallet config, falling back to defaults when no file is given
fn load_config(path: Option<&Path>) -> Result<WalletConfig> {
    let Some(path) = path else {
        return Ok(WalletConfig::default());
    };
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config: WalletConfig = toml::from_str(&content)
        .with_context(|| format!("invalid config {}", path.display()))?;
    config.validate()?;
    info!("loaded config from {}", path.display());
    Ok(config)
}

fn cmd_create(
    config: &WalletConfig,
    total: u32,
    needed: u32,
    delay: &str,
    label: Option<String>,
    json: bool,
) -> Result<()> {
    let mut request = WalletRequest::new(total, needed, delay)?;
    request.label = label;

    let wallet = create_wallet_with(&request, config, &mut OsRng, unix_now()?)
        .context("failed to create wallet")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&wallet)?);
        return Ok(());
    }

    println!("User Backup (keep this yourself)");
    println!("{}", wallet.user_backup_hex);
    println!();
    for (n, share) in wallet.shares.iter().enumerate() {
        println!("{}", wallet.share_title(n + 1));
        println!("{}", share);
        println!();
    }
    if wallet.time_delay_secs > 0 {
        warn!(
            "the emergency share's delay is enforced by this software only; \
             a determined holder can bypass it"
        );
    }
    Ok(())
}

fn cmd_reconstruct(shares: &[String], at: Option<u64>) -> Result<()> {
    let now = match at {
        Some(at) => at,
        None => unix_now()?,
    };
    let secret = reconstruct_at(shares, now).context("recovery failed")?;
    println!("{}", secret.to_hex());
    Ok(())
}

fn cmd_inspect(share: &str) -> Result<()> {
    let share = Share::decode(share).context("cannot read share")?;
    println!("set id:  {}", hex::encode(share.set_id));
    println!("share:   #{}", share.index);
    println!(
        "scheme:  {}-of-{}",
        share.params.needed_shares, share.params.total_shares
    );
    match (share.time_lock, remaining_delay(&share, unix_now()?)) {
        (None, _) => println!("delay:   none"),
        (Some(lock), None) => println!("delay:   unlocked (since unix {})", lock.not_before),
        (Some(lock), Some(wait)) => println!(
            "delay:   locked until unix {} ({} left)",
            lock.not_before,
            format_duration(&wait)
        ),
    }
    Ok(())
}

fn cmd_backup(hex: &str) -> Result<()> {
    let backup = UserBackup::from_hex(hex).context("cannot read user backup")?;
    println!(
        "scheme:  {}-of-{}",
        backup.params.needed_shares, backup.params.total_shares
    );
    println!("delay:   {}", format_duration(&backup.time_delay));
    println!("secret:  {}", backup.secret.to_hex());
    Ok(())
}
