//! synd-creds - Credential management tool for Syndicate
//!
//! Stores platform API keys encrypted in the Syndicate database and controls
//! which platforms take part in publish-all.

use std::io::{self, Read, Write};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use libsyndicate::credentials::CredentialStore;
use libsyndicate::logging::LoggingConfig;
use libsyndicate::{Codec, Config, CredentialSummary, CredentialUpsert, Database, Platform, SyndicateError};

#[derive(Parser)]
#[command(name = "synd-creds")]
#[command(version)]
#[command(about = "Manage Syndicate platform credentials securely", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format for list: text or json
    #[arg(long, global = true, default_value = "text")]
    format: String,

    /// Key used to encrypt stored API keys
    #[arg(long, global = true, env = "SYNDICATE_ENCRYPTION_KEY", hide_env_values = true)]
    encryption_key: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Store the API key for a platform (replaces any existing key)
    Set {
        /// Platform name (medium, devto, wordpress)
        platform: String,

        /// WordPress site URL, e.g. https://blog.example.com
        #[arg(long)]
        site_url: Option<String>,

        /// Extra platform settings as a JSON object
        #[arg(long)]
        platform_config: Option<String>,

        /// Read the API key from stdin (for automation/agents)
        #[arg(long)]
        stdin: bool,
    },

    /// List stored credentials (without showing keys)
    List,

    /// Delete the credential for a platform
    Delete {
        platform: String,

        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Include a platform in publish-all
    Enable { platform: String },

    /// Exclude a platform from publish-all without deleting its key
    Disable { platform: String },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    LoggingConfig::from_env().with_verbose(cli.verbose).init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        let code = e
            .downcast_ref::<SyndicateError>()
            .map(SyndicateError::exit_code)
            .unwrap_or(1);
        std::process::exit(code);
    }
}

async fn run(cli: Cli) -> Result<()> {
    if cli.format != "text" && cli.format != "json" {
        return Err(SyndicateError::Validation(format!(
            "Invalid format '{}'. Must be 'text' or 'json'",
            cli.format
        ))
        .into());
    }

    let store = open_store(cli.encryption_key).await?;

    match cli.command {
        Commands::Set {
            platform,
            site_url,
            platform_config,
            stdin,
        } => set_credentials(&store, &platform, site_url, platform_config, stdin).await,
        Commands::List => list_credentials(&store, &cli.format).await,
        Commands::Delete { platform, force } => delete_credentials(&store, &platform, force).await,
        Commands::Enable { platform } => set_active(&store, &platform, true).await,
        Commands::Disable { platform } => set_active(&store, &platform, false).await,
    }
}

async fn open_store(encryption_key: Option<String>) -> Result<CredentialStore> {
    let config = Config::load()?;
    let codec = match encryption_key {
        Some(key) => Codec::new(&key)?,
        None => Codec::from_env()?,
    };
    let db = Database::new(&config.database_path()).await?;
    Ok(CredentialStore::new(db, codec))
}

fn parse_platform(name: &str) -> Result<Platform> {
    Ok(name.parse::<Platform>()?)
}

async fn set_credentials(
    store: &CredentialStore,
    platform: &str,
    site_url: Option<String>,
    platform_config: Option<String>,
    use_stdin: bool,
) -> Result<()> {
    let platform = parse_platform(platform)?;

    let platform_config: Option<serde_json::Value> = match platform_config {
        Some(raw) => Some(serde_json::from_str(&raw).map_err(|e| {
            SyndicateError::Validation(format!("--platform-config is not valid JSON: {}", e))
        })?),
        None => None,
    };

    let api_key = if use_stdin {
        let mut input = String::new();
        io::stdin()
            .read_to_string(&mut input)
            .context("Failed to read API key from stdin")?;
        input
    } else {
        if !atty::is(atty::Stream::Stdin) {
            bail!("Not a TTY. Use --stdin flag to read the API key from stdin for automation.");
        }
        rpassword::prompt_password(format!("{} API key: ", platform))?
    };

    let summary = store
        .upsert(
            platform,
            CredentialUpsert {
                api_key,
                site_url,
                platform_config,
            },
        )
        .await?;

    println!("✓ Stored {} credentials", summary.platform);
    if let Some(site_url) = &summary.site_url {
        println!("  site: {}", site_url);
    }
    Ok(())
}

async fn list_credentials(store: &CredentialStore, format: &str) -> Result<()> {
    let credentials = store.list().await?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&credentials)?);
        return Ok(());
    }

    if credentials.is_empty() {
        println!("No credentials stored. Add one with 'synd-creds set <platform>'.");
        return Ok(());
    }

    println!("Stored credentials:");
    for credential in &credentials {
        print_summary(credential);
    }
    Ok(())
}

fn print_summary(credential: &CredentialSummary) {
    let state = if credential.is_active { "active" } else { "disabled" };
    match &credential.site_url {
        Some(site_url) => println!("  {:<10} {:<8} {}", credential.platform.display_name(), state, site_url),
        None => println!("  {:<10} {}", credential.platform.display_name(), state),
    }
}

async fn delete_credentials(store: &CredentialStore, platform: &str, force: bool) -> Result<()> {
    let platform = parse_platform(platform)?;

    if !force && atty::is(atty::Stream::Stdin) {
        print!("Delete {} credentials? [y/N]: ", platform);
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;

        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Cancelled");
            return Ok(());
        }
    }

    store.delete(platform).await?;
    println!("✓ Deleted {} credentials", platform);
    Ok(())
}

async fn set_active(store: &CredentialStore, platform: &str, active: bool) -> Result<()> {
    let platform = parse_platform(platform)?;
    store.set_active(platform, active).await?;

    if active {
        println!("✓ {} enabled for publish-all", platform);
    } else {
        println!("✓ {} disabled for publish-all", platform);
    }
    Ok(())
}
