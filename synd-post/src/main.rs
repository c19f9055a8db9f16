//! synd-post - Write once, publish to every blog
//!
//! Unix-style tool for creating posts and publishing them to Medium, DEV.to
//! and WordPress.

use std::io::{self, Read};

use clap::{Parser, Subcommand};
use libsyndicate::logging::LoggingConfig;
use libsyndicate::service::events::{Event, EventReceiver};
use libsyndicate::service::posts::PostService;
use libsyndicate::service::publishing::{PublishAllResponse, PublishResponse, UnpublishResponse};
use libsyndicate::{
    Codec, Config, Database, NewPost, Platform, Post, Result, SyndicateError, SyndicateService,
};
use serde::Serialize;
use tokio::sync::broadcast::error::RecvError;

#[derive(Parser, Debug)]
#[command(name = "synd-post")]
#[command(version)]
#[command(about = "Create posts and publish them to Medium, DEV.to and WordPress")]
#[command(long_about = "\
synd-post - Create posts and publish them to Medium, DEV.to and WordPress

USAGE EXAMPLES:
    # Create a draft from stdin, printing its id
    cat post.md | synd-post new --title \"Hello\" --tag rust

    # Publish to a single platform
    synd-post publish <POST_ID> devto

    # Publish to every platform with an active credential
    synd-post publish-all <POST_ID>

    # Forget that a post was published on a platform (does not delete it there)
    synd-post unpublish <POST_ID> medium

CONFIGURATION:
    Configuration file: ~/.config/syndicate/config.toml
    Override with SYNDICATE_CONFIG.

    Publishing commands need the credential encryption key in
    SYNDICATE_ENCRYPTION_KEY or --encryption-key.

EXIT CODES:
    0 - Success (publish-all: at least one platform succeeded)
    1 - Platform or storage failure
    2 - A platform rejected its API key, or a stored key cannot be decrypted
    3 - Invalid input
    4 - Post or credential not found
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format: text or json
    #[arg(short, long, global = true, default_value = "text")]
    format: String,

    /// Key used to decrypt stored API keys
    #[arg(long, global = true, env = "SYNDICATE_ENCRYPTION_KEY", hide_env_values = true)]
    encryption_key: Option<String>,

    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a draft post and print its id
    New {
        /// Post title
        #[arg(short, long)]
        title: String,

        /// Markdown content (reads from stdin if not provided)
        content: Option<String>,

        /// Tag to attach (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,

        /// Cover image URL
        #[arg(long)]
        cover_image: Option<String>,

        /// Canonical URL of the original article
        #[arg(long)]
        canonical_url: Option<String>,
    },

    /// Publish a post to one platform
    Publish {
        post_id: String,
        /// medium, devto or wordpress
        platform: String,
    },

    /// Publish a post to every platform with an active credential
    PublishAll { post_id: String },

    /// Clear a platform's publication record on a post
    Unpublish { post_id: String, platform: String },

    /// Show a post and its per-platform status
    Show { post_id: String },

    /// Delete a post locally
    Delete { post_id: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

fn parse_format(format: &str) -> Result<OutputFormat> {
    match format {
        "text" => Ok(OutputFormat::Text),
        "json" => Ok(OutputFormat::Json),
        other => Err(SyndicateError::Validation(format!(
            "Invalid format '{}'. Must be 'text' or 'json'",
            other
        ))),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    LoggingConfig::from_env().with_verbose(cli.verbose).init();

    match run(cli).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(e.exit_code());
        }
    }
}

async fn run(cli: Cli) -> Result<i32> {
    let format = parse_format(&cli.format)?;
    let config = Config::load()?;

    match cli.command {
        Commands::New {
            title,
            content,
            tags,
            cover_image,
            canonical_url,
        } => {
            let content = match content {
                Some(content) => content,
                None => read_stdin()?,
            };
            let input = NewPost {
                title,
                content,
                tags,
                cover_image,
                canonical_url,
            };
            let post = post_service(&config).await?.create(input).await?;
            match format {
                OutputFormat::Json => print_json(&post),
                OutputFormat::Text => println!("{}", post.id),
            }
        }
        Commands::Publish { post_id, platform } => {
            let platform: Platform = platform.parse()?;
            let service = service(&config, cli.encryption_key).await?;
            let response = service.publishing().publish_one(&post_id, platform).await?;
            output_publish(&response, format);
        }
        Commands::PublishAll { post_id } => {
            let service = service(&config, cli.encryption_key).await?;
            let progress = (format == OutputFormat::Text)
                .then(|| tokio::spawn(report_progress(service.subscribe())));

            let result = service.publishing().publish_all(&post_id).await;
            // Dropping the service closes the bus so the reporter drains and exits
            drop(service);
            if let Some(progress) = progress {
                let _ = progress.await;
            }

            let response = result?;
            output_publish_all(&response, format);
            if !response.success {
                return Ok(1);
            }
        }
        Commands::Unpublish { post_id, platform } => {
            let service = service(&config, cli.encryption_key).await?;
            let response = service.publishing().unpublish(&post_id, &platform).await?;
            output_unpublish(&response, format);
        }
        Commands::Show { post_id } => {
            let post = post_service(&config).await?.get(&post_id).await?;
            match format {
                OutputFormat::Json => print_json(&post),
                OutputFormat::Text => output_post_text(&post),
            }
        }
        Commands::Delete { post_id } => {
            post_service(&config).await?.delete(&post_id).await?;
            match format {
                OutputFormat::Json => print_json(&serde_json::json!({ "postId": post_id, "deleted": true })),
                OutputFormat::Text => println!("Deleted post {}", post_id),
            }
        }
    }

    Ok(0)
}

/// Post storage without credentials, so drafting works without the key
async fn post_service(config: &Config) -> Result<PostService> {
    let db = Database::new(&config.database_path()).await?;
    Ok(PostService::new(db))
}

async fn service(config: &Config, encryption_key: Option<String>) -> Result<SyndicateService> {
    let codec = match encryption_key {
        Some(key) => Codec::new(&key)?,
        None => Codec::from_env()?,
    };
    SyndicateService::from_config(config, codec).await
}

/// Print per-platform progress to stderr as each platform settles
async fn report_progress(mut events: EventReceiver) {
    loop {
        match events.recv().await {
            Ok(event) => print_progress(&event),
            Err(RecvError::Lagged(_)) => continue,
            Err(RecvError::Closed) => break,
        }
    }
}

fn print_progress(event: &Event) {
    match event {
        Event::PublishStarted { platforms, .. } => {
            let names: Vec<&str> = platforms.iter().map(|p| p.display_name()).collect();
            eprintln!("Publishing to {}...", names.join(", "));
        }
        Event::PlatformSucceeded { platform, url, .. } => {
            eprintln!("  ✓ {} {}", platform.display_name(), url.as_deref().unwrap_or_default());
        }
        Event::PlatformFailed { platform, error, .. } => {
            eprintln!("  ✗ {}: {}", platform.display_name(), error);
        }
        Event::PublishCompleted { .. } => {}
    }
}

fn read_stdin() -> Result<String> {
    if atty::is(atty::Stream::Stdin) {
        return Err(SyndicateError::Validation(
            "No content provided. Pass it as an argument or pipe it via stdin".to_string(),
        ));
    }

    let mut content = String::new();
    io::stdin()
        .read_to_string(&mut content)
        .map_err(|e| SyndicateError::Validation(format!("Failed to read stdin: {}", e)))?;
    Ok(content)
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => tracing::error!("Failed to serialize output: {}", e),
    }
}

fn output_publish(response: &PublishResponse, format: OutputFormat) {
    if format == OutputFormat::Json {
        print_json(response);
        return;
    }

    let status = response
        .platform_status
        .get(&response.platform)
        .cloned()
        .unwrap_or_default();
    let location = status
        .url
        .or(status.external_id)
        .unwrap_or_else(|| "(no url returned)".to_string());
    println!("✓ {}: {}", response.platform, location);
}

fn output_publish_all(response: &PublishAllResponse, format: OutputFormat) {
    if format == OutputFormat::Json {
        print_json(response);
        return;
    }

    for platform in &response.successes {
        println!("✓ {}", platform);
    }
    if let Some(errors) = &response.errors {
        println!("{} platform(s) failed", errors.len());
    }
}

fn output_unpublish(response: &UnpublishResponse, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(response),
        OutputFormat::Text => println!(
            "Cleared {} status for post {}",
            response.platform, response.post_id
        ),
    }
}

fn output_post_text(post: &Post) {
    println!("{}", post.title);
    println!("  id:      {}", post.id);
    println!("  status:  {}", post.status.as_str());
    if !post.tags.is_empty() {
        println!("  tags:    {}", post.tags.join(", "));
    }
    for (platform, status) in &post.platform_status {
        if status.published {
            let when = status
                .published_at
                .and_then(|ts| chrono::DateTime::from_timestamp(ts, 0))
                .map(|dt| dt.format("%Y-%m-%d %H:%M UTC").to_string())
                .unwrap_or_default();
            println!(
                "  {:<10} published {} {}",
                platform.display_name(),
                when,
                status.url.as_deref().unwrap_or_default()
            );
        } else {
            println!("  {:<10} not published", platform.display_name());
        }
    }
}
