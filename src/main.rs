//! LinkVault: client core of a personal bookmark manager.
//!
//! Without a subcommand it loads settings, installs logging and either checks
//! the configured hosted backend or runs a console demo against an in-memory
//! local store. `linkvault config ...` inspects and edits the settings file.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use linkvault::app::App;
use linkvault::database::Database;
use linkvault::managers::session_manager::SessionManagerTrait;
use linkvault::services::categorizer::categorize;
use linkvault::services::link_metadata::{display_icon, favicon_url, generate_title};
use linkvault::services::link_view::{filter_links, group_by_category};
use linkvault::services::settings_engine::{SettingKey, SettingsEngine, SettingsEngineTrait};
use linkvault::services::share_intent::{strip_share_params, ShareIntent};
use linkvault::types::link::{LinkDraft, LinkPatch};
use linkvault::types::session::Credentials;
use linkvault::types::settings::{Backend, ClientSettings, LogFormat};

#[derive(Parser)]
#[command(name = "linkvault")]
#[command(version)]
#[command(about = "LinkVault bookmark client core")]
struct Cli {
    /// Settings file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Inspect or change the settings file
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Config subcommands
#[derive(Debug, Subcommand)]
enum ConfigCommand {
    /// Show the effective settings
    Show,
    /// Print the settings file location
    Path,
    /// Print one value, e.g. `remote.url`
    Get { key: SettingKey },
    /// Validate and store one value
    Set { key: SettingKey, value: String },
    /// Restore the defaults
    Reset,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let mut engine = load_settings(cli.config);
    init_logging(engine.get_settings());

    let result = match cli.command {
        Some(Command::Config { command }) => run_config(&mut engine, command),
        None => run(engine.get_settings()).await,
    };

    if let Err(e) = result {
        tracing::error!("LinkVault error: {}", e);
        std::process::exit(1);
    }
}

/// Loads the settings file and applies `LINKVAULT_*` overrides.
fn load_settings(path: Option<PathBuf>) -> SettingsEngine {
    let mut engine = SettingsEngine::new(path);
    if let Err(e) = engine.load() {
        eprintln!("Failed to load settings, using defaults: {}", e);
    }
    engine.apply_env_overrides();
    engine
}

fn run_config(engine: &mut SettingsEngine, command: ConfigCommand) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        ConfigCommand::Show => {
            for key in SettingKey::ALL {
                let mut value = engine.get_value(key);
                if key == SettingKey::AnonKey && !value.is_empty() {
                    value = mask(&value);
                }
                let source = if engine.is_overridden(key) { "  (env)" } else { "" };
                println!("{:<24}{}{}", key, value, source);
            }
        }
        ConfigCommand::Path => println!("{}", engine.config_path().display()),
        ConfigCommand::Get { key } => println!("{}", engine.get_value(key)),
        ConfigCommand::Set { key, value } => {
            engine.set_value(key, &value)?;
            println!("✓ {} saved to {}", key, engine.config_path().display());
            if engine.is_overridden(key) {
                println!("  {} is currently overridden by the environment", key);
            }
        }
        ConfigCommand::Reset => {
            engine.reset()?;
            println!("✓ Settings reset: {}", engine.config_path().display());
        }
    }
    Ok(())
}

/// Keeps the first four characters of a secret.
fn mask(secret: &str) -> String {
    let shown: String = secret.chars().take(4).collect();
    format!("{}…", shown)
}

async fn run(settings: &ClientSettings) -> Result<(), Box<dyn std::error::Error>> {
    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                 LinkVault v{} · Client Core                ║", env!("CARGO_PKG_VERSION"));
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();

    match settings.remote.backend {
        Backend::Supabase => check_remote(settings).await,
        Backend::Local => run_demo(settings).await,
    }
}

fn init_logging(settings: &ClientSettings) {
    let filter = EnvFilter::try_new(&settings.logging.level).unwrap_or_else(|_| EnvFilter::new("info"));

    match settings.logging.format {
        LogFormat::Json => fmt().json().with_env_filter(filter).with_target(true).init(),
        LogFormat::Pretty => fmt().pretty().with_env_filter(filter).with_target(true).init(),
    }
}

fn section(name: &str) {
    println!("───────────────────────────────────────────────────────────────");
    println!("  📦 {}", name);
    println!("───────────────────────────────────────────────────────────────");
}

async fn check_remote(settings: &ClientSettings) -> Result<(), Box<dyn std::error::Error>> {
    section("Hosted Backend");
    let mut app = App::new(settings)?;
    match app.startup().await {
        Some(session) => {
            println!("  Signed in as {}", session.user.email.as_deref().unwrap_or(&session.user.id));
            println!("  {} links, {} categories", app.link_store.list().len(), app.link_store.categories().len());
        }
        None => println!("  No active session"),
    }
    app.shutdown();
    Ok(())
}

async fn run_demo(settings: &ClientSettings) -> Result<(), Box<dyn std::error::Error>> {
    let db = Arc::new(Database::open_in_memory()?);
    let mut app = App::with_database(settings, db)?;

    section("Session");
    app.startup().await;
    let credentials = Credentials::new("demo@linkvault.local", "correct horse battery");
    let session = app.session_manager.sign_up(&credentials, true).await?;
    app.sync_links().await;
    println!("  Registered {}", session.user.email.as_deref().unwrap_or("?"));
    println!("  ✓ Session active, expires {}", session.expires_at);
    println!();

    section("Links");
    let known = app.link_store.categories();
    for url in [
        "https://github.com/rust-lang/rust",
        "https://www.figma.com/community",
        "https://news.ycombinator.com",
        "https://www.booking.com",
    ] {
        let draft = LinkDraft {
            url: url.to_string(),
            title: generate_title(url),
            icon: favicon_url(url).unwrap_or_default(),
            category: categorize(url, &known),
        };
        app.link_store.create(draft.validate()?).await?;
    }
    for link in app.link_store.list() {
        println!("  [{}] {} -> {}", link.category, link.title, link.url);
    }

    if let Some(first) = app.link_store.list().first() {
        app.link_store.update(&first.id, LinkPatch::category("Reading")).await?;
    }
    println!("  Categories: {}", app.link_store.categories().join(", "));
    println!();

    section("Categories");
    app.link_store.delete_category("Design").await?;
    let links = app.link_store.list();
    let categories = app.link_store.categories();
    let visible = filter_links(&links, "");
    for group in group_by_category(&visible, &categories) {
        println!("  {} ({})", group.category, group.links.len());
        for link in group.links {
            println!("    {} {}", link.title, display_icon(link).unwrap_or_default());
        }
    }
    println!();

    section("Share Target");
    let address = "https://app.linkvault.local/?title=Rust%20Blog&url=https%3A%2F%2Fblog.rust-lang.org&ref=share";
    if let Some((_, query)) = address.split_once('?') {
        if let Some(intent) = ShareIntent::from_query(query) {
            let draft = intent.to_draft(&categories);
            println!("  Draft: {} → {} [{}]", draft.title, draft.url, draft.category);
        }
    }
    println!("  Address after close: {}", strip_share_params(address));
    println!();

    app.session_manager.sign_out().await;
    app.sync_links().await;
    println!("  ✓ Signed out, {} cached links", app.link_store.list().len());
    app.shutdown();
    Ok(())
}
