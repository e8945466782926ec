//! DTU Console CLI
//!
//! Command-line front end for the DTU administration console runtime.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use dtu_console::interceptor::RequestOptions;
use dtu_console::{load_config, Config, ConsoleBuilder, ConsoleError};
use tracing::Level;

#[derive(Parser)]
#[command(name = "dtu-console")]
#[command(about = "Administration console client for the DTU")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Device base URL (overrides config file)
    #[arg(long)]
    base_url: Option<String>,

    /// Session storage file (overrides config file)
    #[arg(long)]
    storage: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: Level,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Authenticate against the device and store the session
    Login { username: String, password: String },
    /// Forget the stored session
    Logout,
    /// Show whether a session is stored
    Status,
    /// GET an API path and print the JSON response
    Get {
        path: String,
        /// View to return to after a forced login
        #[arg(long, default_value = "/")]
        origin: String,
        /// Do not route failures to the error view
        #[arg(long)]
        ignore_errors: bool,
    },
    /// POST a JSON document to an API path
    Post {
        path: String,
        data: String,
        /// View to return to after a forced login
        #[arg(long, default_value = "/")]
        origin: String,
    },
    /// Locale catalogs
    Locale {
        #[command(subcommand)]
        action: LocaleAction,
    },
    /// Print the live-data WebSocket URL with embedded credentials
    LiveUrl,
}

#[derive(Subcommand)]
enum LocaleAction {
    /// List known locales
    List,
    /// Show the active locale
    Show,
    /// Switch the active locale
    Set { code: String },
    /// Translate a message key in the active locale
    Translate { key: String },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .init();

    tracing::debug!(
        "Parsed command line arguments: config={:?}, base_url={:?}, storage={:?}, log_level={:?}",
        args.config,
        args.base_url,
        args.storage,
        args.log_level
    );

    let mut config = if let Some(config_path) = &args.config {
        tracing::debug!("Loading configuration from {:?}", config_path);
        load_config(config_path)?
    } else {
        tracing::debug!("Using default configuration");
        Config::default()
    };

    if let Some(base_url) = args.base_url {
        config.device.base_url = base_url;
    }
    if let Some(storage) = args.storage {
        config.storage.path = storage;
    }

    let mut console = ConsoleBuilder::new(config).build()?;

    match args.command {
        Command::Login { username, password } => {
            match console.login().login(&username, &password).await {
                Ok(_) => println!("Logged in as {}", username),
                Err(ConsoleError::InvalidCredentials) => {
                    console.locale_mut().initialize().await;
                    let message = console.locale().translate("login.invalidCredentials");
                    return Err(message.into());
                }
                Err(e) => return Err(e.into()),
            }
        }
        Command::Logout => {
            console.login().logout();
            println!("Logged out");
        }
        Command::Status => {
            if console.login().is_logged_in() {
                println!("Logged in");
            } else {
                println!("Not logged in");
            }
        }
        Command::Get {
            path,
            origin,
            ignore_errors,
        } => {
            let options = RequestOptions { ignore_errors };
            let data = console.api().get(&path, &origin, options).await?;
            println!("{}", serde_json::to_string_pretty(&data)?);
        }
        Command::Post { path, data, origin } => {
            let data: serde_json::Value = serde_json::from_str(&data)?;
            let response = console
                .api()
                .post_data(&path, &data, &origin, RequestOptions::default())
                .await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Command::Locale { action } => {
            let active = console.locale_mut().initialize().await;
            match action {
                LocaleAction::List => {
                    for locale in console.locale().known_locales() {
                        let marker = if locale.code == active { "*" } else { " " };
                        println!("{} {} {}", marker, locale.code, locale.name);
                    }
                }
                LocaleAction::Show => {
                    println!("{}", active);
                    let formats = console.locale().formats();
                    println!("{}", serde_json::to_string_pretty(formats.as_ref())?);
                }
                LocaleAction::Set { code } => {
                    let applied = console.locale_mut().set_locale(&code).await;
                    if applied != code.trim().to_ascii_lowercase() {
                        tracing::warn!("Locale '{}' unavailable, using '{}'", code, applied);
                    }
                    println!("{}", applied);
                }
                LocaleAction::Translate { key } => {
                    println!("{}", console.locale().translate(&key));
                }
            }
        }
        Command::LiveUrl => println!("{}", console.live_data_url()?),
    }

    Ok(())
}
