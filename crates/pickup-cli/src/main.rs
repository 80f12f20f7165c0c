//! `pickup` - generate and manage pickup lines from the terminal.
//!
//! Reads `.env` if present. Connection settings come from
//! `PICKUP_API_URL`, `PICKUP_API_TOKEN` and `PICKUP_TIMEOUT_SECS`, and can
//! be overridden with `--api-url` / `--token`.

mod print;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use pickup_client::{ClientConfig, PickupClient};
use pickup_core::{HistoryFilters, PickupApi, RecordUpdate, Style};
use pickup_flows::{
    Clipboard, ClipboardError, FlowError, GeneratorFlow, HistoryFlow, SettingsFlow, StatsFlow,
};
use tracing::{debug, warn};

#[derive(Debug, Parser)]
#[command(name = "pickup")]
#[command(about = "Generate, rate and track AI pickup lines")]
struct Args {
    /// API root (falls back to PICKUP_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Bearer token (falls back to PICKUP_API_TOKEN)
    #[arg(long, global = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Log in and print a token to export as PICKUP_API_TOKEN
    Login {
        username: String,
        /// Falls back to PICKUP_PASSWORD
        #[arg(long)]
        password: Option<String>,
    },

    /// Create an account and print its token
    Register {
        username: String,
        email: String,
        /// Falls back to PICKUP_PASSWORD
        #[arg(long)]
        password: Option<String>,
    },

    /// Show the logged-in user
    Whoami,

    /// Generate a pickup line for someone
    Generate {
        /// Who the line is for, e.g. "loves hiking"
        description: String,

        /// 1-10 (defaults to the saved setting)
        #[arg(short, long)]
        dirtiness: Option<i64>,

        /// playful, romantic, funny, cheesy or unhinged (defaults to the saved setting)
        #[arg(short, long)]
        style: Option<Style>,

        /// Ask for this many extra takes after the first
        #[arg(long, default_value_t = 0)]
        again: u32,

        /// Copy the final line to the system clipboard
        #[arg(long)]
        copy: bool,
    },

    /// Get a new line from an existing history record
    Regenerate { id: String },

    /// List past lines
    History {
        #[arg(long, default_value_t = 1)]
        page: u32,

        #[arg(long, default_value_t = pickup_core::DEFAULT_PER_PAGE)]
        per_page: u32,

        #[arg(long)]
        style: Option<Style>,

        /// Only lines rated at least this many stars
        #[arg(long)]
        min_rating: Option<u8>,

        #[arg(long)]
        used_only: bool,

        #[arg(long)]
        success_only: bool,

        /// Narrow the fetched page by text
        #[arg(long)]
        search: Option<String>,
    },

    /// Rate a line 1-5 stars
    Rate { id: String, stars: u8 },

    /// Mark a line as used (or not, with --undo)
    MarkUsed {
        id: String,
        #[arg(long)]
        undo: bool,
    },

    /// Mark a used line as successful (or not, with --undo)
    MarkSuccess {
        id: String,
        #[arg(long)]
        undo: bool,
    },

    /// Attach notes to a line; an empty string clears them
    Note { id: String, text: String },

    /// Delete a line from history
    Delete { id: String },

    /// Show usage statistics
    Stats,

    /// Show or change generation settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },

    /// List the models the server offers
    Models,
}

#[derive(Debug, Subcommand)]
enum SettingsAction {
    /// Print the current settings
    Show,

    /// Change one or more fields and save
    Set {
        #[arg(long)]
        model: Option<String>,

        /// 0.0-2.0, snapped to 0.1
        #[arg(long)]
        temperature: Option<f64>,

        /// 50-500, snapped to 10
        #[arg(long)]
        max_tokens: Option<i64>,

        /// 1-10
        #[arg(long)]
        dirtiness: Option<i64>,

        #[arg(long)]
        style: Option<Style>,

        #[arg(long)]
        emojis: Option<bool>,

        /// May use {description}, {dirtiness} and {style}
        #[arg(long, conflicts_with = "clear_template")]
        template: Option<String>,

        /// Go back to the built-in prompts
        #[arg(long)]
        clear_template: bool,
    },

    /// Show the prompt a request would be sent with
    Preview {
        description: String,
        #[arg(short, long)]
        dirtiness: Option<i64>,
        #[arg(short, long)]
        style: Option<Style>,
    },

    /// Copy the selected model id to the clipboard
    CopyModel,
}

/// The system clipboard.
struct SystemClipboard;

impl Clipboard for SystemClipboard {
    fn set_text(&self, text: &str) -> Result<(), ClipboardError> {
        let mut clipboard =
            arboard::Clipboard::new().map_err(|e| ClipboardError(e.to_string()))?;
        clipboard
            .set_text(text)
            .map_err(|e| ClipboardError(e.to_string()))
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = config(&args)?;

    match args.command {
        Command::Login { username, password } => {
            let password = password_or_env(password)?;
            let client = PickupClient::login(config, &username, &password).await?;
            print::token(client.token());
        }
        Command::Register {
            username,
            email,
            password,
        } => {
            let password = password_or_env(password)?;
            let client = PickupClient::register(config, &username, &email, &password).await?;
            print::token(client.token());
        }
        Command::Whoami => {
            let user = PickupClient::new(config)?.me().await?;
            println!("{} <{}> (id {})", user.username, user.email, user.id);
        }
        Command::Generate {
            description,
            dirtiness,
            style,
            again,
            copy,
        } => {
            let generator = GeneratorFlow::new(api(config)?);
            generator.init().await;
            if let Some(level) = dirtiness {
                generator.set_dirtiness(level).await;
            }
            if let Some(style) = style {
                generator.set_style(style).await;
            }
            generator.set_description(description).await;

            generator.generate().await?;
            for _ in 0..again {
                print::generated(&generator.state().await);
                generator.regenerate().await?;
            }
            let state = generator.state().await;
            print::generated(&state);

            if copy {
                generator.copy(&SystemClipboard).await?;
                println!("Copied!");
            }
        }
        Command::Regenerate { id } => {
            let generated = api(config)?.regenerate(&id).await?;
            println!("{}", generated.pickup_line);
            println!("  id: {}", generated.history_id);
        }
        Command::History {
            page,
            per_page,
            style,
            min_rating,
            used_only,
            success_only,
            search,
        } => {
            let history = HistoryFlow::with_per_page(api(config)?, per_page);
            let filters = HistoryFilters {
                style,
                min_rating,
                used_only,
                success_only,
            };
            history.open(page, filters).await?;
            if let Some(search) = search {
                history.set_search(search).await;
            }
            print::history(&history.state().await);
        }
        Command::Rate { id, stars } => {
            if !pickup_core::is_valid_rating(stars) {
                return Err("stars must be between 1 and 5".into());
            }
            update(config, &id, RecordUpdate::rating(stars)).await?;
            println!("Rated {} {}", id, print::stars(stars));
        }
        Command::MarkUsed { id, undo } => {
            update(config, &id, RecordUpdate::used(!undo)).await?;
            println!("{} marked as {}", id, if undo { "unused" } else { "used" });
        }
        Command::MarkSuccess { id, undo } => {
            update(config, &id, RecordUpdate::success(!undo)).await?;
            println!(
                "{} marked as {}",
                id,
                if undo { "unsuccessful" } else { "successful" }
            );
        }
        Command::Note { id, text } => {
            update(config, &id, RecordUpdate::notes(text)).await?;
            println!("Notes saved for {}", id);
        }
        Command::Delete { id } => {
            api(config)?
                .delete_history(&id)
                .await
                .map_err(|e| FlowError::request(e, "Failed to delete pickup line"))?;
            println!("Deleted {}", id);
        }
        Command::Stats => {
            let view = StatsFlow::new(api(config)?).load().await?;
            print::stats(&view);
        }
        Command::Settings { action } => settings(config, action).await?,
        Command::Models => {
            let flow = SettingsFlow::new(api(config)?);
            load_settings(&flow).await?;
            print::models(&flow.state().await);
        }
    }

    Ok(())
}

fn config(args: &Args) -> Result<ClientConfig, Box<dyn std::error::Error>> {
    let mut config = ClientConfig::from_env()?;
    if let Some(url) = &args.api_url {
        config.base_url = url.trim_end_matches('/').to_string();
    }
    if let Some(token) = &args.token {
        config.token = Some(token.clone());
    }
    config.validate()?;
    debug!("Using API at {}", config.base_url);
    Ok(config)
}

fn api(config: ClientConfig) -> Result<Arc<dyn PickupApi>, Box<dyn std::error::Error>> {
    Ok(Arc::new(PickupClient::new(config)?))
}

fn password_or_env(password: Option<String>) -> Result<String, Box<dyn std::error::Error>> {
    password
        .or_else(|| std::env::var("PICKUP_PASSWORD").ok())
        .ok_or_else(|| "Missing password (--password or PICKUP_PASSWORD)".into())
}

async fn update(
    config: ClientConfig,
    id: &str,
    update: RecordUpdate,
) -> Result<(), Box<dyn std::error::Error>> {
    api(config)?
        .update_record(id, update)
        .await
        .map_err(|e| FlowError::request(e, "Failed to update pickup line"))?;
    Ok(())
}

/// Load settings, tolerating a missing model catalog.
async fn load_settings(flow: &SettingsFlow) -> Result<(), FlowError> {
    match flow.load().await {
        Err(FlowError::PartialLoad {
            part: pickup_flows::LoadPart::Models,
            message,
        }) => {
            warn!("Model catalog unavailable: {}", message);
            Ok(())
        }
        other => other,
    }
}

async fn settings(
    config: ClientConfig,
    action: SettingsAction,
) -> Result<(), Box<dyn std::error::Error>> {
    let flow = SettingsFlow::new(api(config)?);
    load_settings(&flow).await?;

    match action {
        SettingsAction::Show => print::settings(&flow.state().await),
        SettingsAction::Set {
            model,
            temperature,
            max_tokens,
            dirtiness,
            style,
            emojis,
            template,
            clear_template,
        } => {
            if let Some(model) = model {
                flow.set_preferred_model(model).await;
            }
            if let Some(value) = temperature {
                flow.set_temperature(value).await;
            }
            if let Some(value) = max_tokens {
                flow.set_max_tokens(value).await;
            }
            if let Some(value) = dirtiness {
                flow.set_default_dirtiness(value).await;
            }
            if let Some(style) = style {
                flow.set_preferred_style(style).await;
            }
            if let Some(include) = emojis {
                flow.set_include_emojis(include).await;
            }
            if template.is_some() || clear_template {
                flow.set_prompt_template(template).await;
            }

            flow.save().await?;
            println!("Settings saved");
            print::settings(&flow.state().await);
        }
        SettingsAction::Preview {
            description,
            dirtiness,
            style,
        } => {
            let settings = flow.settings().await;
            let level = dirtiness
                .map(pickup_core::clamp_dirtiness)
                .unwrap_or(settings.default_dirtiness_level);
            let style = style.unwrap_or(settings.preferred_style);
            println!(
                "{}",
                settings.render_prompt(description.trim(), level, style)
            );
        }
        SettingsAction::CopyModel => {
            flow.copy_model_slug(&SystemClipboard).await?;
            println!("Copied {}", flow.settings().await.preferred_model);
        }
    }
    Ok(())
}
