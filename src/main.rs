//! passfill command-line client.
//!
//! Runs the popup flows against a page loaded from an HTML file, manages the
//! stored auth token and edits the configuration.

use std::fs;
use std::io::Read;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::debug;

use passfill::app::App;
use passfill::logging;
use passfill::managers::tab_manager::TabManagerTrait;
use passfill::platform;
use passfill::services::content_script::ContentScript;
use passfill::services::popup_controller::PopupState;
use passfill::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use passfill::types::settings::LocatorStrategy;

/// passfill CLI.
#[derive(Parser)]
#[command(name = "passfill")]
#[command(about = "Fill login forms from a local password manager")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the extension storage database
    #[arg(long, global = true, env = "PASSFILL_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log level when RUST_LOG is unset
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show which inputs would receive the username and password
    Locate {
        /// HTML file to inspect ("-" for stdin)
        html: PathBuf,
        #[arg(long, value_enum)]
        strategy: Option<Strategy>,
    },
    /// Request credentials for a page and fill it
    Fill {
        /// Page URL used for the lookup
        #[arg(long)]
        url: String,
        /// HTML of the page ("-" for stdin)
        html: PathBuf,
        /// Entry to use when several match (1-based)
        #[arg(long)]
        select: Option<usize>,
    },
    /// Manage the auth token for the HTTP transport
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },
    /// Show or change configuration
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(Subcommand)]
enum TokenAction {
    Set { token: String },
    Clear,
    Status,
}

#[derive(Subcommand)]
enum SettingsAction {
    Show,
    /// Set a value by dot-notation key, e.g. `transport.kind native`
    Set { key: String, value: String },
    Reset,
}

#[derive(Clone, Copy, ValueEnum)]
enum Strategy {
    Scoped,
    Attribute,
}

impl From<Strategy> for LocatorStrategy {
    fn from(s: Strategy) -> Self {
        match s {
            Strategy::Scoped => LocatorStrategy::Scoped,
            Strategy::Attribute => LocatorStrategy::Attribute,
        }
    }
}

fn read_html(path: &PathBuf) -> Result<String, Box<dyn std::error::Error>> {
    if path.as_os_str() == "-" {
        let mut html = String::new();
        std::io::stdin().read_to_string(&mut html)?;
        Ok(html)
    } else {
        Ok(fs::read_to_string(path)?)
    }
}

fn settings_engine(cli: &Cli) -> SettingsEngine {
    SettingsEngine::new(cli.config.as_ref().map(|p| p.to_string_lossy().to_string()))
}

fn open_app(cli: &Cli) -> Result<App, Box<dyn std::error::Error>> {
    let data_dir = cli.data_dir.clone().unwrap_or_else(platform::get_data_dir);
    fs::create_dir_all(&data_dir)?;
    let db_path = data_dir.join(platform::STORAGE_DB_FILE);
    debug!(db = %db_path.display(), "opening storage");
    App::new(&db_path.to_string_lossy(), &mut settings_engine(cli))
}

fn describe_field(script: &ContentScript, id: Option<usize>) -> String {
    match id.and_then(|id| script.document().input(id)) {
        Some(input) => format!(
            "input #{} (name={:?}, id={:?}, type={:?})",
            input.id,
            input.attr("name").unwrap_or(""),
            input.attr("id").unwrap_or(""),
            input.input_type().unwrap_or_default()
        ),
        None => "not found".to_string(),
    }
}

async fn run_fill(
    cli: &Cli,
    url: &str,
    html: &str,
    select: Option<usize>,
) -> Result<(), Box<dyn std::error::Error>> {
    let app = open_app(cli)?;
    let tab_id = app
        .tabs
        .lock()
        .map_err(|e| e.to_string())?
        .open_tab(url, Some(html), true);

    let mut popup = app.popup();
    popup.click_fill().await?;

    if matches!(popup.state(), PopupState::Selection { .. }) {
        let items = popup.selection_items();
        match select {
            Some(n) if n >= 1 && n <= items.len() => popup.select_entry(n - 1)?,
            _ => {
                println!("Several entries match {}:", url);
                for (i, item) in items.iter().enumerate() {
                    println!("  {}. {} ({})", i + 1, item.label, item.detail);
                }
                println!("Re-run with --select <n> to choose one.");
                return Ok(());
            }
        }
    }

    match popup.state() {
        PopupState::Closed => {
            let tabs = app.tabs.lock().map_err(|e| e.to_string())?;
            if let Some(script) = tabs.content_script(&tab_id) {
                let fields = script.locate();
                println!("Filled username: {}", describe_field(script, fields.username));
                println!("Filled password: {}", describe_field(script, fields.password));
            }
            Ok(())
        }
        PopupState::Error { title, message } => Err(format!("{}: {}", title, message).into()),
        other => Err(format!("unexpected popup state: {}", other.name()).into()),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::init(&cli.log_level);

    match &cli.command {
        Commands::Locate { html, strategy } => {
            let html = read_html(html)?;
            let strategy = match strategy {
                Some(s) => (*s).into(),
                None => {
                    let mut engine = settings_engine(&cli);
                    engine.load()?.fill.locator_strategy
                }
            };
            let script = ContentScript::from_html(&html, strategy);
            let fields = script.locate();
            println!("username: {}", describe_field(&script, fields.username));
            println!("password: {}", describe_field(&script, fields.password));
        }

        Commands::Fill { url, html, select } => {
            let html = read_html(html)?;
            run_fill(&cli, url, &html, *select).await?;
        }

        Commands::Token { action } => {
            let app = open_app(&cli)?;
            match action {
                TokenAction::Set { token } => {
                    app.relay.set_token(token)?;
                    println!("Token saved");
                }
                TokenAction::Clear => {
                    app.relay.clear_token()?;
                    println!("Token cleared");
                }
                TokenAction::Status => {
                    if app.relay.has_token()? {
                        println!("Token is set");
                    } else {
                        println!("No token stored");
                    }
                }
            }
        }

        Commands::Settings { action } => {
            let mut engine = settings_engine(&cli);
            engine.load()?;
            match action {
                SettingsAction::Show => {
                    println!("# {}", engine.get_config_path());
                    println!("{}", serde_json::to_string_pretty(engine.get_settings())?);
                }
                SettingsAction::Set { key, value } => {
                    // Bare words are taken as strings.
                    let parsed = serde_json::from_str(value)
                        .unwrap_or_else(|_| serde_json::Value::String(value.clone()));
                    engine.set_value(key, parsed)?;
                    println!("{} updated", key);
                }
                SettingsAction::Reset => {
                    engine.reset()?;
                    println!("Settings reset to defaults");
                }
            }
        }
    }

    Ok(())
}
