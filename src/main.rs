use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use widgetboard::api::ApiClient;
use widgetboard::chart;
use widgetboard::config::{Config, ConfigError, normalize_base_url};
use widgetboard::source::{SourceError, TaskSource};
use widgetboard::store::{FileStorage, StoreError, Upserted, WidgetStore};
use widgetboard::widget::{WidgetConfig, WidgetError};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Widget(#[from] WidgetError),
    #[error("failed to read {path}: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("no saved widget named `{0}`")]
    NotFound(String),
    #[error("widget `{0}` has no chart data for the current tasks")]
    NoChartData(String),
}

#[derive(Parser, Debug)]
#[command(name = "widgetboard", about = "Saved chart widgets over project task data")]
struct Cli {
    /// Task API base URL; overrides the environment default.
    #[arg(long, env = "WIDGETBOARD_API_BASE_URL")]
    base_url: Option<String>,

    /// Authorization header value sent with every API request.
    #[arg(long, env = "WIDGETBOARD_API_AUTH")]
    auth: Option<String>,

    /// Directory holding the saved-widget slot.
    #[arg(long, env = "WIDGETBOARD_STORE_DIR")]
    store_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List projects from the task API.
    Projects,
    /// List the tasks of one project.
    Tasks { project_id: String },
    /// Manage saved widgets.
    Widgets(WidgetsCommand),
    /// Fetch a saved widget's tasks and print its chart data.
    Chart { name: String },
}

#[derive(Args, Debug)]
struct WidgetsCommand {
    #[command(subcommand)]
    command: WidgetsSubcommand,
}

#[derive(Subcommand, Debug)]
enum WidgetsSubcommand {
    List,
    Show { name: String },
    Delete { name: String },
    /// Save (or replace by name) a widget read from a JSON file.
    Save { file: PathBuf },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WidgetSummary<'a> {
    widget_name: &'a str,
    chart_type: String,
    project_id: &'a str,
    project_name: &'a str,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = resolve_config(&cli)?;

    match cli.command {
        Command::Projects => run_projects(&config).await,
        Command::Tasks { project_id } => run_tasks(&config, &project_id).await,
        Command::Widgets(widgets) => run_widgets(&config, widgets),
        Command::Chart { name } => run_chart(&config, &name).await,
    }
}

/// Environment config with command-line flags applied on top.
fn resolve_config(cli: &Cli) -> Result<Config, CliError> {
    let mut config = Config::from_env()?;
    if let Some(base_url) = &cli.base_url {
        config.api.base_url = normalize_base_url(base_url);
    }
    if let Some(auth) = &cli.auth {
        config.api.auth = Some(auth.clone());
    }
    if let Some(store_dir) = &cli.store_dir {
        config.store_dir.clone_from(store_dir);
    }
    Ok(config)
}

fn open_store(config: &Config) -> WidgetStore<FileStorage> {
    WidgetStore::open(FileStorage::new(config.store_dir.clone()))
}

async fn run_projects(config: &Config) -> Result<(), CliError> {
    let client = ApiClient::new(config.api.clone())?;
    let projects = client.get_projects().await?;
    print_json(&projects)
}

async fn run_tasks(config: &Config, project_id: &str) -> Result<(), CliError> {
    let client = ApiClient::new(config.api.clone())?;
    let tasks = client.get_tasks_for_project(project_id).await?;
    print_json(&tasks)
}

fn run_widgets(config: &Config, widgets: WidgetsCommand) -> Result<(), CliError> {
    let mut store = open_store(config);
    match widgets.command {
        WidgetsSubcommand::List => {
            let summaries: Vec<WidgetSummary<'_>> = store
                .widgets()
                .iter()
                .map(|w| WidgetSummary {
                    widget_name: &w.widget_name,
                    chart_type: w.chart_type().to_string(),
                    project_id: &w.project_id,
                    project_name: &w.project_name,
                })
                .collect();
            print_json(&summaries)
        }
        WidgetsSubcommand::Show { name } => {
            let widget = store.get(&name).ok_or_else(|| CliError::NotFound(name.clone()))?;
            print_json(widget)
        }
        WidgetsSubcommand::Delete { name } => {
            if !store.delete(&name)? {
                return Err(CliError::NotFound(name));
            }
            info!(widget_name = %name, "widget deleted");
            Ok(())
        }
        WidgetsSubcommand::Save { file } => {
            let raw = std::fs::read_to_string(&file).map_err(|source| CliError::ReadFile { path: file.clone(), source })?;
            let widget = WidgetConfig::from_value(serde_json::from_str(&raw)?)?;
            widget.validate()?;
            let name = widget.widget_name.clone();
            match store.upsert(widget)? {
                Upserted::Inserted => info!(widget_name = %name, "widget saved"),
                Upserted::Replaced => info!(widget_name = %name, "widget replaced"),
            }
            Ok(())
        }
    }
}

async fn run_chart(config: &Config, name: &str) -> Result<(), CliError> {
    let store = open_store(config);
    let widget = store.get(name).ok_or_else(|| CliError::NotFound(name.to_string()))?;
    let client = ApiClient::new(config.api.clone())?;
    let tasks = client.get_tasks_for_project(&widget.project_id).await?;
    let data = chart::extract(&widget.chart, &tasks).ok_or_else(|| CliError::NoChartData(name.to_string()))?;
    print_json(&data)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
