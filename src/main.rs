//! CLI entry point for GeoInsight.
//!
//! Provides subcommands for browsing countries, fetching insights with weather
//! and air quality, reviewing saved snapshots and their analytics, and the
//! database tools. `aq` runs the air-quality pipeline on a local JSON file.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use geoinsight::airquality::{AirQualityView, Normalizer, select_latest};
use geoinsight::auth::{DbAction, Session, TokenStore, authorize};
use geoinsight::config::AppConfig;
use geoinsight::countries::{filter_countries, find_exact, load_countries, suggestions};
use geoinsight::dashboard::Dashboard;
use geoinsight::error::GeoError;
use geoinsight::fetch::BasicClient;
use geoinsight::fetch::auth::ApiKey;
use geoinsight::infra::backend::BackendClient;
use geoinsight::infra::openweather::OpenWeatherClient;
use geoinsight::infra::restcountries::RestCountriesClient;
use geoinsight::output::{
    RecordRow, append_record, export_file_name, print_json, render_air_quality, render_record,
    render_snapshot, render_stats, write_export,
};
use geoinsight::records::{RecordQuery, SortKey, SortOrder, group_by_country, load_records, stats_or_default};
use geoinsight::services::admin_api::{AdminApi, RestoreTarget};
use geoinsight::services::auth_api::{AuthApi, Credentials};
use geoinsight::services::records_api::{HISTORY_WINDOWS, RecordsApi};
use geoinsight::services::weather_api::WeatherApi;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "geoinsight")]
#[command(about = "Country insights with live weather and air quality", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in with email and password, or store a token issued elsewhere
    Login {
        #[arg(long, required_unless_present = "token", requires = "password")]
        email: Option<String>,

        #[arg(long)]
        password: Option<String>,

        /// Session token from an external identity provider
        #[arg(long, conflicts_with_all = ["email", "password"])]
        token: Option<String>,
    },
    /// Create an account and log in
    Register {
        #[arg(long)]
        email: String,

        #[arg(long)]
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// Show the logged-in user and role
    Whoami,
    /// List countries, optionally filtered by name or capital
    Countries {
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Country details, current weather and air quality
    Insights {
        country: String,

        /// Save the snapshot to your records
        #[arg(long, default_value_t = false)]
        save: bool,
    },
    /// Saved snapshots
    Records {
        #[command(subcommand)]
        command: RecordsCommand,
    },
    /// Temperature, humidity and PM2.5 trend for a saved location
    History {
        location: String,

        #[arg(short, long, default_value_t = 7, value_parser = parse_days)]
        days: u32,
    },
    /// PM2.5 averages and peaks across saved capitals
    Compare {
        #[arg(short, long, default_value_t = 7, value_parser = parse_days)]
        days: u32,
    },
    /// Database backup, restore, export and import
    Db {
        #[command(subcommand)]
        command: DbCommand,
    },
    /// Run the air-quality pipeline on a JSON payload from disk
    Aq {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Location given to readings from a flat pollutant map
        #[arg(long)]
        label: Option<String>,

        /// Treat the payload as a provider fallback response
        #[arg(long, default_value_t = false)]
        fallback: bool,
    },
}

#[derive(Subcommand)]
enum RecordsCommand {
    /// List saved snapshots
    List {
        /// Only countries containing this text
        #[arg(long)]
        country: Option<String>,

        #[arg(long, value_parser = parse_date)]
        since: Option<DateTime<Utc>>,

        #[arg(long, value_parser = parse_date)]
        until: Option<DateTime<Utc>>,

        #[arg(long, value_enum, default_value_t = SortArg::Createdat)]
        sort: SortArg,

        /// Oldest / lowest first
        #[arg(long, default_value_t = false)]
        asc: bool,

        /// Group the listing by country
        #[arg(long, default_value_t = false)]
        group: bool,

        /// CSV file to append the listed records to
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Delete a saved snapshot
    Delete { id: String },
    /// Record and country counts
    Stats,
}

#[derive(Subcommand)]
enum DbCommand {
    /// Create a backup of the whole database
    Backup,
    /// Restore the latest backup, or the one given
    Restore { id: Option<String> },
    /// Download an export
    Export {
        /// Gzip compress the export file
        #[arg(long, default_value_t = false)]
        gzip: bool,

        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,
    },
    /// Upload a JSON export
    Import {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SortArg {
    Createdat,
    Country,
    Temperature,
}

impl From<SortArg> for SortKey {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Createdat => SortKey::CreatedAt,
            SortArg::Country => SortKey::Country,
            SortArg::Temperature => SortKey::Temperature,
        }
    }
}

fn parse_days(raw: &str) -> Result<u32, String> {
    let days: u32 = raw.parse().map_err(|_| format!("'{raw}' is not a number"))?;
    if HISTORY_WINDOWS.contains(&days) {
        Ok(days)
    } else {
        Err(format!("days must be one of {HISTORY_WINDOWS:?}"))
    }
}

fn parse_date(raw: &str) -> Result<DateTime<Utc>, String> {
    geoinsight::airquality::parse_timestamp(raw).ok_or_else(|| format!("'{raw}' is not a date"))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/geoinsight.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("geoinsight.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let app = App::new(AppConfig::from_env()?)?;

    match cli.command {
        Commands::Login {
            email,
            password,
            token,
        } => {
            let token = match (token, email, password) {
                (Some(token), _, _) => token,
                (None, Some(email), Some(password)) => {
                    app.backend()?.login(&Credentials { email, password }).await?
                }
                _ => anyhow::bail!("either --token or --email with --password is required"),
            };
            let session = app.store.save(&token)?;
            info!(user = %session.display_name(), role = %session.role(), "Logged in");
        }
        Commands::Register { email, password } => {
            let token = app.backend()?.register(&Credentials { email, password }).await?;
            let session = app.store.save(&token)?;
            info!(user = %session.display_name(), "Registered and logged in");
        }
        Commands::Logout => {
            app.store.clear()?;
            info!("Logged out");
        }
        Commands::Whoami => match &app.session {
            Some(session) => info!(
                user = %session.display_name(),
                role = %session.role(),
                user_id = session.user_id().unwrap_or("-"),
                "Session"
            ),
            None => info!("Not logged in"),
        },
        Commands::Countries { search } => {
            let countries = load_countries(&app.countries()).await;
            let filtered = filter_countries(&countries, search.as_deref().unwrap_or(""));
            for country in &filtered {
                println!("{} ({})", country.name, country.capital);
            }
            info!(shown = filtered.len(), total = countries.len(), "Countries listed");
        }
        Commands::Insights { country, save } => insights(&app, &country, save).await?,
        Commands::Records { command } => records(&app, command).await?,
        Commands::History { location, days } => {
            app.require_session()?;
            let points = app.backend()?.history(&location, days).await?;
            info!(location = %location, days, points = points.len(), "History fetched");
            print_json(&points)?;
        }
        Commands::Compare { days } => {
            app.require_session()?;
            let comparison = app.backend()?.compare_air_quality(days).await?;
            info!(days, capitals = comparison.len(), "Comparison fetched");
            print_json(&comparison)?;
        }
        Commands::Db { command } => db(&app, command).await?,
        Commands::Aq {
            file,
            label,
            fallback,
        } => {
            let raw = std::fs::read(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let payload: serde_json::Value = serde_json::from_slice(&raw)?;

            let mut normalizer = Normalizer::new();
            if let Some(label) = label.as_deref() {
                normalizer = normalizer.fallback_label(label);
            }
            let measurements = normalizer.normalize(&payload);
            let selection = select_latest(&measurements);
            info!(
                normalized = measurements.len(),
                latest = selection.latest.len(),
                "Pipeline finished"
            );
            print_json(&selection.latest)?;
            print!("{}", render_air_quality(&AirQualityView::build(&measurements, fallback)));
        }
    }

    Ok(())
}

/// Configuration, the stored session, and one shared transport for every
/// client built from them.
struct App {
    config: AppConfig,
    store: TokenStore,
    session: Option<Session>,
    http: Arc<BasicClient>,
}

impl App {
    fn new(config: AppConfig) -> Result<Self> {
        let store = TokenStore::new(&config.token_path);
        let session = store.load()?;
        let http = Arc::new(BasicClient::with_timeout(config.timeout)?);
        Ok(Self {
            config,
            store,
            session,
            http,
        })
    }

    fn require_session(&self) -> Result<&Session> {
        Ok(self.session.as_ref().ok_or(GeoError::NotAuthenticated)?)
    }

    fn backend(&self) -> Result<BackendClient<ApiKey<Arc<BasicClient>>>> {
        let http = ApiKey::new(self.http.clone(), "x-api-key", &self.config.backend_api_key)?;
        let client = BackendClient::new(http, &self.config.backend_url);
        Ok(match &self.session {
            Some(session) => client.with_token(&session.token),
            None => client,
        })
    }

    fn countries(&self) -> RestCountriesClient<Arc<BasicClient>> {
        RestCountriesClient::new(self.http.clone(), &self.config.countries_url)
    }

    fn weather(&self) -> Option<OpenWeatherClient<Arc<BasicClient>>> {
        let key = self.config.openweather_key.as_deref()?;
        Some(OpenWeatherClient::new(self.http.clone(), &self.config.weather_url, key))
    }
}

#[tracing::instrument(skip(app))]
async fn insights(app: &App, country: &str, save: bool) -> Result<()> {
    let countries = app.countries();
    let weather = app.weather();
    let backend = app.backend()?;

    // Prefer the canonical spelling when the name is in the list.
    let listed = load_countries(&countries).await;
    let name = match find_exact(&listed, country) {
        Some(found) => found.name.clone(),
        None => {
            let close: Vec<&str> = suggestions(&listed, country)
                .iter()
                .map(|c| c.name.as_str())
                .collect();
            if !close.is_empty() {
                warn!(country, suggestions = ?close, "No exact country match");
            }
            country.trim().to_string()
        }
    };

    let dashboard = Dashboard::new(
        &countries,
        weather.as_ref().map(|w| w as &dyn WeatherApi),
        &backend,
        app.session.as_ref(),
    );
    let snapshot = dashboard.insights(&name).await?;
    print!("{}", render_snapshot(&snapshot));

    if save {
        dashboard.save(&snapshot).await?;
    }
    Ok(())
}

async fn records(app: &App, command: RecordsCommand) -> Result<()> {
    app.require_session()?;
    let backend = app.backend()?;

    match command {
        RecordsCommand::List {
            country,
            since,
            until,
            sort,
            asc,
            group,
            csv,
        } => {
            let entries = load_records(&backend).await?;
            let query = RecordQuery {
                country,
                since,
                until,
                sort: sort.into(),
                order: if asc {
                    SortOrder::Ascending
                } else {
                    SortOrder::Descending
                },
            };
            let listed = query.apply(&entries);
            info!(total = entries.len(), shown = listed.len(), "Records loaded");

            if group {
                for (country, group) in group_by_country(&listed) {
                    println!("== {country} ({})", group.len());
                    for entry in group {
                        print!("{}", render_record(entry));
                    }
                }
            } else {
                for entry in &listed {
                    print!("{}", render_record(entry));
                }
            }

            if let Some(path) = csv {
                for entry in &listed {
                    append_record(&path, &RecordRow::from_entry(entry))?;
                }
                info!(path = %path.display(), rows = listed.len(), "Records exported");
            }
        }
        RecordsCommand::Delete { id } => {
            backend.delete_record(&id).await?;
            info!(id = %id, "Record deleted");
        }
        RecordsCommand::Stats => {
            println!("{}", render_stats(&stats_or_default(&backend).await));
        }
    }
    Ok(())
}

async fn db(app: &App, command: DbCommand) -> Result<()> {
    let role = app.require_session()?.role();
    let backend = app.backend()?;

    match command {
        DbCommand::Backup => {
            authorize(role, DbAction::Backup)?;
            let result = backend.backup().await?;
            info!("Backup created");
            print_json(&result)?;
        }
        DbCommand::Restore { id } => {
            authorize(role, DbAction::Restore)?;
            let target = id.map_or(RestoreTarget::Latest, RestoreTarget::Backup);
            let result = backend.restore(&target).await?;
            info!(target = ?target, "Database restored");
            print_json(&result)?;
        }
        DbCommand::Export { gzip, output_dir } => {
            let scope = authorize(role, DbAction::Export)?;
            let contents = backend.export(scope).await?;
            let file_name = export_file_name(scope, Utc::now());
            write_export(&output_dir, &file_name, &contents, gzip)?;
        }
        DbCommand::Import { file } => {
            let scope = authorize(role, DbAction::Import)?;
            let file_name = file
                .file_name()
                .and_then(OsStr::to_str)
                .unwrap_or_default()
                .to_string();
            if !file_name.to_ascii_lowercase().ends_with(".json") {
                return Err(GeoError::UnsupportedImport(file_name).into());
            }
            let contents = std::fs::read(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let result = backend.import(scope, &file_name, contents).await?;
            info!(file = %file_name, "Import finished");
            if !result.is_null() {
                print_json(&result)?;
            }
        }
    }
    Ok(())
}
