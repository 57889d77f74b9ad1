use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use spycats::api::{self, AppState};
use spycats::banner::{BannerInfo, print_banner};
use spycats::breeds::BreedRegistry;
use spycats::breeds::catapi::CatApiRegistry;
use spycats::breeds::fixed::FixedBreeds;
use spycats::config::{Config, Overrides, Settings};
use spycats::consts::default_db_path;
use spycats::store::sqlite::SqliteStore;

#[derive(Parser)]
#[command(name = "spycats", version, about = "Mission control for the Spy Cat Agency.")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// SQLite database path (use :memory: for ephemeral) [default: ~/.spycats/spycats.db]
    #[arg(short, long, env = "SPYCATS_DB", global = true)]
    db: Option<String>,

    /// Log filter, e.g. `info` or `spycats=debug`
    #[arg(long, env = "SPYCATS_LOG", default_value = "info", global = true)]
    log_level: String,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the HTTP API (the default)
    Serve(ServeArgs),
    /// Read or change persisted settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(clap::Args, Default)]
struct ServeArgs {
    /// Address to listen on
    #[arg(short, long, env = "SPYCATS_BIND")]
    bind: Option<String>,

    /// Breed catalog URL
    #[arg(long, env = "SPYCATS_BREED_API_URL")]
    breed_api_url: Option<String>,

    /// Breed catalog API key
    #[arg(long, env = "SPYCATS_BREED_API_KEY", hide_env_values = true)]
    breed_api_key: Option<String>,

    /// Breed lookup timeout in seconds
    #[arg(long, env = "SPYCATS_BREED_TIMEOUT")]
    breed_timeout: Option<u64>,

    /// Accept only these breeds instead of asking the catalog (comma-separated)
    #[arg(long, value_delimiter = ',')]
    offline_breeds: Option<Vec<String>>,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print one value
    Get { key: String },
    /// Store a value
    Set { key: String, value: String },
    /// Remove a value
    Unset { key: String },
    /// Print every stored value
    List,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let db = match cli.db {
        Some(db) => db,
        None => {
            let path = default_db_path();
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            path.to_string_lossy().into_owned()
        }
    };

    match cli.command {
        Some(Command::Config { action }) => handle_config(&db, action),
        Some(Command::Serve(args)) => serve(&db, args).await,
        None => serve(&db, ServeArgs::default()).await,
    }
}

async fn serve(db: &str, args: ServeArgs) -> anyhow::Result<()> {
    let config = Config::open(db)?;
    let settings = Settings::resolve(
        Overrides {
            bind: args.bind,
            breed_api_url: args.breed_api_url,
            breed_api_key: args.breed_api_key,
            breed_timeout_secs: args.breed_timeout,
        },
        &config,
    )?;

    let (breeds, breeds_label): (Arc<dyn BreedRegistry>, String) = match args.offline_breeds {
        Some(names) => {
            let label = format!("fixed list ({})", names.len());
            (Arc::new(FixedBreeds::new(names)), label)
        }
        None => (
            Arc::new(CatApiRegistry::new(
                settings.breed_api_url.clone(),
                settings.breed_api_key.clone(),
                settings.breed_timeout,
            )?),
            settings.breed_api_url.clone(),
        ),
    };

    let store = Arc::new(SqliteStore::open(db)?);
    let app = api::router(AppState::new(store, breeds));

    print_banner(&BannerInfo {
        bind: settings.bind,
        database: if db == ":memory:" { "ephemeral" } else { db },
        breeds: &breeds_label,
    });

    let listener = tokio::net::TcpListener::bind(settings.bind)
        .await
        .with_context(|| format!("failed to bind {}", settings.bind))?;
    info!(addr = %settings.bind, "API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("server error")?;

    info!("shut down");
    Ok(())
}

fn handle_config(db: &str, action: ConfigAction) -> anyhow::Result<()> {
    if db == ":memory:" {
        eprintln!("warning: config changes on an ephemeral database are lost on exit");
    } else if !Path::new(db).exists() {
        info!(db, "creating database");
    }
    let config = Config::open(db)?;

    match action {
        ConfigAction::Get { key } => match config.get(&key)? {
            Some(value) => println!("{value}"),
            None => anyhow::bail!("{key} is not set"),
        },
        ConfigAction::Set { key, value } => {
            config.set(&key, &value)?;
            println!("✓ {key} saved");
        }
        ConfigAction::Unset { key } => {
            config.remove(&key)?;
            println!("✓ {key} removed");
        }
        ConfigAction::List => {
            for (key, value) in config.entries()? {
                println!("{key} = {value}");
            }
        }
    }
    Ok(())
}
