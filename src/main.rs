//! Plantão API Server
//!
//! Run with: cargo run --bin plantao -- --config config.toml
//!
//! # Configuration
//!
//! Settings come from the TOML file given with `--config` (or the default
//! search paths), overridden by `PLANTAO_*` environment variables. See
//! `plantao-cli config` for a commented template.
//!
//! - `RUST_LOG`: Log filter (default: `logging.level`)

use clap::Parser;
use plantao::account::{AccountService, ProfileStore, SessionStore, SqliteProfileStore};
use plantao::api::{serve, ApiConfig, AppState};
use plantao::backend::HostedBackend;
use plantao::config::{Config, LoggingConfig};
use plantao::hospitals::HospitalCatalog;
use plantao::shifts::ShiftStore;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "plantao")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Plantão API server")]
struct Args {
    /// Config file (default: search standard locations)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };

    init_tracing(&config.logging)?;

    tracing::info!("Starting Plantão API server v{}", env!("CARGO_PKG_VERSION"));

    let data_dir = config.data_dir();
    std::fs::create_dir_all(&data_dir)?;
    tracing::info!("Data directory: {:?}", data_dir);

    // Shift records
    let catalog = Arc::new(HospitalCatalog::reference());
    let shifts = Arc::new(ShiftStore::open(
        &data_dir,
        config.tax_policy()?,
        Arc::clone(&catalog),
    )?);
    tracing::info!(
        shifts = shifts.count().await,
        hospitals = catalog.len(),
        tax_rate = %config.shifts.default_tax_rate_percent,
        "Shift store ready"
    );

    let sessions = Arc::new(SessionStore::open(
        &data_dir,
        config.session.admin_password.clone(),
    )?);

    // Hosted backend: auth always, profiles only with a service key
    let backend = match config.hosted_backend()? {
        Some(backend_config) => {
            tracing::info!("Hosted backend enabled: {}", backend_config.url);
            Some(Arc::new(HostedBackend::new(backend_config)?))
        }
        None => {
            tracing::info!("Hosted backend disabled (set backend.url to enable sign-in)");
            None
        }
    };

    let profiles: Arc<dyn ProfileStore> = match &backend {
        Some(hosted) if config.backend.service_key.is_some() => {
            tracing::info!("Using hosted profiles table");
            Arc::clone(hosted) as Arc<dyn ProfileStore>
        }
        _ => {
            let path = config.profiles_db_path();
            tracing::info!("Using local profiles database: {:?}", path);
            Arc::new(SqliteProfileStore::open(&path)?)
        }
    };

    let api_config = ApiConfig::from(&config);

    let mut state = AppState::new(
        shifts,
        catalog,
        Arc::clone(&profiles),
        sessions,
        api_config.clone(),
    )
    .with_billing(config.checkout(), config.billing.webhook_secret.clone());

    if let Some(hosted) = backend {
        state = state.with_accounts(Arc::new(AccountService::new(
            hosted,
            profiles,
            config.billing.trial_days,
        )));
    }

    if api_config.enforce_subscription {
        tracing::info!("Subscription enforcement enabled for shift changes");
    }
    if config.billing.webhook_secret.is_none() {
        tracing::warn!("No webhook secret configured; payment webhooks are not verified");
    }

    // Run server
    serve(state, &api_config).await?;

    tracing::info!("Plantão API server stopped");
    Ok(())
}

/// Pretty or JSON output, filtered by `RUST_LOG` or the configured level
fn init_tracing(logging: &LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("plantao={},tower_http=info", logging.level).into()
    });

    let file = match &logging.file {
        Some(path) => Some(
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?,
        ),
        None => None,
    };

    let json = logging.format.eq_ignore_ascii_case("json");

    let json_layer = json.then(|| tracing_subscriber::fmt::layer().json());
    let pretty_layer = (!json).then(tracing_subscriber::fmt::layer);
    let file_layer = file.map(|f| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::sync::Mutex::new(f))
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(pretty_layer)
        .with(file_layer)
        .init();

    Ok(())
}
