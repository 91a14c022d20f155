mod cli;
mod config;
mod dashboard;
mod error;
mod routes;
mod store;

use crate::config::Config;
use crate::dashboard::AddServiceForm;
use crate::store::ServiceStore;
use axum::{
    Router,
    routing::{get, post},
};
use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_governor::{
    GovernorLayer, governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

pub struct AppState {
    config: Config,
    store: ServiceStore,
}

impl AppState {
    fn new(config: Config) -> Self {
        let store = ServiceStore::new(config.store.path.clone());
        Self { config, store }
    }
}

#[derive(Parser)]
#[command(name = "homedash", version, about = "Personal service dashboard")]
struct Cli {
    /// Path to configuration file (defaults to ./config.yaml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Backend URL override for client commands
    #[arg(short, long, global = true)]
    backend: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the API server and the browser dashboard (default)
    Serve,
    /// Show every service with its reachability
    List,
    /// Add a service
    Add(AddArgs),
    /// Print the link of a service, asking for its password if it has one
    Open {
        /// Service name
        name: String,
    },
    /// Download a favicon for every service that has none yet
    Icons {
        /// Directory the icons are saved to
        #[arg(long, default_value = "icons")]
        dir: PathBuf,
    },
}

#[derive(Args)]
struct AddArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    url: String,
    #[arg(long, default_value = "")]
    description: String,
    #[arg(long, default_value = "")]
    image_url: String,
    #[arg(long, default_value = "")]
    click_url: String,
    #[arg(long, default_value = "")]
    password: String,
}

impl From<AddArgs> for AddServiceForm {
    fn from(args: AddArgs) -> Self {
        Self {
            name: args.name,
            url: args.url,
            description: args.description,
            image_url: args.image_url,
            click_url: args.click_url,
            password: args.password,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::Serve);

    // Initialize tracing
    let default_filter = match command {
        Command::Serve => "homedash=debug,tower_http=debug",
        _ => "homedash=warn",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    // Load configuration
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(backend) = cli.backend {
        crate::config::validate_url(&backend, "Backend").map_err(anyhow::Error::msg)?;
        config.dashboard.backend_url = backend;
    }

    match command {
        Command::Serve => serve(config).await,
        Command::List => cli::list(&config).await,
        Command::Add(args) => cli::add(&config, args.into()).await,
        Command::Open { name } => cli::open(&config, &name).await,
        Command::Icons { dir } => cli::icons(&config, &dir).await,
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    info!("Starting homedash...");

    let state = Arc::new(AppState::new(config.clone()));
    if config.store.create_if_missing {
        state.store.ensure_exists().await?;
    }
    info!("Serving services from {}", state.store.path().display());

    // Build the application router
    let app = build_router(state);

    // Start the server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    // Peer addresses feed the per-IP rate limiter
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown...");
        },
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown...");
        },
    }
}

fn build_router(state: Arc<AppState>) -> Router {
    let limits = &state.config.server.add_rate_limit;
    let add_governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .key_extractor(SmartIpKeyExtractor)
            .per_second(limits.per_second)
            .burst_size(limits.burst_size)
            .use_headers()
            .finish()
            .expect("Failed to create rate limiter config"),
    );

    // Writes are throttled per client IP
    let write_routes = Router::new()
        .route("/api/services", post(routes::add_service))
        .layer(GovernorLayer {
            config: add_governor_conf,
        });

    let read_routes = Router::new()
        .route("/", get(routes::serve_dashboard))
        .route("/health", get(routes::health_check))
        .route("/api/services", get(routes::list_services));

    Router::new()
        .merge(read_routes)
        .merge(write_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
