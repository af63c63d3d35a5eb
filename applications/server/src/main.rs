/// Iseng Server - user CRUD service
use clap::{Parser, Subcommand};
use iseng_core::{UserService, UuidGenerator};
use iseng_server::{
    config::ServerConfig,
    routes::{self, create_router},
    shutdown::{self, ShutdownReport},
    state::AppState,
};
use iseng_storage::{SqlUserReader, SqlUserWriter};
use sqlx::SqlitePool;
use std::{net::SocketAddr, path::PathBuf, process::ExitCode, sync::Arc};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "iseng-server")]
#[command(about = "User CRUD service over separate reader and writer databases", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Configuration file path
        #[arg(short, long, env = "ISENG_CONFIG")]
        config: Option<PathBuf>,
    },
    /// Apply database migrations to the writer database and exit
    Migrate {
        /// Configuration file path
        #[arg(short, long, env = "ISENG_CONFIG")]
        config: Option<PathBuf>,
    },
}

impl Commands {
    fn config_path(&self) -> Option<&std::path::Path> {
        match self {
            Commands::Serve { config } | Commands::Migrate { config } => config.as_deref(),
        }
    }
}

fn init_tracing(default_filter: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = ServerConfig::load(cli.command.config_path()).and_then(|config| {
        config.validate()?;
        Ok(config)
    });

    let fallback = ServerConfig::default();
    init_tracing(config.as_ref().unwrap_or(&fallback).log.filter.as_str());

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        Commands::Serve { .. } => serve(config).await,
        Commands::Migrate { .. } => migrate(config).await.map(|()| ExitCode::SUCCESS),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn open_pools(config: &ServerConfig) -> anyhow::Result<(SqlitePool, SqlitePool)> {
    let db = &config.database;

    // The reader pool is read-only, so the writer creates the file first
    let writer_pool = iseng_storage::create_writer_pool(&db.writer_url, db.max_connections).await?;
    if db.run_migrations {
        iseng_storage::run_migrations(&writer_pool).await?;
    }

    let reader_pool = match iseng_storage::create_reader_pool(&db.reader_url, db.max_connections).await {
        Ok(pool) => pool,
        Err(e) => {
            writer_pool.close().await;
            return Err(e.into());
        }
    };

    Ok((reader_pool, writer_pool))
}

async fn serve(config: ServerConfig) -> anyhow::Result<ExitCode> {
    tracing::info!("Starting Iseng Server");
    tracing::info!("Host: {}", config.server.host);
    tracing::info!("Port: {}", config.server.port);

    let addr = SocketAddr::from((
        config.server.host.parse::<std::net::IpAddr>()?,
        config.server.port,
    ));

    let (reader_pool, writer_pool) = open_pools(&config).await?;
    tracing::info!("Database connected");

    let service = UserService::new(
        Arc::new(SqlUserReader::new(reader_pool.clone())),
        Arc::new(SqlUserWriter::new(writer_pool.clone())),
        Arc::new(UuidGenerator::new()),
    );
    let app = create_router(AppState::new(Arc::new(service)));
    routes::log_routes();

    let timeout = config.server.shutdown_timeout();
    let mut report = ShutdownReport::new();

    match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => {
            tracing::info!("Server listening on {}", addr);
            shutdown::serve_with_shutdown(
                listener,
                app,
                shutdown::wait_for_shutdown(),
                timeout,
                &mut report,
            )
            .await;
        }
        Err(e) => report.record(&format!("bind {}", addr), e),
    }

    shutdown::close_pool(&mut report, "reader", &reader_pool, timeout).await;
    shutdown::close_pool(&mut report, "writer", &writer_pool, timeout).await;
    report.log();

    Ok(if report.is_clean() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

async fn migrate(config: ServerConfig) -> anyhow::Result<()> {
    let db = &config.database;
    let pool = iseng_storage::create_writer_pool(&db.writer_url, 1).await?;
    let result = iseng_storage::run_migrations(&pool).await;
    pool.close().await;
    result?;
    Ok(())
}
