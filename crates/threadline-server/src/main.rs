use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod config;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("threadline=info,tower_http=debug")),
        )
        .init();

    let args = cli::Args::parse();
    let mut config = config::Config::load(&args.config)?;
    if let Some(bind) = args.bind {
        config.server.bind_address = bind;
    }

    if let Some(user_id) = args.issue_token {
        let token = threadline_core::auth::create_token(
            user_id,
            &config.auth.jwt_secret,
            config.auth.jwt_expiry_seconds,
        )?;
        println!("{token}");
        return Ok(());
    }

    ensure_data_dir(&config.database.url);

    let db = threadline_db::create_pool(&config.database.url, config.database.max_connections)
        .await?;
    threadline_db::run_migrations(&db).await?;

    let state = threadline_core::AppState {
        db,
        config: threadline_core::AppConfig {
            jwt_secret: config.auth.jwt_secret.clone(),
            jwt_expiry_seconds: config.auth.jwt_expiry_seconds,
            vote_retry_attempts: config.engagement.vote_retry_attempts,
            worker_id: config.server.worker_id,
        },
    };

    let app = threadline_api::build_router().with_state(state);
    let listener = tokio::net::TcpListener::bind(&config.server.bind_address).await?;
    tracing::info!(
        bind = %config.server.bind_address,
        database = %config.database.url,
        "threadline listening"
    );

    let shutdown_signal = async {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("Shutting down...");
    };

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    Ok(())
}

/// Create the parent directory of a file-backed SQLite URL.
fn ensure_data_dir(database_url: &str) {
    let Some(path) = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))
    else {
        return;
    };
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() || path.starts_with(':') {
        return;
    }
    if let Some(parent) = std::path::Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                tracing::warn!("Failed to create data directory {:?}: {}", parent, e);
            }
        }
    }
}
