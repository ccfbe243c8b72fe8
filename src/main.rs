use std::net::{Ipv4Addr, SocketAddr};

use tracing_subscriber::EnvFilter;

use telecare::api::{app_router, ApiContext};
use telecare::config::{self, ServerConfig};
use telecare::db::sqlite::open_database;
use telecare::notify::transport::TwilioClient;
use telecare::notify::{dispatcher, Notifier};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    let cfg = ServerConfig::from_env();
    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    std::fs::create_dir_all(&cfg.data_dir)?;
    std::fs::create_dir_all(cfg.uploads_dir())?;

    // Open once at startup so migrations run before traffic arrives.
    let db_path = cfg.db_path();
    open_database(&db_path)?;

    let (notifier, events) = Notifier::channel();
    let transport = TwilioClient::from_config(&cfg.twilio);
    dispatcher::spawn(db_path.clone(), transport, events);

    let ctx = ApiContext::new(db_path, cfg.uploads_dir(), notifier);
    let app = app_router(ctx, &cfg.frontend_origin);

    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, cfg.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("listening on http://{addr}");
    axum::serve(listener, app).await?;
    Ok(())
}
