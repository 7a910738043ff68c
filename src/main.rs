use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use consoleauth::api::{self, AppState};
use consoleauth::cache::{CacheBackend, MemoryCache, RedisCache};
use consoleauth::config::{self, Config};
use consoleauth::jobs;
use consoleauth::models::context::RequestContext;
use consoleauth::models::token::ConsoleGrant;
use consoleauth::ConsoleAuthManager;

mod cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // LOG_FORMAT=json for log shippers, human-readable otherwise
    let json_logs = std::env::var("LOG_FORMAT").map(|v| v == "json").unwrap_or(false);
    let (json_layer, text_layer) = if json_logs {
        (Some(tracing_subscriber::fmt::layer().json()), None)
    } else {
        (None, Some(tracing_subscriber::fmt::layer()))
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "consoleauth=debug,tower_http=debug".into()),
        ))
        .with(json_layer)
        .with(text_layer)
        .init();

    let cfg = config::load()?;
    let args = cli::Cli::parse();

    let result = match args.command {
        Some(cli::Commands::Serve { port }) => {
            let port = port.unwrap_or(cfg.port);
            run_server(cfg, port).await
        }
        None => {
            let port = cfg.port;
            run_server(cfg, port).await
        }
        Some(command) => {
            let url = cli::shared_cache_url(&cfg)?;
            let redis = RedisCache::connect(url)
                .await
                .context("failed to connect to Redis")?;
            let manager = ConsoleAuthManager::from_config(&cfg, Arc::new(redis))?;
            handle_command(command, &manager).await
        }
    };

    if let Err(ref e) = result {
        eprintln!("Error: {:?}", e);
    }
    result
}

/// Redis when configured, otherwise the in-process cache (returned
/// separately so the caller can sweep it).
async fn connect_cache(
    cfg: &Config,
) -> anyhow::Result<(Arc<dyn CacheBackend>, Option<MemoryCache>)> {
    match &cfg.redis_url {
        Some(url) => {
            tracing::info!("Connecting to Redis...");
            let redis = RedisCache::connect(url)
                .await
                .context("failed to connect to Redis")?;
            let cache: Arc<dyn CacheBackend> = Arc::new(redis);
            Ok((cache, None))
        }
        None => {
            tracing::warn!("REDIS_URL not set; console tokens are held in process memory");
            let memory = MemoryCache::new();
            let cache: Arc<dyn CacheBackend> = Arc::new(memory.clone());
            Ok((cache, Some(memory)))
        }
    }
}

async fn run_server(cfg: Config, port: u16) -> anyhow::Result<()> {
    let (cache, memory) = connect_cache(&cfg).await?;

    if let Some(memory) = memory {
        jobs::sweep::spawn(memory, std::time::Duration::from_secs(cfg.sweep_interval_secs.max(1)));
        tracing::info!(
            every_secs = cfg.sweep_interval_secs,
            "Background sweep job started"
        );
    }

    let manager = ConsoleAuthManager::from_config(&cfg, cache)?;
    tracing::info!(
        ttl_secs = cfg.token_ttl_secs,
        cells = cfg.cells_enabled,
        "Console token manager ready"
    );

    let app = api::router(Arc::new(AppState { manager }));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("consoleauth listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn handle_command(cmd: cli::Commands, manager: &ConsoleAuthManager) -> anyhow::Result<()> {
    let ctx = RequestContext::admin();
    match cmd {
        cli::Commands::Authorize {
            token,
            console_type,
            host,
            port,
            internal_access_path,
            instance,
        } => {
            let grant = ConsoleGrant::new(console_type, host, port, internal_access_path, Some(instance));
            let token = match token {
                Some(token) => {
                    manager.authorize_console(&ctx, &token, grant).await?;
                    token
                }
                None => manager.issue_console(&ctx, grant).await?,
            };
            println!("Token authorized: {}", token);
            println!("Expires in {}s", manager.token_ttl().as_secs());
        }
        cli::Commands::Check { token } => {
            if manager.check_token(&ctx, &token).await {
                println!("valid");
            } else {
                println!("invalid");
                std::process::exit(1);
            }
        }
        cli::Commands::List { instance } => {
            let tokens = manager.tokens_for_instance(&instance).await?;
            if tokens.is_empty() {
                println!("No tokens indexed for {}", instance);
            }
            for token in tokens {
                println!("{}", token);
            }
        }
        cli::Commands::Purge { instance } => {
            manager.delete_tokens_for_instance(&ctx, &instance).await?;
            println!("Revoked console tokens for {}", instance);
        }
        cli::Commands::Serve { .. } => anyhow::bail!("serve is not a one-shot command"),
    }
    Ok(())
}
