use actix_web::{dev::Service, web, App, HttpServer};
use sqlx::postgres::PgPoolOptions;
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fork_feed::cache::{KeyValueCache, RedisCache, SessionStore};
use fork_feed::config::Config;
use fork_feed::db::{
    CandidateSource, ForkRepository, ForkStore, InteractionRepository, InteractionStore,
};
use fork_feed::handlers::configure_api;
use fork_feed::middleware::JwtAuthMiddleware;
use fork_feed::services::{FeedService, ForkService, HistoryTracker, RateLimiter};

#[actix_web::main]
async fn main() -> io::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(true)
                .with_thread_ids(true)
                .with_line_number(true)
                .with_file(true)
                .with_target(true),
        )
        .init();

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("Configuration loading failed: {:#}", e);
            eprintln!("ERROR: Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Starting fork-feed-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    let pool = match PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .acquire_timeout(Duration::from_secs(10))
        .connect(&config.database.url)
        .await
    {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("Database connection failed: {}", e);
            eprintln!("ERROR: Failed to connect to database: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = sqlx::migrate!("./migrations").run(&pool).await {
        tracing::error!("Database migration failed: {}", e);
        eprintln!("ERROR: Failed to run migrations: {}", e);
        std::process::exit(1);
    }
    tracing::info!("Database ready");

    let redis = match RedisCache::new(&config.redis.url).await {
        Ok(cache) => cache,
        Err(e) => {
            tracing::error!("Redis connection failed: {}", e);
            eprintln!("ERROR: Failed to connect to Redis: {}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = redis.ping().await {
        tracing::warn!("Redis not answering PING at startup: {}", e);
    }

    let fork_repo = Arc::new(ForkRepository::new(pool.clone()));
    let interactions: Arc<dyn InteractionStore> = Arc::new(InteractionRepository::new(pool));
    let candidates: Arc<dyn CandidateSource> = fork_repo.clone();
    let forks: Arc<dyn ForkStore> = fork_repo;
    let cache: Arc<dyn KeyValueCache> = Arc::new(redis);

    let feed_cfg = &config.feed;
    let history = HistoryTracker::new(
        interactions.clone(),
        feed_cfg.seen_window(),
        feed_cfg.history_limit,
        feed_cfg.lookup_timeout(),
    );
    let sessions = SessionStore::new(cache, feed_cfg.session_ttl());
    let feed_service = web::Data::new(FeedService::new(
        candidates,
        history,
        sessions,
        feed_cfg.fetch_timeout(),
    ));

    let limiter = RateLimiter::for_creation(interactions.clone(), feed_cfg.creates_per_hour);
    let fork_service = web::Data::new(ForkService::new(forks, interactions, limiter));

    let auth = JwtAuthMiddleware::new(&config.auth.jwt_secret);
    let bind_addr = format!("{}:{}", config.app.host, config.app.port);
    tracing::info!("HTTP server listening on {}", bind_addr);

    HttpServer::new(move || {
        let auth = auth.clone();

        App::new()
            .app_data(feed_service.clone())
            .app_data(fork_service.clone())
            .route("/health", web::get().to(|| async { "OK" }))
            .route("/metrics", web::get().to(fork_feed::metrics::serve_metrics))
            .configure(|cfg| configure_api(cfg, auth))
            .wrap_fn(|req, srv| {
                let method = req.method().to_string();
                let path = req
                    .match_pattern()
                    .map(|p| p.to_string())
                    .unwrap_or_else(|| req.path().to_string());
                let start = Instant::now();

                let fut = srv.call(req);
                async move {
                    match fut.await {
                        Ok(res) => {
                            fork_feed::metrics::observe_http_request(
                                &method,
                                &path,
                                res.status().as_u16(),
                                start.elapsed(),
                            );
                            Ok(res)
                        }
                        Err(err) => {
                            let status = err.as_response_error().status_code().as_u16();
                            fork_feed::metrics::observe_http_request(
                                &method,
                                &path,
                                status,
                                start.elapsed(),
                            );
                            Err(err)
                        }
                    }
                }
            })
            .wrap(TracingLogger::default())
    })
    .bind(bind_addr)?
    .run()
    .await
}
