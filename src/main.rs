mod core;
mod features;
mod modules;
mod shared;

use crate::core::config::{AntivirusMode, Config};
use crate::core::openapi::{ApiDoc, SwaggerInfoModifier};
use crate::core::{database, middleware};
use crate::features::auth;
use crate::features::auth::routes as auth_routes;
use crate::features::categories::{routes as categories_routes, CategoryCatalog, CategoryService};
use crate::features::rate_limits::RateLimitService;
use crate::features::users::{PgUserDirectory, UserDirectory};
use crate::features::whistleblowing::{
    routes as wb_routes, spawn_daily, AttachmentService, CaseAccess, CaseService, CaseStore,
    DailySchedule, DeadlineReminderJob, IntakeService, ManagerResolver, PgCaseStore,
    RetentionPurgeJob, ThreadService, WbSettings, WbState,
};
use crate::modules::antivirus::{ClamScanner, DisabledScanner, VirusScanner};
use crate::modules::crypto::CaseCipher;
use crate::modules::notifier::{LogNotifier, NotificationDispatcher, Notifier, SmtpNotifier};
use crate::modules::storage::LocalStorage;
use crate::shared::clock::{Clock, SystemClock};
use axum::{middleware::from_fn, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::Modify;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// How often stale rate limit buckets are dropped
const RATE_LIMIT_PRUNE_INTERVAL: Duration = Duration::from_secs(300);

fn main() -> anyhow::Result<()> {
    // Build Tokio runtime with configurable worker threads
    let worker_threads = std::env::var("TOKIO_WORKER_THREADS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(4)
        });

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(worker_threads)
        .max_blocking_threads(worker_threads * 4)
        .enable_all()
        .build()?;

    runtime.block_on(async_main(worker_threads))
}

async fn async_main(worker_threads: usize) -> anyhow::Result<()> {
    // Load .env file BEFORE initializing logger so RUST_LOG is available
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;

    tracing::info!(
        "System info: tokio_worker_threads={}, pid={}",
        worker_threads,
        std::process::id()
    );
    tracing::info!("Configuration loaded successfully");

    let pool = database::create_pool(&config.database).await?;
    tracing::info!("Database connection pool created");

    tracing::info!("Running database migrations...");
    database::run_migrations(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("Migration failed: {}", e))?;
    tracing::info!("Database migrations completed successfully");

    // Auth
    let jwks_client = Arc::new(auth::JwksClient::new(
        &config.auth.issuer,
        config.auth.jwks_cache_ttl,
    ));
    let jwt_validator = Arc::new(auth::JwtValidator::new(
        jwks_client,
        config.auth.issuer.clone(),
        config.auth.audience.clone(),
        config.auth.jwt_leeway,
        config.auth.roles_claim.clone(),
    ));
    tracing::info!("Auth configuration initialized");

    let wb_config = &config.whistleblowing;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let settings = Arc::new(WbSettings::from(wb_config));

    // Attachment storage
    let storage = Arc::new(LocalStorage::new(&wb_config.storage_root));
    storage
        .ensure_root()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to prepare attachment storage: {}", e))?;
    tracing::info!(
        "Attachment storage ready at {}",
        storage.root().display()
    );

    let scanner: Arc<dyn VirusScanner> = match config.antivirus.mode {
        AntivirusMode::Local => {
            tracing::info!(
                "Antivirus scanning enabled ({})",
                config.antivirus.scanner_path
            );
            Arc::new(ClamScanner::new(
                &config.antivirus.scanner_path,
                config.antivirus.timeout,
            ))
        }
        AntivirusMode::Disabled => {
            tracing::warn!(
                "Antivirus scanning disabled: attachments stay pending and hidden from reporters"
            );
            Arc::new(DisabledScanner)
        }
    };

    let notifier: Arc<dyn Notifier> = match &config.smtp {
        Some(smtp) => match SmtpNotifier::new(smtp) {
            Ok(notifier) => {
                tracing::info!("SMTP notifier initialized ({}:{})", smtp.host, smtp.port);
                Arc::new(notifier)
            }
            Err(e) => {
                tracing::warn!("SMTP notifier unavailable, logging notifications instead: {}", e);
                Arc::new(LogNotifier)
            }
        },
        None => {
            tracing::warn!("SMTP_HOST not set, notifications will only be logged");
            Arc::new(LogNotifier)
        }
    };
    let notifications = NotificationDispatcher::new(Arc::clone(&notifier));

    // Directory, catalog and case store
    let users: Arc<dyn UserDirectory> = Arc::new(PgUserDirectory::new(pool.clone()));
    let categories: Arc<dyn CategoryCatalog> = Arc::new(CategoryService::new(pool.clone()));
    let store: Arc<dyn CaseStore> = Arc::new(PgCaseStore::new(pool.clone()));
    let cipher = Arc::new(CaseCipher::new(&wb_config.encryption_key));

    let managers = Arc::new(ManagerResolver::new(
        Arc::clone(&users),
        wb_config.manager_role.clone(),
        wb_config.manager_cache_ttl,
        Arc::clone(&clock),
    ));
    let access = Arc::new(CaseAccess::new(
        Arc::clone(&store),
        Arc::clone(&managers),
        Arc::clone(&clock),
    ));

    // Whistleblowing services
    let intake_service = Arc::new(IntakeService::new(
        Arc::clone(&store),
        Arc::clone(&cipher),
        Arc::clone(&managers),
        Arc::clone(&categories),
        notifications.clone(),
        Arc::clone(&clock),
        Arc::clone(&settings),
    ));
    let thread_service = Arc::new(ThreadService::new(
        Arc::clone(&store),
        Arc::clone(&cipher),
        Arc::clone(&access),
        Arc::clone(&users),
        notifications,
        Arc::clone(&clock),
        Arc::clone(&settings),
    ));
    let attachment_service = Arc::new(AttachmentService::new(
        Arc::clone(&store),
        Arc::clone(&storage),
        scanner,
        Arc::clone(&clock),
        Arc::clone(&settings),
    ));
    let case_service = Arc::new(CaseService::new(
        Arc::clone(&store),
        Arc::clone(&cipher),
        Arc::clone(&access),
        Arc::clone(&users),
        Arc::clone(&categories),
        Arc::clone(&clock),
    ));
    tracing::info!("Whistleblowing services initialized");

    let rate_limit_service = Arc::new(RateLimitService::new(
        &config.rate_limits,
        Arc::clone(&clock),
    ));
    Arc::clone(&rate_limit_service).spawn_pruner(RATE_LIMIT_PRUNE_INTERVAL);
    tracing::info!("Rate limit service initialized");

    // Daily background jobs
    if config.jobs.enabled {
        let reminder_schedule = DailySchedule::new(config.jobs.utc_offset, config.jobs.reminder_at)
            .ok_or_else(|| anyhow::anyhow!("Invalid reminder schedule"))?;
        let retention_schedule =
            DailySchedule::new(config.jobs.utc_offset, config.jobs.retention_at)
                .ok_or_else(|| anyhow::anyhow!("Invalid retention schedule"))?;

        let reminder_job = Arc::new(DeadlineReminderJob::new(
            Arc::clone(&store),
            Arc::clone(&managers),
            Arc::clone(&notifier),
            Arc::clone(&clock),
            wb_config.ack_reminder_days,
            wb_config.response_reminder_months,
            wb_config.extra_recipients.clone(),
        ));
        let retention_job = Arc::new(RetentionPurgeJob::new(
            Arc::clone(&store),
            Arc::clone(&storage),
            Arc::clone(&clock),
            wb_config.retention_months,
        ));

        spawn_daily(reminder_job, reminder_schedule, Arc::clone(&clock));
        spawn_daily(retention_job, retention_schedule, Arc::clone(&clock));
        tracing::info!(
            "Daily jobs scheduled (reminders at {:02}:{:02}, retention at {:02}:{:02}, offset {})",
            config.jobs.reminder_at.0,
            config.jobs.reminder_at.1,
            config.jobs.retention_at.0,
            config.jobs.retention_at.1,
            config.jobs.utc_offset
        );
    } else {
        tracing::warn!("Background jobs disabled (JOBS_ENABLED=false)");
    }

    let wb_state = WbState {
        intake: intake_service,
        threads: thread_service,
        attachments: attachment_service,
        cases: case_service,
        access,
        rate_limits: rate_limit_service,
    };

    // Build application router with dynamic swagger config
    let swagger_modifier = SwaggerInfoModifier {
        title: config.swagger.title.clone(),
        version: config.swagger.version.clone(),
        description: config.swagger.description.clone(),
    };

    let mut openapi = ApiDoc::openapi();
    swagger_modifier.modify(&mut openapi);

    let swagger = if let Some(credentials) = config.swagger.credentials() {
        tracing::info!("Swagger UI basic auth enabled");
        Router::new()
            .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
            .layer(from_fn(middleware::basic_auth_middleware(Arc::new(
                credentials,
            ))))
    } else {
        tracing::info!("Swagger UI basic auth disabled (no credentials configured)");
        Router::new().merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
    };

    let max_attachment_size = wb_config.max_attachment_size;

    // Protected routes (require JWT authentication)
    let protected_routes = Router::new()
        .merge(auth_routes::protected_routes(Arc::new(
            wb_config.manager_role.clone(),
        )))
        .merge(wb_routes::protected_routes(
            wb_state.clone(),
            max_attachment_size,
        ))
        .route_layer(axum::middleware::from_fn_with_state(
            jwt_validator.clone(),
            middleware::auth_middleware,
        ));

    // Simple health check endpoint (no auth required)
    async fn health_check() -> axum::http::StatusCode {
        axum::http::StatusCode::OK
    }
    let health_route = Router::new().route("/health", axum::routing::get(health_check));

    // Public routes (no auth required)
    let public_routes = Router::new()
        .merge(categories_routes::routes(categories))
        .merge(wb_routes::public_routes(wb_state, max_attachment_size));

    let app = Router::new()
        .merge(swagger)
        .merge(protected_routes)
        .merge(public_routes)
        .merge(health_route)
        .layer(axum::middleware::from_fn_with_state(
            config.app.trust_proxy_headers,
            middleware::client_ip_middleware,
        ))
        .layer(middleware::cors_layer(
            config.app.cors_allowed_origins.clone(),
        ))
        // Propagate X-Request-Id to response headers
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(middleware::MakeSpanWithRequestId)
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Generate X-Request-Id using UUID v7 (or use client-provided one)
        .layer(SetRequestIdLayer::x_request_id(middleware::MakeRequestUuid));

    // Start server
    let addr = config.app.server_address();
    let socket_addr: SocketAddr = addr
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid address: {}", e))?;

    // Use socket2 for TCP listener configuration
    let socket = socket2::Socket::new(
        socket2::Domain::for_address(socket_addr),
        socket2::Type::STREAM,
        Some(socket2::Protocol::TCP),
    )?;

    socket.set_reuse_address(true)?;
    socket.set_nodelay(true)?;

    #[cfg(target_os = "linux")]
    {
        let keepalive = socket2::TcpKeepalive::new()
            .with_time(Duration::from_secs(60))
            .with_interval(Duration::from_secs(10))
            .with_retries(3);
        socket.set_tcp_keepalive(&keepalive)?;
    }
    #[cfg(not(target_os = "linux"))]
    {
        let keepalive = socket2::TcpKeepalive::new().with_time(Duration::from_secs(60));
        socket.set_tcp_keepalive(&keepalive)?;
    }

    socket.set_nonblocking(true)?;
    socket.bind(&socket_addr.into())?;
    socket.listen(1024)?;

    let listener = tokio::net::TcpListener::from_std(socket.into())?;
    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
