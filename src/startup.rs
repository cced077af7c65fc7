//! Application Startup
//!
//! Application building and server initialization.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::Router;
use redis::aio::ConnectionManager;
use sqlx::PgPool;
use tokio::net::TcpListener;
use tower_http::compression::CompressionLayer;
use tracing::{info, warn};

use crate::application::services::{
    AdminAuthService, AdminAuthServiceImpl, CatalogServiceImpl, ChatServiceImpl,
    ContentServiceImpl, InstagramServiceImpl, PaymentServiceImpl, ReportServiceImpl,
    SubmissionServiceImpl,
};
use crate::config::Settings;
use crate::infrastructure::cache::{self, RedisCache};
use crate::infrastructure::database;
use crate::infrastructure::instagram::InstagramClient;
use crate::infrastructure::notifications::{Notifier, TelegramSender};
use crate::infrastructure::payments::PaymentProviders;
use crate::infrastructure::realtime::{ChatRelay, RoomHub};
use crate::infrastructure::repositories::{
    PgAdminSessionRepository, PgAdminUserRepository, PgChatMessageRepository,
    PgChatSessionRepository, PgDonationRepository, PgHomepageMediaRepository, PgMediaRepository,
    PgReportRepository, PgServiceRepository, PgSubmissionRepository, PgTextRepository,
};
use crate::infrastructure::storage::{InMemoryObjectStore, ObjectStore, S3ObjectStore};
use crate::presentation::http::handlers::health;
use crate::presentation::http::routes;
use crate::presentation::middleware::{cors, logging};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// `None` when no Redis URL is configured
    pub cache: Option<Arc<RedisCache>>,
    /// `None` when the real-time relay is disabled
    pub rooms: Option<Arc<RoomHub>>,
    pub payments: PaymentProviders,
    pub notifier: Notifier,
    pub store: Arc<dyn ObjectStore>,
    pub instagram: Arc<InstagramClient>,
    pub settings: Arc<Settings>,
}

pub type ChatServiceType = ChatServiceImpl<PgChatSessionRepository, PgChatMessageRepository>;
pub type PaymentServiceType = PaymentServiceImpl<PgDonationRepository>;
pub type AuthServiceType = AdminAuthServiceImpl<PgAdminUserRepository, PgAdminSessionRepository>;
pub type SubmissionServiceType = SubmissionServiceImpl<PgSubmissionRepository>;
pub type ContentServiceType =
    ContentServiceImpl<PgTextRepository, PgMediaRepository, PgHomepageMediaRepository, RedisCache>;
pub type CatalogServiceType = CatalogServiceImpl<PgServiceRepository>;
pub type ReportServiceType = ReportServiceImpl<PgReportRepository>;
pub type InstagramServiceType = InstagramServiceImpl<InstagramClient, RedisCache>;

impl AppState {
    /// Assemble the state from already-connected resources.
    pub fn new(
        settings: Settings,
        db: PgPool,
        cache: Option<RedisCache>,
        store: Arc<dyn ObjectStore>,
        notifier: Notifier,
        http: reqwest::Client,
    ) -> Self {
        let rooms = settings.chat.realtime_enabled.then(|| {
            Arc::new(RoomHub::new(
                Arc::new(PgChatMessageRepository::new(db.clone())),
                settings.chat.room_capacity,
            ))
        });

        Self {
            payments: PaymentProviders::from_settings(&settings.payments, http.clone()),
            instagram: Arc::new(InstagramClient::from_settings(&settings.instagram, http)),
            cache: cache.map(Arc::new),
            rooms,
            notifier,
            store,
            db,
            settings: Arc::new(settings),
        }
    }

    /// Redis connection for rate limiting, when Redis is configured.
    pub fn redis(&self) -> Option<ConnectionManager> {
        self.cache.as_ref().map(|c| c.connection())
    }

    pub fn relay(&self) -> Option<Arc<dyn ChatRelay>> {
        self.rooms.clone().map(|rooms| rooms as Arc<dyn ChatRelay>)
    }

    pub fn chat_service(&self) -> ChatServiceType {
        ChatServiceImpl::new(
            Arc::new(PgChatSessionRepository::new(self.db.clone())),
            Arc::new(PgChatMessageRepository::new(self.db.clone())),
            self.relay(),
            self.notifier.clone(),
            self.settings.chat.max_message_length,
        )
    }

    pub fn payment_service(&self) -> PaymentServiceType {
        PaymentServiceImpl::new(
            Arc::new(PgDonationRepository::new(self.db.clone())),
            self.payments.clone(),
            self.notifier.clone(),
        )
    }

    pub fn auth_service(&self) -> AuthServiceType {
        AdminAuthServiceImpl::new(
            Arc::new(PgAdminUserRepository::new(self.db.clone())),
            Arc::new(PgAdminSessionRepository::new(self.db.clone())),
            self.settings.admin.session_ttl_days,
        )
    }

    pub fn submission_service(&self) -> SubmissionServiceType {
        SubmissionServiceImpl::new(
            Arc::new(PgSubmissionRepository::new(self.db.clone())),
            self.notifier.clone(),
        )
    }

    pub fn content_service(&self) -> ContentServiceType {
        ContentServiceImpl::new(
            Arc::new(PgTextRepository::new(self.db.clone())),
            Arc::new(PgMediaRepository::new(self.db.clone())),
            Arc::new(PgHomepageMediaRepository::new(self.db.clone())),
            self.cache.clone(),
            self.store.clone(),
            self.settings.media.cdn_base_url.clone(),
            self.settings.media.max_upload_bytes,
        )
    }

    pub fn catalog_service(&self) -> CatalogServiceType {
        CatalogServiceImpl::new(
            Arc::new(PgServiceRepository::new(self.db.clone())),
            self.settings.media.cdn_base_url.clone(),
        )
    }

    pub fn report_service(&self) -> ReportServiceType {
        ReportServiceImpl::new(Arc::new(PgReportRepository::new(self.db.clone())))
    }

    pub fn instagram_service(&self) -> InstagramServiceType {
        InstagramServiceImpl::new(
            self.instagram.clone(),
            self.cache.clone(),
            self.settings.instagram.cache_ttl_secs,
        )
    }
}

/// Router with every middleware layer applied.
pub fn build_router(state: AppState) -> Router {
    let cors = cors::create_cors_layer(&state.settings.cors);
    routes::create_router(state)
        .layer(CompressionLayer::new())
        .layer(logging::create_trace_layer())
        .layer(cors)
}

/// Application instance
pub struct Application {
    listener: TcpListener,
    router: Router,
    state: AppState,
}

impl Application {
    /// Build the application from settings
    pub async fn build(settings: Settings) -> Result<Self> {
        health::init_server_start();

        let db = database::create_pool(&settings.database).await?;
        info!("Database connection pool created");

        if settings.database.run_migrations {
            database::run_migrations(&db).await?;
            info!("Database migrations applied");
        }

        let cache = match settings.redis.url.as_deref() {
            Some(url) => match cache::create_redis_cache(url).await {
                Ok(cache) => Some(cache),
                Err(e) => {
                    warn!(error = %e, "Redis unavailable, running without cache and rate limiting");
                    None
                }
            },
            None => {
                info!("No Redis URL configured, running without cache and rate limiting");
                None
            }
        };

        let store: Arc<dyn ObjectStore> = if settings.media.access_key_id.is_some()
            || settings.media.endpoint.is_some()
        {
            Arc::new(S3ObjectStore::from_settings(&settings.media).await)
        } else {
            warn!("No object storage credentials configured, media is kept in memory");
            Arc::new(InMemoryObjectStore::new())
        };

        let http = reqwest::Client::builder()
            .user_agent(concat!("rehab-center/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let notifier = match TelegramSender::from_settings(&settings.notifications, http.clone()) {
            Some(sender) => {
                let (notifier, _worker) =
                    Notifier::spawn(Arc::new(sender), settings.notifications.queue_capacity);
                info!("Telegram notifications enabled");
                notifier
            }
            None => {
                info!("Telegram notifications disabled");
                Notifier::disabled()
            }
        };

        let state = AppState::new(settings.clone(), db, cache, store, notifier, http);

        bootstrap_admin(&state).await;
        spawn_session_cleanup(&state);

        let router = build_router(state.clone());

        let addr: SocketAddr = settings.server_addr().parse()?;
        let listener = TcpListener::bind(addr).await?;
        info!("Listening on {}", addr);

        Ok(Self {
            listener,
            router,
            state,
        })
    }

    /// Run the server until stopped
    pub async fn run_until_stopped(self) -> Result<()> {
        let rooms = self.state.rooms.clone();

        axum::serve(
            self.listener,
            self.router
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await?;

        if let Some(rooms) = rooms {
            rooms.shutdown();
        }
        info!("Server stopped");
        Ok(())
    }

    /// Get the bound address
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

/// Create the configured admin account when none exists yet.
async fn bootstrap_admin(state: &AppState) {
    let admin = &state.settings.admin;
    let (Some(username), Some(password)) = (&admin.bootstrap_username, &admin.bootstrap_password)
    else {
        return;
    };

    match state.auth_service().bootstrap(username, password).await {
        Ok(Some(created)) => info!(username = %created.username, "Bootstrap admin created"),
        Ok(None) => {}
        Err(e) => warn!(error = %e, "Admin bootstrap failed"),
    }
}

/// Purge expired admin sessions periodically.
fn spawn_session_cleanup(state: &AppState) {
    let service = state.auth_service();
    let period = Duration::from_secs(state.settings.admin.cleanup_interval_secs.max(60));

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            match service.cleanup_expired().await {
                Ok(0) => {}
                Ok(removed) => info!(removed, "Expired admin sessions purged"),
                Err(e) => warn!(error = %e, "Admin session cleanup failed"),
            }
        }
    });
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
