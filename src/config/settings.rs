//! Application settings and configuration structures.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Root configuration structure containing all application settings.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Server configuration (host, port)
    pub server: ServerSettings,

    /// Database configuration (PostgreSQL)
    pub database: DatabaseSettings,

    /// Redis configuration (optional cache and rate limiting backend)
    #[serde(default)]
    pub redis: RedisSettings,

    /// Admin panel authentication
    pub admin: AdminSettings,

    /// Visitor chat settings
    pub chat: ChatSettings,

    /// Payment gateway credentials
    pub payments: PaymentSettings,

    /// Outbound messaging bot notifications
    #[serde(default)]
    pub notifications: NotificationSettings,

    /// Object storage and CDN for media files
    pub media: MediaSettings,

    /// Instagram Graph API feed
    pub instagram: InstagramSettings,

    /// Rate limiting configuration
    pub rate_limit: RateLimitSettings,

    /// CORS configuration
    pub cors: CorsSettings,

    /// Current environment (development, staging, production)
    pub environment: String,
}

/// Server binding configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    /// Host address to bind to (e.g., "0.0.0.0")
    pub host: String,

    /// Port number to listen on
    pub port: u16,
}

/// PostgreSQL database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// Database connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections to maintain
    pub min_connections: u32,

    /// Connection acquire timeout in seconds
    pub acquire_timeout: u64,

    /// Apply pending migrations on startup
    pub run_migrations: bool,
}

/// Redis configuration. Without a URL the service runs without cache
/// and rate limiting.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RedisSettings {
    pub url: Option<String>,
}

/// Admin session settings.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminSettings {
    /// Name of the session cookie
    pub cookie_name: String,

    /// Session lifetime in days
    pub session_ttl_days: i64,

    /// Mark the cookie `Secure` (HTTPS only)
    pub secure_cookie: bool,

    /// How often expired sessions are purged, in seconds
    pub cleanup_interval_secs: u64,

    /// Admin account created on first start when none exists
    pub bootstrap_username: Option<String>,
    pub bootstrap_password: Option<String>,
}

/// Visitor chat settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatSettings {
    /// Use the in-process real-time room relay; when disabled messages are
    /// written straight to the database
    pub realtime_enabled: bool,

    /// Buffered events per room before slow subscribers lag
    pub room_capacity: usize,

    /// Maximum message length in characters
    pub max_message_length: usize,
}

/// Payment gateway settings.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentSettings {
    /// Absolute public URL of this site, used for callback and result URLs
    pub public_base_url: String,

    pub liqpay: LiqPaySettings,
    pub monobank: MonobankSettings,
    pub wayforpay: WayForPaySettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LiqPaySettings {
    pub public_key: Option<String>,
    pub private_key: Option<String>,
    pub checkout_url: String,
    pub sandbox: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonobankSettings {
    /// Merchant API token (`X-Token`)
    pub token: Option<String>,

    /// Base64-encoded PEM public key used to verify `X-Sign`
    pub public_key: Option<String>,

    pub api_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WayForPaySettings {
    pub merchant_account: Option<String>,
    pub secret_key: Option<String>,
    pub merchant_domain: String,
    pub checkout_url: String,
}

/// Telegram bot notification settings.
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationSettings {
    pub telegram_bot_token: Option<String>,
    pub telegram_chat_id: Option<String>,
    pub telegram_api_url: String,

    /// Pending notifications kept in memory before new ones are dropped
    pub queue_capacity: usize,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            telegram_bot_token: None,
            telegram_chat_id: None,
            telegram_api_url: "https://api.telegram.org".into(),
            queue_capacity: 256,
        }
    }
}

/// Object storage (S3-compatible) and CDN configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaSettings {
    pub bucket: String,

    /// Custom endpoint, e.g. a Cloudflare R2 account endpoint
    pub endpoint: Option<String>,

    pub region: String,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,

    /// Public CDN base URL objects are served from
    pub cdn_base_url: String,

    /// Largest accepted upload in bytes
    pub max_upload_bytes: usize,
}

/// Instagram Graph API settings.
#[derive(Debug, Clone, Deserialize)]
pub struct InstagramSettings {
    pub access_token: Option<String>,
    pub api_url: String,
    pub cache_ttl_secs: u64,
}

/// Rate limiting configuration for public write endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitSettings {
    /// Requests allowed per window on public forms
    pub forms_per_window: u32,

    /// Login attempts allowed per window
    pub login_per_window: u32,

    /// Window length in seconds
    pub window_seconds: u64,
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CorsSettings {
    /// Allowed origins (comma-separated in env)
    pub allowed_origins: Vec<String>,
}

impl Settings {
    /// Load settings from environment variables and configuration files.
    ///
    /// The loading order is:
    /// 1. config/default.toml (base configuration)
    /// 2. config/{RUN_ENV}.toml (environment-specific overrides)
    /// 3. Environment variables (highest priority)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if configuration cannot be loaded or parsed,
    /// or if the payment base URL is not absolute.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let environment = std::env::var("RUN_ENV").unwrap_or_else(|_| "development".into());

        Config::builder()
            .set_default("environment", environment.clone())?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("database.acquire_timeout", 30)?
            .set_default("database.run_migrations", true)?
            .set_default("admin.cookie_name", "admin_session")?
            .set_default("admin.session_ttl_days", 7)?
            .set_default("admin.secure_cookie", environment == "production")?
            .set_default("admin.cleanup_interval_secs", 3600)?
            .set_default("chat.realtime_enabled", true)?
            .set_default("chat.room_capacity", 64)?
            .set_default("chat.max_message_length", 2000)?
            .set_default("payments.public_base_url", "http://localhost:3000")?
            .set_default("payments.liqpay.checkout_url", "https://www.liqpay.ua/api/3/checkout")?
            .set_default("payments.liqpay.sandbox", false)?
            .set_default("payments.monobank.api_url", "https://api.monobank.ua")?
            .set_default("payments.wayforpay.merchant_domain", "localhost")?
            .set_default("payments.wayforpay.checkout_url", "https://secure.wayforpay.com/pay")?
            .set_default("notifications.telegram_api_url", "https://api.telegram.org")?
            .set_default("notifications.queue_capacity", 256)?
            .set_default("media.bucket", "media")?
            .set_default("media.region", "auto")?
            .set_default("media.cdn_base_url", "http://localhost:3000/cdn")?
            .set_default("media.max_upload_bytes", 20 * 1024 * 1024)?
            .set_default("instagram.api_url", "https://graph.instagram.com")?
            .set_default("instagram.cache_ttl_secs", 900)?
            .set_default("rate_limit.forms_per_window", 10)?
            .set_default("rate_limit.login_per_window", 5)?
            .set_default("rate_limit.window_seconds", 60)?
            .set_default("cors.allowed_origins", vec!["http://localhost:3000"])?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // APP__PAYMENTS__LIQPAY__PRIVATE_KEY=... -> payments.liqpay.private_key
            .add_source(
                Environment::default()
                    .prefix("APP")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("cors.allowed_origins")
                    .try_parsing(true),
            )
            .set_override_option("server.host", std::env::var("SERVER_HOST").ok())?
            .set_override_option("server.port", std::env::var("SERVER_PORT").ok())?
            .set_override_option("database.url", std::env::var("DATABASE_URL").ok())?
            .set_override_option("redis.url", std::env::var("REDIS_URL").ok())?
            .set_override_option(
                "notifications.telegram_bot_token",
                std::env::var("TELEGRAM_BOT_TOKEN").ok(),
            )?
            .set_override_option(
                "notifications.telegram_chat_id",
                std::env::var("TELEGRAM_CHAT_ID").ok(),
            )?
            .build()?
            .try_deserialize()
            .and_then(|settings: Self| {
                settings.validate()?;
                Ok(settings)
            })
    }

    /// Check cross-field constraints the deserializer cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let base = &self.payments.public_base_url;
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(ConfigError::Message(format!(
                "payments.public_base_url must be an absolute http(s) URL, got {:?}",
                base
            )));
        }
        if self.admin.session_ttl_days <= 0 {
            return Err(ConfigError::Message(
                "admin.session_ttl_days must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Get the full server address as a string.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl PaymentSettings {
    /// Absolute URL of a path on this site, without a doubled slash.
    pub fn public_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.public_base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

impl NotificationSettings {
    /// Both the bot token and the target chat are required to send anything.
    pub fn is_configured(&self) -> bool {
        self.telegram_bot_token.is_some() && self.telegram_chat_id.is_some()
    }
}
