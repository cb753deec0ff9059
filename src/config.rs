use config::{Config, ConfigError, Environment, File};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{error, info, warn};
use url::Url;
use validator::{Validate, ValidationError, ValidationErrors};

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_PORT: u16 = 5000;
const CONFIG_DIR: &str = "config";
const DEFAULT_BATCH_FILE: &str = "stock_data.json";
const DEFAULT_DB_HOST: &str = "localhost";
const DEFAULT_DB_PORT: u16 = 5432;
const DEFAULT_DB_USER: &str = "api_user";
const DEFAULT_DB_NAME: &str = "stockwatch_db";
const DEFAULT_SIMULATOR_INTERVAL_SECS: u64 = 5 * 60;
const DEFAULT_PRODUCT_NAME: &str = "Mango Oatmeal";

/// A product the simulator reports on, with its fixed shelf price.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ProductConfig {
    pub name: String,
    pub price: Decimal,
}

/// Simulator configuration
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct SimulatorConfig {
    /// Seconds between two simulated batches
    #[serde(default = "default_simulator_interval")]
    #[validate(range(min = 1))]
    pub interval_secs: u64,

    /// Lower bound of the random pause between two store fetches
    #[serde(default = "default_store_delay_min_ms")]
    pub store_delay_min_ms: u64,

    /// Upper bound of the random pause between two store fetches (0 disables the pause)
    #[serde(default = "default_store_delay_max_ms")]
    pub store_delay_max_ms: u64,

    /// Area code -> store ids
    #[serde(default = "default_areas")]
    pub areas: BTreeMap<String, Vec<String>>,

    /// Products observed in every store
    #[serde(default = "default_products")]
    pub products: Vec<ProductConfig>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_simulator_interval(),
            store_delay_min_ms: default_store_delay_min_ms(),
            store_delay_max_ms: default_store_delay_max_ms(),
            areas: default_areas(),
            products: default_products(),
        }
    }
}

impl SimulatorConfig {
    fn validate_delays(&self) -> Result<(), ValidationError> {
        if self.store_delay_min_ms > self.store_delay_max_ms {
            let mut err = ValidationError::new("store_delay_min_ms");
            err.message = Some("store_delay_min_ms must not exceed store_delay_max_ms".into());
            return Err(err);
        }
        Ok(())
    }
}

/// Application configuration structure with validation
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Full database connection URL; takes precedence over the discrete `db_*` fields
    #[serde(default)]
    pub database_url: Option<String>,

    #[serde(default = "default_db_host")]
    pub db_host: String,

    #[serde(default = "default_db_port")]
    pub db_port: u16,

    #[serde(default = "default_db_user")]
    pub db_user: String,

    #[serde(default)]
    pub db_password: Option<String>,

    #[serde(default = "default_db_name")]
    #[validate(length(min = 1))]
    pub db_name: String,

    /// Append `sslmode=require` to postgres URLs given through `database_url`
    #[serde(default = "default_true_bool")]
    pub db_require_ssl: bool,

    /// Server host address
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Application environment
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    #[validate(custom = "validate_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// Whether to run database migrations on startup
    #[serde(default)]
    pub auto_migrate: bool,

    /// CORS: comma-separated list of allowed origins
    #[serde(default)]
    pub cors_allowed_origins: Option<String>,

    /// Allow permissive CORS outside development
    #[serde(default)]
    pub cors_allow_any_origin: bool,

    /// DB pool: max connections
    #[serde(default = "default_db_max_connections")]
    #[validate(range(min = 1))]
    pub db_max_connections: u32,

    /// DB pool: min connections
    #[serde(default = "default_db_min_connections")]
    pub db_min_connections: u32,

    /// DB timeouts (seconds)
    #[serde(default = "default_db_connect_timeout_secs")]
    pub db_connect_timeout_secs: u64,
    #[serde(default = "default_db_idle_timeout_secs")]
    pub db_idle_timeout_secs: u64,
    #[serde(default = "default_db_acquire_timeout_secs")]
    pub db_acquire_timeout_secs: u64,

    /// Batch file shared between the simulator and the ETL trigger
    #[serde(default = "default_batch_file")]
    pub batch_file: PathBuf,

    #[serde(default)]
    pub simulator: SimulatorConfig,
}

impl AppConfig {
    /// Creates a new configuration with defaults for everything but the essentials
    pub fn new(database_url: Option<String>, host: String, port: u16, environment: String) -> Self {
        Self {
            database_url,
            db_host: default_db_host(),
            db_port: default_db_port(),
            db_user: default_db_user(),
            db_password: None,
            db_name: default_db_name(),
            db_require_ssl: default_true_bool(),
            host,
            port,
            environment,
            log_level: default_log_level(),
            log_json: false,
            auto_migrate: false,
            cors_allowed_origins: None,
            cors_allow_any_origin: false,
            db_max_connections: default_db_max_connections(),
            db_min_connections: default_db_min_connections(),
            db_connect_timeout_secs: default_db_connect_timeout_secs(),
            db_idle_timeout_secs: default_db_idle_timeout_secs(),
            db_acquire_timeout_secs: default_db_acquire_timeout_secs(),
            batch_file: default_batch_file(),
            simulator: SimulatorConfig::default(),
        }
    }

    /// Resolves the URL used to open the database.
    ///
    /// `database_url` wins when present. Otherwise a postgres URL is assembled from
    /// the discrete `db_*` settings.
    pub fn connection_url(&self) -> Result<String, AppConfigError> {
        if let Some(raw) = self.database_url.as_deref().filter(|s| !s.trim().is_empty()) {
            return Ok(self.with_ssl_requirement(raw.trim()));
        }

        warn!(
            host = %self.db_host,
            db = %self.db_name,
            "DATABASE_URL not set; using discrete database settings"
        );

        let mut url = Url::parse(&format!("postgres://{}", self.db_host))
            .map_err(|e| AppConfigError::InvalidDatabaseUrl(e.to_string()))?;
        url.set_port(Some(self.db_port))
            .and_then(|_| url.set_username(&self.db_user))
            .and_then(|_| url.set_password(self.db_password.as_deref()))
            .map_err(|_| {
                AppConfigError::InvalidDatabaseUrl(format!("cannot build URL for host {}", self.db_host))
            })?;
        url.set_path(&self.db_name);
        Ok(url.to_string())
    }

    fn with_ssl_requirement(&self, raw: &str) -> String {
        let is_postgres = raw.starts_with("postgres://") || raw.starts_with("postgresql://");
        if !self.db_require_ssl || !is_postgres || raw.contains("sslmode=") {
            return raw.to_string();
        }
        let separator = if raw.contains('?') { '&' } else { '?' };
        format!("{raw}{separator}sslmode=require")
    }

    /// Applies the unprefixed deployment variables
    /// (`DATABASE_URL`, `DB_HOST`, `DB_PORT`, `DB_USER`, `DB_PASS`, `DB_NAME`).
    pub fn apply_deployment_env<F>(&mut self, lookup: F) -> Result<(), AppConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = lookup("DATABASE_URL") {
            self.database_url = Some(url);
        }
        if let Some(host) = lookup("DB_HOST") {
            self.db_host = host;
        }
        if let Some(port) = lookup("DB_PORT") {
            self.db_port = port
                .trim()
                .parse()
                .map_err(|_| AppConfigError::InvalidDatabaseUrl(format!("invalid DB_PORT '{port}'")))?;
        }
        if let Some(user) = lookup("DB_USER") {
            self.db_user = user;
        }
        if let Some(password) = lookup("DB_PASS") {
            self.db_password = Some(password);
        }
        if let Some(name) = lookup("DB_NAME") {
            self.db_name = name;
        }
        Ok(())
    }

    /// Checks if running in development environment
    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development")
    }

    /// Returns true if explicit CORS origins are configured
    pub fn has_cors_allowed_origins(&self) -> bool {
        self.cors_allowed_origins
            .as_ref()
            .map(|raw| raw.split(',').any(|origin| !origin.trim().is_empty()))
            .unwrap_or(false)
    }

    /// Whether we should fall back to permissive CORS
    pub fn should_allow_permissive_cors(&self) -> bool {
        self.is_development() || self.cors_allow_any_origin
    }

    fn validate_additional_constraints(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if !self.should_allow_permissive_cors() && !self.has_cors_allowed_origins() {
            let mut err = ValidationError::new("cors_allowed_origins_required");
            err.message = Some(
                "Set APP__CORS_ALLOWED_ORIGINS for non-development environments or explicitly opt-in via APP__CORS_ALLOW_ANY_ORIGIN=true".into(),
            );
            errors.add("cors_allowed_origins", err);
        }

        if self.simulator.areas.is_empty()
            || self.simulator.areas.values().any(|stores| stores.is_empty())
        {
            let mut err = ValidationError::new("simulator_areas");
            err.message = Some("simulator.areas needs at least one area, each with at least one store".into());
            errors.add("simulator", err);
        }

        if self.simulator.products.is_empty() {
            let mut err = ValidationError::new("simulator_products");
            err.message = Some("simulator.products needs at least one product".into());
            errors.add("simulator", err);
        }

        if let Err(err) = self.simulator.validate_delays() {
            errors.add("simulator", err);
        }

        if self.simulator.products.iter().any(|p| p.price.is_sign_negative()) {
            let mut err = ValidationError::new("simulator_products");
            err.message = Some("product prices must not be negative".into());
            errors.add("simulator", err);
        }

        if errors.errors().is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Runs field validation plus the cross-field checks
    pub fn validate_all(&self) -> Result<(), AppConfigError> {
        self.validate()?;
        self.simulator.validate()?;
        self.validate_additional_constraints()?;
        Ok(())
    }

    /// Gets log level reference
    pub fn log_level(&self) -> &str {
        &self.log_level
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("Configuration loading failed: {0}")]
    Load(#[from] ConfigError),

    #[error("Configuration validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Invalid database settings: {0}")]
    InvalidDatabaseUrl(String),
}

/// Default value functions
fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_true_bool() -> bool {
    true
}

fn default_db_host() -> String {
    DEFAULT_DB_HOST.to_string()
}

fn default_db_port() -> u16 {
    DEFAULT_DB_PORT
}

fn default_db_user() -> String {
    DEFAULT_DB_USER.to_string()
}

fn default_db_name() -> String {
    DEFAULT_DB_NAME.to_string()
}

fn default_db_max_connections() -> u32 {
    4
}
fn default_db_min_connections() -> u32 {
    1
}
fn default_db_connect_timeout_secs() -> u64 {
    30
}
fn default_db_idle_timeout_secs() -> u64 {
    600
}
fn default_db_acquire_timeout_secs() -> u64 {
    8
}

fn default_batch_file() -> PathBuf {
    PathBuf::from(DEFAULT_BATCH_FILE)
}

fn default_simulator_interval() -> u64 {
    DEFAULT_SIMULATOR_INTERVAL_SECS
}

fn default_store_delay_min_ms() -> u64 {
    1_000
}

fn default_store_delay_max_ms() -> u64 {
    3_000
}

fn default_areas() -> BTreeMap<String, Vec<String>> {
    BTreeMap::from([
        (
            "400001".to_string(),
            vec!["BLK_MUM_101".to_string(), "BLK_MUM_102".to_string()],
        ),
        (
            "201301".to_string(),
            vec![
                "BLK_NOI_201".to_string(),
                "BLK_NOI_202".to_string(),
                "BLK_NOI_203".to_string(),
            ],
        ),
    ])
}

fn default_products() -> Vec<ProductConfig> {
    vec![ProductConfig {
        name: DEFAULT_PRODUCT_NAME.to_string(),
        price: dec!(199.00),
    }]
}

/// Validates log level values
fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if valid_levels.contains(&level.to_lowercase().as_str()) {
        Ok(())
    } else {
        let mut err = ValidationError::new("log_level");
        err.message = Some("Must be one of: trace, debug, info, warn, error".into());
        Err(err)
    }
}

/// Initializes tracing using the provided log level as the default filter
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_directive = format!("stockwatch_api={},tower_http=debug", level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    if json {
        let _ = fmt()
            .with_env_filter(EnvFilter::new(filter_directive))
            .json()
            .try_init();
    } else {
        let _ = fmt()
            .with_env_filter(EnvFilter::new(filter_directive))
            .try_init();
    }
}

/// Loads application configuration
///
/// Layers configuration sources in this order:
/// 1. Built-in defaults
/// 2. Default config (config/default.toml)
/// 3. Environment-specific config (config/{env}.toml)
/// 4. Docker config (config/docker.toml) if DOCKER env var is set
/// 5. Environment variables (APP__*)
/// 6. The unprefixed database variables (DATABASE_URL, DB_*)
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    // Support both RUN_ENV and APP_ENV for selecting config profile
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    info!("Loading configuration for environment: {}", run_env);

    if !Path::new(CONFIG_DIR).exists() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            CONFIG_DIR
        );
    }

    let mut builder = Config::builder()
        .set_default("host", "0.0.0.0")?
        .set_default("port", DEFAULT_PORT as i64)?
        .set_default("environment", DEFAULT_ENV)?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?
        .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
        .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, run_env)).required(false));

    if env::var("DOCKER").is_ok() {
        info!("Docker environment detected");
        builder =
            builder.add_source(File::with_name(&format!("{}/docker", CONFIG_DIR)).required(false));
    }

    let config = builder
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    let mut app_config: AppConfig = config.try_deserialize()?;
    app_config.apply_deployment_env(|key| env::var(key).ok())?;

    app_config.validate_all().map_err(|e| {
        error!("Configuration validation failed: {}", e);
        e
    })?;

    info!("Configuration loaded successfully");
    Ok(app_config)
}
