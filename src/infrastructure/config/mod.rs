//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

use crate::application::errors::ConfigError;

/// Bot configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    pub bot: BotConfig,
    pub server: ServerConfig,
    pub session: SessionConfig,
    pub storage: StorageConfig,
    pub menu: MenuConfig,
    pub order: OrderConfig,
    pub messaging: MessagingConfig,
    pub email: EmailConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct BotConfig {
    pub name: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: "order-bot".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct SessionConfig {
    pub timeout_ms: u64,
    pub cleanup_interval_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 30 * 60 * 1000,
            cleanup_interval_ms: 5 * 60 * 1000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    Sqlite,
}

impl FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "memory" => Ok(StorageBackend::Memory),
            "sqlite" => Ok(StorageBackend::Sqlite),
            other => Err(ConfigError::InvalidValue(format!("unknown storage backend '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub sqlite_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            sqlite_path: PathBuf::from("order-bot.db"),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct MenuConfig {
    /// YAML catalog replacing the built-in menu
    pub catalog_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct OrderConfig {
    pub delivery_fee_cents: i64,
}

impl Default for OrderConfig {
    fn default() -> Self {
        Self {
            delivery_fee_cents: 500,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessagingProvider {
    #[default]
    Console,
    Chatguru,
    Twilio,
}

impl FromStr for MessagingProvider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "console" => Ok(MessagingProvider::Console),
            "chatguru" => Ok(MessagingProvider::Chatguru),
            "twilio" => Ok(MessagingProvider::Twilio),
            other => Err(ConfigError::InvalidValue(format!("unknown messaging provider '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct MessagingConfig {
    pub provider: MessagingProvider,
    pub chatguru: ChatGuruConfig,
    pub twilio: TwilioConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ChatGuruConfig {
    pub api_url: String,
    pub api_key: String,
    pub account_id: String,
    pub phone_id: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: String,
    /// Sender number in E.164 form, e.g. `+14155238886`
    pub phone_number: String,
}

/// Email configuration (Resend). Confirmation emails are only logged while
/// no API key is set.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct EmailConfig {
    pub resend_api_key: String,
    pub from_email: String,
    pub from_name: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            resend_api_key: String::new(),
            from_email: "pedidos@restaurante.com".to_string(),
            from_name: "Restaurante".to_string(),
        }
    }
}

impl EmailConfig {
    /// Formatted "From" header value
    pub fn from_header(&self) -> String {
        format!("{} <{}>", self.from_name, self.from_email)
    }

    pub fn is_enabled(&self) -> bool {
        !self.resend_api_key.is_empty()
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct SecurityConfig {
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window_seconds: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 100,
            window_seconds: 15 * 60,
        }
    }
}

impl Config {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| ConfigError::Parse(format!("Failed to read config: {}", e)))?;

        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse config: {}", e)))
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(self)
            .map_err(|e| ConfigError::Parse(format!("Failed to serialize config: {}", e)))
    }

    /// Defaults with environment overrides applied
    pub fn load_env() -> Result<Self, ConfigError> {
        let mut config = Config::default();
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Override fields from environment-style variables. `lookup` returns the
    /// value of a variable, or `None` when it is unset.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(port) = parse_var(&var, "PORT")? {
            self.server.port = port;
        }
        if let Some(timeout) = parse_var(&var, "SESSION_TIMEOUT_MS")? {
            self.session.timeout_ms = timeout;
        }
        if let Some(backend) = parse_var(&var, "STORAGE_BACKEND")? {
            self.storage.backend = backend;
        }
        if let Some(path) = var("SQLITE_PATH") {
            self.storage.sqlite_path = PathBuf::from(path);
        }
        if let Some(fee) = parse_var(&var, "DELIVERY_FEE_CENTS")? {
            self.order.delivery_fee_cents = fee;
        }
        if let Some(provider) = parse_var(&var, "MESSAGING_PROVIDER")? {
            self.messaging.provider = provider;
        }

        let chatguru = &mut self.messaging.chatguru;
        if let Some(v) = var("CHATGURU_API_URL") {
            chatguru.api_url = v;
        }
        if let Some(v) = var("CHATGURU_API_KEY") {
            chatguru.api_key = v;
        }
        if let Some(v) = var("CHATGURU_ACCOUNT_ID") {
            chatguru.account_id = v;
        }
        if let Some(v) = var("CHATGURU_PHONE_ID") {
            chatguru.phone_id = v;
        }

        let twilio = &mut self.messaging.twilio;
        if let Some(v) = var("TWILIO_ACCOUNT_SID") {
            twilio.account_sid = v;
        }
        if let Some(v) = var("TWILIO_AUTH_TOKEN") {
            twilio.auth_token = v;
        }
        if let Some(v) = var("TWILIO_PHONE_NUMBER") {
            twilio.phone_number = v;
        }

        if let Some(key) = var("RESEND_API_KEY") {
            self.email.resend_api_key = key;
        }
        if let Some(from) = var("EMAIL_FROM") {
            self.email.from_email = from;
        }

        if let Some(max) = parse_var(&var, "RATE_LIMIT_MAX_REQUESTS")? {
            self.security.rate_limit.max_requests = max;
        }
        if let Some(window) = parse_var(&var, "RATE_LIMIT_WINDOW_SECONDS")? {
            self.security.rate_limit.window_seconds = window;
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.session.timeout_ms == 0 {
            return Err(ConfigError::InvalidValue("session.timeout-ms must be greater than zero".into()));
        }
        if self.session.cleanup_interval_ms == 0 {
            return Err(ConfigError::InvalidValue(
                "session.cleanup-interval-ms must be greater than zero".into(),
            ));
        }
        if self.order.delivery_fee_cents < 0 {
            return Err(ConfigError::InvalidValue("order.delivery-fee-cents cannot be negative".into()));
        }
        if self.security.rate_limit.max_requests == 0 || self.security.rate_limit.window_seconds == 0 {
            return Err(ConfigError::InvalidValue(
                "security.rate-limit values must be greater than zero".into(),
            ));
        }

        match self.messaging.provider {
            MessagingProvider::Console => {}
            MessagingProvider::Chatguru => {
                let c = &self.messaging.chatguru;
                require(&c.api_url, "messaging.chatguru.api-url")?;
                require(&c.api_key, "messaging.chatguru.api-key")?;
                require(&c.account_id, "messaging.chatguru.account-id")?;
                require(&c.phone_id, "messaging.chatguru.phone-id")?;
            }
            MessagingProvider::Twilio => {
                let t = &self.messaging.twilio;
                require(&t.account_sid, "messaging.twilio.account-sid")?;
                require(&t.auth_token, "messaging.twilio.auth-token")?;
                require(&t.phone_number, "messaging.twilio.phone-number")?;
            }
        }

        if self.email.is_enabled() && !self.email.from_email.contains('@') {
            return Err(ConfigError::InvalidValue("email.from-email must be an email address".into()));
        }

        Ok(())
    }
}

fn require(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::MissingField(field.to_string()));
    }
    Ok(())
}

fn parse_var<T, F>(var: &F, key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| ConfigError::InvalidValue(format!("{}: {}", key, e))),
        None => Ok(None),
    }
}
