use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub telegram: TelegramConfig,
    pub llm: LlmConfig,
    pub server: ServerConfig,
    pub admin: AdminConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct TelegramConfig {
    pub bot_token: SecretString,
    /// Absolute path the webhook is served on, e.g. `/webhook`.
    pub webhook_path: String,
    /// Shared secret echoed by Telegram in `X-Telegram-Bot-Api-Secret-Token`.
    pub webhook_secret: SecretString,
    /// Public base URL. When unset, `RENDER_EXTERNAL_URL` is consulted so the
    /// hosted deployment works without extra configuration.
    pub base_url: Option<String>,
}

#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub api_key: SecretString,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub health_check_port: u16,
}

#[derive(Clone, Debug, Default)]
pub struct AdminConfig {
    /// User ids allowed to mutate the catalog via `/add`.
    pub ids: Vec<i64>,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub bot_token: Option<String>,
    pub webhook_secret: Option<String>,
    pub llm_api_key: Option<String>,
    pub llm_model: Option<String>,
    pub admin_ids: Option<Vec<i64>>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://modista.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            telegram: TelegramConfig {
                bot_token: String::new().into(),
                webhook_path: "/webhook".to_string(),
                webhook_secret: String::new().into(),
                base_url: None,
            },
            llm: LlmConfig {
                api_key: String::new().into(),
                base_url: "https://api.openai.com/v1".to_string(),
                model: "gpt-4o-mini".to_string(),
                timeout_secs: 60,
            },
            server: ServerConfig {
                bind_address: "0.0.0.0".to_string(),
                port: 8000,
                health_check_port: 8080,
            },
            admin: AdminConfig::default(),
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl TelegramConfig {
    /// Public base URL with any trailing slash stripped. Falls back to
    /// `RENDER_EXTERNAL_URL` when no base URL is configured.
    pub fn effective_base_url(&self) -> Option<String> {
        self.base_url
            .clone()
            .or_else(|| read_env("RENDER_EXTERNAL_URL"))
            .map(|url| url.trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
    }

    /// Full webhook URL, when a base URL is resolvable.
    pub fn webhook_url(&self) -> Option<String> {
        let base = self.effective_base_url()?;
        let path = if self.webhook_path.starts_with('/') {
            self.webhook_path.clone()
        } else {
            format!("/{}", self.webhook_path)
        };
        Some(format!("{base}{path}"))
    }

    /// Webhook URL suitable for registration. The Bot API only accepts https
    /// endpoints, so an http base yields `None` and the bot keeps running
    /// without a registered webhook.
    pub fn registration_url(&self) -> Option<String> {
        self.webhook_url().filter(|url| url.starts_with("https://"))
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("modista.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(telegram) = patch.telegram {
            if let Some(bot_token_value) = telegram.bot_token {
                self.telegram.bot_token = bot_token_value.into();
            }
            if let Some(webhook_path) = telegram.webhook_path {
                self.telegram.webhook_path = webhook_path;
            }
            if let Some(webhook_secret_value) = telegram.webhook_secret {
                self.telegram.webhook_secret = webhook_secret_value.into();
            }
            if let Some(base_url) = telegram.base_url {
                self.telegram.base_url = Some(base_url);
            }
        }

        if let Some(llm) = patch.llm {
            if let Some(api_key_value) = llm.api_key {
                self.llm.api_key = api_key_value.into();
            }
            if let Some(base_url) = llm.base_url {
                self.llm.base_url = base_url;
            }
            if let Some(model) = llm.model {
                self.llm.model = model;
            }
            if let Some(timeout_secs) = llm.timeout_secs {
                self.llm.timeout_secs = timeout_secs;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(health_check_port) = server.health_check_port {
                self.server.health_check_port = health_check_port;
            }
        }

        if let Some(admin) = patch.admin {
            if let Some(ids) = admin.ids {
                self.admin.ids = ids;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("MODISTA_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("MODISTA_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = parse_u32("MODISTA_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("MODISTA_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_u64("MODISTA_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("MODISTA_BOT_TOKEN") {
            self.telegram.bot_token = value.into();
        }
        if let Some(value) = read_env("MODISTA_WEBHOOK_PATH") {
            self.telegram.webhook_path = value;
        }
        if let Some(value) = read_env("MODISTA_WEBHOOK_SECRET") {
            self.telegram.webhook_secret = value.into();
        }
        if let Some(value) = read_env("MODISTA_WEBHOOK_BASE_URL") {
            self.telegram.base_url = Some(value);
        }

        if let Some(value) = read_env("MODISTA_LLM_API_KEY") {
            self.llm.api_key = value.into();
        }
        if let Some(value) = read_env("MODISTA_LLM_BASE_URL") {
            self.llm.base_url = value;
        }
        if let Some(value) = read_env("MODISTA_LLM_MODEL") {
            self.llm.model = value;
        }
        if let Some(value) = read_env("MODISTA_LLM_TIMEOUT_SECS") {
            self.llm.timeout_secs = parse_u64("MODISTA_LLM_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("MODISTA_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("MODISTA_SERVER_PORT") {
            self.server.port = parse_u16("MODISTA_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("MODISTA_SERVER_HEALTH_CHECK_PORT") {
            self.server.health_check_port =
                parse_u16("MODISTA_SERVER_HEALTH_CHECK_PORT", &value)?;
        }

        if let Some(value) = read_env("MODISTA_ADMIN_IDS") {
            self.admin.ids = parse_admin_ids(&value);
        }

        let log_level = read_env("MODISTA_LOGGING_LEVEL").or_else(|| read_env("MODISTA_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("MODISTA_LOGGING_FORMAT").or_else(|| read_env("MODISTA_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(bot_token) = overrides.bot_token {
            self.telegram.bot_token = bot_token.into();
        }
        if let Some(webhook_secret) = overrides.webhook_secret {
            self.telegram.webhook_secret = webhook_secret.into();
        }
        if let Some(llm_api_key) = overrides.llm_api_key {
            self.llm.api_key = llm_api_key.into();
        }
        if let Some(llm_model) = overrides.llm_model {
            self.llm.model = llm_model;
        }
        if let Some(admin_ids) = overrides.admin_ids {
            self.admin.ids = admin_ids;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_telegram(&self.telegram)?;
        validate_llm(&self.llm)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        Ok(())
    }

    pub fn is_admin(&self, user_id: i64) -> bool {
        self.admin.ids.contains(&user_id)
    }
}

/// Parses a comma-separated id list; entries that are not integers are
/// ignored rather than failing startup.
pub fn parse_admin_ids(raw: &str) -> Vec<i64> {
    raw.split(',').filter_map(|part| part.trim().parse::<i64>().ok()).collect()
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("modista.toml"), PathBuf::from("config/modista.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_telegram(telegram: &TelegramConfig) -> Result<(), ConfigError> {
    let bot_token = telegram.bot_token.expose_secret();
    if bot_token.is_empty() {
        return Err(ConfigError::Validation(
            "telegram.bot_token is required. Get it from @BotFather".to_string(),
        ));
    }
    if !bot_token.contains(':') {
        return Err(ConfigError::Validation(
            "telegram.bot_token must look like `<bot_id>:<secret>` as issued by @BotFather"
                .to_string(),
        ));
    }

    if telegram.webhook_secret.expose_secret().is_empty() {
        return Err(ConfigError::Validation(
            "telegram.webhook_secret is required; inbound updates are rejected without it"
                .to_string(),
        ));
    }

    if !telegram.webhook_path.starts_with('/') {
        return Err(ConfigError::Validation(
            "telegram.webhook_path must be an absolute path starting with `/`".to_string(),
        ));
    }

    if let Some(base_url) = &telegram.base_url {
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ConfigError::Validation(
                "telegram.base_url must start with http:// or https://".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_llm(llm: &LlmConfig) -> Result<(), ConfigError> {
    if llm.api_key.expose_secret().trim().is_empty() {
        return Err(ConfigError::Validation("llm.api_key is required".to_string()));
    }

    if llm.model.trim().is_empty() {
        return Err(ConfigError::Validation("llm.model must not be empty".to_string()));
    }

    if llm.timeout_secs == 0 || llm.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "llm.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation(
            "server.port must be greater than zero".to_string(),
        ));
    }

    if server.health_check_port == 0 {
        return Err(ConfigError::Validation(
            "server.health_check_port must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    telegram: Option<TelegramPatch>,
    llm: Option<LlmPatch>,
    server: Option<ServerPatch>,
    admin: Option<AdminPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct TelegramPatch {
    bot_token: Option<String>,
    webhook_path: Option<String>,
    webhook_secret: Option<String>,
    base_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LlmPatch {
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    health_check_port: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
struct AdminPatch {
    ids: Option<Vec<i64>>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::sync::{Mutex, OnceLock};

    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    use super::{parse_admin_ids, AppConfig, ConfigError, ConfigOverrides, LoadOptions};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    fn required_overrides() -> ConfigOverrides {
        ConfigOverrides {
            bot_token: Some("12345:test-token".to_string()),
            webhook_secret: Some("hook-secret".to_string()),
            llm_api_key: Some("sk-test".to_string()),
            ..ConfigOverrides::default()
        }
    }

    #[test]
    fn admin_id_parsing_skips_garbage_entries() {
        assert_eq!(parse_admin_ids("42, 7,oops, -3 ,"), vec![42, 7, -3]);
        assert!(parse_admin_ids("").is_empty());
    }

    #[test]
    fn defaults_fail_validation_without_required_secrets() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(&["MODISTA_BOT_TOKEN", "MODISTA_WEBHOOK_SECRET", "MODISTA_LLM_API_KEY"]);

        let error = match AppConfig::load(LoadOptions::default()) {
            Ok(_) => return Err("expected validation failure".to_string()),
            Err(error) => error,
        };
        let mentions_token = matches!(
            error,
            ConfigError::Validation(ref message) if message.contains("telegram.bot_token")
        );
        ensure(mentions_token, "validation failure should mention telegram.bot_token")
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TEST_MODISTA_BOT_TOKEN", "999:from-env");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("modista.toml");
            fs::write(
                &path,
                r#"
[telegram]
bot_token = "${TEST_MODISTA_BOT_TOKEN}"
webhook_secret = "file-secret"

[llm]
api_key = "sk-file"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.telegram.bot_token.expose_secret() == "999:from-env",
                "bot token should be interpolated from the environment",
            )?;
            ensure(
                config.telegram.webhook_secret.expose_secret() == "file-secret",
                "webhook secret should come from the file",
            )?;
            Ok(())
        })();

        clear_vars(&["TEST_MODISTA_BOT_TOKEN"]);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("MODISTA_DATABASE_URL", "sqlite://from-env.db");
        env::set_var("MODISTA_ADMIN_IDS", "1,2,3");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("modista.toml");
            fs::write(
                &path,
                r#"
[database]
url = "sqlite://from-file.db"

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    database_url: Some("sqlite://from-override.db".to_string()),
                    log_level: Some("debug".to_string()),
                    ..required_overrides()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.database.url == "sqlite://from-override.db",
                "override database url should win over env and file",
            )?;
            ensure(config.logging.level == "debug", "overridden log level should be debug")?;
            ensure(config.admin.ids == vec![1, 2, 3], "admin ids should come from env")?;
            ensure(config.is_admin(2), "id 2 should be recognized as admin")?;
            ensure(!config.is_admin(9), "id 9 should not be admin")?;
            Ok(())
        })();

        clear_vars(&["MODISTA_DATABASE_URL", "MODISTA_ADMIN_IDS"]);
        result
    }

    #[test]
    fn webhook_url_prefers_configured_base_then_render_hint() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(&["RENDER_EXTERNAL_URL"]);

        let result = (|| -> Result<(), String> {
            let mut config = AppConfig::default();
            ensure(
                config.telegram.webhook_url().is_none(),
                "no base url should mean no webhook url",
            )?;

            env::set_var("RENDER_EXTERNAL_URL", "https://modista.onrender.com/");
            ensure(
                config.telegram.webhook_url().as_deref()
                    == Some("https://modista.onrender.com/webhook"),
                "render hint should be used when no base url is configured",
            )?;

            config.telegram.base_url = Some("https://shop.example".to_string());
            ensure(
                config.telegram.webhook_url().as_deref() == Some("https://shop.example/webhook"),
                "configured base url should win over the render hint",
            )?;
            Ok(())
        })();

        clear_vars(&["RENDER_EXTERNAL_URL"]);
        result
    }

    #[test]
    fn registration_url_requires_an_https_base() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(&["RENDER_EXTERNAL_URL"]);

        let mut config = AppConfig::default();
        config.telegram.base_url = Some("http://localhost:8000".to_string());
        ensure(
            config.telegram.webhook_url().as_deref() == Some("http://localhost:8000/webhook"),
            "http base should still resolve a webhook url",
        )?;
        ensure(
            config.telegram.registration_url().is_none(),
            "http base must not produce a registration url",
        )?;

        config.telegram.base_url = Some("https://shop.example".to_string());
        ensure(
            config.telegram.registration_url().as_deref() == Some("https://shop.example/webhook"),
            "https base should produce a registration url",
        )
    }

    #[test]
    fn secret_values_are_not_leaked_by_debug() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("MODISTA_BOT_TOKEN", "777:super-secret");
        env::set_var("MODISTA_WEBHOOK_SECRET", "hook-super-secret");
        env::set_var("MODISTA_LLM_API_KEY", "sk-super-secret");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;
            let debug = format!("{config:?}");

            ensure(!debug.contains("super-secret"), "debug output should not contain secrets")?;
            Ok(())
        })();

        clear_vars(&["MODISTA_BOT_TOKEN", "MODISTA_WEBHOOK_SECRET", "MODISTA_LLM_API_KEY"]);
        result
    }
}
