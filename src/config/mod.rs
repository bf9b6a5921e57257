use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::error;

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_TOKEN_EXPIRY_MINUTES: i64 = 30;
const DEFAULT_BCRYPT_COST: u32 = 10;
const DEFAULT_GRAPH_API_BASE: &str = "https://graph.facebook.com/v18.0";
const DEFAULT_SESSION_IDLE_MINUTES: u64 = 1440;

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

// ─── AuthConfig ───────────────────────────────────────────────────────────────

/// Authentication configuration (`[auth]` in config.toml).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HS256 signing secret for bearer tokens.
    /// The built-in default is for local development only.
    pub secret_key: String,
    /// Bearer token lifetime in minutes (default: 30).
    pub token_expiry_minutes: i64,
    /// bcrypt work factor for password hashing (default: 10).
    pub bcrypt_cost: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret_key: "sevad-dev-secret-change-in-production".to_string(),
            token_expiry_minutes: DEFAULT_TOKEN_EXPIRY_MINUTES,
            bcrypt_cost: DEFAULT_BCRYPT_COST,
        }
    }
}

// ─── WhatsAppConfig ───────────────────────────────────────────────────────────

/// WhatsApp Business API configuration (`[whatsapp]` in config.toml).
///
/// With an empty `api_token` the portal runs in demo mode: outbound messages
/// are logged instead of dispatched, and the status probe reports
/// `configured: false`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WhatsAppConfig {
    /// Shared secret echoed back during the Meta webhook verify handshake.
    pub verify_token: String,
    /// Graph API bearer token. Empty = demo mode (log-only outbound).
    pub api_token: String,
    /// Business phone number id used in the Graph API message URL.
    pub phone_number_id: String,
    /// Graph API base URL (override for tests/mocks).
    pub graph_api_base: String,
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            verify_token: "sevad-verify-token".to_string(),
            api_token: String::new(),
            phone_number_id: String::new(),
            graph_api_base: DEFAULT_GRAPH_API_BASE.to_string(),
        }
    }
}

impl WhatsAppConfig {
    /// True when an outbound Graph API token is present.
    pub fn is_configured(&self) -> bool {
        !self.api_token.is_empty()
    }
}

// ─── ChatConfig ───────────────────────────────────────────────────────────────

/// Chatbot session configuration (`[chat]` in config.toml).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Minutes of inactivity before a chat session is evicted (default: 1440).
    /// 0 disables the idle sweeper and sessions live for the process lifetime.
    pub session_idle_minutes: u64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            session_idle_minutes: DEFAULT_SESSION_IDLE_MINUTES,
        }
    }
}

// ─── TOML config file ─────────────────────────────────────────────────────────

/// `{data_dir}/config.toml` — all fields are optional overrides.
/// Priority: CLI / env var  >  TOML  >  built-in default.
#[derive(Deserialize, Default)]
struct TomlConfig {
    /// HTTP server port (default: 8000).
    port: Option<u16>,
    /// Bind address (default: "127.0.0.1"; use "0.0.0.0" for LAN access).
    bind_address: Option<String>,
    /// Log level filter string, e.g. "debug", "info,sevad=trace" (default: "info").
    log: Option<String>,
    /// Log output format: "pretty" (default, human-readable) | "json" (structured for log aggregators).
    log_format: Option<String>,
    /// Allowed CORS origins; `["*"]` (default) allows any origin.
    cors_origins: Option<Vec<String>>,
    /// Directory for uploaded document blobs (default: `{data_dir}/uploads`).
    uploads_dir: Option<PathBuf>,
    /// Authentication configuration (`[auth]`).
    auth: Option<AuthConfig>,
    /// WhatsApp Business API configuration (`[whatsapp]`).
    whatsapp: Option<WhatsAppConfig>,
    /// Chatbot session configuration (`[chat]`).
    chat: Option<ChatConfig>,
}

fn load_toml(data_dir: &Path) -> Option<TomlConfig> {
    let path = data_dir.join("config.toml");
    let contents = std::fs::read_to_string(&path).ok()?;
    match toml::from_str::<TomlConfig>(&contents) {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            error!(path = %path.display(), err = %e, "failed to parse config.toml — using defaults");
            None
        }
    }
}

// ─── PortalConfig ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct PortalConfig {
    pub port: u16,
    /// Bind address for the HTTP server (SEVAD_BIND env var, default: "127.0.0.1").
    pub bind_address: String,
    pub data_dir: PathBuf,
    pub log: String,
    /// Log output format: "pretty" (default) | "json".
    pub log_format: String,
    /// Allowed CORS origins; `["*"]` allows any origin.
    pub cors_origins: Vec<String>,
    /// Directory for uploaded document blobs.
    pub uploads_dir: PathBuf,
    pub auth: AuthConfig,
    pub whatsapp: WhatsAppConfig,
    pub chat: ChatConfig,
}

impl PortalConfig {
    /// Build config from CLI/env args + optional TOML file.
    ///
    /// Priority (highest to lowest):
    ///   1. CLI / env — passed as `Some(value)` from clap
    ///   2. TOML file at `{data_dir}/config.toml`
    ///   3. Built-in defaults
    pub fn new(
        port: Option<u16>,
        data_dir: Option<PathBuf>,
        log: Option<String>,
        bind_address: Option<String>,
    ) -> Self {
        let data_dir = data_dir.unwrap_or_else(default_data_dir);

        // Load TOML as the lowest-priority override layer
        let toml = load_toml(&data_dir).unwrap_or_default();

        let port = port.or(toml.port).unwrap_or(DEFAULT_PORT);
        let log = log.or(toml.log).unwrap_or_else(|| "info".to_string());

        let bind_address = bind_address
            .or(std::env::var("SEVAD_BIND").ok().filter(|s| !s.is_empty()))
            .or(toml.bind_address)
            .unwrap_or_else(default_bind_address);

        let log_format = std::env::var("SEVAD_LOG_FORMAT")
            .ok()
            .filter(|s| !s.is_empty())
            .or(toml.log_format)
            .unwrap_or_else(|| "pretty".to_string());

        let cors_origins = toml.cors_origins.unwrap_or_else(|| vec!["*".to_string()]);

        let uploads_dir = toml
            .uploads_dir
            .unwrap_or_else(|| data_dir.join("uploads"));

        let mut auth = toml.auth.unwrap_or_default();
        if let Ok(secret) = std::env::var("SEVAD_SECRET_KEY") {
            if !secret.is_empty() {
                auth.secret_key = secret;
            }
        }

        let mut whatsapp = toml.whatsapp.unwrap_or_default();
        if let Ok(token) = std::env::var("SEVAD_WHATSAPP_TOKEN") {
            if !token.is_empty() {
                whatsapp.api_token = token;
            }
        }
        if let Ok(token) = std::env::var("SEVAD_WHATSAPP_VERIFY_TOKEN") {
            if !token.is_empty() {
                whatsapp.verify_token = token;
            }
        }
        if let Ok(id) = std::env::var("SEVAD_WHATSAPP_PHONE_NUMBER_ID") {
            if !id.is_empty() {
                whatsapp.phone_number_id = id;
            }
        }

        let chat = toml.chat.unwrap_or_default();

        Self {
            port,
            bind_address,
            data_dir,
            log,
            log_format,
            cors_origins,
            uploads_dir,
            auth,
            whatsapp,
            chat,
        }
    }
}

fn default_data_dir() -> PathBuf {
    #[cfg(target_os = "macos")]
    {
        // ~/Library/Application Support/sevad
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("sevad");
        }
    }
    #[cfg(target_os = "linux")]
    {
        // $XDG_DATA_HOME/sevad or ~/.local/share/sevad
        if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
            return PathBuf::from(xdg).join("sevad");
        }
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home)
                .join(".local")
                .join("share")
                .join("sevad");
        }
    }
    #[cfg(target_os = "windows")]
    {
        // %APPDATA%\sevad
        if let Ok(appdata) = std::env::var("APPDATA") {
            return PathBuf::from(appdata).join("sevad");
        }
    }
    // Fallback
    PathBuf::from(".sevad")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_toml() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = PortalConfig::new(None, Some(dir.path().to_path_buf()), None, None);
        assert_eq!(cfg.port, DEFAULT_PORT);
        assert_eq!(cfg.bind_address, "127.0.0.1");
        assert_eq!(cfg.log, "info");
        assert_eq!(cfg.cors_origins, vec!["*".to_string()]);
        assert_eq!(cfg.uploads_dir, dir.path().join("uploads"));
        assert!(!cfg.whatsapp.is_configured());
        assert_eq!(cfg.chat.session_idle_minutes, DEFAULT_SESSION_IDLE_MINUTES);
    }

    #[test]
    fn toml_overrides_defaults_but_not_cli() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("config.toml"),
            r#"
port = 9100
log = "debug"

[whatsapp]
api_token = "tok"
phone_number_id = "123"

[chat]
session_idle_minutes = 0
"#,
        )
        .unwrap();

        let cfg = PortalConfig::new(None, Some(dir.path().to_path_buf()), None, None);
        assert_eq!(cfg.port, 9100);
        assert_eq!(cfg.log, "debug");
        assert!(cfg.whatsapp.is_configured());
        assert_eq!(cfg.chat.session_idle_minutes, 0);

        // CLI wins over TOML.
        let cfg = PortalConfig::new(Some(8042), Some(dir.path().to_path_buf()), None, None);
        assert_eq!(cfg.port, 8042);
    }

    #[test]
    fn malformed_toml_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.toml"), "port = \"not a number").unwrap();
        let cfg = PortalConfig::new(None, Some(dir.path().to_path_buf()), None, None);
        assert_eq!(cfg.port, DEFAULT_PORT);
    }
}
