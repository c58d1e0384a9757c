//! Configuration loading and validation for the gateway.
//!
//! Two layers:
//! - [`Settings`]: runtime knobs read from environment variables at startup.
//! - [`PersistedConfig`]: the JSON file holding the shared key, backend URL,
//!   and listen port. Created with a freshly generated key on first run.
//!
//! The process exits with a clear error message if either layer is missing a
//! required value or fails validation.

use std::fs;
use std::io::Write as _;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::crypto::{key, SharedKey, KEY_LEN};

/// Runtime settings read from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Path of the persisted JSON configuration file.
    #[serde(default = "default_config_path")]
    pub config_path: String,

    /// Tracing log level (e.g. `"info"`, `"debug"`).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Path prefix stripped from inbound paths before forwarding.
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,

    /// Comma-separated route names relayed under [`Settings::api_prefix`].
    #[serde(default = "default_relay_routes")]
    pub relay_routes: String,

    /// Interface address the HTTP listener binds to.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Upper bound (seconds) on a single backend forward, including body read.
    #[serde(default = "default_backend_timeout")]
    pub backend_timeout_secs: u64,

    /// Optional OTLP endpoint. When unset, only JSON logs are emitted.
    #[serde(default)]
    pub otel_exporter_otlp_endpoint: Option<String>,
}

fn default_config_path() -> String {
    "middleman_config.json".into()
}
fn default_log_level() -> String {
    "info".into()
}
fn default_api_prefix() -> String {
    "/api".into()
}
fn default_relay_routes() -> String {
    "create-account,add-user,health".into()
}
fn default_bind_addr() -> String {
    "127.0.0.1".into()
}
fn default_backend_timeout() -> u64 {
    10
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            config_path: default_config_path(),
            log_level: default_log_level(),
            api_prefix: default_api_prefix(),
            relay_routes: default_relay_routes(),
            bind_addr: default_bind_addr(),
            backend_timeout_secs: default_backend_timeout(),
            otel_exporter_otlp_endpoint: None,
        }
    }
}

impl Settings {
    /// Load settings from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is present but cannot be parsed.
    pub fn from_env() -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::Environment::default())
            .build()
            .context("failed to build settings from environment")?;

        cfg.try_deserialize()
            .context("failed to deserialise settings")
    }

    /// The relay route names, trimmed, with empty and repeated entries dropped.
    pub fn routes(&self) -> Vec<String> {
        let mut routes: Vec<String> = Vec::new();
        for route in self.relay_routes.split(',').map(str::trim) {
            if !route.is_empty() && !routes.iter().any(|r| r == route) {
                routes.push(route.to_owned());
            }
        }
        routes
    }

    /// Validate all fields, returning a descriptive error on the first failure.
    fn validate(&self) -> Result<()> {
        if !self.api_prefix.starts_with('/') || self.api_prefix.len() < 2 {
            anyhow::bail!("API_PREFIX must start with '/' and name a path segment");
        }
        if self.api_prefix.ends_with('/') {
            anyhow::bail!("API_PREFIX must not end with '/'");
        }
        if self.backend_timeout_secs == 0 {
            anyhow::bail!("BACKEND_TIMEOUT_SECS must be > 0");
        }
        let routes = self.routes();
        if routes.is_empty() {
            anyhow::bail!("RELAY_ROUTES must name at least one route");
        }
        if let Some(bad) = routes.iter().find(|r| r.contains('/') || r.contains('*')) {
            anyhow::bail!("RELAY_ROUTES entry {bad:?} must be a single path segment");
        }
        if self.bind_addr.parse::<std::net::IpAddr>().is_err() {
            anyhow::bail!("BIND_ADDR {:?} is not an IP address", self.bind_addr);
        }
        Ok(())
    }
}

/// On-disk configuration file contents.
#[derive(Clone, Serialize, Deserialize)]
pub struct PersistedConfig {
    /// Shared key; its UTF-8 bytes are the AES-256 key.
    pub encryption_key: String,

    /// Backend base URL requests are forwarded to.
    pub sftp_server_url: String,

    /// Port the gateway listens on. Stored as a string, read as either.
    #[serde(serialize_with = "serialize_port", deserialize_with = "deserialize_port")]
    pub listen_port: u16,
}

fn default_backend_url() -> String {
    "http://localhost:4444".into()
}
fn default_listen_port() -> u16 {
    8882
}

impl std::fmt::Debug for PersistedConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistedConfig")
            .field("encryption_key", &key::fingerprint(&self.encryption_key))
            .field("sftp_server_url", &self.sftp_server_url)
            .field("listen_port", &self.listen_port)
            .finish()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PortRepr {
    Number(u16),
    Text(String),
}

fn deserialize_port<'de, D: Deserializer<'de>>(d: D) -> Result<u16, D::Error> {
    match PortRepr::deserialize(d)? {
        PortRepr::Number(n) => Ok(n),
        PortRepr::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

fn serialize_port<S: Serializer>(port: &u16, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&port.to_string())
}

/// Whether [`PersistedConfig::load_or_create`] found a file or wrote one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provisioning {
    /// An existing file was loaded.
    Loaded,
    /// No file existed; a new one was written with a fresh key.
    Generated,
}

impl PersistedConfig {
    /// Load the file at `path`, or create it with a fresh key if absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed, or if
    /// a new file cannot be written.
    pub fn load_or_create(path: &Path) -> Result<(Self, Provisioning)> {
        if path.exists() {
            let data = fs::read(path)
                .with_context(|| format!("failed to read config file {}", path.display()))?;
            let parsed: PersistedConfig = serde_json::from_slice(&data)
                .with_context(|| format!("failed to parse config file {}", path.display()))?;
            return Ok((parsed, Provisioning::Loaded));
        }

        let fresh = PersistedConfig {
            encryption_key: key::generate_key_string()
                .context("failed to generate shared key")?,
            sftp_server_url: default_backend_url(),
            listen_port: default_listen_port(),
        };
        fresh.write_new(path)?;
        Ok((fresh, Provisioning::Generated))
    }

    /// Write to `path`, refusing to overwrite an existing file.
    fn write_new(&self, path: &Path) -> Result<()> {
        let data = serde_json::to_vec_pretty(self).context("failed to serialise config")?;

        let mut opts = fs::OpenOptions::new();
        opts.write(true).create_new(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            opts.mode(0o600);
        }

        let mut file = opts
            .open(path)
            .with_context(|| format!("failed to create config file {}", path.display()))?;
        file.write_all(&data)
            .with_context(|| format!("failed to write config file {}", path.display()))?;
        Ok(())
    }
}

/// Validated gateway configuration. Built once, then shared read-only.
#[derive(Debug)]
pub struct Config {
    /// Runtime settings from the environment.
    pub settings: Settings,
    /// Shared envelope key.
    pub key: SharedKey,
    /// Masked key fingerprint for the health endpoint and startup log.
    pub key_fingerprint: String,
    /// Backend base URL, without a trailing slash.
    pub backend_url: String,
    /// Port the HTTP listener binds to.
    pub listen_port: u16,
}

impl Config {
    /// Load settings from the environment, then the persisted file they name.
    ///
    /// Returns the full key string alongside the config only when it was just
    /// generated, so the caller can display it once.
    ///
    /// # Errors
    ///
    /// Returns an error if any layer is unreadable or fails validation.
    pub fn load() -> Result<(Self, Option<String>)> {
        let settings = Settings::from_env()?;
        Self::from_settings(settings)
    }

    /// Build from explicit settings, loading or creating the persisted file.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings or the persisted file fail validation.
    pub fn from_settings(settings: Settings) -> Result<(Self, Option<String>)> {
        settings.validate()?;

        let (persisted, provisioning) =
            PersistedConfig::load_or_create(Path::new(&settings.config_path))?;

        let key_len = persisted.encryption_key.len();
        let key = SharedKey::from_bytes(persisted.encryption_key.as_bytes()).with_context(|| {
            format!("encryption_key must be exactly {KEY_LEN} bytes, found {key_len}")
        })?;

        let backend_url = persisted.sftp_server_url.trim_end_matches('/').to_owned();
        if !(backend_url.starts_with("http://") || backend_url.starts_with("https://")) {
            anyhow::bail!("sftp_server_url must be an http:// or https:// URL");
        }
        if persisted.listen_port == 0 {
            anyhow::bail!("listen_port must be non-zero");
        }

        let generated = match provisioning {
            Provisioning::Generated => Some(persisted.encryption_key.clone()),
            Provisioning::Loaded => None,
        };

        let cfg = Config {
            key_fingerprint: key::fingerprint(&persisted.encryption_key),
            settings,
            key,
            backend_url,
            listen_port: persisted.listen_port,
        };
        Ok((cfg, generated))
    }
}
