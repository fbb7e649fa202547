//! # Configuration
//!
//! [`ToolkitConfig`] is a plain value owned by the caller and passed by
//! reference into every helper. Several configurations can live side by
//! side; nothing here is global.
//!
//! ## Building a config in code
//! ```rust
//! use toolkit_core::ToolkitConfig;
//!
//! let config = ToolkitConfig::new()
//!     .with_max_upload_bytes(10 * 1024 * 1024)
//!     .allow_content_type("image/png")
//!     .allow_content_type("image/jpeg");
//!
//! assert!(config.is_content_type_allowed("IMAGE/PNG"));
//! assert!(!config.is_content_type_allowed("image/gif"));
//! ```
//!
//! ## Loading from settings
//! [`Settings`] is a string key/value store. It can be filled by hand or
//! from environment variables sharing a prefix:
//!
//! ```bash
//! export TOOLKIT__UPLOAD__MAX_BYTES=1048576
//! export TOOLKIT__UPLOAD__ALLOWED_TYPES=image/png,image/jpeg
//! export TOOLKIT__JSON__ALLOW_UNKNOWN_FIELDS=true
//! ```
//!
//! ```rust
//! use toolkit_core::{Settings, ToolkitConfig};
//!
//! let mut settings = Settings::new();
//! settings.set("json.max_bytes", "4096");
//! settings.set("upload.allowed_types", "image/png, image/gif");
//!
//! let config = ToolkitConfig::from_settings(&settings).unwrap();
//! assert_eq!(config.max_json_bytes, 4096);
//! assert_eq!(config.allowed_content_types.len(), 2);
//! ```

use std::collections::{HashMap, HashSet};
use std::str::FromStr;

use crate::errors::{ToolkitError, ToolkitResult};
use crate::ids::Alphabet;

/// Upload cap used when `max_upload_bytes` is zero.
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 1024 * 1024 * 1024; // 1GB

/// JSON body cap used when `max_json_bytes` is zero.
pub const DEFAULT_MAX_JSON_BYTES: usize = 1024 * 1024; // 1MB

#[derive(Debug, Clone)]
pub struct ToolkitConfig {
    /// Largest accepted multipart body in bytes. Zero means the default.
    pub max_upload_bytes: u64,

    /// Allowed sniffed MIME types for uploads (empty = all allowed)
    pub allowed_content_types: HashSet<String>,

    /// Largest accepted JSON body in bytes. Zero means the default.
    pub max_json_bytes: usize,

    /// Accept JSON fields the target type does not declare
    pub allow_unknown_json_fields: bool,

    /// Alphabet for generated identifiers and renamed uploads
    pub alphabet: Alphabet,
}

impl Default for ToolkitConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            allowed_content_types: HashSet::new(), // Allow all
            max_json_bytes: DEFAULT_MAX_JSON_BYTES,
            allow_unknown_json_fields: false,
            alphabet: Alphabet::default(),
        }
    }
}

impl ToolkitConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set maximum multipart body size
    pub fn with_max_upload_bytes(mut self, bytes: u64) -> Self {
        self.max_upload_bytes = bytes;
        self
    }

    /// Add an allowed upload content type
    pub fn allow_content_type(mut self, content_type: &str) -> Self {
        self.allowed_content_types.insert(content_type.to_string());
        self
    }

    /// Set maximum JSON body size
    pub fn with_max_json_bytes(mut self, bytes: usize) -> Self {
        self.max_json_bytes = bytes;
        self
    }

    /// Accept JSON fields that the target type does not declare
    pub fn allow_unknown_json_fields(mut self, allow: bool) -> Self {
        self.allow_unknown_json_fields = allow;
        self
    }

    pub fn with_alphabet(mut self, alphabet: Alphabet) -> Self {
        self.alphabet = alphabet;
        self
    }

    /// Upload cap with zero replaced by [`DEFAULT_MAX_UPLOAD_BYTES`].
    pub fn effective_max_upload_bytes(&self) -> u64 {
        match self.max_upload_bytes {
            0 => DEFAULT_MAX_UPLOAD_BYTES,
            n => n,
        }
    }

    /// JSON cap with zero replaced by [`DEFAULT_MAX_JSON_BYTES`].
    pub fn effective_max_json_bytes(&self) -> usize {
        match self.max_json_bytes {
            0 => DEFAULT_MAX_JSON_BYTES,
            n => n,
        }
    }

    /// Case-insensitive allow-list check. A sniffed type such as
    /// `text/plain; charset=utf-8` matches either that exact string or
    /// its essence `text/plain`.
    pub fn is_content_type_allowed(&self, content_type: &str) -> bool {
        if self.allowed_content_types.is_empty() {
            return true;
        }
        let essence = content_type.split(';').next().unwrap_or("").trim();
        self.allowed_content_types.iter().any(|allowed| {
            allowed.eq_ignore_ascii_case(content_type) || allowed.eq_ignore_ascii_case(essence)
        })
    }

    /// Random identifier drawn from this config's alphabet.
    pub fn random_string(&self, len: usize) -> String {
        self.alphabet.generate(len)
    }

    /// Build a config from a settings store. Missing keys keep defaults.
    ///
    /// Keys: `upload.max_bytes`, `upload.allowed_types` (comma separated),
    /// `json.max_bytes`, `json.allow_unknown_fields`, `ids.alphabet`.
    pub fn from_settings(settings: &Settings) -> ToolkitResult<Self> {
        let mut config = Self::default();

        if let Some(bytes) = settings.parse::<u64>("upload.max_bytes")? {
            config.max_upload_bytes = bytes;
        }
        if let Some(types) = settings.get("upload.allowed_types") {
            config.allowed_content_types = types
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(bytes) = settings.parse::<usize>("json.max_bytes")? {
            config.max_json_bytes = bytes;
        }
        if let Some(allow) = settings.parse::<bool>("json.allow_unknown_fields")? {
            config.allow_unknown_json_fields = allow;
        }
        if let Some(alphabet) = settings.get("ids.alphabet") {
            config.alphabet = Alphabet::new(alphabet)?;
        }

        Ok(config)
    }
}

/// String key/value settings store.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    values: HashMap<String, String>,
}

impl Settings {
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    /// Collect every environment variable starting with `prefix`.
    ///
    /// `TOOLKIT__JSON__MAX_BYTES` with prefix `TOOLKIT__` becomes `json.max_bytes`.
    pub fn from_env(prefix: &str) -> Self {
        Self::from_vars(prefix, std::env::vars())
    }

    pub fn from_vars<I>(prefix: &str, vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut settings = Self::new();
        for (key, value) in vars {
            if let Some(stripped) = key.strip_prefix(prefix) {
                let normalized = stripped.to_lowercase().replace("__", ".");
                settings.set(normalized, value);
            }
        }
        settings
    }

    pub fn set<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|s| s.as_str())
    }

    pub fn has(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Parse a value, reporting the key when it does not parse.
    pub fn parse<T: FromStr>(&self, key: &str) -> ToolkitResult<Option<T>> {
        match self.get(key) {
            None => Ok(None),
            Some(raw) => raw
                .trim()
                .parse::<T>()
                .map(Some)
                .map_err(|_| ToolkitError::InvalidConfig {
                    key: key.to_string(),
                    value: raw.to_string(),
                }),
        }
    }
}
