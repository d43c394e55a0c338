//! Runtime settings.
//!
//! The object graph is built from `Rc`s and never crosses threads, so the
//! settings cell is per thread: every thread is its own runtime. The cell
//! starts out at [`Settings::default`], can be replaced wholesale with
//! [`install`], tweaked with [`update`], restored with [`reset`], or
//! overridden for a block with [`scoped`].
//!
//! Settings can also be read from a small `key = value` file:
//!
//! ```text
//! # protoform settings
//! private_prefix = "_"
//! testing = true
//! messy = false
//! sloppy = false
//! ```

use std::cell::RefCell;
use std::fs;
use std::path::Path;

use thiserror::Error;

/// Host capabilities the runtime adapts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// A derived object's assignment can shadow a read-only inherited property.
    pub writable_default: bool,
    /// True accessor and attribute descriptors are available.
    pub has_attribute_support: bool,
}

impl Capabilities {
    fn probe() -> Self {
        Capabilities {
            writable_default: true,
            has_attribute_support: true,
        }
    }
}

lazy_static! {
    pub static ref CAPABILITIES: Capabilities = Capabilities::probe();
}

pub const DEFAULT_PRIVATE_PREFIX: &str = "_";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Every private member name must start with this.
    pub private_prefix: String,
    /// Install values by plain assignment instead of descriptors.
    pub sloppy: bool,
    /// Force every installed value to be writable.
    pub messy: bool,
    /// Double-layer extension and mock methods.
    pub testing: bool,
}

impl Settings {
    pub fn from_capabilities(caps: &Capabilities) -> Self {
        Settings {
            private_prefix: DEFAULT_PRIVATE_PREFIX.to_string(),
            sloppy: !caps.has_attribute_support,
            messy: !caps.writable_default,
            testing: false,
        }
    }

    pub fn with_testing(mut self, testing: bool) -> Self {
        self.testing = testing;
        self
    }

    pub fn with_private_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.private_prefix = prefix.into();
        self
    }

    pub fn with_sloppy(mut self, sloppy: bool) -> Self {
        self.sloppy = sloppy;
        self
    }

    pub fn with_messy(mut self, messy: bool) -> Self {
        self.messy = messy;
        self
    }

    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let content = fs::read_to_string(path)
            .map_err(|e| SettingsError::Io(format!("{}: {}", path.display(), e)))?;
        Self::parse(&content)
    }

    /// Parses `key = value` lines on top of the defaults.
    pub fn parse(content: &str) -> Result<Self, SettingsError> {
        let mut settings = Settings::default();
        for (index, line) in content.lines().enumerate() {
            let line_no = index + 1;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let parts: Vec<&str> = line.splitn(2, '=').collect();
            if parts.len() != 2 {
                return Err(SettingsError::Malformed {
                    line: line_no,
                    content: line.to_string(),
                });
            }
            let key = parts[0].trim();
            let value = parts[1].trim();
            match key {
                "private_prefix" => {
                    let prefix = value.trim_matches('"');
                    if prefix.is_empty() {
                        return Err(SettingsError::InvalidValue {
                            key: key.to_string(),
                            value: value.to_string(),
                        });
                    }
                    settings.private_prefix = prefix.to_string();
                }
                "sloppy" => settings.sloppy = Self::parse_bool(key, value)?,
                "messy" => settings.messy = Self::parse_bool(key, value)?,
                "testing" => settings.testing = Self::parse_bool(key, value)?,
                _ => return Err(SettingsError::UnknownKey(key.to_string())),
            }
        }
        Ok(settings)
    }

    fn parse_bool(key: &str, value: &str) -> Result<bool, SettingsError> {
        match value {
            "true" => Ok(true),
            "false" => Ok(false),
            _ => Err(SettingsError::InvalidValue {
                key: key.to_string(),
                value: value.to_string(),
            }),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings::from_capabilities(&CAPABILITIES)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("failed to read settings: {0}")]
    Io(String),
    #[error("line {line}: expected `key = value`, found `{content}`")]
    Malformed { line: usize, content: String },
    #[error("unknown settings key `{0}`")]
    UnknownKey(String),
    #[error("invalid value `{value}` for `{key}`")]
    InvalidValue { key: String, value: String },
}

thread_local! {
    static SETTINGS: RefCell<Settings> = RefCell::new(Settings::default());
}

/// A snapshot of the current settings.
pub fn current() -> Settings {
    SETTINGS.with(|s| s.borrow().clone())
}

pub fn install(settings: Settings) -> Settings {
    SETTINGS.with(|s| std::mem::replace(&mut *s.borrow_mut(), settings))
}

pub fn update<F: FnOnce(&mut Settings)>(f: F) {
    SETTINGS.with(|s| f(&mut s.borrow_mut()));
}

pub fn reset() {
    install(Settings::default());
}

pub fn is_testing() -> bool {
    SETTINGS.with(|s| s.borrow().testing)
}

pub fn private_prefix() -> String {
    SETTINGS.with(|s| s.borrow().private_prefix.clone())
}

/// Restores the settings that were current when it was created.
#[must_use = "settings are restored as soon as the guard is dropped"]
pub struct ScopedSettings {
    previous: Option<Settings>,
}

impl Drop for ScopedSettings {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            install(previous);
        }
    }
}

pub fn scoped(settings: Settings) -> ScopedSettings {
    ScopedSettings {
        previous: Some(install(settings)),
    }
}
