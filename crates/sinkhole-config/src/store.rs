//! Process-wide settings with copy-validate-swap updates.

use std::io::Write as _;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info};

use crate::item::{self, ApplyMode, ConfItem, Value};
use crate::parse::parse_text;
use crate::resolver::{DependentCheck, ResolverCheck};
use crate::settings::Settings;
use crate::{loader, writer, ConfigError};

/// Result of a successful [`ConfigStore::set_from_text`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetOutcome {
    /// The parsed value equals the current one; nothing was swapped.
    Unchanged(Value),
    /// A new settings version was committed.
    Changed {
        value: Value,
        apply: ApplyMode,
    },
}

impl SetOutcome {
    /// Value now in effect.
    #[must_use]
    pub const fn value(&self) -> &Value {
        match self {
            Self::Unchanged(value) | Self::Changed { value, .. } => value,
        }
    }
}

/// Versioned settings shared by every part of the process.
///
/// Readers take an `Arc` snapshot and never observe a half-applied change.
/// Writers build a full copy, validate it and swap it in under a mutex.
pub struct ConfigStore {
    current: RwLock<Arc<Settings>>,
    version: AtomicU64,
    write_lock: Mutex<()>,
    check: Box<dyn DependentCheck>,
}

impl std::fmt::Debug for ConfigStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigStore")
            .field("version", &self.version())
            .finish_non_exhaustive()
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

impl ConfigStore {
    /// Store holding `settings`, checked with [`ResolverCheck`].
    #[must_use]
    pub fn new(settings: Settings) -> Self {
        Self::with_check(settings, Box::new(ResolverCheck))
    }

    /// Store with a custom dependent check.
    #[must_use]
    pub fn with_check(settings: Settings, check: Box<dyn DependentCheck>) -> Self {
        Self {
            current: RwLock::new(Arc::new(settings)),
            version: AtomicU64::new(0),
            write_lock: Mutex::new(()),
            check,
        }
    }

    /// Read `path` (defaults if it does not exist).
    pub fn load(path: &Path) -> crate::Result<Self> {
        Ok(Self::new(loader::load_file(path)?))
    }

    /// Current settings.
    pub fn snapshot(&self) -> Arc<Settings> {
        Arc::clone(&self.current.read())
    }

    /// Number of committed changes since construction.
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    /// Current value of `key`.
    pub fn get(&self, key: &str) -> crate::Result<(&'static ConfItem, Value)> {
        let item = item::find(key).ok_or_else(|| ConfigError::UnknownKey(key.to_owned()))?;
        Ok((item, item.value(&self.snapshot())))
    }

    /// Parse `text` for `key` and commit it if it changes anything.
    ///
    /// Nothing is modified on error.
    pub fn set_from_text(&self, key: &str, text: &str) -> crate::Result<SetOutcome> {
        let item = item::find(key).ok_or_else(|| ConfigError::UnknownKey(key.to_owned()))?;
        let value = parse_text(item, text)?;

        let _guard = self.write_lock.lock();
        let current = self.snapshot();
        if item.value(&current) == value {
            debug!(key, "value unchanged");
            return Ok(SetOutcome::Unchanged(value));
        }

        let mut candidate = Settings::clone(&current);
        item.store(&mut candidate, &value)?;

        if item.apply == ApplyMode::RestartResolver {
            self.check
                .check(&candidate)
                .map_err(|detail| ConfigError::DependentValidationFailed {
                    key: key.to_owned(),
                    detail,
                })?;
        }

        self.commit(candidate);
        info!(key, value = %value, "setting changed");
        Ok(SetOutcome::Changed {
            value,
            apply: item.apply,
        })
    }

    /// Replace everything at once, e.g. after re-reading the file.
    ///
    /// Returns false if `settings` equals the current settings.
    pub fn replace(&self, settings: Settings) -> crate::Result<bool> {
        let _guard = self.write_lock.lock();
        if *self.snapshot() == settings {
            return Ok(false);
        }
        self.check
            .check(&settings)
            .map_err(|detail| ConfigError::DependentValidationFailed {
                key: String::from("*"),
                detail,
            })?;
        self.commit(settings);
        Ok(true)
    }

    /// Write the current settings to `path` atomically.
    pub fn persist(&self, path: &Path) -> crate::Result<()> {
        let text = writer::write_toml(&self.snapshot());
        let persist_err = |source| ConfigError::Persist {
            path: path.to_path_buf(),
            source,
        };

        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir).map_err(persist_err)?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(persist_err)?;
        tmp.write_all(text.as_bytes()).map_err(persist_err)?;
        tmp.as_file().sync_all().map_err(persist_err)?;
        tmp.persist(path).map_err(|e| persist_err(e.error))?;

        debug!(path = %path.display(), "settings written");
        Ok(())
    }

    fn commit(&self, settings: Settings) {
        *self.current.write() = Arc::new(settings);
        self.version.fetch_add(1, Ordering::AcqRel);
    }
}
