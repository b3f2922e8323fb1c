//! Tolerant TOML reader.
//!
//! Every registered setting is looked up on its own. A missing, mistyped or
//! invalid value keeps the default and is logged; it never fails the load.

use std::path::Path;

use tracing::{debug, warn};

use crate::item::{ConfItem, ITEMS};
use crate::parse::from_toml;
use crate::settings::Settings;

/// Read settings from `path`, starting from defaults.
///
/// A missing file yields the defaults. A file that is not valid TOML is an
/// error.
pub fn load_file(path: &Path) -> crate::Result<Settings> {
    match std::fs::read_to_string(path) {
        Ok(text) => {
            debug!(path = %path.display(), "reading config file");
            from_toml_str(&text)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "config file does not exist, using defaults");
            Ok(finish(Settings::default()))
        }
        Err(e) => Err(e.into()),
    }
}

/// Read settings from TOML text, starting from defaults.
pub fn from_toml_str(text: &str) -> crate::Result<Settings> {
    let table: toml::Table = text.parse()?;
    let mut settings = Settings::default();
    apply_table(&mut settings, &table);
    Ok(finish(settings))
}

/// Overlay every setting found in `table` onto `settings`.
pub fn apply_table(settings: &mut Settings, table: &toml::Table) {
    for item in ITEMS {
        let Some(raw) = lookup(table, item.key) else {
            debug!(key = item.key, "DOES NOT EXIST");
            continue;
        };
        match from_toml(item, raw) {
            Ok(Some(value)) => {
                if let Err(e) = item.store(settings, &value) {
                    warn!(key = item.key, error = %e, "cannot apply setting");
                }
            }
            Ok(None) => debug!(key = item.key, "empty, keeping default"),
            Err(reason) => warn!(key = item.key, %reason, "invalid setting, keeping default"),
        }
    }
}

fn lookup<'a>(table: &'a toml::Table, key: &str) -> Option<&'a toml::Value> {
    let mut parts = key.split('.');
    let mut value = table.get(parts.next()?)?;
    for part in parts {
        value = value.as_table()?.get(part)?;
    }
    Some(value)
}

fn finish(mut settings: Settings) -> Settings {
    if settings.debug.all {
        settings.debug.enable_all();
    }
    settings
}

/// Log every effective setting at debug level, marking those that differ
/// from the default. Meant to run once logging is set up when `debug.config`
/// is on.
pub fn report(settings: &Settings) {
    for item in ITEMS {
        log_item(item, settings);
    }
}

fn log_item(item: &ConfItem, settings: &Settings) {
    let value = item.value(settings);
    if value == item.default_value() {
        debug!(key = item.key, value = %value, "config");
    } else {
        debug!(key = item.key, value = %value, "config (modified)");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::BlockingMode;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let settings = load_file(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_values_are_applied() {
        let text = r#"
            [dns]
            blockingMode = "nxdomain"
            upstreams = ["9.9.9.9", "149.112.112.112"]
            port = 5353
            ipBlocking.IPv4 = "10.1.1.1"

            [dns.rateLimit]
            count = 0

            [fifo]
            size = 64
            segment = "/tmp/fifo"
        "#;
        let settings = from_toml_str(text).unwrap();
        assert_eq!(settings.dns.blocking_mode, BlockingMode::Nxdomain);
        assert_eq!(settings.dns.upstreams.len(), 2);
        assert_eq!(settings.dns.port, 5353);
        assert_eq!(settings.dns.ip_blocking.ipv4, Some("10.1.1.1".parse().unwrap()));
        assert_eq!(settings.dns.rate_limit.count, 0);
        assert_eq!(settings.dns.rate_limit.interval, 60);
        assert_eq!(settings.fifo.size, 64);
        assert_eq!(settings.fifo.segment, "/tmp/fifo");
    }

    #[test]
    fn test_bad_values_keep_defaults() {
        let text = r#"
            [database]
            DBinterval = 5
            maxHistory = "lots"
            maxDBdays = 1000000

            [files]
            log = ""

            [misc]
            privacyLevel = 7
        "#;
        let settings = from_toml_str(text).unwrap();
        let defaults = Settings::default();
        assert_eq!(settings.database.db_interval, defaults.database.db_interval);
        assert_eq!(settings.database.max_history, defaults.database.max_history);
        assert_eq!(settings.database.max_db_days, 24_855);
        assert_eq!(settings.files.log, defaults.files.log);
        assert_eq!(settings.misc.privacy_level, 0);
    }

    #[test]
    fn test_debug_all_enables_everything() {
        let settings = from_toml_str("[debug]\nall = true\n").unwrap();
        assert!(settings.debug.queries);
        assert!(settings.debug.config);
        assert_eq!(settings.debug.enabled_areas().len(), 8);
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        assert!(matches!(
            from_toml_str("[dns\nport = 1"),
            Err(crate::ConfigError::Toml(_))
        ));
    }
}
