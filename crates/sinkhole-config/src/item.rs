//! Registry of every setting: key path, type, rule and accessors.
//!
//! The registry drives the TOML reader, the TOML writer and the command
//! line. Adding a setting means adding a field to [`Settings`] and one entry
//! to [`ITEMS`].

use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

use crate::settings::{BlockingMode, RefreshNames, Settings};
use crate::ConfigError;

/// A setting's value, independent of where it is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Str(String),
    /// Canonical option name.
    Enum(String),
    Ipv4(Option<Ipv4Addr>),
    Ipv6(Option<Ipv6Addr>),
    StrArray(Vec<String>),
}

impl Value {
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int<T: TryFrom<i64>>(&self) -> Option<T> {
        match self {
            Self::Int(n) => T::try_from(*n).ok(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) | Self::Enum(s) => Some(s),
            _ => None,
        }
    }

    /// TOML representation; unset addresses become an empty string.
    #[must_use]
    pub fn to_toml(&self) -> toml::Value {
        match self {
            Self::Bool(b) => toml::Value::Boolean(*b),
            Self::Int(n) => toml::Value::Integer(*n),
            Self::Str(s) | Self::Enum(s) => toml::Value::String(s.clone()),
            Self::Ipv4(addr) => {
                toml::Value::String(addr.map(|a| a.to_string()).unwrap_or_default())
            }
            Self::Ipv6(addr) => {
                toml::Value::String(addr.map(|a| a.to_string()).unwrap_or_default())
            }
            Self::StrArray(items) => toml::Value::Array(
                items.iter().cloned().map(toml::Value::String).collect(),
            ),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_toml())
    }
}

/// Integer bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntRule {
    pub min: i64,
    pub max: i64,
    /// Values above `max` are clamped instead of rejected.
    pub clamp: bool,
    /// Accepts `0x` hex and leading-zero octal on input.
    pub signed: bool,
    /// Out-of-range value that is still accepted.
    pub special: Option<i64>,
}

impl IntRule {
    const fn unsigned(min: i64, max: i64) -> Self {
        Self {
            min,
            max,
            clamp: false,
            signed: false,
            special: None,
        }
    }

    const fn signed(min: i64, max: i64) -> Self {
        Self {
            min,
            max,
            clamp: false,
            signed: true,
            special: None,
        }
    }

    /// Check `n`, returning the value to store.
    pub fn apply(&self, n: i64) -> Result<i64, String> {
        if Some(n) == self.special || (self.min..=self.max).contains(&n) {
            Ok(n)
        } else if self.clamp && n > self.max {
            Ok(self.max)
        } else {
            Err(format!("{n} is out of range"))
        }
    }

    fn describe(&self) -> String {
        match self.special {
            Some(special) => format!("{}..={} or {special}", self.min, self.max),
            None => format!("{}..={}", self.min, self.max),
        }
    }
}

/// Value type and validation rule of a setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Bool,
    Int(IntRule),
    Enum(&'static [&'static str]),
    Str {
        /// Whether the empty string is a meaningful value.
        allow_empty: bool,
    },
    Ipv4,
    Ipv6,
    StrArray,
}

impl ItemKind {
    /// Short type name for listings.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Bool => "boolean",
            Self::Int(_) => "integer",
            Self::Enum(_) => "enum",
            Self::Str { .. } => "string",
            Self::Ipv4 => "IPv4 address",
            Self::Ipv6 => "IPv6 address",
            Self::StrArray => "array of strings",
        }
    }

    /// Human readable list or format of accepted values.
    #[must_use]
    pub fn allowed(&self) -> Option<String> {
        match self {
            Self::Bool => Some("true, false, yes, no".into()),
            Self::Int(rule) => Some(rule.describe()),
            Self::Enum(options) => Some(options.join(", ")),
            Self::Str { .. } => None,
            Self::Ipv4 => Some("a valid IPv4 address, or empty for unset".into()),
            Self::Ipv6 => Some("a valid IPv6 address, or empty for unset".into()),
            Self::StrArray => Some("a JSON array of strings".into()),
        }
    }
}

/// What has to happen for a committed change to take effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyMode {
    /// Picked up on the next snapshot.
    Live,
    /// Changes the derived resolver configuration; checked before commit.
    RestartResolver,
    /// Only read at process start.
    RestartRequired,
}

/// One registered setting.
pub struct ConfItem {
    /// Dot-delimited path, e.g. `dns.port`.
    pub key: &'static str,
    pub description: &'static str,
    pub kind: ItemKind,
    pub apply: ApplyMode,
    get: fn(&Settings) -> Value,
    set: fn(&mut Settings, &Value) -> Option<()>,
}

impl fmt::Debug for ConfItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfItem")
            .field("key", &self.key)
            .field("kind", &self.kind)
            .field("apply", &self.apply)
            .finish_non_exhaustive()
    }
}

impl ConfItem {
    /// Current value in `settings`.
    #[must_use]
    pub fn value(&self, settings: &Settings) -> Value {
        (self.get)(settings)
    }

    /// Value in a default-constructed [`Settings`].
    #[must_use]
    pub fn default_value(&self) -> Value {
        (self.get)(&Settings::default())
    }

    /// Store an already validated value.
    pub fn store(&self, settings: &mut Settings, value: &Value) -> crate::Result<()> {
        (self.set)(settings, value).ok_or_else(|| {
            ConfigError::invalid(
                self.key,
                format!("expected {}", self.kind.type_name()),
                self.kind.allowed(),
            )
        })
    }

    /// Top-level table name.
    #[must_use]
    pub fn section(&self) -> &'static str {
        self.key.split_once('.').map_or(self.key, |(section, _)| section)
    }

    /// Key path below the section.
    #[must_use]
    pub fn leaf(&self) -> &'static str {
        self.key.split_once('.').map_or(self.key, |(_, leaf)| leaf)
    }
}

/// Look up a setting by its exact key.
#[must_use]
pub fn find(key: &str) -> Option<&'static ConfItem> {
    ITEMS.iter().find(|item| item.key == key)
}

const BLOCKING_MODES: &[&str] = &["NULL", "IP-NODATA-AAAA", "IP", "NXDOMAIN", "NODATA"];
const REFRESH_NAMES: &[&str] = &["IPV4_ONLY", "ALL", "UNKNOWN", "NONE"];

fn text(value: &Value) -> Option<String> {
    value.as_str().map(ToOwned::to_owned)
}

/// Every setting, grouped by section in file order.
pub static ITEMS: &[ConfItem] = &[
    // [dns]
    ConfItem {
        key: "dns.blockingMode",
        description: "How blocked queries are answered",
        kind: ItemKind::Enum(BLOCKING_MODES),
        apply: ApplyMode::RestartResolver,
        get: |s| Value::Enum(s.dns.blocking_mode.as_str().into()),
        set: |s, v| {
            s.dns.blocking_mode = BlockingMode::from_name(v.as_str()?)?;
            Some(())
        },
    },
    ConfItem {
        key: "dns.CNAMEdeepInspect",
        description: "Check every name in a CNAME chain against the blocklists",
        kind: ItemKind::Bool,
        apply: ApplyMode::Live,
        get: |s| Value::Bool(s.dns.cname_deep_inspect),
        set: |s, v| {
            s.dns.cname_deep_inspect = v.as_bool()?;
            Some(())
        },
    },
    ConfItem {
        key: "dns.blockESNI",
        description: "Block _esni subdomains of blocked domains",
        kind: ItemKind::Bool,
        apply: ApplyMode::Live,
        get: |s| Value::Bool(s.dns.block_esni),
        set: |s, v| {
            s.dns.block_esni = v.as_bool()?;
            Some(())
        },
    },
    ConfItem {
        key: "dns.EDNS0ECS",
        description: "Use EDNS0 client subnet data to identify clients",
        kind: ItemKind::Bool,
        apply: ApplyMode::Live,
        get: |s| Value::Bool(s.dns.edns0_ecs),
        set: |s, v| {
            s.dns.edns0_ecs = v.as_bool()?;
            Some(())
        },
    },
    ConfItem {
        key: "dns.ignoreLocalhost",
        description: "Hide queries from the local machine",
        kind: ItemKind::Bool,
        apply: ApplyMode::Live,
        get: |s| Value::Bool(s.dns.ignore_localhost),
        set: |s, v| {
            s.dns.ignore_localhost = v.as_bool()?;
            Some(())
        },
    },
    ConfItem {
        key: "dns.upstreams",
        description: "Upstream DNS servers, each an IP address with optional #port",
        kind: ItemKind::StrArray,
        apply: ApplyMode::RestartResolver,
        get: |s| Value::StrArray(s.dns.upstreams.clone()),
        set: |s, v| match v {
            Value::StrArray(items) => {
                s.dns.upstreams.clone_from(items);
                Some(())
            }
            _ => None,
        },
    },
    ConfItem {
        key: "dns.port",
        description: "Port the resolver listens on",
        kind: ItemKind::Int(IntRule::unsigned(0, 65_535)),
        apply: ApplyMode::RestartResolver,
        get: |s| Value::Int(s.dns.port.into()),
        set: |s, v| {
            s.dns.port = v.as_int()?;
            Some(())
        },
    },
    ConfItem {
        key: "dns.ipBlocking.IPv4",
        description: "Address returned for blocked A queries in IP blocking modes",
        kind: ItemKind::Ipv4,
        apply: ApplyMode::RestartResolver,
        get: |s| Value::Ipv4(s.dns.ip_blocking.ipv4),
        set: |s, v| match v {
            Value::Ipv4(addr) => {
                s.dns.ip_blocking.ipv4 = *addr;
                Some(())
            }
            _ => None,
        },
    },
    ConfItem {
        key: "dns.ipBlocking.IPv6",
        description: "Address returned for blocked AAAA queries in IP blocking modes",
        kind: ItemKind::Ipv6,
        apply: ApplyMode::RestartResolver,
        get: |s| Value::Ipv6(s.dns.ip_blocking.ipv6),
        set: |s, v| match v {
            Value::Ipv6(addr) => {
                s.dns.ip_blocking.ipv6 = *addr;
                Some(())
            }
            _ => None,
        },
    },
    ConfItem {
        key: "dns.rateLimit.count",
        description: "Queries a client may send per interval, 0 disables rate limiting",
        kind: ItemKind::Int(IntRule::unsigned(0, u32::MAX as i64)),
        apply: ApplyMode::RestartResolver,
        get: |s| Value::Int(s.dns.rate_limit.count.into()),
        set: |s, v| {
            s.dns.rate_limit.count = v.as_int()?;
            Some(())
        },
    },
    ConfItem {
        key: "dns.rateLimit.interval",
        description: "Rate limit interval in seconds",
        kind: ItemKind::Int(IntRule::unsigned(0, u32::MAX as i64)),
        apply: ApplyMode::RestartResolver,
        get: |s| Value::Int(s.dns.rate_limit.interval.into()),
        set: |s, v| {
            s.dns.rate_limit.interval = v.as_int()?;
            Some(())
        },
    },
    // [resolver]
    ConfItem {
        key: "resolver.resolveIPv4",
        description: "Resolve host names of IPv4 clients",
        kind: ItemKind::Bool,
        apply: ApplyMode::Live,
        get: |s| Value::Bool(s.resolver.resolve_ipv4),
        set: |s, v| {
            s.resolver.resolve_ipv4 = v.as_bool()?;
            Some(())
        },
    },
    ConfItem {
        key: "resolver.resolveIPv6",
        description: "Resolve host names of IPv6 clients",
        kind: ItemKind::Bool,
        apply: ApplyMode::Live,
        get: |s| Value::Bool(s.resolver.resolve_ipv6),
        set: |s, v| {
            s.resolver.resolve_ipv6 = v.as_bool()?;
            Some(())
        },
    },
    ConfItem {
        key: "resolver.networkNames",
        description: "Use names from the network table for clients without one",
        kind: ItemKind::Bool,
        apply: ApplyMode::Live,
        get: |s| Value::Bool(s.resolver.network_names),
        set: |s, v| {
            s.resolver.network_names = v.as_bool()?;
            Some(())
        },
    },
    ConfItem {
        key: "resolver.refreshNames",
        description: "Which clients get their host names refreshed every hour",
        kind: ItemKind::Enum(REFRESH_NAMES),
        apply: ApplyMode::Live,
        get: |s| Value::Enum(s.resolver.refresh_names.as_str().into()),
        set: |s, v| {
            s.resolver.refresh_names = RefreshNames::from_name(v.as_str()?)?;
            Some(())
        },
    },
    // [database]
    ConfItem {
        key: "database.DBimport",
        description: "Import recent queries from the database at startup",
        kind: ItemKind::Bool,
        apply: ApplyMode::RestartRequired,
        get: |s| Value::Bool(s.database.db_import),
        set: |s, v| {
            s.database.db_import = v.as_bool()?;
            Some(())
        },
    },
    ConfItem {
        key: "database.maxHistory",
        description: "Seconds of query history kept in memory",
        kind: ItemKind::Int(IntRule::unsigned(0, 86_400)),
        apply: ApplyMode::RestartRequired,
        get: |s| Value::Int(s.database.max_history.into()),
        set: |s, v| {
            s.database.max_history = v.as_int()?;
            Some(())
        },
    },
    ConfItem {
        key: "database.maxDBdays",
        description: "Days of queries kept in the database, -1 keeps everything",
        kind: ItemKind::Int(IntRule {
            min: -1,
            max: 24_855,
            clamp: true,
            signed: true,
            special: None,
        }),
        apply: ApplyMode::Live,
        get: |s| Value::Int(s.database.max_db_days.into()),
        set: |s, v| {
            s.database.max_db_days = v.as_int()?;
            Some(())
        },
    },
    ConfItem {
        key: "database.DBinterval",
        description: "Seconds between writes of queries to the database",
        kind: ItemKind::Int(IntRule::unsigned(10, 86_400)),
        apply: ApplyMode::Live,
        get: |s| Value::Int(s.database.db_interval.into()),
        set: |s, v| {
            s.database.db_interval = v.as_int()?;
            Some(())
        },
    },
    ConfItem {
        key: "database.network.parseARP",
        description: "Build the network table from the ARP cache",
        kind: ItemKind::Bool,
        apply: ApplyMode::Live,
        get: |s| Value::Bool(s.database.network.parse_arp),
        set: |s, v| {
            s.database.network.parse_arp = v.as_bool()?;
            Some(())
        },
    },
    ConfItem {
        key: "database.network.expire",
        description: "Days after which idle devices are removed from the network table",
        kind: ItemKind::Int(IntRule::unsigned(1, 365)),
        apply: ApplyMode::Live,
        get: |s| Value::Int(s.database.network.expire.into()),
        set: |s, v| {
            s.database.network.expire = v.as_int()?;
            Some(())
        },
    },
    // [http]
    ConfItem {
        key: "http.localAPIauth",
        description: "Require authentication for API requests from localhost",
        kind: ItemKind::Bool,
        apply: ApplyMode::Live,
        get: |s| Value::Bool(s.http.local_api_auth),
        set: |s, v| {
            s.http.local_api_auth = v.as_bool()?;
            Some(())
        },
    },
    ConfItem {
        key: "http.prettyJSON",
        description: "Indent API responses",
        kind: ItemKind::Bool,
        apply: ApplyMode::Live,
        get: |s| Value::Bool(s.http.pretty_json),
        set: |s, v| {
            s.http.pretty_json = v.as_bool()?;
            Some(())
        },
    },
    ConfItem {
        key: "http.sessionTimeout",
        description: "Seconds an idle API session stays valid",
        kind: ItemKind::Int(IntRule::unsigned(0, u32::MAX as i64)),
        apply: ApplyMode::Live,
        get: |s| Value::Int(s.http.session_timeout.into()),
        set: |s, v| {
            s.http.session_timeout = v.as_int()?;
            Some(())
        },
    },
    ConfItem {
        key: "http.domain",
        description: "Domain name the web interface is reachable under",
        kind: ItemKind::Str { allow_empty: false },
        apply: ApplyMode::RestartRequired,
        get: |s| Value::Str(s.http.domain.clone()),
        set: |s, v| {
            s.http.domain = text(v)?;
            Some(())
        },
    },
    ConfItem {
        key: "http.acl",
        description: "Access control list for the web server, empty allows everyone",
        kind: ItemKind::Str { allow_empty: true },
        apply: ApplyMode::RestartRequired,
        get: |s| Value::Str(s.http.acl.clone()),
        set: |s, v| {
            s.http.acl = text(v)?;
            Some(())
        },
    },
    ConfItem {
        key: "http.port",
        description: "Comma-separated ports (and addresses) the web server binds",
        kind: ItemKind::Str { allow_empty: false },
        apply: ApplyMode::RestartRequired,
        get: |s| Value::Str(s.http.port.clone()),
        set: |s, v| {
            s.http.port = text(v)?;
            Some(())
        },
    },
    ConfItem {
        key: "http.paths.webroot",
        description: "Document root of the web server",
        kind: ItemKind::Str { allow_empty: false },
        apply: ApplyMode::RestartRequired,
        get: |s| Value::Str(s.http.webroot.clone()),
        set: |s, v| {
            s.http.webroot = text(v)?;
            Some(())
        },
    },
    ConfItem {
        key: "http.paths.webhome",
        description: "Sub-directory of the web interface below the root",
        kind: ItemKind::Str { allow_empty: false },
        apply: ApplyMode::RestartRequired,
        get: |s| Value::Str(s.http.webhome.clone()),
        set: |s, v| {
            s.http.webhome = text(v)?;
            Some(())
        },
    },
    // [files]
    ConfItem {
        key: "files.log",
        description: "Log file",
        kind: ItemKind::Str { allow_empty: false },
        apply: ApplyMode::RestartRequired,
        get: |s| Value::Str(s.files.log.clone()),
        set: |s, v| {
            s.files.log = text(v)?;
            Some(())
        },
    },
    ConfItem {
        key: "files.pid",
        description: "PID file",
        kind: ItemKind::Str { allow_empty: false },
        apply: ApplyMode::RestartRequired,
        get: |s| Value::Str(s.files.pid.clone()),
        set: |s, v| {
            s.files.pid = text(v)?;
            Some(())
        },
    },
    ConfItem {
        key: "files.database",
        description: "Long-term query database",
        kind: ItemKind::Str { allow_empty: false },
        apply: ApplyMode::RestartRequired,
        get: |s| Value::Str(s.files.database.clone()),
        set: |s, v| {
            s.files.database = text(v)?;
            Some(())
        },
    },
    ConfItem {
        key: "files.gravity",
        description: "Blocklist database",
        kind: ItemKind::Str { allow_empty: false },
        apply: ApplyMode::RestartRequired,
        get: |s| Value::Str(s.files.gravity.clone()),
        set: |s, v| {
            s.files.gravity = text(v)?;
            Some(())
        },
    },
    ConfItem {
        key: "files.macvendor",
        description: "MAC vendor database",
        kind: ItemKind::Str { allow_empty: false },
        apply: ApplyMode::RestartRequired,
        get: |s| Value::Str(s.files.macvendor.clone()),
        set: |s, v| {
            s.files.macvendor = text(v)?;
            Some(())
        },
    },
    // [fifo]
    ConfItem {
        key: "fifo.size",
        description: "Number of log lines kept in the shared log ring",
        kind: ItemKind::Int(IntRule::unsigned(1, 65_536)),
        apply: ApplyMode::RestartRequired,
        get: |s| Value::Int(s.fifo.size.into()),
        set: |s, v| {
            s.fifo.size = v.as_int()?;
            Some(())
        },
    },
    ConfItem {
        key: "fifo.segment",
        description: "Shared memory file backing the log ring",
        kind: ItemKind::Str { allow_empty: false },
        apply: ApplyMode::RestartRequired,
        get: |s| Value::Str(s.fifo.segment.clone()),
        set: |s, v| {
            s.fifo.segment = text(v)?;
            Some(())
        },
    },
    // [misc]
    ConfItem {
        key: "misc.privacyLevel",
        description: "0 shows everything, 1 hides domains, 2 hides domains and clients, 3 anonymous mode",
        kind: ItemKind::Int(IntRule::unsigned(0, 3)),
        apply: ApplyMode::Live,
        get: |s| Value::Int(s.misc.privacy_level.into()),
        set: |s, v| {
            s.misc.privacy_level = v.as_int()?;
            Some(())
        },
    },
    ConfItem {
        key: "misc.nice",
        description: "Process niceness, -999 leaves it unchanged",
        kind: ItemKind::Int(IntRule {
            min: -20,
            max: 19,
            clamp: false,
            signed: true,
            special: Some(-999),
        }),
        apply: ApplyMode::RestartRequired,
        get: |s| Value::Int(s.misc.nice.into()),
        set: |s, v| {
            s.misc.nice = v.as_int()?;
            Some(())
        },
    },
    ConfItem {
        key: "misc.delayStartup",
        description: "Seconds to wait before the resolver starts",
        kind: ItemKind::Int(IntRule::unsigned(0, 300)),
        apply: ApplyMode::RestartRequired,
        get: |s| Value::Int(s.misc.delay_startup.into()),
        set: |s, v| {
            s.misc.delay_startup = v.as_int()?;
            Some(())
        },
    },
    // [debug]
    ConfItem {
        key: "debug.all",
        description: "Enable every debug area",
        kind: ItemKind::Bool,
        apply: ApplyMode::Live,
        get: |s| Value::Bool(s.debug.all),
        set: |s, v| {
            s.debug.all = v.as_bool()?;
            Some(())
        },
    },
    ConfItem {
        key: "debug.database",
        description: "Log database activity",
        kind: ItemKind::Bool,
        apply: ApplyMode::Live,
        get: |s| Value::Bool(s.debug.database),
        set: |s, v| {
            s.debug.database = v.as_bool()?;
            Some(())
        },
    },
    ConfItem {
        key: "debug.networking",
        description: "Log interface and network table activity",
        kind: ItemKind::Bool,
        apply: ApplyMode::Live,
        get: |s| Value::Bool(s.debug.networking),
        set: |s, v| {
            s.debug.networking = v.as_bool()?;
            Some(())
        },
    },
    ConfItem {
        key: "debug.queries",
        description: "Log every query",
        kind: ItemKind::Bool,
        apply: ApplyMode::Live,
        get: |s| Value::Bool(s.debug.queries),
        set: |s, v| {
            s.debug.queries = v.as_bool()?;
            Some(())
        },
    },
    ConfItem {
        key: "debug.shmem",
        description: "Log shared memory activity",
        kind: ItemKind::Bool,
        apply: ApplyMode::Live,
        get: |s| Value::Bool(s.debug.shmem),
        set: |s, v| {
            s.debug.shmem = v.as_bool()?;
            Some(())
        },
    },
    ConfItem {
        key: "debug.api",
        description: "Log API requests",
        kind: ItemKind::Bool,
        apply: ApplyMode::Live,
        get: |s| Value::Bool(s.debug.api),
        set: |s, v| {
            s.debug.api = v.as_bool()?;
            Some(())
        },
    },
    ConfItem {
        key: "debug.config",
        description: "Log how the configuration is read and report the result",
        kind: ItemKind::Bool,
        apply: ApplyMode::Live,
        get: |s| Value::Bool(s.debug.config),
        set: |s, v| {
            s.debug.config = v.as_bool()?;
            Some(())
        },
    },
    ConfItem {
        key: "debug.resolver",
        description: "Log host name resolution",
        kind: ItemKind::Bool,
        apply: ApplyMode::Live,
        get: |s| Value::Bool(s.debug.resolver),
        set: |s, v| {
            s.debug.resolver = v.as_bool()?;
            Some(())
        },
    },
    ConfItem {
        key: "debug.events",
        description: "Log internal event processing",
        kind: ItemKind::Bool,
        apply: ApplyMode::Live,
        get: |s| Value::Bool(s.debug.events),
        set: |s, v| {
            s.debug.events = v.as_bool()?;
            Some(())
        },
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_keys_are_unique() {
        let mut seen = HashSet::new();
        for item in ITEMS {
            assert!(seen.insert(item.key), "duplicate key {}", item.key);
        }
    }

    #[test]
    fn test_every_item_round_trips_its_default() {
        for item in ITEMS {
            let mut settings = Settings::default();
            let value = item.default_value();
            item.store(&mut settings, &value).unwrap();
            assert_eq!(settings, Settings::default(), "{}", item.key);
        }
    }

    #[test]
    fn test_store_rejects_wrong_type() {
        let item = find("dns.port").unwrap();
        let mut settings = Settings::default();
        let err = item.store(&mut settings, &Value::Bool(true)).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { .. }));
        assert_eq!(settings.dns.port, 53);
    }

    #[test]
    fn test_section_and_leaf() {
        let item = find("dns.ipBlocking.IPv4").unwrap();
        assert_eq!(item.section(), "dns");
        assert_eq!(item.leaf(), "ipBlocking.IPv4");
        assert!(find("dns.nope").is_none());
        assert!(find("DNS.PORT").is_none());
    }

    #[test]
    fn test_int_rule() {
        let nice = find("misc.nice").unwrap();
        let ItemKind::Int(rule) = nice.kind else {
            panic!("misc.nice is an integer");
        };
        assert_eq!(rule.apply(-999), Ok(-999));
        assert_eq!(rule.apply(5), Ok(5));
        assert!(rule.apply(20).is_err());

        let days = find("database.maxDBdays").unwrap();
        let ItemKind::Int(rule) = days.kind else {
            panic!("database.maxDBdays is an integer");
        };
        assert_eq!(rule.apply(100_000), Ok(24_855));
        assert!(rule.apply(-2).is_err());
    }

    #[test]
    fn test_value_display_is_toml() {
        assert_eq!(Value::Bool(true).to_string(), "true");
        assert_eq!(Value::Str("pi.hole".into()).to_string(), "\"pi.hole\"");
        assert_eq!(Value::Ipv4(None).to_string(), "\"\"");
        assert_eq!(
            Value::StrArray(vec!["1.1.1.1".into()]).to_string(),
            "[\"1.1.1.1\"]"
        );
    }
}
