//! Typed settings with their defaults.

use serde::Serialize;
use std::net::{Ipv4Addr, Ipv6Addr};

/// Complete set of engine settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Settings {
    pub dns: DnsSettings,
    pub resolver: ResolverSettings,
    pub database: DatabaseSettings,
    pub http: HttpSettings,
    pub files: FileSettings,
    pub fifo: FifoSettings,
    pub misc: MiscSettings,
    pub debug: DebugSettings,
}

/// How blocked queries are answered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum BlockingMode {
    /// Unspecified address (`0.0.0.0` / `::`).
    #[default]
    #[serde(rename = "NULL")]
    Null,
    /// Blocking address for A, empty answer for AAAA.
    #[serde(rename = "IP-NODATA-AAAA")]
    IpNodataAaaa,
    /// Blocking address for both A and AAAA.
    #[serde(rename = "IP")]
    Ip,
    /// NXDOMAIN.
    #[serde(rename = "NXDOMAIN")]
    Nxdomain,
    /// Empty answer with NOERROR.
    #[serde(rename = "NODATA")]
    Nodata,
}

impl BlockingMode {
    /// Every mode, in display order.
    pub const ALL: [Self; 5] = [
        Self::Null,
        Self::IpNodataAaaa,
        Self::Ip,
        Self::Nxdomain,
        Self::Nodata,
    ];

    /// Configuration name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Null => "NULL",
            Self::IpNodataAaaa => "IP-NODATA-AAAA",
            Self::Ip => "IP",
            Self::Nxdomain => "NXDOMAIN",
            Self::Nodata => "NODATA",
        }
    }

    /// Case-insensitive lookup by name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(name))
    }
}

/// Which clients get their host names re-resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RefreshNames {
    #[default]
    Ipv4Only,
    All,
    Unknown,
    None,
}

impl RefreshNames {
    /// Every option, in display order.
    pub const ALL: [Self; 4] = [Self::Ipv4Only, Self::All, Self::Unknown, Self::None];

    /// Configuration name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ipv4Only => "IPV4_ONLY",
            Self::All => "ALL",
            Self::Unknown => "UNKNOWN",
            Self::None => "NONE",
        }
    }

    /// Case-insensitive lookup by name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|opt| opt.as_str().eq_ignore_ascii_case(name))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DnsSettings {
    pub blocking_mode: BlockingMode,
    pub cname_deep_inspect: bool,
    pub block_esni: bool,
    pub edns0_ecs: bool,
    pub ignore_localhost: bool,
    /// Upstream servers, `ip` or `ip#port`.
    pub upstreams: Vec<String>,
    pub port: u16,
    pub ip_blocking: IpBlocking,
    pub rate_limit: RateLimit,
}

impl Default for DnsSettings {
    fn default() -> Self {
        Self {
            blocking_mode: BlockingMode::default(),
            cname_deep_inspect: true,
            block_esni: true,
            edns0_ecs: true,
            ignore_localhost: false,
            upstreams: Vec::new(),
            port: 53,
            ip_blocking: IpBlocking::default(),
            rate_limit: RateLimit::default(),
        }
    }
}

/// Addresses returned for blocked queries in the `IP*` modes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IpBlocking {
    pub ipv4: Option<Ipv4Addr>,
    pub ipv6: Option<Ipv6Addr>,
}

/// Per-client query rate limit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RateLimit {
    /// Queries allowed per interval, `0` disables the limit.
    pub count: u32,
    /// Interval length in seconds.
    pub interval: u32,
}

impl Default for RateLimit {
    fn default() -> Self {
        Self {
            count: 1000,
            interval: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolverSettings {
    pub resolve_ipv4: bool,
    pub resolve_ipv6: bool,
    pub network_names: bool,
    pub refresh_names: RefreshNames,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            resolve_ipv4: true,
            resolve_ipv6: true,
            network_names: true,
            refresh_names: RefreshNames::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatabaseSettings {
    pub db_import: bool,
    /// Seconds of query history kept in memory.
    pub max_history: u32,
    /// Days kept in the long-term database, `-1` keeps everything.
    pub max_db_days: i32,
    /// Seconds between database writes.
    pub db_interval: u32,
    pub network: NetworkSettings,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            db_import: true,
            max_history: 86_400,
            max_db_days: 365,
            db_interval: 60,
            network: NetworkSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkSettings {
    pub parse_arp: bool,
    /// Days after which idle network devices are dropped.
    pub expire: u32,
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            parse_arp: true,
            expire: 365,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HttpSettings {
    pub local_api_auth: bool,
    pub pretty_json: bool,
    pub session_timeout: u32,
    pub domain: String,
    pub acl: String,
    pub port: String,
    pub webroot: String,
    pub webhome: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            local_api_auth: true,
            pretty_json: false,
            session_timeout: 300,
            domain: String::from("pi.hole"),
            acl: String::new(),
            port: String::from("80,[::]:80"),
            webroot: String::from("/var/www/html"),
            webhome: String::from("/admin/"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileSettings {
    pub log: String,
    pub pid: String,
    pub database: String,
    pub gravity: String,
    pub macvendor: String,
}

impl Default for FileSettings {
    fn default() -> Self {
        Self {
            log: String::from("/var/log/sinkhole/sinkhole.log"),
            pid: String::from("/run/sinkhole.pid"),
            database: String::from("/etc/sinkhole/sinkhole.db"),
            gravity: String::from("/etc/sinkhole/gravity.db"),
            macvendor: String::from("/etc/sinkhole/macvendor.db"),
        }
    }
}

/// Shared log ring. Read once at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FifoSettings {
    /// Ring capacity in entries.
    pub size: u32,
    /// Path of the shared segment file.
    pub segment: String,
}

impl Default for FifoSettings {
    fn default() -> Self {
        Self {
            size: 512,
            segment: String::from("/dev/shm/sinkhole-fifo"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MiscSettings {
    /// 0 shows everything, 3 hides everything.
    pub privacy_level: u8,
    /// Process niceness, `-999` leaves it untouched.
    pub nice: i32,
    /// Seconds to wait before starting the resolver.
    pub delay_startup: u32,
}

impl Default for MiscSettings {
    fn default() -> Self {
        Self {
            privacy_level: 0,
            nice: -10,
            delay_startup: 0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct DebugSettings {
    pub all: bool,
    pub database: bool,
    pub networking: bool,
    pub queries: bool,
    pub shmem: bool,
    pub api: bool,
    pub config: bool,
    pub resolver: bool,
    pub events: bool,
}

impl DebugSettings {
    /// Turn every area on.
    pub fn enable_all(&mut self) {
        *self = Self {
            all: true,
            database: true,
            networking: true,
            queries: true,
            shmem: true,
            api: true,
            config: true,
            resolver: true,
            events: true,
        };
    }

    /// Names of the areas that are switched on.
    #[must_use]
    pub fn enabled_areas(&self) -> Vec<&'static str> {
        [
            ("database", self.database),
            ("networking", self.networking),
            ("queries", self.queries),
            ("shmem", self.shmem),
            ("api", self.api),
            ("config", self.config),
            ("resolver", self.resolver),
            ("events", self.events),
        ]
        .into_iter()
        .filter_map(|(name, on)| on.then_some(name))
        .collect()
    }
}
