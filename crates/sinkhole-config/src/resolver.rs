//! Derived resolver configuration and the check run before committing
//! resolver-affecting settings.

use std::fmt::Write as _;
use std::net::IpAddr;

use crate::settings::{BlockingMode, Settings};

/// Validation of a complete candidate settings copy beyond per-key rules.
pub trait DependentCheck: Send + Sync {
    /// Return a description of the problem if `candidate` must be rejected.
    fn check(&self, candidate: &Settings) -> Result<(), String>;
}

/// Checks and renders the resolver configuration derived from settings.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResolverCheck;

impl DependentCheck for ResolverCheck {
    fn check(&self, candidate: &Settings) -> Result<(), String> {
        ResolverConfig::render(candidate).map(|_| ())
    }
}

/// Rendered resolver configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    pub text: String,
}

impl ResolverConfig {
    /// Render the resolver configuration for `settings`.
    pub fn render(settings: &Settings) -> Result<Self, String> {
        let dns = &settings.dns;
        if dns.port == 0 {
            return Err("dns.port must not be 0".into());
        }
        if dns.rate_limit.count > 0 && dns.rate_limit.interval == 0 {
            return Err(format!(
                "rate limit of {} queries needs a non-zero interval",
                dns.rate_limit.count
            ));
        }

        let mut text = String::from("# Generated by sinkhole. Changes are overwritten.\n\n");
        let _ = writeln!(text, "port={}", dns.port);

        if !dns.upstreams.is_empty() {
            text.push_str("no-resolv\n");
        }
        for upstream in &dns.upstreams {
            let (addr, port) = parse_upstream(upstream)?;
            match port {
                Some(port) => {
                    let _ = writeln!(text, "server={addr}#{port}");
                }
                None => {
                    let _ = writeln!(text, "server={addr}");
                }
            }
        }

        let _ = writeln!(text, "\n# blocking mode: {}", dns.blocking_mode.as_str());
        if matches!(dns.blocking_mode, BlockingMode::Ip | BlockingMode::IpNodataAaaa) {
            if let Some(v4) = dns.ip_blocking.ipv4 {
                let _ = writeln!(text, "# blocking reply A: {v4}");
            }
            if let (BlockingMode::Ip, Some(v6)) = (dns.blocking_mode, dns.ip_blocking.ipv6) {
                let _ = writeln!(text, "# blocking reply AAAA: {v6}");
            }
        }
        if dns.rate_limit.count > 0 {
            let _ = writeln!(
                text,
                "# rate limit: {} queries per {}s",
                dns.rate_limit.count, dns.rate_limit.interval
            );
        }
        if dns.edns0_ecs {
            text.push_str("add-subnet=32,128\n");
        }

        Ok(Self { text })
    }
}

/// Split `ip` or `ip#port`.
fn parse_upstream(upstream: &str) -> Result<(IpAddr, Option<u16>), String> {
    let (addr, port) = match upstream.split_once('#') {
        Some((addr, port)) => {
            let port = port
                .parse::<u16>()
                .ok()
                .filter(|p| *p != 0)
                .ok_or_else(|| format!("upstream {upstream:?} has an invalid port"))?;
            (addr, Some(port))
        }
        None => (upstream, None),
    };
    let addr = addr
        .parse::<IpAddr>()
        .map_err(|_| format!("upstream {upstream:?} is not an IP address"))?;
    Ok((addr, port))
}
