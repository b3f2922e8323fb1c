//! Commented TOML writer.

use std::fmt::Write as _;

use crate::item::{ItemKind, ITEMS};
use crate::settings::Settings;

/// Render `settings` as a commented TOML document.
///
/// The result reads back into equal settings.
#[must_use]
pub fn write_toml(settings: &Settings) -> String {
    let mut out = String::new();
    out.push_str("# sinkhole configuration file\n");
    out.push_str("# Managed by sinkhole: values are kept, comments are regenerated.\n");
    let _ = writeln!(
        out,
        "# Last updated on {}",
        chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    );

    let mut section = "";
    for item in ITEMS {
        if item.section() != section {
            section = item.section();
            let _ = write!(out, "\n[{section}]\n");
        }

        let _ = writeln!(out, "  # {}", item.description);
        if let Some(allowed) = allowed_comment(item.kind) {
            out.push_str("  #\n");
            out.push_str("  # Allowed values are:\n");
            let _ = writeln!(out, "  #     {allowed}");
        }

        let value = item.value(settings);
        let default = item.default_value();
        if value == default {
            let _ = writeln!(out, "  {} = {value}", item.leaf());
        } else {
            let _ = writeln!(out, "  {} = {value} ### CHANGED, default = {default}", item.leaf());
        }
        out.push('\n');
    }
    out
}

fn allowed_comment(kind: ItemKind) -> Option<String> {
    match kind {
        ItemKind::Bool => Some("true or false".into()),
        ItemKind::Str { .. } => None,
        other => other.allowed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::from_toml_str;

    #[test]
    fn test_defaults_round_trip() {
        let text = write_toml(&Settings::default());
        assert!(text.starts_with("# sinkhole configuration file"));
        assert!(text.contains("[dns]\n"));
        assert!(text.contains("  port = 53\n"));
        assert!(!text.contains("CHANGED"));
        assert_eq!(from_toml_str(&text).unwrap(), Settings::default());
    }

    #[test]
    fn test_changed_values_are_marked_and_reload() {
        let mut settings = Settings::default();
        settings.dns.port = 5353;
        settings.dns.upstreams = vec!["9.9.9.9".into()];
        settings.dns.ip_blocking.ipv6 = Some("fd00::1".parse().unwrap());
        settings.http.domain = String::from("dns \"home\"");
        settings.misc.nice = -999;

        let text = write_toml(&settings);
        assert!(text.contains("port = 5353 ### CHANGED, default = 53"));
        assert!(text.contains("Allowed values are:"));
        assert_eq!(from_toml_str(&text).unwrap(), settings);
    }
}
