//! Turning user text and TOML values into validated [`Value`]s.

use std::net::{Ipv4Addr, Ipv6Addr};

use crate::item::{ConfItem, IntRule, ItemKind, Value};
use crate::ConfigError;

/// Parse command line text for `item`.
pub fn parse_text(item: &ConfItem, text: &str) -> crate::Result<Value> {
    let invalid = |reason: String| ConfigError::invalid(item.key, reason, item.kind.allowed());

    match item.kind {
        ItemKind::Bool => parse_bool(text)
            .map(Value::Bool)
            .ok_or_else(|| invalid(format!("{text:?} is not a boolean"))),
        ItemKind::Int(rule) => {
            let n = parse_int(text, rule.signed)
                .ok_or_else(|| invalid(format!("{text:?} is not an integer")))?;
            rule.apply(n).map(Value::Int).map_err(invalid)
        }
        ItemKind::Enum(options) => match_option(options, text)
            .map(|name| Value::Enum(name.to_owned()))
            .ok_or_else(|| invalid(format!("unknown option {text:?}"))),
        ItemKind::Str { allow_empty } => {
            if text.is_empty() && !allow_empty {
                Err(invalid("value must not be empty".into()))
            } else {
                Ok(Value::Str(text.to_owned()))
            }
        }
        ItemKind::Ipv4 => parse_addr::<Ipv4Addr>(text)
            .map(Value::Ipv4)
            .ok_or_else(|| invalid(format!("{text:?} is not a valid IPv4 address"))),
        ItemKind::Ipv6 => parse_addr::<Ipv6Addr>(text)
            .map(Value::Ipv6)
            .ok_or_else(|| invalid(format!("{text:?} is not a valid IPv6 address"))),
        ItemKind::StrArray => parse_string_array(text).map(Value::StrArray).map_err(invalid),
    }
}

/// Convert a TOML value read from the config file for `item`.
///
/// Returns `Ok(None)` for values that mean "keep the default", such as an
/// empty string for a path.
pub fn from_toml(item: &ConfItem, raw: &toml::Value) -> Result<Option<Value>, String> {
    let mismatch = || format!("expected {}, found {}", item.kind.type_name(), raw.type_str());

    let value = match (item.kind, raw) {
        (ItemKind::Bool, toml::Value::Boolean(b)) => Value::Bool(*b),
        (ItemKind::Int(rule), toml::Value::Integer(n)) => Value::Int(clamped(rule, *n)?),
        (ItemKind::Enum(options), toml::Value::String(s)) => match_option(options, s)
            .map(|name| Value::Enum(name.to_owned()))
            .ok_or_else(|| format!("unknown option {s:?}, allowed: {}", options.join(", ")))?,
        (ItemKind::Str { allow_empty }, toml::Value::String(s)) => {
            if s.is_empty() && !allow_empty {
                return Ok(None);
            }
            Value::Str(s.clone())
        }
        (ItemKind::Ipv4, toml::Value::String(s)) => parse_addr::<Ipv4Addr>(s)
            .map(Value::Ipv4)
            .ok_or_else(|| format!("{s:?} is not a valid IPv4 address"))?,
        (ItemKind::Ipv6, toml::Value::String(s)) => parse_addr::<Ipv6Addr>(s)
            .map(Value::Ipv6)
            .ok_or_else(|| format!("{s:?} is not a valid IPv6 address"))?,
        (ItemKind::StrArray, toml::Value::Array(items)) => Value::StrArray(
            items
                .iter()
                .enumerate()
                .map(|(i, v)| {
                    v.as_str()
                        .map(ToOwned::to_owned)
                        .ok_or_else(|| format!("element {i} is not a string"))
                })
                .collect::<Result<_, _>>()?,
        ),
        _ => return Err(mismatch()),
    };
    Ok(Some(value))
}

fn clamped(rule: IntRule, n: i64) -> Result<i64, String> {
    let value = rule.apply(n)?;
    if value != n {
        tracing::warn!(value = n, clamped = value, "value too large, clamped");
    }
    Ok(value)
}

/// `true`/`yes` and `false`/`no`, any case.
#[must_use]
pub fn parse_bool(text: &str) -> Option<bool> {
    let text = text.trim();
    if text.eq_ignore_ascii_case("true") || text.eq_ignore_ascii_case("yes") {
        Some(true)
    } else if text.eq_ignore_ascii_case("false") || text.eq_ignore_ascii_case("no") {
        Some(false)
    } else {
        None
    }
}

/// Parse an integer. With `prefixes`, `0x`/`0X` selects hex and a leading `0`
/// selects octal.
#[must_use]
pub fn parse_int(text: &str, prefixes: bool) -> Option<i64> {
    let text = text.trim();
    if !prefixes {
        return text.parse().ok();
    }

    let (negative, digits) = match text.as_bytes().first()? {
        b'-' => (true, &text[1..]),
        b'+' => (false, &text[1..]),
        _ => (false, text),
    };
    // A second sign is not a number.
    if digits.starts_with(['+', '-']) {
        return None;
    }
    let magnitude = if let Some(hex) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        i64::from_str_radix(hex, 16).ok()?
    } else if digits.len() > 1 && digits.starts_with('0') {
        i64::from_str_radix(&digits[1..], 8).ok()?
    } else {
        digits.parse::<i64>().ok()?
    };
    Some(if negative { -magnitude } else { magnitude })
}

fn match_option(options: &'static [&'static str], text: &str) -> Option<&'static str> {
    let text = text.trim();
    options.iter().copied().find(|opt| opt.eq_ignore_ascii_case(text))
}

/// Empty text means "unset".
fn parse_addr<A: std::str::FromStr>(text: &str) -> Option<Option<A>> {
    let text = text.trim();
    if text.is_empty() {
        return Some(None);
    }
    text.parse().ok().map(Some)
}

/// A JSON array whose every element is a string.
pub fn parse_string_array(text: &str) -> Result<Vec<String>, String> {
    let json: serde_json::Value =
        serde_json::from_str(text).map_err(|e| format!("not valid JSON: {e}"))?;
    let serde_json::Value::Array(items) = json else {
        return Err("not a JSON array".into());
    };
    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            serde_json::Value::String(s) => Ok(s),
            _ => Err(format!("element {i} is not a string")),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::find;

    fn parse(key: &str, text: &str) -> crate::Result<Value> {
        parse_text(find(key).unwrap(), text)
    }

    #[test]
    fn test_bool_spellings() {
        for yes in ["true", "TRUE", "Yes", "yes"] {
            assert_eq!(parse("debug.api", yes).unwrap(), Value::Bool(true));
        }
        for no in ["false", "False", "NO"] {
            assert_eq!(parse("debug.api", no).unwrap(), Value::Bool(false));
        }
        assert!(parse("debug.api", "1").is_err());
        assert!(parse("debug.api", "on").is_err());
    }

    #[test]
    fn test_int_parsing() {
        assert_eq!(parse_int("42", false), Some(42));
        assert_eq!(parse_int("0x10", false), None);
        assert_eq!(parse_int("0x10", true), Some(16));
        assert_eq!(parse_int("-0X1f", true), Some(-31));
        assert_eq!(parse_int("010", true), Some(8));
        assert_eq!(parse_int("0", true), Some(0));
        assert_eq!(parse_int("-5", true), Some(-5));
        assert_eq!(parse_int("--5", true), None);
        assert_eq!(parse_int("08", true), None);
        assert_eq!(parse_int("", true), None);
    }

    #[test]
    fn test_int_ranges() {
        assert_eq!(parse("database.DBinterval", "10").unwrap(), Value::Int(10));
        assert!(parse("database.DBinterval", "9").is_err());
        assert!(parse("fifo.size", "0").is_err());
        assert_eq!(parse("fifo.size", "65536").unwrap(), Value::Int(65_536));
        assert!(parse("dns.port", "70000").is_err());
        assert_eq!(parse("misc.nice", "-999").unwrap(), Value::Int(-999));
        assert_eq!(parse("database.maxDBdays", "999999").unwrap(), Value::Int(24_855));
    }

    #[test]
    fn test_enum_matching() {
        assert_eq!(
            parse("dns.blockingMode", "nxdomain").unwrap(),
            Value::Enum("NXDOMAIN".into())
        );
        let err = parse("dns.blockingMode", "bogus").unwrap_err();
        let ConfigError::Validation { allowed, .. } = err else {
            panic!("expected validation error");
        };
        assert_eq!(
            allowed.as_deref(),
            Some("NULL, IP-NODATA-AAAA, IP, NXDOMAIN, NODATA")
        );
    }

    #[test]
    fn test_addresses() {
        assert_eq!(
            parse("dns.ipBlocking.IPv4", "10.0.0.1").unwrap(),
            Value::Ipv4(Some(Ipv4Addr::new(10, 0, 0, 1)))
        );
        assert_eq!(parse("dns.ipBlocking.IPv4", "").unwrap(), Value::Ipv4(None));
        assert!(parse("dns.ipBlocking.IPv4", "::1").is_err());
        assert!(parse("dns.ipBlocking.IPv4", "256.0.0.1").is_err());
        assert_eq!(
            parse("dns.ipBlocking.IPv6", "fe80::1").unwrap(),
            Value::Ipv6(Some("fe80::1".parse().unwrap()))
        );
    }

    #[test]
    fn test_string_arrays() {
        assert_eq!(
            parse("dns.upstreams", r#"["9.9.9.9", "1.1.1.1#53"]"#).unwrap(),
            Value::StrArray(vec!["9.9.9.9".into(), "1.1.1.1#53".into()])
        );
        assert_eq!(parse("dns.upstreams", "[]").unwrap(), Value::StrArray(vec![]));
        assert!(parse("dns.upstreams", r#"["ok", 5]"#).is_err());
        assert!(parse("dns.upstreams", r#""9.9.9.9""#).is_err());
        assert!(parse("dns.upstreams", "[").is_err());
    }

    #[test]
    fn test_strings() {
        assert!(parse("files.log", "").is_err());
        assert_eq!(parse("http.acl", "").unwrap(), Value::Str(String::new()));
    }

    #[test]
    fn test_from_toml() {
        let item = find("database.maxDBdays").unwrap();
        assert_eq!(
            from_toml(item, &toml::Value::Integer(50_000)).unwrap(),
            Some(Value::Int(24_855))
        );
        assert!(from_toml(item, &toml::Value::String("x".into())).is_err());

        let log = find("files.log").unwrap();
        assert_eq!(from_toml(log, &toml::Value::String(String::new())).unwrap(), None);

        let upstreams = find("dns.upstreams").unwrap();
        let bad = toml::Value::Array(vec![toml::Value::Integer(1)]);
        assert!(from_toml(upstreams, &bad).is_err());
    }
}
