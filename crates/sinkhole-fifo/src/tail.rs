//! The log-tail operation behind the HTTP API.
//!
//! Request routing lives elsewhere; this module turns a query string and an
//! access decision into the `{"log": [...], "nextID": n}` response body.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ring::{LogEntry, Ring, TailPage};
use crate::FifoError;

/// Outcome of the caller's authentication check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Caller may read the log.
    Granted,
    /// Caller may not read the log.
    Denied,
}

/// Parsed tail request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TailRequest {
    /// Next id the client has not seen yet.
    pub next_id: Option<u64>,
}

impl TailRequest {
    /// Parse a raw query string such as `nextID=42`.
    ///
    /// A missing or non-numeric `nextID` is treated as absent.
    #[must_use]
    pub fn from_query(query: &str) -> Self {
        let next_id = url::form_urlencoded::parse(query.trim_start_matches('?').as_bytes())
            .find(|(key, _)| key == "nextID")
            .and_then(|(_, value)| value.trim().parse().ok());
        Self { next_id }
    }
}

/// One line of the response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TailEntry {
    pub timestamp: i64,
    pub message: String,
}

impl From<LogEntry> for TailEntry {
    fn from(entry: LogEntry) -> Self {
        Self {
            timestamp: entry.timestamp,
            message: entry.message,
        }
    }
}

/// Response body of the tail operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TailResponse {
    pub log: Vec<TailEntry>,
    #[serde(rename = "nextID")]
    pub next_id: u64,
}

impl From<TailPage> for TailResponse {
    fn from(page: TailPage) -> Self {
        Self {
            log: page.entries.into_iter().map(TailEntry::from).collect(),
            next_id: page.next_id,
        }
    }
}

impl TailResponse {
    /// Serialize, optionally pretty-printed.
    pub fn to_json(&self, pretty: bool) -> crate::Result<String> {
        let json = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(json)
    }
}

/// Serve a tail request against `ring`.
///
/// The access decision is checked before the ring is touched.
pub fn serve_tail<B: AsRef<[u8]>>(
    ring: &Ring<B>,
    request: TailRequest,
    access: Access,
) -> crate::Result<TailResponse> {
    if access == Access::Denied {
        return Err(FifoError::Unauthorized);
    }
    let page = ring.tail(request.next_id);
    debug!(
        requested = ?request.next_id,
        returned = page.entries.len(),
        next_id = page.next_id,
        "served log tail"
    );
    Ok(page.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::HeapSegment;

    fn ring_with(count: i64) -> Ring<HeapSegment> {
        let mut ring = Ring::in_memory(5).unwrap();
        for ts in 1..=count {
            ring.append(ts, &format!("msg {ts}")).unwrap();
        }
        ring
    }

    #[test]
    fn test_query_parsing() {
        assert_eq!(TailRequest::from_query("nextID=42").next_id, Some(42));
        assert_eq!(TailRequest::from_query("?nextID=7&x=1").next_id, Some(7));
        assert_eq!(TailRequest::from_query("").next_id, None);
        assert_eq!(TailRequest::from_query("nextID=abc").next_id, None);
        assert_eq!(TailRequest::from_query("nextID=-1").next_id, None);
        assert_eq!(TailRequest::from_query("nextid=3").next_id, None);
    }

    #[test]
    fn test_denied_is_rejected() {
        let ring = ring_with(3);
        let err = serve_tail(&ring, TailRequest::default(), Access::Denied).unwrap_err();
        assert!(matches!(err, FifoError::Unauthorized));
    }

    #[test]
    fn test_response_shape() {
        let ring = ring_with(7);
        let response =
            serve_tail(&ring, TailRequest::from_query("nextID=2"), Access::Granted).unwrap();
        let json: serde_json::Value = serde_json::from_str(&response.to_json(false).unwrap()).unwrap();

        assert_eq!(json["nextID"], 7);
        let log = json["log"].as_array().unwrap();
        assert_eq!(log.len(), 5);
        assert_eq!(log[0]["timestamp"], 3);
        assert_eq!(log[0]["message"], "msg 3");
        assert_eq!(log[4]["timestamp"], 7);
    }

    #[test]
    fn test_caught_up_returns_empty_log() {
        let ring = ring_with(3);
        let response =
            serve_tail(&ring, TailRequest { next_id: Some(3) }, Access::Granted).unwrap();
        assert!(response.log.is_empty());
        assert_eq!(response.next_id, 3);
        assert_eq!(response.to_json(false).unwrap(), r#"{"log":[],"nextID":3}"#);
    }
}
