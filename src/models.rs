use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Order {
    Asc,
    #[default]
    Desc,
}

impl Order {
    pub fn as_str(&self) -> &'static str {
        match self {
            Order::Asc => "asc",
            Order::Desc => "desc",
        }
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Order {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(Order::Asc),
            "desc" => Ok(Order::Desc),
            other => Err(format!("unknown order {:?}, expected asc or desc", other)),
        }
    }
}

/// Paging for `query`. Zero limit means no limit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryOptions {
    pub limit: u64,
    pub offset: u64,
    pub order: Order,
}

impl QueryOptions {
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = limit;
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }

    pub fn order(mut self, order: Order) -> Self {
        self.order = order;
        self
    }
}

pub const NO_EXPIRY: &str = "0s";

/// Optional fields of `write` and `asyncwrite`.
///
/// An empty `time` lets the server stamp the point with its own clock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOptions {
    pub time: String,
    pub ttl: String,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            time: String::new(),
            ttl: NO_EXPIRY.to_string(),
        }
    }
}

impl WriteOptions {
    pub fn time(mut self, time: impl Into<String>) -> Self {
        self.time = time.into();
        self
    }

    /// Sets the point key from a timestamp, as unix nanoseconds.
    pub fn at(self, time: DateTime<Utc>) -> Self {
        let nanos = time
            .timestamp_nanos_opt()
            .unwrap_or_else(|| time.timestamp().saturating_mul(1_000_000_000));
        self.time(nanos.to_string())
    }

    pub fn ttl(mut self, ttl: impl Into<String>) -> Self {
        self.ttl = ttl.into();
        self
    }

    pub fn ttl_duration(self, ttl: Duration) -> Self {
        let ttl = format_duration(ttl);
        self.ttl(ttl)
    }
}

/// Renders a duration in the server's `<n><unit>` syntax.
pub fn format_duration(d: Duration) -> String {
    if d.subsec_nanos() == 0 {
        format!("{}s", d.as_secs())
    } else {
        format!("{}ns", d.as_nanos())
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct QueryParams<'a> {
    pub series: &'a str,
    pub limit: u64,
    pub offset: u64,
    pub order: Order,
}

#[derive(Debug, Serialize)]
pub(crate) struct WriteParams<'a> {
    pub series: &'a str,
    pub value: String,
    pub time: &'a str,
    pub ttl: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct SeriesParams<'a> {
    pub series: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct DeleteByTimeParams<'a> {
    pub series: &'a str,
    pub time: &'a str,
}

/// Top-level JSON object of every envelope-carrying endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
}

impl Envelope {
    pub fn is_error(&self) -> bool {
        self.status.as_deref() == Some("error")
    }
}

/// One stored point as returned by `query`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub time: String,
    pub value: Value,
}

impl Point {
    /// Interprets `time` as unix nanoseconds.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        let nanos: i64 = self.time.parse().ok()?;
        Some(Utc.timestamp_nanos(nanos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_query_params_encoding() {
        let params = QueryParams {
            series: "cpu.load",
            limit: 0,
            offset: 0,
            order: Order::default(),
        };
        let encoded = serde_json::to_value(&params).unwrap();
        assert_eq!(
            encoded,
            json!({"series": "cpu.load", "limit": 0, "offset": 0, "order": "desc"})
        );
    }

    #[test]
    fn test_write_defaults() {
        let opts = WriteOptions::default();
        assert_eq!(opts.time, "");
        assert_eq!(opts.ttl, "0s");
    }

    #[test]
    fn test_ttl_duration() {
        assert_eq!(WriteOptions::default().ttl_duration(Duration::from_secs(90)).ttl, "90s");
        assert_eq!(
            WriteOptions::default().ttl_duration(Duration::from_millis(1500)).ttl,
            "1500000000ns"
        );
        assert_eq!(format_duration(Duration::ZERO), NO_EXPIRY);
    }

    #[test]
    fn test_write_at_uses_nanos() {
        let at = Utc.timestamp_opt(1_700_000_000, 5).unwrap();
        let opts = WriteOptions::default().at(at);
        assert_eq!(opts.time, "1700000000000000005");
    }

    #[test]
    fn test_order_parse() {
        assert_eq!("asc".parse::<Order>().unwrap(), Order::Asc);
        assert_eq!("desc".parse::<Order>().unwrap(), Order::Desc);
        assert!("ASC".parse::<Order>().is_err());
    }

    #[test]
    fn test_envelope_status() {
        let ok: Envelope = serde_json::from_value(json!({"status": "ok"})).unwrap();
        assert!(!ok.is_error());

        let bare: Envelope = serde_json::from_value(json!({"result": 3})).unwrap();
        assert!(!bare.is_error());
        assert_eq!(bare.result, Some(json!(3)));

        let err: Envelope =
            serde_json::from_value(json!({"status": "error", "message": "series need"})).unwrap();
        assert!(err.is_error());
        assert_eq!(err.message.as_deref(), Some("series need"));
    }

    #[test]
    fn test_point_timestamp() {
        let point = Point {
            time: "1700000000000000000".to_string(),
            value: json!("0.5"),
        };
        assert_eq!(point.timestamp().unwrap().timestamp(), 1_700_000_000);

        let custom = Point {
            time: "yesterday".to_string(),
            value: json!(1),
        };
        assert!(custom.timestamp().is_none());
    }
}
