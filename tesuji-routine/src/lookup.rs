//! Game metadata fetched from the play server's public API.
//!
//! Lookups are best-effort: any failure resolves to `None`, and everything
//! downstream has a defined behavior for "unknown".

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The fields of a game record the routine cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameMetadata {
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub outcome: Option<String>,
}

impl GameMetadata {
    /// Read a game record payload. Returns `None` unless it is a JSON object;
    /// absent or malformed fields inside it degrade to `None`.
    #[must_use]
    pub fn from_record(record: &Value) -> Option<Self> {
        let fields = record.as_object()?;
        Some(Self {
            start_time: first_present(fields, &["start_time", "started"]).and_then(parse_timestamp),
            end_time: first_present(fields, &["end_time", "ended"]).and_then(parse_timestamp),
            outcome: first_present(fields, &["outcome", "result", "outcome_code"]).and_then(text_of),
        })
    }

    /// Wall-clock length of the game, when both ends are known and ordered.
    #[must_use]
    pub fn duration(&self) -> Option<Duration> {
        let (start, end) = (self.start_time?, self.end_time?);
        if end <= start {
            return None;
        }
        (end - start).to_std().ok()
    }
}

/// Null-safe [`GameMetadata::duration`].
#[must_use]
pub fn duration_seconds(metadata: Option<&GameMetadata>) -> Option<Duration> {
    metadata.and_then(GameMetadata::duration)
}

/// Null-safe outcome text.
#[must_use]
pub fn outcome_text(metadata: Option<&GameMetadata>) -> Option<&str> {
    metadata.and_then(|m| m.outcome.as_deref())
}

/// Whether an outcome is a natural stopping point worth reviewing without
/// asking: a resignation, or both players passing. Timeouts, disconnections
/// and unknown outcomes are not.
#[must_use]
pub fn is_reviewable(outcome: Option<&str>) -> bool {
    let Some(text) = outcome else {
        return false;
    };
    let lowered = text.to_lowercase();
    lowered.contains("resign") || (lowered.contains("both") && lowered.contains("pass"))
}

/// First field among `keys` holding a "truthy" value (not null, false, zero
/// or empty).
fn first_present<'a>(fields: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| fields.get(*key))
        .find(|value| is_truthy(value))
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// ISO-8601 string or epoch seconds.
fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => {
            let secs = n.as_f64()?;
            if !secs.is_finite() {
                return None;
            }
            #[allow(clippy::cast_possible_truncation)]
            let millis = (secs * 1000.0).round() as i64;
            DateTime::from_timestamp_millis(millis)
        }
        // Offset-less ISO 8601 is read as UTC.
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
                    .ok()
                    .map(|naive| naive.and_utc())
            }),
        _ => None,
    }
}

fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

/// Source of game metadata by id.
#[async_trait]
pub trait GameLookup: Send + Sync {
    /// Fetch the record for `game_id`. Never fails: anything that goes wrong
    /// yields `None`.
    async fn fetch(&self, game_id: &str) -> Option<GameMetadata>;
}

/// Lookup that never knows anything; useful offline.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLookup;

#[async_trait]
impl GameLookup for NoLookup {
    async fn fetch(&self, _game_id: &str) -> Option<GameMetadata> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reviewable_outcomes() {
        assert!(is_reviewable(Some("Black resigns")));
        assert!(is_reviewable(Some("White Resigned")));
        assert!(is_reviewable(Some("Both players passed")));
        assert!(!is_reviewable(Some("Timeout")));
        assert!(!is_reviewable(Some("")));
        assert!(!is_reviewable(None));
        assert!(!is_reviewable(Some("Black passed")));
    }

    #[test]
    fn record_with_iso_timestamps() {
        let record = json!({
            "started": "2024-03-01T10:00:00Z",
            "ended": "2024-03-01T10:05:00+00:00",
            "outcome": "Resignation"
        });
        let meta = GameMetadata::from_record(&record).expect("object");
        assert_eq!(meta.duration(), Some(Duration::from_secs(300)));
        assert_eq!(outcome_text(Some(&meta)), Some("Resignation"));
    }

    #[test]
    fn timestamps_without_offset_are_utc() {
        let record = json!({
            "start_time": "2024-03-01T10:00:00",
            "end_time": "2024-03-01T10:02:30.5",
        });
        let meta = GameMetadata::from_record(&record).expect("object");
        assert_eq!(meta.start_time, DateTime::from_timestamp(1_709_287_200, 0));
        assert_eq!(meta.duration(), Some(Duration::from_millis(150_500)));
    }

    #[test]
    fn record_with_epoch_numbers_and_fallback_keys() {
        let record = json!({
            "start_time": 0,
            "started": 1_700_000_000,
            "end_time": 1_700_000_600.5,
            "outcome": "",
            "result": null,
            "outcome_code": 17
        });
        let meta = GameMetadata::from_record(&record).expect("object");
        assert_eq!(meta.duration(), Some(Duration::from_millis(600_500)));
        assert_eq!(meta.outcome.as_deref(), Some("17"));
    }

    #[test]
    fn malformed_fields_degrade_to_none() {
        let record = json!({
            "start_time": "yesterday",
            "end_time": {"nested": true},
            "outcome": false
        });
        let meta = GameMetadata::from_record(&record).expect("object");
        assert_eq!(meta, GameMetadata::default());
        assert_eq!(duration_seconds(Some(&meta)), None);
        assert!(GameMetadata::from_record(&json!([1, 2, 3])).is_none());
    }

    #[test]
    fn duration_requires_ordered_ends() {
        let start = DateTime::from_timestamp(1_000, 0);
        let meta = GameMetadata {
            start_time: start,
            end_time: start,
            outcome: None,
        };
        assert_eq!(meta.duration(), None);
        assert_eq!(duration_seconds(None), None);
        assert_eq!(outcome_text(None), None);
    }

    #[test]
    fn no_lookup_knows_nothing() {
        assert!(tokio_test::block_on(NoLookup.fetch("1")).is_none());
    }
}
