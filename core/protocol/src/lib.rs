//! Wire types and endpoint contract for the Nightwatch shift ledger API.
//!
//! Shared by the dashboard engine and its tests. The server remains the
//! authority on validation. Input is accepted loosely: numeric or string ids,
//! timestamps with or without an offset.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

// ═══════════════════════════════════════════════════════════════════════════════
// Identifiers
// ═══════════════════════════════════════════════════════════════════════════════

/// Server-assigned identifier for a shift or task.
///
/// The API serves integer ids; fixtures and older builds use strings. Both are
/// normalized to their string form, which is also what goes into request paths.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<i64> for RecordId {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

impl Serialize for RecordId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Int(i64),
            Str(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Int(value) => RecordId(value.to_string()),
            Raw::Str(value) => RecordId(value),
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Timestamps
// ═══════════════════════════════════════════════════════════════════════════════

/// Parses an API timestamp.
///
/// Accepts RFC 3339 (`2024-01-01T00:00:00Z`) and offset-less ISO 8601
/// (`2024-01-01T00:00:00.123`), the latter interpreted as UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|naive| naive.and_utc())
}

pub fn format_timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// `#[serde(with = "timestamp")]` for required timestamp fields.
pub mod timestamp {
    use super::*;

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_timestamp(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_timestamp(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {}", raw)))
    }

    /// `#[serde(default, with = "timestamp::option")]` for nullable timestamp fields.
    pub mod option {
        use super::*;

        pub fn serialize<S: Serializer>(
            value: &Option<DateTime<Utc>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(value) => serializer.serialize_str(&format_timestamp(value)),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            match Option::<String>::deserialize(deserializer)? {
                None => Ok(None),
                Some(raw) => parse_timestamp(&raw)
                    .map(Some)
                    .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {}", raw))),
            }
        }
    }
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

// ═══════════════════════════════════════════════════════════════════════════════
// Resources
// ═══════════════════════════════════════════════════════════════════════════════

/// A bounded work session. Active while `ended_at` is absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shift {
    pub id: RecordId,
    #[serde(with = "timestamp")]
    pub started_at: DateTime<Utc>,
    #[serde(default, with = "timestamp::option")]
    pub ended_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub notes: String,
}

impl Shift {
    pub fn is_active(&self) -> bool {
        self.ended_at.is_none()
    }
}

/// A titled unit of work scoped to one shift. Open while `completed_at` is absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: RecordId,
    pub title: String,
    #[serde(default, with = "timestamp::option")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp::option")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub shift_id: Option<RecordId>,
}

impl Task {
    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }
}

/// Response of `POST /api/shift/start`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartShiftResponse {
    pub shift: Shift,
    #[serde(default)]
    pub carried_task_count: Option<u32>,
    #[serde(default)]
    pub already_active: Option<bool>,
}

impl StartShiftResponse {
    pub fn carried(&self) -> u32 {
        self.carried_task_count.unwrap_or(0)
    }

    pub fn was_already_active(&self) -> bool {
        self.already_active.unwrap_or(false)
    }
}

/// Point-in-time host health reading served by `GET /api/system`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemSnapshot {
    pub cpu_percent: f64,
    pub ram_percent: f64,
    pub ram_used_mb: f64,
    pub ram_total_mb: f64,
    pub disk_percent: f64,
    pub disk_used_gb: f64,
    pub disk_total_gb: f64,
    #[serde(default)]
    pub temp_c: Option<f64>,
    pub network_up: bool,
    #[serde(with = "timestamp")]
    pub at: DateTime<Utc>,
}

// ═══════════════════════════════════════════════════════════════════════════════
// Request Bodies
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotesUpdate {
    pub notes: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTask {
    pub title: String,
}

// ═══════════════════════════════════════════════════════════════════════════════
// Error Bodies
// ═══════════════════════════════════════════════════════════════════════════════

/// Error payload of a non-success response.
///
/// `detail` is normally a string. Request validation failures carry a list of
/// `{loc, msg, type}` items instead.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<Value>,
}

impl ErrorBody {
    /// Human-readable message carried by the body, if it has one.
    pub fn message(&self) -> Option<String> {
        match self.detail.as_ref()? {
            Value::String(detail) => {
                let detail = detail.trim();
                (!detail.is_empty()).then(|| detail.to_string())
            }
            Value::Array(items) => {
                let messages: Vec<&str> = items
                    .iter()
                    .filter_map(|item| item.get("msg").and_then(Value::as_str))
                    .collect();
                (!messages.is_empty()).then(|| messages.join("; "))
            }
            _ => None,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Endpoints
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Method + path of one API operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub method: Method,
    pub path: String,
}

impl Endpoint {
    fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
        }
    }

    pub fn current_shift() -> Self {
        Self::new(Method::Get, "/api/shift/current")
    }

    pub fn start_shift() -> Self {
        Self::new(Method::Post, "/api/shift/start")
    }

    pub fn end_shift() -> Self {
        Self::new(Method::Post, "/api/shift/end")
    }

    pub fn shift_notes(shift_id: &RecordId) -> Self {
        Self::new(Method::Put, format!("/api/shift/{}/notes", shift_id))
    }

    pub fn current_tasks() -> Self {
        Self::new(Method::Get, "/api/tasks/current")
    }

    pub fn create_task() -> Self {
        Self::new(Method::Post, "/api/tasks")
    }

    pub fn complete_task(task_id: &RecordId) -> Self {
        Self::new(Method::Post, format!("/api/tasks/{}/complete", task_id))
    }

    pub fn reopen_task(task_id: &RecordId) -> Self {
        Self::new(Method::Post, format!("/api/tasks/{}/reopen", task_id))
    }

    pub fn delete_task(task_id: &RecordId) -> Self {
        Self::new(Method::Delete, format!("/api/tasks/{}", task_id))
    }

    pub fn system() -> Self {
        Self::new(Method::Get, "/api/system")
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}
