use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// What a learner did with a recommendation. The feedback table is shared
/// with other writers, so rows may carry kinds this service does not issue;
/// those load as [`FeedbackKind::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FeedbackKind {
    Snooze,
    Start,
    Other(String),
}

impl FeedbackKind {
    pub fn as_str(&self) -> &str {
        match self {
            FeedbackKind::Snooze => "snooze",
            FeedbackKind::Start => "start",
            FeedbackKind::Other(raw) => raw,
        }
    }

    /// Lenient decode for stored rows.
    pub fn from_stored(raw: &str) -> Self {
        raw.parse()
            .unwrap_or_else(|_| FeedbackKind::Other(raw.trim().to_string()))
    }
}

impl fmt::Display for FeedbackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown feedback kind: {0}")]
pub struct UnknownFeedbackKind(pub String);

/// Strict parse: only the kinds this service records.
impl FromStr for FeedbackKind {
    type Err = UnknownFeedbackKind;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "snooze" => Ok(FeedbackKind::Snooze),
            "start" => Ok(FeedbackKind::Start),
            other => Err(UnknownFeedbackKind(other.to_string())),
        }
    }
}

impl Serialize for FeedbackKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FeedbackKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackEntry {
    pub user_id: String,
    pub topic: String,
    pub kind: FeedbackKind,
    pub recorded_at: DateTime<Utc>,
}
