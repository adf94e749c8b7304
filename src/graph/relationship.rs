//! Relationship (edge) between two persons

use super::person::{Person, PersonId, PersonRef};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Identifier of a relationship record
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RelationshipId(String);

impl RelationshipId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RelationshipId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for RelationshipId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A recorded contact between two persons.
///
/// `persons` carries lightweight identity; `people`, when present, carries
/// the same participants with their full payload in matching order. Fields
/// the engine does not interpret are kept in `attributes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    pub id: RelationshipId,
    #[serde(default, deserialize_with = "deserialize_persons")]
    pub persons: Vec<PersonRef>,
    #[serde(deserialize_with = "deserialize_contact_date")]
    pub contact_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub people: Option<Vec<Person>>,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl Relationship {
    pub fn new(
        id: impl Into<String>,
        first: PersonRef,
        second: PersonRef,
        contact_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: RelationshipId::new(id),
            persons: vec![first, second],
            contact_date,
            people: None,
            attributes: Map::new(),
        }
    }

    /// Attach full payloads for both participants, in `persons` order.
    pub fn with_people(mut self, first: Person, second: Person) -> Self {
        self.people = Some(vec![first, second]);
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    /// The two participant ids, or `None` unless the edge names exactly two
    /// resolvable persons.
    pub fn participants(&self) -> Option<(&PersonId, &PersonId)> {
        match self.persons.as_slice() {
            [a, b] if a.is_resolvable() && b.is_resolvable() => Some((&a.id, &b.id)),
            _ => None,
        }
    }

    /// Split off the full person payloads, leaving the lightweight edge.
    pub fn into_parts(mut self) -> (Relationship, Option<Vec<Person>>) {
        let people = self.people.take();
        (self, people)
    }
}

/// Each participant entry is read on its own. An entry that cannot be read
/// becomes an unresolved reference, which makes only this relationship
/// malformed; a missing or non-array `persons` reads as empty.
fn deserialize_persons<'de, D>(deserializer: D) -> Result<Vec<PersonRef>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    let persons = match raw {
        Value::Array(items) => items
            .into_iter()
            .map(|item| serde_json::from_value(item).unwrap_or_else(|_| PersonRef::unresolved()))
            .collect(),
        _ => Vec::new(),
    };
    Ok(persons)
}

/// Accepts RFC 3339 timestamps as well as bare `YYYY-MM-DD` dates (midnight UTC).
fn deserialize_contact_date<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_contact_date(&raw).map_err(serde::de::Error::custom)
}

/// Parse an RFC 3339 timestamp or a bare `YYYY-MM-DD` date.
pub fn parse_contact_date(raw: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| format!("invalid contact date: {}", raw))
}
