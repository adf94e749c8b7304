//! Person identity and payload types

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Identifier of a person (case, contact, event, ...) taking part in a relationship
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonId(String);

impl PersonId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for PersonId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for PersonId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for PersonId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

const REFERENCE_DATA_PREFIX: &str = "LNG_REFERENCE_DATA_CATEGORY_PERSON_TYPE_";

/// Kind of person on either end of a relationship.
///
/// Serialized in kebab-case. The long reference-data spellings
/// (`LNG_REFERENCE_DATA_CATEGORY_PERSON_TYPE_CASE`, ...) are accepted on
/// input and normalized; anything else round-trips through `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PersonType {
    Case,
    Contact,
    Event,
    ContactOfContact,
    Other(String),
}

impl PersonType {
    pub fn as_str(&self) -> &str {
        match self {
            PersonType::Case => "case",
            PersonType::Contact => "contact",
            PersonType::Event => "event",
            PersonType::ContactOfContact => "contact-of-contact",
            PersonType::Other(s) => s,
        }
    }
}

impl From<String> for PersonType {
    fn from(s: String) -> Self {
        let key = s.strip_prefix(REFERENCE_DATA_PREFIX).unwrap_or(&s);
        match key.to_ascii_lowercase().replace('_', "-").as_str() {
            "case" => PersonType::Case,
            "contact" => PersonType::Contact,
            "event" => PersonType::Event,
            "contact-of-contact" => PersonType::ContactOfContact,
            _ => PersonType::Other(s),
        }
    }
}

impl From<PersonType> for String {
    fn from(t: PersonType) -> Self {
        match t {
            PersonType::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for PersonType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lightweight participant identity carried in `Relationship::persons`.
///
/// Identity is the `id` alone; `type` is informational and may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonRef {
    #[serde(default)]
    pub id: PersonId,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub person_type: Option<PersonType>,
}

impl PersonRef {
    pub fn new(id: impl Into<PersonId>, person_type: PersonType) -> Self {
        Self {
            id: id.into(),
            person_type: Some(person_type),
        }
    }

    /// Reference without a type.
    pub fn untyped(id: impl Into<PersonId>) -> Self {
        Self {
            id: id.into(),
            person_type: None,
        }
    }

    /// Placeholder for a participant entry that could not be read.
    pub fn unresolved() -> Self {
        Self::default()
    }

    /// A reference can only join a chain if it names someone.
    pub fn is_resolvable(&self) -> bool {
        !self.id.is_empty()
    }
}

/// Full person record as supplied by the relationship feed.
///
/// Only `id` and `type` are interpreted; every other field is carried
/// through to the node map untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub id: PersonId,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub person_type: Option<PersonType>,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl Person {
    pub fn new(id: impl Into<PersonId>) -> Self {
        Self {
            id: id.into(),
            person_type: None,
            attributes: Map::new(),
        }
    }

    pub fn with_type(mut self, person_type: PersonType) -> Self {
        self.person_type = Some(person_type);
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }
}

impl From<&PersonRef> for Person {
    fn from(r: &PersonRef) -> Self {
        Person {
            person_type: r.person_type.clone(),
            ..Person::new(r.id.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn person_type_accepts_reference_data_spelling() {
        let t: PersonType =
            serde_json::from_value(json!("LNG_REFERENCE_DATA_CATEGORY_PERSON_TYPE_CONTACT_OF_CONTACT"))
                .unwrap();
        assert_eq!(t, PersonType::ContactOfContact);
        assert_eq!(serde_json::to_value(&t).unwrap(), json!("contact-of-contact"));
    }

    #[test]
    fn unknown_person_type_round_trips() {
        let t: PersonType = serde_json::from_value(json!("household")).unwrap();
        assert_eq!(t, PersonType::Other("household".into()));
        assert_eq!(serde_json::to_value(&t).unwrap(), json!("household"));
    }

    #[test]
    fn person_keeps_unknown_fields() {
        let p: Person = serde_json::from_value(json!({
            "id": "case-1",
            "type": "case",
            "firstName": "Ada",
            "addresses": [{"locationId": "loc-9"}]
        }))
        .unwrap();

        assert_eq!(p.id.as_str(), "case-1");
        assert_eq!(p.person_type, Some(PersonType::Case));
        assert_eq!(p.attributes["firstName"], json!("Ada"));

        let back = serde_json::to_value(&p).unwrap();
        assert_eq!(back["addresses"][0]["locationId"], json!("loc-9"));
    }

    #[test]
    fn empty_id_is_not_resolvable() {
        assert!(!PersonRef::new("", PersonType::Case).is_resolvable());
        assert!(PersonRef::new("c1", PersonType::Case).is_resolvable());
        assert!(!PersonRef::unresolved().is_resolvable());
    }

    #[test]
    fn person_ref_type_is_optional() {
        let r: PersonRef = serde_json::from_value(json!({"id": "c"})).unwrap();
        assert_eq!(r, PersonRef::untyped("c"));
        assert!(r.is_resolvable());
        assert_eq!(serde_json::to_value(&r).unwrap(), json!({"id": "c"}));
        assert_eq!(Person::from(&r).person_type, None);
    }
}
