//! Contact graph data types: persons and the relationships between them

mod person;
mod relationship;

pub use person::{Person, PersonId, PersonRef, PersonType};
pub use relationship::{Relationship, RelationshipId};

pub use relationship::parse_contact_date;
