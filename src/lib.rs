//! Transmission Chains: contact-graph chain construction for outbreak data
//!
//! Partitions person-to-person relationships into connected components
//! ("transmission chains"), flags each chain as active or inactive by
//! contact recency, and returns either the full network or a count-only
//! summary.
//!
//! # Core Concepts
//!
//! - **Relationship**: a dated contact between exactly two persons
//! - **Chain**: a maximal connected component of the contact graph
//! - **Active chain**: contains at least one contact within the follow-up window
//!
//! # Example
//!
//! ```
//! use chrono::{Duration, Utc};
//! use transmission_chains::{count, PersonRef, PersonType, Relationship};
//!
//! let edge = Relationship::new(
//!     "rel-1",
//!     PersonRef::new("case-1", PersonType::Case),
//!     PersonRef::new("contact-1", PersonType::Contact),
//!     Utc::now() - Duration::days(2),
//! );
//! let summary = count(vec![edge], 28);
//! assert_eq!(summary.length, 1);
//! assert_eq!(summary.active_chains, 1);
//! ```

pub mod chains;
pub mod config;
mod graph;
pub mod worker;

pub use chains::{
    build, build_at, count, count_at, process, ActivityWindow, BuildMode, BuildStats,
    ChainBuilder, ChainCount, ChainDetail, ChainNetwork, ChainSet, ChainSize, ChainsResult,
};
pub use config::{ConfigError, EngineConfig, WorkerConfig};
pub use graph::{
    parse_contact_date, Person, PersonId, PersonRef, PersonType, Relationship, RelationshipId,
};
pub use worker::{
    encode_response, ChainWorker, Function, Operation, Request, Response, WorkerError, WorkerHost,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
