//! Result payloads: the full network and the count-only summary

use crate::graph::{Person, PersonId, Relationship, RelationshipId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Size and activity of one chain (count mode)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainSize {
    pub length: usize,
    pub active: bool,
}

/// Count-only statistics over all chains
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainCount {
    pub chains: Vec<ChainSize>,
    pub length: usize,
    pub active_chains: usize,
}

impl ChainCount {
    pub fn empty() -> Self {
        Self {
            chains: Vec::new(),
            length: 0,
            active_chains: 0,
        }
    }
}

/// One chain with its person-id pairs, one pair per merged relationship
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainDetail {
    pub chain: Vec<[PersonId; 2]>,
    pub active: bool,
}

impl ChainDetail {
    /// Number of relationships in the chain.
    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    /// Whether `person` takes part in any pair of this chain.
    pub fn contains(&self, person: &PersonId) -> bool {
        self.chain.iter().any(|[a, b]| a == person || b == person)
    }
}

/// Dense list of live chains (full mode)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainSet {
    pub chains: Vec<ChainDetail>,
    pub length: usize,
}

impl ChainSet {
    pub fn active_count(&self) -> usize {
        self.chains.iter().filter(|c| c.active).count()
    }
}

/// Full network payload: nodes, stripped edges and the chains over them.
///
/// Nodes hold the first payload seen for each person; edges are stored
/// without their `people` so person payloads are not duplicated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainNetwork {
    pub nodes: BTreeMap<PersonId, Person>,
    pub edges: BTreeMap<RelationshipId, Relationship>,
    pub transmission_chains: ChainSet,
}

impl ChainNetwork {
    /// The count-mode payload for the same chains.
    pub fn summary(&self) -> ChainCount {
        let chains: Vec<ChainSize> = self
            .transmission_chains
            .chains
            .iter()
            .map(|c| ChainSize {
                length: c.len(),
                active: c.active,
            })
            .collect();
        ChainCount {
            length: chains.len(),
            active_chains: self.transmission_chains.active_count(),
            chains,
        }
    }
}

/// Either result shape, depending on the requested mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChainsResult {
    Network(ChainNetwork),
    Count(ChainCount),
}

impl ChainsResult {
    pub fn chain_count(&self) -> usize {
        match self {
            ChainsResult::Network(n) => n.transmission_chains.length,
            ChainsResult::Count(c) => c.length,
        }
    }

    pub fn into_network(self) -> Option<ChainNetwork> {
        match self {
            ChainsResult::Network(n) => Some(n),
            ChainsResult::Count(_) => None,
        }
    }

    pub fn into_count(self) -> Option<ChainCount> {
        match self {
            ChainsResult::Count(c) => Some(c),
            ChainsResult::Network(_) => None,
        }
    }
}
