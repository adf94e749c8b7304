//! Chain builder: incremental, size-biased union of persons into chains
//!
//! Relationships are consumed strictly in input order. Each one either
//! extends an existing chain, joins two chains (the smaller is folded into
//! the larger, so total re-indexing stays near-linear), or opens a new
//! chain. Absorbed chains leave a tombstone behind; slot indices are never
//! reused, and the final compaction drops the tombstones in one pass.

use super::result::{ChainCount, ChainDetail, ChainNetwork, ChainSet, ChainSize, ChainsResult};
use super::window::ActivityWindow;
use crate::graph::{Person, PersonId, Relationship, RelationshipId};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, trace};

/// Which result shape a build produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuildMode {
    /// Nodes, edges and the person pairs of every chain
    #[default]
    Full,
    /// Only chain sizes and activity
    CountOnly,
}

/// A live chain: its person pairs in merge order
#[derive(Debug, Clone, Default)]
struct Chain {
    pairs: Vec<[PersonId; 2]>,
    active: bool,
}

impl Chain {
    fn len(&self) -> usize {
        self.pairs.len()
    }
}

#[derive(Debug)]
enum ChainSlot {
    Alive(Chain),
    Tombstoned,
}

/// Full-mode bookkeeping; absent entirely in count mode.
#[derive(Debug, Default)]
struct NetworkMaps {
    nodes: BTreeMap<PersonId, Person>,
    edges: BTreeMap<RelationshipId, Relationship>,
}

impl NetworkMaps {
    /// First occurrence wins for both nodes and edges.
    fn record(&mut self, relationship: Relationship) {
        let (edge, people) = relationship.into_parts();

        match people {
            Some(people) => {
                for person in people {
                    if !self.nodes.contains_key(&person.id) {
                        self.nodes.insert(person.id.clone(), person);
                    }
                }
            }
            // Feed sent no payloads: fall back to the lightweight identity
            None => {
                for r in &edge.persons {
                    if !self.nodes.contains_key(&r.id) {
                        self.nodes.insert(r.id.clone(), Person::from(r));
                    }
                }
            }
        }

        if !self.edges.contains_key(&edge.id) {
            self.edges.insert(edge.id.clone(), edge);
        }
    }
}

/// Counters kept for diagnostics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildStats {
    /// Relationships handed to `push`
    pub edges_seen: usize,
    /// Relationships dropped for not naming exactly two persons
    pub edges_skipped: usize,
    /// Chain-into-chain merges performed
    pub merges: usize,
}

/// Single-pass chain builder.
///
/// All state lives for one build only; `finish` consumes the builder.
#[derive(Debug)]
pub struct ChainBuilder {
    window: ActivityWindow,
    slots: Vec<ChainSlot>,
    person_chain: HashMap<PersonId, usize>,
    network: Option<NetworkMaps>,
    stats: BuildStats,
}

impl ChainBuilder {
    pub fn new(window: ActivityWindow, mode: BuildMode) -> Self {
        let network = match mode {
            BuildMode::Full => Some(NetworkMaps::default()),
            BuildMode::CountOnly => None,
        };
        Self {
            window,
            slots: Vec::new(),
            person_chain: HashMap::new(),
            network,
            stats: BuildStats::default(),
        }
    }

    pub fn mode(&self) -> BuildMode {
        if self.network.is_some() {
            BuildMode::Full
        } else {
            BuildMode::CountOnly
        }
    }

    pub fn stats(&self) -> BuildStats {
        self.stats
    }

    /// Index of the chain currently holding `person`, if seen.
    pub fn chain_index_of(&self, person: &PersonId) -> Option<usize> {
        self.person_chain.get(person).copied()
    }

    /// Number of live (non-tombstoned) chains so far.
    pub fn live_chains(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| matches!(s, ChainSlot::Alive(_)))
            .count()
    }

    /// Consume one relationship.
    pub fn push(&mut self, relationship: Relationship) {
        self.stats.edges_seen += 1;

        let (first, second) = match relationship.participants() {
            Some((a, b)) => (a.clone(), b.clone()),
            None => {
                self.stats.edges_skipped += 1;
                trace!(relationship = %relationship.id, "skipping relationship without two participants");
                return;
            }
        };

        let relation_active = self.window.is_active(relationship.contact_date);

        if let Some(network) = self.network.as_mut() {
            network.record(relationship);
        }

        let idx1 = self.chain_index_of(&first);
        let idx2 = self.chain_index_of(&second);

        match (idx1, idx2) {
            (Some(i1), Some(i2)) if i1 == i2 => {
                let chain = self.chain_mut(i1);
                chain.pairs.push([first, second]);
                chain.active |= relation_active;
            }
            (Some(i1), Some(i2)) => {
                // Ties go to the second participant's chain
                let (target, source) = if self.chain(i1).len() > self.chain(i2).len() {
                    (i1, i2)
                } else {
                    (i2, i1)
                };
                let chain = self.chain_mut(target);
                chain.pairs.push([first.clone(), second.clone()]);
                chain.active |= relation_active;
                self.person_chain.insert(first, target);
                self.person_chain.insert(second, target);
                self.merge_chains(target, source);
            }
            (Some(i1), None) => {
                let chain = self.chain_mut(i1);
                chain.pairs.push([first, second.clone()]);
                chain.active |= relation_active;
                self.person_chain.insert(second, i1);
            }
            (None, Some(i2)) => {
                let chain = self.chain_mut(i2);
                chain.pairs.push([first.clone(), second]);
                chain.active |= relation_active;
                self.person_chain.insert(first, i2);
            }
            (None, None) => {
                let idx = self.slots.len();
                self.slots.push(ChainSlot::Alive(Chain {
                    pairs: vec![[first.clone(), second.clone()]],
                    active: relation_active,
                }));
                self.person_chain.insert(first, idx);
                self.person_chain.insert(second, idx);
            }
        }
    }

    /// Fold `source` into `target` and tombstone `source`.
    fn merge_chains(&mut self, target: usize, source: usize) {
        let absorbed = match std::mem::replace(&mut self.slots[source], ChainSlot::Tombstoned) {
            ChainSlot::Alive(chain) => chain,
            ChainSlot::Tombstoned => unreachable!("chain {} merged twice", source),
        };

        for [a, b] in &absorbed.pairs {
            self.person_chain.insert(a.clone(), target);
            self.person_chain.insert(b.clone(), target);
        }

        let chain = self.chain_mut(target);
        chain.active |= absorbed.active;
        chain.pairs.extend(absorbed.pairs);
        self.stats.merges += 1;
    }

    fn chain(&self, idx: usize) -> &Chain {
        match &self.slots[idx] {
            ChainSlot::Alive(chain) => chain,
            ChainSlot::Tombstoned => unreachable!("person index points at tombstoned chain {}", idx),
        }
    }

    fn chain_mut(&mut self, idx: usize) -> &mut Chain {
        match &mut self.slots[idx] {
            ChainSlot::Alive(chain) => chain,
            ChainSlot::Tombstoned => unreachable!("person index points at tombstoned chain {}", idx),
        }
    }

    /// Compact the live chains and assemble the result for the build mode.
    pub fn finish(self) -> ChainsResult {
        let stats = self.stats;
        let live: Vec<Chain> = self
            .slots
            .into_iter()
            .filter_map(|slot| match slot {
                ChainSlot::Alive(chain) => Some(chain),
                ChainSlot::Tombstoned => None,
            })
            .collect();

        debug!(
            edges = stats.edges_seen,
            skipped = stats.edges_skipped,
            merges = stats.merges,
            chains = live.len(),
            "transmission chains built"
        );

        match self.network {
            None => {
                let chains: Vec<ChainSize> = live
                    .iter()
                    .map(|c| ChainSize {
                        length: c.len(),
                        active: c.active,
                    })
                    .collect();
                let active_chains = chains.iter().filter(|c| c.active).count();
                ChainsResult::Count(ChainCount {
                    length: chains.len(),
                    active_chains,
                    chains,
                })
            }
            Some(NetworkMaps { nodes, edges }) => {
                let chains: Vec<ChainDetail> = live
                    .into_iter()
                    .map(|c| ChainDetail {
                        chain: c.pairs,
                        active: c.active,
                    })
                    .collect();
                ChainsResult::Network(ChainNetwork {
                    nodes,
                    edges,
                    transmission_chains: ChainSet {
                        length: chains.len(),
                        chains,
                    },
                })
            }
        }
    }
}

/// Run a whole build over `relationships` in order.
pub fn process<I>(relationships: I, window: ActivityWindow, mode: BuildMode) -> ChainsResult
where
    I: IntoIterator<Item = Relationship>,
{
    let mut builder = ChainBuilder::new(window, mode);
    for relationship in relationships {
        builder.push(relationship);
    }
    builder.finish()
}

/// Full network build, activity measured against the current time.
pub fn build<I>(relationships: I, follow_up_period: u32) -> ChainNetwork
where
    I: IntoIterator<Item = Relationship>,
{
    build_at(relationships, follow_up_period, Utc::now())
}

/// Count-only build, activity measured against the current time.
pub fn count<I>(relationships: I, follow_up_period: u32) -> ChainCount
where
    I: IntoIterator<Item = Relationship>,
{
    count_at(relationships, follow_up_period, Utc::now())
}

/// Full network build with a pinned `now`.
pub fn build_at<I>(relationships: I, follow_up_period: u32, now: DateTime<Utc>) -> ChainNetwork
where
    I: IntoIterator<Item = Relationship>,
{
    let window = ActivityWindow::new(follow_up_period, now);
    match process(relationships, window, BuildMode::Full) {
        ChainsResult::Network(network) => network,
        ChainsResult::Count(_) => unreachable!("full build produced a count"),
    }
}

/// Count-only build with a pinned `now`.
pub fn count_at<I>(relationships: I, follow_up_period: u32, now: DateTime<Utc>) -> ChainCount
where
    I: IntoIterator<Item = Relationship>,
{
    let window = ActivityWindow::new(follow_up_period, now);
    match process(relationships, window, BuildMode::CountOnly) {
        ChainsResult::Count(count) => count,
        ChainsResult::Network(_) => unreachable!("count build produced a network"),
    }
}
