//! Shared fixtures for transmission chain integration tests
//!
//! Dates are expressed as day offsets from a fixed epoch so that activity
//! flags are reproducible.

#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::{HashMap, HashSet};
use transmission_chains::{ChainNetwork, Person, PersonId, PersonRef, PersonType, Relationship};

pub fn day(n: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap() + Duration::days(n)
}

/// Edge with full payloads attached, as the feed supplies it in full mode.
pub fn edge(id: &str, a: &str, b: &str, contact_day: i64) -> Relationship {
    Relationship::new(
        id,
        PersonRef::new(a, PersonType::Case),
        PersonRef::new(b, PersonType::Contact),
        day(contact_day),
    )
    .with_people(
        Person::new(a).with_type(PersonType::Case),
        Person::new(b).with_type(PersonType::Contact),
    )
}

/// Random contact graph over `people` persons with `edges` relationships.
///
/// Roughly one in ten relationships is malformed (one participant missing).
pub fn random_edges(seed: u64, people: usize, edges: usize, max_day: i64) -> Vec<Relationship> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..edges)
        .map(|i| {
            let a = format!("p{}", rng.gen_range(0..people));
            let b = format!("p{}", rng.gen_range(0..people));
            let mut rel = edge(&format!("r{}", i), &a, &b, rng.gen_range(0..=max_day));
            if rng.gen_ratio(1, 10) {
                rel.persons.pop();
            }
            rel
        })
        .collect()
}

pub fn well_formed(edges: &[Relationship]) -> usize {
    edges.iter().filter(|e| e.participants().is_some()).count()
}

/// Connected components computed independently with a plain BFS,
/// as sets of person ids.
pub fn reference_components(edges: &[Relationship]) -> Vec<HashSet<PersonId>> {
    let mut adjacency: HashMap<PersonId, Vec<PersonId>> = HashMap::new();
    for e in edges {
        if let Some((a, b)) = e.participants() {
            adjacency.entry(a.clone()).or_default().push(b.clone());
            adjacency.entry(b.clone()).or_default().push(a.clone());
        }
    }

    let mut seen: HashSet<PersonId> = HashSet::new();
    let mut components = Vec::new();
    let mut starts: Vec<&PersonId> = adjacency.keys().collect();
    starts.sort();
    for start in starts {
        if seen.contains(start) {
            continue;
        }
        let mut component = HashSet::new();
        let mut queue = vec![start.clone()];
        while let Some(p) = queue.pop() {
            if !seen.insert(p.clone()) {
                continue;
            }
            for n in &adjacency[&p] {
                if !seen.contains(n) {
                    queue.push(n.clone());
                }
            }
            component.insert(p);
        }
        components.push(component);
    }
    components
}

/// Person ids appearing in each output chain.
pub fn chain_members(network: &ChainNetwork) -> Vec<HashSet<PersonId>> {
    network
        .transmission_chains
        .chains
        .iter()
        .map(|c| c.chain.iter().flat_map(|[a, b]| [a.clone(), b.clone()]).collect())
        .collect()
}
