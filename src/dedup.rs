// 🔍 Dedup Guard - one colony per (municipality, postal code, name) per run
//
// The catalog repeats settlements (same colony listed under several
// settlement types, or duplicated export lines). The guard remembers every
// composite key accepted in the current run and rejects repeats.
//
// Process-local and run-scoped: two concurrent runs against the same store
// do NOT see each other's keys.

use std::collections::HashSet;

use crate::normalizer::upper;

/// Composite key `municipalityId|postalCode|UPPER(colonyName)`
pub fn composite_key(municipality_id: i64, postal_code: &str, colony_name: &str) -> String {
    format!("{}|{}|{}", municipality_id, postal_code, upper(colony_name))
}

#[derive(Debug, Default)]
pub struct DedupGuard {
    seen: HashSet<String>,
}

impl DedupGuard {
    pub fn new() -> Self {
        DedupGuard::default()
    }

    /// True (and remembered) the first time a key is seen, false afterwards
    pub fn accept(&mut self, key: String) -> bool {
        self.seen.insert(key)
    }

    /// Build the composite key and accept it in one step
    pub fn accept_colony(
        &mut self,
        municipality_id: i64,
        postal_code: &str,
        colony_name: &str,
    ) -> bool {
        self.accept(composite_key(municipality_id, postal_code, colony_name))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.seen.contains(key)
    }

    /// Number of distinct keys accepted so far
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
