// 🔎 Reference Index / Resolver - (state, free-text name) → municipality id
//
// Tiered lookup, cheapest and most confident first:
//
//   1. Exact       "09|CUAUHTÉMOC"   (trim + upper-case)
//   2. Normalized  "09|CUAUHTEMOC"   (normalizer::normalize)
//   3. Fuzzy       first municipality of the state, in ascending id order,
//                  whose normalized name contains the query or is contained
//                  by it
//
// The index is built once from the municipality snapshot and never mutated
// afterwards; every lookup is a pure read.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::entities::{pad_state_code, Municipality};
use crate::normalizer::{normalize, upper};

// ============================================================================
// MATCH TIER
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchTier {
    Exact,
    Normalized,
    Fuzzy,
}

impl MatchTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchTier::Exact => "exact",
            MatchTier::Normalized => "normalized",
            MatchTier::Fuzzy => "fuzzy",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub municipality_id: i64,
    pub tier: MatchTier,
}

// ============================================================================
// REFERENCE INDEX
// ============================================================================

/// Cached per-state entry for the fuzzy scan
#[derive(Debug, Clone)]
struct ScanEntry {
    municipality_id: i64,
    normalized_name: String,
}

pub struct ReferenceIndex {
    /// "state|UPPER(name)" → municipality id
    exact: HashMap<String, i64>,

    /// "state|normalize(name)" → municipality id
    normalized: HashMap<String, i64>,

    /// state → entries ordered by ascending municipality id
    by_state: HashMap<String, Vec<ScanEntry>>,

    municipality_count: usize,
}

impl ReferenceIndex {
    /// Build the index from a municipality snapshot
    ///
    /// Snapshot order does not matter: municipalities are registered in
    /// ascending id order, and on key collisions the lowest id wins.
    pub fn build(municipalities: &[Municipality]) -> Self {
        let mut ordered: Vec<&Municipality> = municipalities.iter().collect();
        ordered.sort_by_key(|m| m.id);

        let mut exact = HashMap::with_capacity(ordered.len());
        let mut normalized = HashMap::with_capacity(ordered.len());
        let mut by_state: HashMap<String, Vec<ScanEntry>> = HashMap::new();

        for municipality in ordered {
            let state = pad_state_code(&municipality.state_code);
            let normalized_name = normalize(&municipality.name);

            exact
                .entry(index_key(&state, &upper(&municipality.name)))
                .or_insert(municipality.id);
            normalized
                .entry(index_key(&state, &normalized_name))
                .or_insert(municipality.id);

            by_state.entry(state).or_default().push(ScanEntry {
                municipality_id: municipality.id,
                normalized_name,
            });
        }

        ReferenceIndex {
            exact,
            normalized,
            by_state,
            municipality_count: municipalities.len(),
        }
    }

    /// Resolve a free-text municipality name within a state
    ///
    /// `None` means unresolved - an expected outcome for dirty catalog data.
    pub fn resolve(&self, state_code: &str, raw_name: &str) -> Option<Resolution> {
        let state = pad_state_code(state_code);

        if let Some(&id) = self.exact.get(&index_key(&state, &upper(raw_name))) {
            return Some(Resolution {
                municipality_id: id,
                tier: MatchTier::Exact,
            });
        }

        let query = normalize(raw_name);
        if let Some(&id) = self.normalized.get(&index_key(&state, &query)) {
            return Some(Resolution {
                municipality_id: id,
                tier: MatchTier::Normalized,
            });
        }

        self.fuzzy_scan(&state, &query).map(|id| Resolution {
            municipality_id: id,
            tier: MatchTier::Fuzzy,
        })
    }

    /// Convenience: municipality id only
    pub fn resolve_id(&self, state_code: &str, raw_name: &str) -> Option<i64> {
        self.resolve(state_code, raw_name).map(|r| r.municipality_id)
    }

    /// O(municipalities in state) containment scan
    fn fuzzy_scan(&self, state: &str, normalized: &str) -> Option<i64> {
        // Every string contains "", so an empty query would match anything
        if normalized.is_empty() {
            return None;
        }

        self.by_state.get(state)?.iter().find_map(|entry| {
            let candidate = entry.normalized_name.as_str();
            if candidate.is_empty() {
                return None;
            }
            if candidate.contains(normalized) || normalized.contains(candidate) {
                Some(entry.municipality_id)
            } else {
                None
            }
        })
    }

    /// Number of municipalities in the snapshot
    pub fn len(&self) -> usize {
        self.municipality_count
    }

    pub fn is_empty(&self) -> bool {
        self.municipality_count == 0
    }

    /// Number of distinct lookup keys registered (exact + normalized)
    pub fn key_count(&self) -> usize {
        self.exact.len() + self.normalized.len()
    }

    /// Number of states with at least one municipality
    pub fn state_count(&self) -> usize {
        self.by_state.len()
    }
}

fn index_key(state: &str, name: &str) -> String {
    format!("{}|{}", state, name)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> Vec<Municipality> {
        vec![
            Municipality::new(15, "09", "CUAUHTÉMOC"),
            Municipality::new(16, "09", "MIGUEL HIDALGO"),
            Municipality::new(10, "09", "ÁLVARO OBREGÓN"),
            Municipality::new(50, "31", "MÉRIDA"),
            Municipality::new(60, "08", "CUAUHTÉMOC"),
        ]
    }

    #[test]
    fn test_build_registers_two_keys_per_municipality() {
        let index = ReferenceIndex::build(&snapshot());

        assert_eq!(index.len(), 5);
        assert_eq!(index.state_count(), 3);
        assert_eq!(index.key_count(), 10);
    }

    #[test]
    fn test_exact_tier() {
        let index = ReferenceIndex::build(&snapshot());

        let resolution = index.resolve("09", "Cuauhtémoc").unwrap();
        assert_eq!(resolution.municipality_id, 15);
        assert_eq!(resolution.tier, MatchTier::Exact);
    }

    #[test]
    fn test_normalized_tier() {
        let index = ReferenceIndex::build(&snapshot());

        let resolution = index.resolve("09", "CUAUHTEMOC").unwrap();
        assert_eq!(resolution.municipality_id, 15);
        assert_eq!(resolution.tier, MatchTier::Normalized);
    }

    #[test]
    fn test_state_scopes_lookup() {
        let index = ReferenceIndex::build(&snapshot());

        assert_eq!(index.resolve_id("08", "Cuauhtémoc"), Some(60));
        assert_eq!(index.resolve_id("8", "Cuauhtémoc"), Some(60));
        assert_eq!(index.resolve_id("31", "Cuauhtémoc"), None);
    }

    #[test]
    fn test_fuzzy_tier_containment_both_directions() {
        let index = ReferenceIndex::build(&snapshot());

        // query contained in candidate
        let resolution = index.resolve("09", "OBREGON").unwrap();
        assert_eq!(resolution.municipality_id, 10);
        assert_eq!(resolution.tier, MatchTier::Fuzzy);

        // candidate contained in query
        let resolution = index.resolve("31", "MÉRIDA CENTRO").unwrap();
        assert_eq!(resolution.municipality_id, 50);
        assert_eq!(resolution.tier, MatchTier::Fuzzy);
    }

    #[test]
    fn test_fuzzy_first_match_is_lowest_id() {
        let municipalities = vec![
            Municipality::new(30, "14", "SAN PEDRO TLAQUEPAQUE"),
            Municipality::new(20, "14", "SAN PEDRO"),
        ];
        let index = ReferenceIndex::build(&municipalities);

        // both contain "PEDRO"; ascending id order makes 20 win
        assert_eq!(index.resolve_id("14", "PEDRO"), Some(20));
    }

    #[test]
    fn test_exact_tier_takes_precedence() {
        // "LA PAZ" exact-keys to 2; normalized "PAZ" would hit 1
        let municipalities = vec![
            Municipality::new(1, "03", "PAZ"),
            Municipality::new(2, "03", "LA PAZ"),
        ];
        let index = ReferenceIndex::build(&municipalities);

        let resolution = index.resolve("03", "la paz").unwrap();
        assert_eq!(resolution.municipality_id, 2);
        assert_eq!(resolution.tier, MatchTier::Exact);

        // "DE LA PAZ" has no exact key; its normalized form "PAZ" belongs to 1
        let resolution = index.resolve("03", "DE LA PAZ").unwrap();
        assert_eq!(resolution.municipality_id, 1);
        assert_eq!(resolution.tier, MatchTier::Normalized);
    }

    #[test]
    fn test_normalized_key_collision_lowest_id_wins() {
        let municipalities = vec![
            Municipality::new(9, "03", "LA PAZ"),
            Municipality::new(4, "03", "PAZ"),
        ];
        let index = ReferenceIndex::build(&municipalities);

        // both normalize to "PAZ"; 4 registers first and keeps that key
        assert_eq!(index.resolve_id("03", "paz"), Some(4));
        assert_eq!(index.resolve_id("03", "LA PAZ"), Some(9));
    }

    #[test]
    fn test_unresolved() {
        let index = ReferenceIndex::build(&snapshot());

        assert_eq!(index.resolve("09", "TLALPAN"), None);
        assert_eq!(index.resolve("99", "CUAUHTÉMOC"), None);
    }

    #[test]
    fn test_empty_index() {
        let index = ReferenceIndex::build(&[]);

        assert!(index.is_empty());
        assert_eq!(index.resolve("09", "CUAUHTÉMOC"), None);
    }
}
