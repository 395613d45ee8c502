// 🤝 Counterparty Reference Table
//
// Counterparty names in the store sometimes contain line breaks that the source
// spreadsheet flattened to spaces (or the other way round). Lookups therefore try
// the exact name first and then the newline-normalized form of both sides.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Id used when a row has no (known) counterparty
pub const NO_COUNTERPARTY: i64 = 0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Counterparty {
    pub id: i64,
    pub name: String,
}

impl Counterparty {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Counterparty { id, name: name.into() }
    }
}

/// Line breaks become single spaces, surrounding whitespace is dropped
pub fn normalize_newlines(name: &str) -> String {
    name.replace("\r\n", " ").replace(['\n', '\r'], " ").trim().to_string()
}

// ============================================================================
// LOOKUP STRATEGIES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterpartyStrategy {
    Exact,
    NewlineNormalized,
}

pub const COUNTERPARTY_STRATEGIES: [CounterpartyStrategy; 2] =
    [CounterpartyStrategy::Exact, CounterpartyStrategy::NewlineNormalized];

impl CounterpartyStrategy {
    pub fn lookup(&self, registry: &CounterpartyRegistry, name: &str) -> Option<i64> {
        match self {
            CounterpartyStrategy::Exact => registry.exact.get(name).copied(),
            CounterpartyStrategy::NewlineNormalized => {
                registry.normalized.get(&normalize_newlines(name)).copied()
            }
        }
    }
}

// ============================================================================
// COUNTERPARTY REGISTRY
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct CounterpartyRegistry {
    exact: HashMap<String, i64>,
    /// First registration wins for a normalized name
    normalized: HashMap<String, i64>,
}

impl CounterpartyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, counterparty: Counterparty) {
        self.normalized
            .entry(normalize_newlines(&counterparty.name))
            .or_insert(counterparty.id);
        self.exact.insert(counterparty.name, counterparty.id);
    }

    /// Counterparty id, or NO_COUNTERPARTY when absent or unknown
    pub fn resolve(&self, name: Option<&str>) -> i64 {
        name.and_then(|name| {
            COUNTERPARTY_STRATEGIES
                .iter()
                .find_map(|strategy| strategy.lookup(self, name))
        })
        .unwrap_or(NO_COUNTERPARTY)
    }

    pub fn count(&self) -> usize {
        self.exact.len()
    }
}

impl FromIterator<Counterparty> for CounterpartyRegistry {
    fn from_iter<I: IntoIterator<Item = Counterparty>>(iter: I) -> Self {
        let mut registry = CounterpartyRegistry::new();
        for counterparty in iter {
            registry.register(counterparty);
        }
        registry
    }
}
