use crate::core::models::system::ConformationalSystem;
use std::collections::BTreeMap;

/// Term-keyed activation switches for the interaction-energy provider.
///
/// Terms that were never registered are treated as inactive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnergySet {
    terms: BTreeMap<String, bool>,
}

impl EnergySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers every term used by the system's interactions as active.
    pub fn from_system(system: &ConformationalSystem) -> Self {
        Self {
            terms: system
                .term_names()
                .into_iter()
                .map(|name| (name.to_string(), true))
                .collect(),
        }
    }

    pub fn set_term_active(&mut self, term: &str, active: bool) {
        self.terms.insert(term.to_string(), active);
    }

    pub fn is_term_active(&self, term: &str) -> bool {
        self.terms.get(term).copied().unwrap_or(false)
    }

    /// Names of the active terms, in sorted order.
    pub fn active_terms(&self) -> impl Iterator<Item = &str> {
        self.terms
            .iter()
            .filter(|(_, active)| **active)
            .map(|(name, _)| name.as_str())
    }
}
