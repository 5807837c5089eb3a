//! Host type name to class resolution

use acorn_suite::{KlassRef, SuiteRef};
use rustc_hash::FxHashMap;

use crate::error::{RomizeError, RomizeResult};

/// Name-keyed view over every class in the input suites.
///
/// Suites are scanned in input order; the first class registered under a
/// name wins, so suite 0's bootstrap classes shadow any re-declarations.
#[derive(Debug)]
pub struct ClassRegistry {
    by_name: FxHashMap<String, KlassRef>,
}

impl ClassRegistry {
    /// Build the registry from the input suites.
    pub fn from_suites(suites: &[SuiteRef]) -> Self {
        let mut by_name = FxHashMap::default();
        for suite in suites {
            for klass in suite.classes().iter().flatten() {
                by_name
                    .entry(klass.name().to_string())
                    .or_insert_with(|| klass.clone());
            }
        }
        Self { by_name }
    }

    /// Resolve a host type name (including bracket-prefixed array names).
    pub fn lookup(&self, name: &str) -> RomizeResult<KlassRef> {
        self.by_name
            .get(name)
            .cloned()
            .ok_or_else(|| RomizeError::UnknownClass {
                name: name.to_string(),
            })
    }

    /// Resolve a name without failing.
    pub fn find(&self, name: &str) -> Option<&KlassRef> {
        self.by_name.get(name)
    }
}
