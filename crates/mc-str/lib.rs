//! Interning for Micro-C identifiers.
//!
//! Variables, record fields, and function names are all interned here so
//! that downstream code (the AST, the program graph, every analysis
//! assignment map) can hold a cheap `Copy` id instead of a `String`, and
//! compare/hash identifiers by that id rather than by text.

use std::hash::BuildHasherDefault;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Copy, Eq, PartialEq, Hash, PartialOrd, Ord, Debug)]
pub struct StrId(pub u32);

impl StrId {
    /// Reserved ids for the two built-in record field names, interned
    /// first so every `Interner` assigns them the same id.
    pub const FST: StrId = StrId(0);
    pub const SND: StrId = StrId(1);
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Interner {
    map: IndexSet<String, BuildHasherDefault<rustc_hash::FxHasher>>,
}

impl Interner {
    pub fn new() -> Self {
        let mut interner = Self {
            map: IndexSet::default(),
        };
        interner.intern("fst".to_string());
        interner.intern("snd".to_string());
        interner
    }

    /// Get the id corresponding to `name`, if it has been interned.
    pub fn get(&self, name: &str) -> Option<StrId> {
        self.map.get_index_of(name).map(|i| StrId(i as u32))
    }

    /// Insert `name`, returning its existing id or a freshly allocated one.
    pub fn intern(&mut self, name: String) -> StrId {
        let (id, _added) = self.map.insert_full(name);
        assert!(id < u32::MAX as usize);
        StrId(id as u32)
    }

    /// Look up the text behind `id`.
    ///
    /// # Panics
    /// Panics if `id` was never produced by this interner.
    pub fn lookup(&self, id: StrId) -> &str {
        self.map
            .get_index(id.0 as usize)
            .unwrap_or_else(|| panic!("unknown StrId {}", id.0))
    }
}
