//! Symbol interning and the per-symbol "hitch" binding list (spec §3.4, §4.1
//! "Symbol & binding table").
//!
//! Words are interned once per spelling into a canon table; every `Word`
//! cell thereafter carries only a small [`loom_core::cell::SymbolId`]. Module
//! binding does not go through a context's keylist at all — each symbol
//! instead owns a "hitch" chain of per-module patches, and lookup in a
//! module walks that chain looking for the right module's patch.

use loom_core::cell::SymbolId;
use std::collections::HashMap;

/// One interned spelling plus its module-binding hitch chain.
#[derive(Debug, Default)]
pub struct Canon {
    pub spelling: String,
    /// Per-module bindings, in the order they were added. A real
    /// `navicore-cem3`-style patch would be a pooled stub; since module
    /// binding sits outside the varlist/keylist pairing described in spec
    /// §3.4, this table keeps it as a plain side map keyed by module id,
    /// which is observably the same "walk the chain looking for the hit"
    /// behavior without inventing a second pooled-node flavor this crate
    /// doesn't otherwise need.
    pub hitches: Vec<ModulePatch>,
}

/// One entry in a symbol's hitch chain: this symbol's slot within a
/// particular module's variable store.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ModulePatch {
    pub module: loom_core::cell::NodeRef,
    pub slot: u32,
}

/// The interned-identifier table. One per [`crate::interpreter::Interpreter`]
/// (spec §9's "global mutable interpreter state... packaged inside an
/// Interpreter struct").
#[derive(Debug, Default)]
pub struct SymbolTable {
    canons: Vec<Canon>,
    by_spelling: HashMap<String, SymbolId>,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable::default()
    }

    /// Intern a spelling, returning its stable `SymbolId`. Interning the
    /// same spelling twice returns the same id.
    pub fn intern(&mut self, spelling: &str) -> SymbolId {
        if let Some(id) = self.by_spelling.get(spelling) {
            return *id;
        }
        let id = SymbolId(self.canons.len() as u32);
        self.canons.push(Canon { spelling: spelling.to_string(), hitches: Vec::new() });
        self.by_spelling.insert(spelling.to_string(), id);
        id
    }

    pub fn spelling(&self, id: SymbolId) -> &str {
        &self.canons[id.0 as usize].spelling
    }

    /// Add this symbol's slot in `module` to its hitch chain. A symbol may
    /// appear in more than one module's hitch chain simultaneously (one
    /// entry per module it is bound in).
    pub fn add_hitch(&mut self, id: SymbolId, module: loom_core::cell::NodeRef, slot: u32) {
        let canon = &mut self.canons[id.0 as usize];
        if let Some(existing) = canon.hitches.iter_mut().find(|p| p.module == module) {
            existing.slot = slot;
        } else {
            canon.hitches.push(ModulePatch { module, slot });
        }
    }

    /// Walk the hitch chain for `id` looking for `module`'s patch.
    pub fn lookup_hitch(
        &self,
        id: SymbolId,
        module: loom_core::cell::NodeRef,
    ) -> Option<ModulePatch> {
        self.canons[id.0 as usize]
            .hitches
            .iter()
            .find(|p| p.module == module)
            .copied()
    }
}
