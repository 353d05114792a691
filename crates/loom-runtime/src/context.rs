//! Context: paired varlist + keylist (or module patch chain), archetype cell
//! (spec §3.3).
//!
//! A context is a varlist (an array whose element 0 is the archetype) plus
//! either a keylist (object/frame/port/error) or, for a module, nothing —
//! modules resolve variables through [`crate::symbol::SymbolTable`]'s hitch
//! chain instead.

use crate::array::{append, as_slice, check_mutable, make_array};
use crate::array_content::Content;
use crate::series::{Flavor, Stub};
use loom_core::cell::{Cell, NodeRef, Payload, SymbolId};
use loom_core::heart::Heart;
use loom_core::{Error, ErrorId, Raised};

/// The context kind an archetype/varlist names (spec §3.3: "a self-
/// describing context value cell whose heart names the context kind").
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ContextKind {
    Object,
    Frame,
    Module,
    Port,
    Error,
}

impl ContextKind {
    pub fn heart(self) -> Heart {
        match self {
            ContextKind::Object => Heart::Object,
            ContextKind::Frame => Heart::Frame,
            ContextKind::Module => Heart::Module,
            ContextKind::Port => Heart::Port,
            ContextKind::Error => Heart::Error,
        }
    }
}

/// Build a fresh varlist: element 0 is the archetype cell, the rest are the
/// member slots (initially `Blank`, matching the spec's "fresh" convention
/// until each is assigned).
pub fn make_varlist(kind: ContextKind, keylist: NodeRef, len: usize) -> Stub {
    let archetype = Cell::new(kind.heart(), Payload::Context(keylist));
    let mut cells = vec![archetype];
    cells.extend(std::iter::repeat_n(Cell::new(Heart::Blank, Payload::Blank), len));
    let mut stub = make_array(cells, false);
    stub.flavor = Flavor::Varlist;
    stub.side.bonus = Some(keylist);
    stub
}

/// Build a keylist: an array of interned symbol pointers, one per member
/// (parallel to a varlist's slots 1..len, since slot 0 is the archetype and
/// has no key).
pub fn make_keylist(keys: Vec<SymbolId>) -> Stub {
    let mut stub = Stub::new(Flavor::Keylist, Content::Symbols(keys));
    stub.flags.insert(loom_core::flags::SeriesFlags::SHARED);
    stub
}

/// Look up a member's slot index (0-based among the *member* slots, i.e.
/// varlist index `slot + 1`) by symbol.
pub fn key_index(keylist: &Stub, symbol: SymbolId) -> Option<usize> {
    match &keylist.content {
        Content::Symbols(keys) => keys.iter().position(|k| *k == symbol),
        _ => None,
    }
}

/// Read a member's value out of the varlist by symbol, given its keylist.
pub fn get(varlist: &Stub, keylist: &Stub, symbol: SymbolId) -> Result<Option<Cell>, Raised> {
    let Some(idx) = key_index(keylist, symbol) else { return Ok(None) };
    let slice = as_slice(varlist)?;
    Ok(slice.get(idx + 1).cloned())
}

/// Write a member's value by symbol. Raises `not-in-context` if the symbol
/// has no slot (spec §7 Access errors), and respects the varlist's own
/// mutation flags (spec §5).
pub fn set(varlist: &mut Stub, keylist: &Stub, symbol: SymbolId, value: Cell) -> Result<(), Raised> {
    check_mutable(varlist)?;
    let Some(idx) = key_index(keylist, symbol) else {
        return Err(Raised(Error::new(
            ErrorId::NotInContext,
            "word is not a member of this context",
        )));
    };
    match &mut varlist.content {
        Content::Cells(v) => {
            if let Some(slot) = v.get_mut(idx + 1) {
                *slot = value;
            }
        }
        Content::Dynamic(d) => {
            if let Some(slot) = d.as_mut_slice().get_mut(idx + 1) {
                *slot = value;
            }
        }
        _ => {}
    }
    Ok(())
}

/// Append a new member to an object-like context, extending both varlist
/// and keylist in lockstep. Copy-on-write unshares the keylist first (spec
/// §5: "a write that would mutate a shared keylist first unshares").
pub fn extend(varlist: &mut Stub, keylist: &mut Stub, symbol: SymbolId, value: Cell) -> Result<(), Raised> {
    crate::array::unshare_if_needed(keylist);
    if let Content::Symbols(keys) = &mut keylist.content {
        keys.push(symbol);
    }
    append(varlist, value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use loom_core::pool::StubIndex;

    fn sym(n: u32) -> SymbolId {
        SymbolId(n)
    }

    #[test]
    fn archetype_cell_names_context_kind() {
        let keylist = NodeRef(StubIndex(0));
        let varlist = make_varlist(ContextKind::Object, keylist, 2);
        let slice = as_slice(&varlist).unwrap();
        assert_eq!(slice[0].heart, Heart::Object);
        assert_eq!(slice[0].payload, Payload::Context(keylist));
    }

    #[test]
    fn get_and_set_round_trip_by_symbol() {
        let keylist = make_keylist(vec![sym(1), sym(2)]);
        let mut varlist = make_varlist(ContextKind::Object, NodeRef(StubIndex(0)), 2);
        set(&mut varlist, &keylist, sym(2), Cell::new(Heart::Integer, Payload::Integer(42))).unwrap();
        let got = get(&varlist, &keylist, sym(2)).unwrap().unwrap();
        assert_eq!(got.payload, Payload::Integer(42));
    }

    #[test]
    fn set_unknown_symbol_raises_not_in_context() {
        let keylist = make_keylist(vec![sym(1)]);
        let mut varlist = make_varlist(ContextKind::Object, NodeRef(StubIndex(0)), 1);
        let err = set(&mut varlist, &keylist, sym(99), Cell::fresh()).unwrap_err();
        assert_eq!(err.0.id, ErrorId::NotInContext);
    }

    #[test]
    fn extend_unshares_a_shared_keylist() {
        let mut keylist = make_keylist(vec![sym(1)]);
        assert!(keylist.flags.contains(loom_core::flags::SeriesFlags::SHARED));
        let mut varlist = make_varlist(ContextKind::Object, NodeRef(StubIndex(0)), 1);
        extend(&mut varlist, &mut keylist, sym(2), Cell::new(Heart::Integer, Payload::Integer(7))).unwrap();
        assert!(!keylist.flags.contains(loom_core::flags::SeriesFlags::SHARED));
        assert_eq!(key_index(&keylist, sym(2)), Some(1));
    }
}
