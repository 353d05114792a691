//! The series node ("stub") — spec §3.2, §4.1.
//!
//! A [`Stub`] is the payload a pooled [`loom_core::pool::Pool`] slot holds.
//! Its content is either inlined (small arrays/strings, `dynamic` flag
//! clear) or lives in a separately-allocated `Vec`-backed block (`dynamic`
//! flag set); either way `used`/`rest`/`bias` describe the logical content
//! window, and `link`/`misc`/`bonus` are three slots whose meaning is
//! entirely up to the [`Flavor`].

use crate::array_content::Content;
use loom_core::cell::{Cell, NodeRef};
use loom_core::flags::SeriesFlags;
use loom_core::pool::PoolObject;

/// The concrete subclass tag of a series (spec §3.2). Flavor implies element
/// width and GC marking rules; this crate only needs to distinguish the
/// handful that actually appear in the core (array-of-cells vs. byte/char
/// buffers vs. symbol-pointer keylists), so the remainder of the spec's
/// flavor list is kept as variants even where this crate's `Content` never
/// produces them, to keep `Stub::flavor` a faithful, total mapping from the
/// spec's vocabulary.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Flavor {
    Array,
    Varlist,
    Details,
    Keylist,
    Patch,
    Let,
    Use,
    Hitch,
    Partials,
    Pairlist,
    Feed,
    Library,
    Handle,
    Api,
    Binary,
    String,
    Symbol,
    Hashlist,
    Bookmarklist,
    Pointer,
    Nodelist,
    Canontable,
    Moldstack,
    Datastack,
    Plug,
    InstructionSplice,
}

impl Flavor {
    /// Series flavors whose elements are cells needing a GC mark pass, as
    /// opposed to raw bytes/chars (spec §3.2: "Flavor implies element width
    /// and marking rules").
    pub fn elements_are_cells(self) -> bool {
        matches!(
            self,
            Flavor::Array
                | Flavor::Varlist
                | Flavor::Details
                | Flavor::Partials
                | Flavor::Pairlist
                | Flavor::Datastack
        )
    }
}

/// Three flavor-dependent interpretive slots (spec §3.2). Meaning is set by
/// `Flavor`: e.g. a varlist's `bonus` is its key-source, an array's `link`
/// is its source-file symbol, a string's `misc` is a cached codepoint count.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SideSlots {
    pub link: Option<NodeRef>,
    pub misc_node: Option<NodeRef>,
    /// Scalar form of `misc` (e.g. a string's cached codepoint length);
    /// mutually exclusive with `misc_node` in practice, kept alongside it
    /// rather than as a union since `Stub` is already heap-backed.
    pub misc_scalar: i64,
    pub bonus: Option<NodeRef>,
}

/// A pooled series node.
#[derive(Debug)]
pub struct Stub {
    pub flavor: Flavor,
    pub flags: SeriesFlags,
    pub side: SideSlots,
    pub content: Content,
}

impl Stub {
    pub fn new(flavor: Flavor, content: Content) -> Stub {
        Stub { flavor, flags: SeriesFlags::empty(), side: SideSlots::default(), content }
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.len() == 0
    }

    /// Spec invariant 3: `bias + used <= original_capacity` and
    /// `used <= rest`. Inlined (non-dynamic) content trivially satisfies
    /// this since it has no bias/rest distinction.
    pub fn check_dynamic_invariant(&self) -> bool {
        match &self.content {
            Content::Dynamic(d) => d.bias + d.used <= d.original_capacity && d.used <= d.rest,
            _ => true,
        }
    }
}

impl PoolObject for Stub {
    fn series_flags(&self) -> SeriesFlags {
        self.flags
    }

    fn series_flags_mut(&mut self) -> &mut SeriesFlags {
        &mut self.flags
    }

    fn release_payload(&mut self) {
        self.content = Content::Freed;
    }
}

/// A dynamic (over-allocated, head-biasable) cell array, the backing store
/// for [`crate::array_content::Content::Cells`] when it has grown beyond
/// its inline form.
#[derive(Debug, Default)]
pub struct DynamicCells {
    pub data: Vec<Cell>,
    /// Head-side offset: `data[bias..bias+used]` is the logical content.
    /// Lets `remove` at index 0 run in O(1) by bumping `bias` rather than
    /// shifting every remaining element (spec §3.2).
    pub bias: usize,
    pub used: usize,
    pub rest: usize,
    pub original_capacity: usize,
}

impl DynamicCells {
    pub fn from_cells(cells: Vec<Cell>) -> DynamicCells {
        let used = cells.len();
        let rest = cells.capacity();
        DynamicCells { data: cells, bias: 0, used, rest, original_capacity: rest }
    }

    pub fn as_slice(&self) -> &[Cell] {
        &self.data[self.bias..self.bias + self.used]
    }

    pub fn as_mut_slice(&mut self) -> &mut [Cell] {
        &mut self.data[self.bias..self.bias + self.used]
    }

    /// Remove the head element in O(1) by advancing `bias`.
    pub fn remove_head(&mut self) -> Option<Cell> {
        if self.used == 0 {
            return None;
        }
        let v = self.data[self.bias].clone();
        self.bias += 1;
        self.used -= 1;
        Some(v)
    }

    pub fn push(&mut self, cell: Cell) {
        if self.bias + self.used >= self.data.len() {
            self.data.push(cell);
        } else {
            self.data[self.bias + self.used] = cell;
        }
        self.used += 1;
        self.rest = self.rest.max(self.used);
        self.original_capacity = self.original_capacity.max(self.bias + self.used);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array_content::Content;

    #[test]
    fn inline_content_satisfies_dynamic_invariant_trivially() {
        let s = Stub::new(Flavor::Array, Content::Cells(vec![]));
        assert!(s.check_dynamic_invariant());
    }

    #[test]
    fn dynamic_invariant_holds_after_bias_shift() {
        let mut d = DynamicCells::from_cells(vec![
            Cell::fresh(),
            Cell::fresh(),
            Cell::fresh(),
        ]);
        d.remove_head();
        let s = Stub::new(Flavor::Array, Content::Dynamic(d));
        assert!(s.check_dynamic_invariant());
    }

    #[test]
    fn release_payload_frees_content() {
        let mut s = Stub::new(Flavor::Array, Content::Cells(vec![Cell::fresh()]));
        s.release_payload();
        assert_eq!(s.len(), 0);
        assert!(matches!(s.content, Content::Freed));
    }

    #[test]
    fn array_and_varlist_elements_are_cells_but_string_is_not() {
        assert!(Flavor::Array.elements_are_cells());
        assert!(Flavor::Varlist.elements_are_cells());
        assert!(!Flavor::String.elements_are_cells());
    }
}
