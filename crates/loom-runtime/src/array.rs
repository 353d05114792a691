//! Array-flavored series operations (spec §3.3, §4.5).
//!
//! An array is a [`crate::series::Stub`] of flavor [`crate::series::Flavor::Array`]
//! (or `Varlist`/`Details`/`Partials`) whose content is cells. This module
//! carries the newline-hint bookkeeping the scanner and `mold`/`compose` both
//! depend on, plus the handful of series-generic operations spec §4.5 asks
//! for as "one helper keyed only by series-ness": `append`, `pick`,
//! `length?`, `copy`, `find`, `remove`, head/tail/skip/at/index.

use crate::array_content::Content;
use crate::series::{DynamicCells, Flavor, Stub};
use loom_core::cell::{Cell, NodeRef};
use loom_core::flags::{CellFlags, SeriesFlags};
use loom_core::{Error, ErrorId, Raised};

/// Build a fresh array stub from a vector of cells. `newline_at_tail`
/// mirrors whatever the caller determined at the source/composition level
/// (spec SPEC_FULL §3: "arrays built purely in memory ... default both to
/// unset").
pub fn make_array(cells: Vec<Cell>, newline_at_tail: bool) -> Stub {
    let mut s = Stub::new(Flavor::Array, Content::Cells(cells));
    s.flags.set(SeriesFlags::NEWLINE_AT_TAIL, newline_at_tail);
    s
}

/// Reject a mutation if the stub's flags say it should be (spec §5 "Shared
/// resource policy"). Returns the most specific applicable error.
pub fn check_mutable(stub: &Stub) -> Result<(), Raised> {
    if let Some(reason) = stub.flags.mutation_error() {
        let id = match reason {
            "series-held" => ErrorId::SeriesHeld,
            "series-frozen" => ErrorId::SeriesFrozen,
            "series-auto-locked" => ErrorId::SeriesAutoLocked,
            "series-protected" => ErrorId::SeriesProtected,
            _ => ErrorId::SeriesProtected,
        };
        return Err(Raised(Error::new(id, format!("series is {reason}"))));
    }
    if stub.flags.contains(SeriesFlags::INACCESSIBLE) {
        return Err(Raised(Error::new(ErrorId::SeriesDataFreed, "series data has been freed")));
    }
    Ok(())
}

/// `length?`: number of elements.
pub fn length(stub: &Stub) -> usize {
    stub.len()
}

/// `head`/`tail`/`at`/`skip`/`index?` all reduce to "the cell slice plus a
/// cursor"; the evaluator's feed owns the cursor itself (see
/// `loom-eval::feed`), so this module only exposes the slice view.
pub fn as_slice(stub: &Stub) -> Result<&[Cell], Raised> {
    if stub.flags.contains(SeriesFlags::INACCESSIBLE) {
        return Err(Raised(Error::new(ErrorId::SeriesDataFreed, "series data has been freed")));
    }
    Ok(stub.content.cells().unwrap_or(&[]))
}

/// `pick`: 1-based index, Rebol-style (`pick block 1` is the first
/// element). Out-of-range returns `None` (the language-level `null`, not an
/// error) rather than raising, matching ordinary series PICK semantics.
pub fn pick(stub: &Stub, index_one_based: i64) -> Result<Option<Cell>, Raised> {
    let slice = as_slice(stub)?;
    if index_one_based < 1 {
        return Ok(None);
    }
    Ok(slice.get((index_one_based - 1) as usize).cloned())
}

/// `append`: push a cell onto the tail, converting the array to dynamic
/// content on first growth past its inline capacity. Newline hints are not
/// touched here — spec SPEC_FULL §3 says in-memory-built arrays default to
/// unset and callers that want a hint set it on the new cell explicitly.
pub fn append(stub: &mut Stub, value: Cell) -> Result<(), Raised> {
    check_mutable(stub)?;
    match &mut stub.content {
        Content::Cells(v) => {
            v.push(value);
        }
        Content::Dynamic(d) => d.push(value),
        other => {
            return Err(Raised(Error::new(
                ErrorId::NotRelated,
                "append requires a cell-bearing series",
            )
            .with_arg1(format!("{other:?}"))));
        }
    }
    Ok(())
}

/// `remove` at a 0-based index. Removing index 0 is O(1) once the content
/// has been promoted to [`Content::Dynamic`] (spec §3.2 "bias"); removing
/// from an inline [`Content::Cells`] vector is a plain `Vec::remove` shift,
/// matching the spec's description that bias is specifically an
/// optimization for head-side removal on the dynamic form.
pub fn remove(stub: &mut Stub, index: usize) -> Result<Option<Cell>, Raised> {
    check_mutable(stub)?;
    match &mut stub.content {
        Content::Cells(v) => {
            if index >= v.len() {
                Ok(None)
            } else {
                Ok(Some(v.remove(index)))
            }
        }
        Content::Dynamic(d) => {
            if index == 0 {
                Ok(d.remove_head())
            } else if index < d.used {
                let abs = d.bias + index;
                let v = d.data[abs].clone();
                d.data.remove(abs);
                d.used -= 1;
                Ok(Some(v))
            } else {
                Ok(None)
            }
        }
        _ => Ok(None),
    }
}

/// `find`: first index (0-based) whose cell compares equal under strict
/// compare (spec §4.3). Returns `None` if not found.
pub fn find(stub: &Stub, needle: &Cell, compare: impl Fn(&Cell, &Cell) -> bool) -> Result<Option<usize>, Raised> {
    let slice = as_slice(stub)?;
    Ok(slice.iter().position(|c| compare(c, needle)))
}

/// `copy`: a shallow clone of the content into a fresh, unshared array.
/// Deep-frozen sources propagate `const` onto every copied reference (spec
/// §3.2 "newly-copied references inherit `const`").
pub fn copy_shallow(stub: &Stub) -> Result<Stub, Raised> {
    let slice = as_slice(stub)?;
    let inherit_const = stub.flags.contains(SeriesFlags::FROZEN_DEEP);
    let cells: Vec<Cell> = slice
        .iter()
        .cloned()
        .map(|mut c| {
            if inherit_const {
                c.flags.insert(CellFlags::CONST);
            }
            c
        })
        .collect();
    let mut out = make_array(cells, stub.flags.contains(SeriesFlags::NEWLINE_AT_TAIL));
    out.side.link = stub.side.link;
    Ok(out)
}

/// Promote `stub`'s keylist-style symbol-pointer content if it is currently
/// marked `SHARED`: copy-on-write before the caller mutates it (spec §5,
/// "a write that would mutate a shared keylist first unshares (copies)
/// it").
pub fn unshare_if_needed(stub: &mut Stub) {
    if stub.flags.contains(SeriesFlags::SHARED) {
        if let Content::Symbols(syms) = &stub.content {
            let copied = syms.clone();
            stub.content = Content::Symbols(copied);
        }
        stub.flags.remove(SeriesFlags::SHARED);
    }
}

/// Freeze this array shallowly: mark it so its own length/identity cannot
/// change, without touching reachable sub-series.
pub fn freeze_shallow(stub: &mut Stub) {
    stub.flags.insert(SeriesFlags::FROZEN_SHALLOW);
}

/// Deep-freeze: also mark every reachable sub-array shallow-frozen and every
/// reachable sub-context deep-frozen (spec invariant 4). The walk itself
/// needs graph traversal with cycle-breaking; see `crate::gc::freeze_deep`,
/// which reuses the GC's `black` coloring (spec §9 design note) for that.
pub fn mark_deep_frozen(stub: &mut Stub) {
    stub.flags.insert(SeriesFlags::FROZEN_DEEP);
    stub.flags.insert(SeriesFlags::FROZEN_SHALLOW);
}
