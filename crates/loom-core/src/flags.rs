//! Per-cell and per-series bit flags.
//!
//! These are kept as two distinct flag sets because they live on two distinct
//! kinds of record (`Cell` vs. `Stub`) with different lifetimes: a cell's
//! flags describe how *this particular reference* may be used, while a
//! series' flags describe the lifecycle of the *pooled node* it refers to.

use bitflags::bitflags;

bitflags! {
    /// Per-cell boolean flags (spec §3.1).
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
    pub struct CellFlags: u16 {
        /// May not be overwritten (user-visible `protect`).
        const PROTECTED         = 1 << 0;
        /// Origin was a literal in source, not a computed result.
        const UNEVALUATED       = 1 << 1;
        /// Access-granting: treat the referenced series as const even if
        /// the series itself is mutable.
        const CONST             = 1 << 2;
        /// Access-granting: explicitly opt back into mutability under `const`.
        const EXPLICITLY_MUTABLE = 1 << 3;
        /// Display hint: a newline preceded this cell in its source array.
        const NEWLINE_BEFORE     = 1 << 4;
        /// GC hint: payload.node1 holds a live node pointer that must be marked.
        const NODE1_NEEDS_MARK   = 1 << 5;
        /// GC hint: payload.node2 holds a live node pointer that must be marked.
        const NODE2_NEEDS_MARK   = 1 << 6;
        /// This variable slot is hidden from ordinary lookup in its frame.
        const MARKED_HIDDEN      = 1 << 7;
    }
}

bitflags! {
    /// Per-series (stub) lifecycle and access flags (spec §3.2).
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
    pub struct SeriesFlags: u32 {
        /// Owned by the garbage collector (as opposed to the manuals list).
        const MANAGED         = 1 << 0;
        /// Capacity is fixed at creation; `rest` never grows.
        const FIXED_SIZE       = 1 << 1;
        /// Payload lives in a separately allocated, possibly over-allocated
        /// block rather than being inlined in the stub.
        const DYNAMIC           = 1 << 2;
        /// Transient GC coloring bit used to break cycles during mark/sweep
        /// and during freeze's reachability walk. Must be cleared (`uncolor`)
        /// by whichever pass set it.
        const BLACK             = 1 << 3;
        /// Freed but the stub (and pointers to it) still exist; reads raise
        /// `series-data-freed`.
        const INACCESSIBLE      = 1 << 4;
        /// Currently being enumerated; mutation is rejected until the frame
        /// that set this releases it on exit.
        const HOLD              = 1 << 5;
        /// User-visible write protection (`protect`).
        const PROTECTED         = 1 << 6;
        /// Every element is itself at least shallow-frozen; the series'
        /// own structure (length, element identity) cannot change.
        const FROZEN_SHALLOW     = 1 << 7;
        /// `FROZEN_SHALLOW` plus: every reachable sub-series is likewise
        /// deep-frozen.
        const FROZEN_DEEP        = 1 << 8;
        /// Locked automatically by the runtime (e.g. function bodies),
        /// distinct from a user's explicit `protect`.
        const AUTO_LOCKED        = 1 << 9;
        /// Carries a source-file/line annotation in its link slot.
        const HAS_FILE_LINE      = 1 << 10;
        /// (Arrays only) the source text had a newline after the last
        /// element, so the array's closing bracket should mold on its own line.
        const NEWLINE_AT_TAIL    = 1 << 11;
        /// (Keylists only) shared across more than one context; a write that
        /// would mutate it must copy-on-expand first.
        const SHARED             = 1 << 12;
    }
}

impl SeriesFlags {
    /// True if any mutation should be rejected, and if so which error id
    /// names the most specific reason (spec §5, "shared resource policy").
    pub fn mutation_error(&self) -> Option<&'static str> {
        if self.contains(SeriesFlags::HOLD) {
            Some("series-held")
        } else if self.contains(SeriesFlags::FROZEN_DEEP) || self.contains(SeriesFlags::FROZEN_SHALLOW) {
            Some("series-frozen")
        } else if self.contains(SeriesFlags::AUTO_LOCKED) {
            Some("series-auto-locked")
        } else if self.contains(SeriesFlags::PROTECTED) {
            Some("series-protected")
        } else {
            None
        }
    }
}
