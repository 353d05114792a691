//! Pooled stub allocation (spec §4.1).
//!
//! A `Pool<T>` owns a dense `Vec` of slots indexed by [`StubIndex`]; freed
//! slots are recycled through a free list so indices stay small and stable
//! for as long as a stub is alive, which is what lets a `Cell`'s payload
//! reference be "just a number" (see `crate::cell::NodeRef`).
//!
//! Every stub starts out *manual*: the allocator records it on a growable
//! "manuals" list and expects the owner to either [`Pool::free_unmanaged`]
//! it explicitly or [`Pool::manage`] it over to the garbage collector.
//! Mixing the two — freeing a managed stub directly, or leaking a manual one
//! — is exactly the failure mode invariant 2 (spec §8) rules out.

use crate::flags::SeriesFlags;
use std::cell::Cell as StdCell;

/// A stable handle into a [`Pool`]. Indices are reused once a slot is
/// reclaimed, so a `StubIndex` is only meaningful relative to the pool that
/// minted it and only for as long as nothing has reclaimed that slot.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StubIndex(pub u32);

/// Anything a [`Pool`] can own must expose its series flags (for the
/// manual/managed bookkeeping and for the GC's mark/sweep) and know how to
/// drop its own over-allocated payload on reclaim.
pub trait PoolObject {
    fn series_flags(&self) -> SeriesFlags;
    fn series_flags_mut(&mut self) -> &mut SeriesFlags;

    /// Release whatever separately-allocated payload this stub owns
    /// (its dynamic content block, or any contained node references it is
    /// directly responsible for). Called exactly once, either by
    /// `free_unmanaged` or by the GC's sweep.
    fn release_payload(&mut self);
}

/// A pooled allocator for fixed-size series nodes of type `T`.
pub struct Pool<T: PoolObject> {
    slots: Vec<Option<T>>,
    free_list: Vec<StubIndex>,
    manuals: Vec<StubIndex>,
    /// Allocations remaining before a recycle should be requested at the
    /// next safe point (spec §4.1, "GC trigger").
    ballast: StdCell<i64>,
    ballast_reset: i64,
}

impl<T: PoolObject> Pool<T> {
    pub fn new(ballast: i64) -> Self {
        Pool {
            slots: Vec::new(),
            free_list: Vec::new(),
            manuals: Vec::new(),
            ballast: StdCell::new(ballast),
            ballast_reset: ballast,
        }
    }

    /// Allocate a new stub, recorded on the manuals list. Returns the index
    /// and whether the ballast has been exhausted (the caller should request
    /// a recycle at the next safe point when `true`).
    pub fn alloc_stub(&mut self, value: T) -> (StubIndex, bool) {
        let idx = if let Some(reused) = self.free_list.pop() {
            self.slots[reused.0 as usize] = Some(value);
            reused
        } else {
            self.slots.push(Some(value));
            StubIndex((self.slots.len() - 1) as u32)
        };
        self.manuals.push(idx);

        let remaining = self.ballast.get() - 1;
        self.ballast.set(remaining);
        (idx, remaining <= 0)
    }

    /// Reset the ballast counter after a recycle (spec §4.1).
    pub fn reset_ballast(&mut self) {
        self.ballast.set(self.ballast_reset);
    }

    pub fn ballast_remaining(&self) -> i64 {
        self.ballast.get()
    }

    pub fn get(&self, idx: StubIndex) -> Option<&T> {
        self.slots.get(idx.0 as usize).and_then(|s| s.as_ref())
    }

    pub fn get_mut(&mut self, idx: StubIndex) -> Option<&mut T> {
        self.slots.get_mut(idx.0 as usize).and_then(|s| s.as_mut())
    }

    pub fn is_managed(&self, idx: StubIndex) -> bool {
        self.get(idx)
            .is_some_and(|s| s.series_flags().contains(SeriesFlags::MANAGED))
    }

    /// Promote a manual stub to GC-managed. Idempotent: managing an
    /// already-managed stub is a no-op (mirrors the teacher's defensive
    /// style in `pool.rs`/`memory_stats.rs`, which never panics on a
    /// redundant call).
    pub fn manage(&mut self, idx: StubIndex) {
        if self.is_managed(idx) {
            return;
        }
        if let Some(pos) = self.manuals.iter().position(|m| *m == idx) {
            self.manuals.swap_remove(pos);
        }
        if let Some(s) = self.get_mut(idx) {
            *s.series_flags_mut() |= SeriesFlags::MANAGED;
        }
    }

    /// Free a manual stub explicitly. Errors (returns `false`) if the stub
    /// is managed — per spec, freeing a managed series directly is a
    /// programming error, not a user-facing one, so the caller is expected
    /// to have checked `is_managed` first or to treat `false` as a bug.
    pub fn free_unmanaged(&mut self, idx: StubIndex) -> bool {
        if self.is_managed(idx) {
            return false;
        }
        if let Some(pos) = self.manuals.iter().position(|m| *m == idx) {
            self.manuals.swap_remove(pos);
        }
        self.reclaim(idx);
        true
    }

    /// Release a stub's payload and mark it inaccessible, without returning
    /// its slot to the free list. Used when something makes a *referenced*
    /// stub invalid ahead of collection (explicit `close`, a freed FFI
    /// handle); the slot itself can only be recycled once the GC's sweep
    /// confirms nothing still points at it.
    pub fn gc_kill(&mut self, idx: StubIndex) {
        if let Some(s) = self.get_mut(idx) {
            s.release_payload();
            let flags = s.series_flags_mut();
            flags.remove(SeriesFlags::DYNAMIC);
            flags.insert(SeriesFlags::INACCESSIBLE);
        }
    }

    /// Fully reclaim a slot: release its payload (if not already released by
    /// `gc_kill`) and return the index to the free list for reuse. Only the
    /// GC sweep (for managed stubs) or `free_unmanaged` (for manual ones)
    /// may call this.
    pub fn reclaim(&mut self, idx: StubIndex) {
        if let Some(mut s) = self.slots.get_mut(idx.0 as usize).and_then(Option::take) {
            if !s.series_flags().contains(SeriesFlags::INACCESSIBLE) {
                s.release_payload();
            }
        }
        self.free_list.push(idx);
    }

    /// Iterate all currently-live (non-reclaimed) stub indices. Used by the
    /// GC's sweep pass.
    pub fn live_indices(&self) -> impl Iterator<Item = StubIndex> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|_| StubIndex(i as u32)))
    }

    /// The manuals list, e.g. for the GC to assert nothing manual leaked
    /// across a frame boundary (spec invariant 2).
    pub fn manuals(&self) -> &[StubIndex] {
        &self.manuals
    }
}
