//! The handle tracker is the bookkeeping half of a [`HandleTable`](crate::table::HandleTable)
//!
//! A [`HandleTracker`] keeps track of which handle owns which position of an
//! associated array (or set of arrays), and which handles are waiting to be
//! recycled. It does not own any values.
//!
//! * Each time you call [`VacantSlot::insert`], you must push an element onto the array(s)
//! * Each time you call [`HandleTracker::remove`] (or its variants) successfully,
//!   you must [`Vec::swap_remove`] the returned position out of the array(s)
//!
//! If you do these two things, then every position handed out by the tracker is
//! a correct index into your array(s). This makes it possible to store values as
//! a [SoA](https://en.wikipedia.org/wiki/AoS_and_SoA) instead of the single
//! [`Vec`] used by [`HandleTable`](crate::table::HandleTable).
//!
//! ## Layout
//!
//! The tracker is made of two tables that are inverse permutations of each other
//! over `0..high_water_mark`:
//!
//! * `positions[handle]` is the position of the handle's value, meaningful only while
//!   the handle is live
//! * `handles[position]` is the handle that owns `position` for positions below `len`.
//!   Beyond `len` it is the recycle bucket: the freed handles, the most recently freed
//!   one first.

use alloc::vec::Vec;
use core::{iter::FusedIterator, slice};

use tracing::{debug, trace};

use crate::{error::Error, handle::Handle};

/// Tracks which handle points to which position of an associated array
///
/// This structure should be paired with an array of elements that store the actual data
#[derive(Debug, Clone)]
pub struct HandleTracker<H: Handle = usize> {
    positions: Vec<H>,
    handles: Vec<H>,
    len: usize,
}

/// A vacant slot in a [`HandleTracker`], created by [`HandleTracker::vacant_slot`]
///
/// Dropping the slot without calling [`VacantSlot::insert`] leaves the tracker unchanged.
pub struct VacantSlot<'a, H: Handle = usize> {
    tracker: &'a mut HandleTracker<H>,
    handle: H,
}

impl<H: Handle> VacantSlot<'_, H> {
    /// Get the handle that will be associated with this slot once it is filled
    #[inline]
    pub fn handle(&self) -> H {
        self.handle
    }

    /// Get the position of the slot into the associated array once it is filled
    #[inline]
    pub fn position(&self) -> usize {
        self.tracker.len
    }

    /// Fill this slot
    ///
    /// This should be called along side pushing the element at
    /// `self.position()` onto the associated array
    pub fn insert(self) {
        let Self { tracker, handle } = self;
        let position = tracker.len;

        // SAFETY: a recycled slot lies below the high water mark, and a fresh slot
        // sits exactly at the high water mark, which `vacant_slot` checked is a
        // valid handle. Either way the position is below `H::MAX_COUNT`
        let position_h = unsafe { H::from_usize_unchecked(position) };

        if position < tracker.handles.len() {
            debug_assert_eq!(tracker.handles[position], handle);
            tracker.positions[handle.to_usize()] = position_h;
            trace!(?handle, position, "recycled handle");
        } else {
            debug_assert_eq!(handle.to_usize(), position);
            tracker.handles.push(handle);
            tracker.positions.push(position_h);
            trace!(?handle, "allocated handle");
        }

        tracker.len += 1;
    }
}

impl<H: Handle> HandleTracker<H> {
    /// Create a new [`HandleTracker`]
    pub const fn new() -> Self {
        Self {
            positions: Vec::new(),
            handles: Vec::new(),
            len: 0,
        }
    }

    /// Create a new [`HandleTracker`] which can track `capacity` handles without reallocating
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            positions: Vec::with_capacity(capacity),
            handles: Vec::with_capacity(capacity),
            len: 0,
        }
    }

    /// The number of live handles
    #[inline]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns true if there are no live handles
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The number of distinct handles allocated so far, live or waiting to be recycled
    ///
    /// Every handle ever returned by this tracker is below this value
    #[inline]
    pub fn high_water_mark(&self) -> usize {
        self.handles.len()
    }

    /// The number of freed handles waiting to be recycled
    #[inline]
    pub fn free_count(&self) -> usize {
        self.handles.len() - self.len
    }

    /// Reserve room to track at least `additional` more live handles without reallocating
    pub fn reserve(&mut self, additional: usize) {
        let needed = self
            .len
            .saturating_add(additional)
            .saturating_sub(self.handles.len());
        self.handles.reserve(needed);
        self.positions.reserve(needed);
        debug!(additional, needed, "reserved handle tracker capacity");
    }

    /// Free every live handle
    ///
    /// All handles move into the recycle bucket and will be handed out again
    /// by later insertions. The associated array(s) must be cleared as well.
    pub fn clear(&mut self) {
        debug!(freed = self.len, "cleared handle tracker");
        self.len = 0;
    }

    /// Access a vacant slot in the tracker
    ///
    /// `len` is the length of the associated array, which must match [`HandleTracker::len`]
    ///
    /// # Errors
    ///
    /// [`Error::Exhausted`] if a fresh handle is needed, but every value of `H`
    /// has already been allocated
    ///
    /// # Panics
    ///
    /// If `len` doesn't match the number of live handles
    pub fn vacant_slot(&mut self, len: usize) -> Result<VacantSlot<'_, H>, Error<H>> {
        assert_eq!(
            self.len, len,
            "the associated array is out of sync with the handle tracker"
        );

        let handle = match self.handles.get(self.len) {
            Some(&handle) => handle,
            None => {
                let count = self.handles.len();
                match H::try_from_usize(count) {
                    Some(handle) => handle,
                    None => {
                        debug!(count, "handle space exhausted");
                        return Err(Error::Exhausted { count });
                    }
                }
            }
        };

        Ok(VacantSlot {
            tracker: self,
            handle,
        })
    }

    /// Get the position in the associated array of the handle's value
    ///
    /// Returns None if the handle was never allocated or isn't live
    #[inline]
    pub fn position(&self, handle: H) -> Option<usize> {
        let position = self.positions.get(handle.to_usize())?.to_usize();

        if position >= self.len {
            return None;
        }

        // SAFETY: position < self.len <= self.handles.len()
        let owner = unsafe { *self.handles.get_unchecked(position) };

        // a freed handle keeps its old position, which may since have been given
        // to another handle
        (owner == handle).then_some(position)
    }

    /// Get the position in the associated array of the handle's value
    ///
    /// # Errors
    ///
    /// [`Error::OutOfRange`] if the handle was never allocated or isn't live
    #[inline]
    pub fn at(&self, handle: H) -> Result<usize, Error<H>> {
        match self.position(handle) {
            Some(position) => Ok(position),
            None => Err(out_of_range(handle)),
        }
    }

    /// Get the position in the associated array of the handle's value
    /// without checking if the handle is live
    ///
    /// # Safety
    ///
    /// The handle must be live
    ///
    /// i.e. [`HandleTracker::position`] would have returned [`Some`]
    #[inline]
    pub unsafe fn position_unchecked(&self, handle: H) -> usize {
        let index = handle.to_usize();
        // SAFETY: the caller ensures that the handle is live, so it is below
        // the high water mark
        unsafe { assert_unchecked!(index < self.positions.len()) };
        let position = self.positions[index].to_usize();
        // SAFETY: live handles always map to a live position
        unsafe { assert_unchecked!(position < self.len) };
        position
    }

    /// Returns true if the handle is live
    #[inline]
    pub fn contains(&self, handle: H) -> bool {
        self.position(handle).is_some()
    }

    /// Get the handle that owns a position in the associated array
    ///
    /// Returns None if the position is out of bounds
    #[inline]
    pub fn handle_at(&self, position: usize) -> Option<H> {
        self.live_handles().get(position).copied()
    }

    /// All live handles, in the order of the positions they own
    #[inline]
    pub fn live_handles(&self) -> &[H] {
        &self.handles[..self.len]
    }

    /// # Safety
    ///
    /// `handle` must be live and own `position`
    unsafe fn remove_at(&mut self, handle: H, position: usize) -> usize {
        // SAFETY: all callers ensure that the handle is live, so the tracker isn't
        // empty, and that the position is owned by it
        unsafe {
            assert_unchecked!(position < self.len);
            assert_unchecked!(self.len <= self.handles.len());
        }
        debug_assert_eq!(self.handles[position], handle);

        let last = self.len - 1;
        let moved = self.handles[last];
        let moved_index = moved.to_usize();
        // SAFETY: every handle in `self.handles` is below the high water mark
        unsafe { assert_unchecked!(moved_index < self.positions.len()) };

        // the value at `last` gets swapped into `position`, so the handle that
        // owns it must follow it there. When `position == last` this is a no-op.
        self.handles[position] = moved;
        // SAFETY: position < self.len <= MAX_COUNT
        self.positions[moved_index] = unsafe { H::from_usize_unchecked(position) };

        // the freed handle becomes the top of the recycle bucket
        self.handles[last] = handle;
        self.len = last;

        trace!(?handle, position, ?moved, "freed handle");

        position
    }

    /// Try to free the handle
    ///
    /// Returns the position that must be [`Vec::swap_remove`]d from the associated array(s)
    ///
    /// # Errors
    ///
    /// [`Error::OutOfRange`] if the handle was never allocated or isn't live.
    /// The tracker is left unchanged.
    #[inline]
    pub fn remove(&mut self, handle: H) -> Result<usize, Error<H>> {
        let position = self.at(handle)?;
        // SAFETY: `at` checked that the handle is live and owns `position`
        Ok(unsafe { self.remove_at(handle, position) })
    }

    /// Free the handle without checking if it is live
    ///
    /// Returns the position that must be [`Vec::swap_remove`]d from the associated array(s)
    ///
    /// # Safety
    ///
    /// The handle must be live
    #[inline]
    pub unsafe fn remove_unchecked(&mut self, handle: H) -> usize {
        // SAFETY: the caller ensures that the handle is live
        let position = unsafe { self.position_unchecked(handle) };
        // SAFETY: live handles own the position they map to
        unsafe { self.remove_at(handle, position) }
    }

    /// Get an iterator over all the live handles
    ///
    /// This iterator will yield exactly `self.len()` elements, in the order of
    /// the positions they own
    pub fn handles(&self) -> Handles<'_, H> {
        Handles {
            handles: self.live_handles().iter(),
        }
    }

    #[cfg(test)]
    pub(crate) fn check_invariants(&self) {
        let high_water_mark = self.handles.len();
        assert_eq!(self.positions.len(), high_water_mark);
        assert!(self.len <= high_water_mark);

        let mut seen = alloc::vec![false; high_water_mark];
        for (position, &handle) in self.handles.iter().enumerate() {
            let index = handle.to_usize();
            assert!(index < high_water_mark, "{handle:?} above the high water mark");
            assert!(!seen[index], "{handle:?} tracked twice");
            seen[index] = true;

            if position < self.len {
                assert_eq!(self.positions[index].to_usize(), position);
                assert_eq!(self.position(handle), Some(position));
            } else {
                assert_eq!(self.position(handle), None);
            }
        }
    }
}

impl<H: Handle> Default for HandleTracker<H> {
    fn default() -> Self {
        Self::new()
    }
}

#[cold]
#[inline(never)]
fn out_of_range<H: Handle>(handle: H) -> Error<H> {
    debug!(?handle, "rejected access to an invalid handle");
    Error::OutOfRange { handle }
}

/// An iterator over the live handles of a [`HandleTracker`], created from
/// [`HandleTracker::handles`]
#[derive(Debug, Clone)]
pub struct Handles<'a, H: Handle = usize> {
    handles: slice::Iter<'a, H>,
}

impl<H: Handle> ExactSizeIterator for Handles<'_, H> {}
impl<H: Handle> FusedIterator for Handles<'_, H> {}
impl<H: Handle> Iterator for Handles<'_, H> {
    type Item = H;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.handles.next().copied()
    }

    #[inline]
    fn nth(&mut self, n: usize) -> Option<Self::Item> {
        self.handles.nth(n).copied()
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.handles.size_hint()
    }
}

impl<H: Handle> DoubleEndedIterator for Handles<'_, H> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        self.handles.next_back().copied()
    }

    #[inline]
    fn nth_back(&mut self, n: usize) -> Option<Self::Item> {
        self.handles.nth_back(n).copied()
    }
}
