//! A dense table of values addressed by recyclable integer handles
//!
//! see [`HandleTable`] for details

use alloc::vec::Vec;
use core::{fmt, iter, ops, slice};

use tracing::debug;

use crate::{
    error::Error,
    handle::Handle,
    tracker::{self, HandleTracker, Handles},
};

/// [`HandleTable`] is the canonical way to use a [`HandleTracker`]
///
/// It pairs a [`HandleTracker`] with a [`Vec<T>`]. The values are kept packed at
/// the front of the vector in no particular order, and the order changes when
/// values are erased.
///
/// All references into the table are invalidated by insertion (which may
/// reallocate) and erasure (which moves the last value), but handles are not.
#[derive(Clone)]
pub struct HandleTable<T, H: Handle = usize> {
    values: Vec<T>,
    tracker: HandleTracker<H>,
}

/// A vacant slot into a [`HandleTable`], created by [`HandleTable::vacant_slot`]
///
/// Dropping the slot without calling [`VacantSlot::insert`] leaves the table unchanged.
pub struct VacantSlot<'a, T, H: Handle = usize> {
    slot: tracker::VacantSlot<'a, H>,
    values: &'a mut Vec<T>,
}

impl<T, H: Handle> VacantSlot<'_, T, H> {
    /// Get the handle that will be associated with this slot once it is filled
    #[inline]
    pub fn handle(&self) -> H {
        self.slot.handle()
    }

    /// Insert an element into this slot
    pub fn insert(self, value: T) {
        debug_assert_eq!(self.slot.position(), self.values.len());
        debug_assert!(self.values.len() < self.values.capacity());

        // [`HandleTable::vacant_slot`] ensures there is capacity for this push,
        // so it can't reallocate
        self.values.push(value);
        self.slot.insert()
    }
}

impl<T, H: Handle> HandleTable<T, H> {
    /// Create a new [`HandleTable`]
    pub const fn new() -> Self {
        Self {
            values: Vec::new(),
            tracker: HandleTracker::new(),
        }
    }

    /// Create a new [`HandleTable`] which can hold `capacity` values without reallocating
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: Vec::with_capacity(capacity),
            tracker: HandleTracker::with_capacity(capacity),
        }
    }

    /// Get the number of values in the [`HandleTable`]
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if there are no values in the [`HandleTable`]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Get the number of values in the [`HandleTable`] as a handle-width integer
    #[inline]
    pub fn size(&self) -> H {
        H::from_count(self.len())
    }

    /// The number of distinct handles allocated so far
    ///
    /// see [`HandleTracker::high_water_mark`]
    #[inline]
    pub fn high_water_mark(&self) -> usize {
        self.tracker.high_water_mark()
    }

    /// The number of values the [`HandleTable`] can hold without reallocating
    #[inline]
    pub fn capacity(&self) -> usize {
        self.values.capacity()
    }

    /// Reserve room for at least `additional` more values
    ///
    /// This doesn't change anything observable besides the capacity
    pub fn reserve(&mut self, additional: usize) {
        self.values.reserve(additional);
        self.tracker.reserve(additional);
    }

    /// Access a vacant slot in the table
    ///
    /// # Errors
    ///
    /// [`Error::Exhausted`] if no handle is left to give to the slot
    pub fn vacant_slot(&mut self) -> Result<VacantSlot<'_, T, H>, Error<H>> {
        if self.values.len() == self.values.capacity() {
            self.values.reserve(1);
        }

        Ok(VacantSlot {
            slot: self.tracker.vacant_slot(self.values.len())?,
            values: &mut self.values,
        })
    }

    /// Try to insert a new value into the [`HandleTable`]
    ///
    /// # Errors
    ///
    /// [`Error::Exhausted`] if every value of `H` is already allocated and none
    /// were erased. The table is left unchanged.
    pub fn try_insert(&mut self, value: T) -> Result<H, Error<H>> {
        let slot = self.vacant_slot()?;
        let handle = slot.handle();
        slot.insert(value);
        Ok(handle)
    }

    /// Insert a new value into the [`HandleTable`]
    ///
    /// Returns the most recently erased handle if there is one, otherwise a
    /// fresh handle one greater than the last one allocated
    ///
    /// # Panics
    ///
    /// If every value of `H` is already allocated and none were erased
    pub fn insert(&mut self, value: T) -> H {
        match self.try_insert(value) {
            Ok(handle) => handle,
            Err(err) => insert_failed(err),
        }
    }

    /// Insert a clone of the value into the [`HandleTable`]
    ///
    /// # Panics
    ///
    /// If every value of `H` is already allocated and none were erased
    pub fn insert_cloned(&mut self, value: &T) -> H
    where
        T: Clone,
    {
        self.insert(value.clone())
    }

    /// Insert a new value that depends on its handle into the [`HandleTable`]
    ///
    /// If `value` panics, the table is left unchanged.
    ///
    /// # Panics
    ///
    /// If every value of `H` is already allocated and none were erased
    pub fn insert_with(&mut self, value: impl FnOnce(H) -> T) -> H {
        let slot = match self.vacant_slot() {
            Ok(slot) => slot,
            Err(err) => insert_failed(err),
        };
        let handle = slot.handle();
        slot.insert(value(handle));
        handle
    }

    /// Returns true if the handle is associated with a value
    #[inline]
    pub fn contains(&self, handle: H) -> bool {
        self.tracker.contains(handle)
    }

    /// Get a reference to the value associated with the handle
    ///
    /// Returns None if the handle is invalid (never allocated, or erased)
    #[inline]
    pub fn get(&self, handle: H) -> Option<&T> {
        let position = self.tracker.position(handle)?;
        // SAFETY: the tracker ensures that position is in bounds
        Some(unsafe { self.values.get_unchecked(position) })
    }

    /// Get a mutable reference to the value associated with the handle
    ///
    /// Returns None if the handle is invalid (never allocated, or erased)
    #[inline]
    pub fn get_mut(&mut self, handle: H) -> Option<&mut T> {
        let position = self.tracker.position(handle)?;
        // SAFETY: the tracker ensures that position is in bounds
        Some(unsafe { self.values.get_unchecked_mut(position) })
    }

    /// Get a reference to the value associated with the handle
    ///
    /// # Errors
    ///
    /// [`Error::OutOfRange`] if the handle is invalid (never allocated, or erased)
    #[inline]
    pub fn at(&self, handle: H) -> Result<&T, Error<H>> {
        let position = self.tracker.at(handle)?;
        // SAFETY: the tracker ensures that position is in bounds
        Ok(unsafe { self.values.get_unchecked(position) })
    }

    /// Get a mutable reference to the value associated with the handle
    ///
    /// # Errors
    ///
    /// [`Error::OutOfRange`] if the handle is invalid (never allocated, or erased)
    #[inline]
    pub fn at_mut(&mut self, handle: H) -> Result<&mut T, Error<H>> {
        let position = self.tracker.at(handle)?;
        // SAFETY: the tracker ensures that position is in bounds
        Ok(unsafe { self.values.get_unchecked_mut(position) })
    }

    /// Get a reference to the value associated with the handle
    ///
    /// # Safety
    ///
    /// The handle must be associated with a value
    ///
    /// i.e. [`HandleTable::get`] would have returned [`Some`]
    #[inline]
    pub unsafe fn get_unchecked(&self, handle: H) -> &T {
        // SAFETY: the caller ensures that the handle is valid
        let position = unsafe { self.tracker.position_unchecked(handle) };
        // SAFETY: the tracker ensures that position is in bounds
        unsafe { self.values.get_unchecked(position) }
    }

    /// Get a mutable reference to the value associated with the handle
    ///
    /// # Safety
    ///
    /// The handle must be associated with a value
    ///
    /// i.e. [`HandleTable::get_mut`] would have returned [`Some`]
    #[inline]
    pub unsafe fn get_unchecked_mut(&mut self, handle: H) -> &mut T {
        // SAFETY: the caller ensures that the handle is valid
        let position = unsafe { self.tracker.position_unchecked(handle) };
        // SAFETY: the tracker ensures that position is in bounds
        unsafe { self.values.get_unchecked_mut(position) }
    }

    unsafe fn remove_at(&mut self, position: usize) -> T {
        // SAFETY: all callers ensure that the position is in bounds
        unsafe { assert_unchecked!(position < self.values.len()) };

        self.values.swap_remove(position)
    }

    /// Erase the value associated with the handle, and return it
    ///
    /// The last value in the table is moved into the erased value's place, and
    /// the handle is recycled by the next insertion.
    ///
    /// # Errors
    ///
    /// [`Error::OutOfRange`] if the handle is invalid (never allocated, or erased).
    /// The table is left unchanged.
    #[inline]
    pub fn erase(&mut self, handle: H) -> Result<T, Error<H>> {
        let position = self.tracker.remove(handle)?;
        // SAFETY: the tracker ensures that position is in bounds
        Ok(unsafe { self.remove_at(position) })
    }

    /// Erase the value associated with the handle without checking
    /// if the handle is valid
    ///
    /// # Safety
    ///
    /// The handle must be associated with a value
    #[inline]
    pub unsafe fn erase_unchecked(&mut self, handle: H) -> T {
        // SAFETY: the caller ensures that the handle is valid
        let position = unsafe { self.tracker.remove_unchecked(handle) };
        // SAFETY: the tracker ensures that position is in bounds
        unsafe { self.remove_at(position) }
    }

    /// Erase every value
    ///
    /// All handles are recycled by later insertions
    pub fn clear(&mut self) {
        debug!(len = self.values.len(), "clearing handle table");
        // clear the tracker first, so a panicking destructor can't leave the
        // two halves out of sync
        self.tracker.clear();
        self.values.clear();
    }

    /// All live handles, in the order of the values they are associated with
    pub fn all_handles(&self) -> Vec<H> {
        self.tracker.live_handles().to_vec()
    }

    /// An iterator over all the live handles
    pub fn handles(&self) -> Handles<'_, H> {
        self.tracker.handles()
    }

    /// An unordered slice of the values in the table
    #[inline]
    pub fn values(&self) -> &[T] {
        self.values.as_slice()
    }

    /// An unordered mutable slice of the values in the table
    #[inline]
    pub fn values_mut(&mut self) -> &mut [T] {
        self.values.as_mut_slice()
    }

    /// An iterator over the handles and values in the table
    pub fn iter(&self) -> Iter<'_, T, H> {
        Iter {
            inner: self.tracker.handles().zip(self.values.iter()),
        }
    }

    /// An iterator over the handles and mutable references to the values in the table
    pub fn iter_mut(&mut self) -> IterMut<'_, T, H> {
        IterMut {
            inner: self.tracker.handles().zip(self.values.iter_mut()),
        }
    }

    /// The [`HandleTracker`] that this [`HandleTable`] uses
    #[inline]
    pub const fn tracker(&self) -> &HandleTracker<H> {
        &self.tracker
    }

    /// The mutable slice of values in this [`HandleTable`]
    /// and the [`HandleTracker`] that this [`HandleTable`] uses
    ///
    /// This method is to work around limitations in Rust's borrow checker
    #[inline]
    pub fn values_mut_and_tracker(&mut self) -> (&mut [T], &HandleTracker<H>) {
        (self.values.as_mut_slice(), &self.tracker)
    }

    #[cfg(test)]
    fn check_invariants(&self) {
        self.tracker.check_invariants();
        assert_eq!(self.tracker.len(), self.values.len());
    }
}

#[cold]
#[inline(never)]
fn insert_failed<H: Handle>(err: Error<H>) -> ! {
    panic!("failed to insert into handle table: {err}")
}

#[cold]
#[inline(never)]
fn access_invalid_handle<H: Handle>(handle: H) -> ! {
    panic!("Tried to access invalid handle: {handle:?}")
}

impl<T, H: Handle> Default for HandleTable<T, H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug, H: Handle> fmt::Debug for HandleTable<T, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<T, H: Handle> ops::Index<H> for HandleTable<T, H> {
    type Output = T;

    fn index(&self, handle: H) -> &Self::Output {
        match self.get(handle) {
            Some(value) => value,
            None => access_invalid_handle(handle),
        }
    }
}

impl<T, H: Handle> ops::IndexMut<H> for HandleTable<T, H> {
    fn index_mut(&mut self, handle: H) -> &mut Self::Output {
        match self.get_mut(handle) {
            Some(value) => value,
            None => access_invalid_handle(handle),
        }
    }
}

impl<T, H: Handle> Extend<T> for HandleTable<T, H> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        self.reserve(iter.size_hint().0);
        for value in iter {
            self.insert(value);
        }
    }
}

impl<T, H: Handle> FromIterator<T> for HandleTable<T, H> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut table = Self::new();
        table.extend(iter);
        table
    }
}

impl<'a, T, H: Handle> IntoIterator for &'a HandleTable<T, H> {
    type Item = (H, &'a T);
    type IntoIter = Iter<'a, T, H>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T, H: Handle> IntoIterator for &'a mut HandleTable<T, H> {
    type Item = (H, &'a mut T);
    type IntoIter = IterMut<'a, T, H>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

/// An iterator over the handles and values of a [`HandleTable`], created from
/// [`HandleTable::iter`]
pub struct Iter<'a, T, H: Handle = usize> {
    inner: iter::Zip<Handles<'a, H>, slice::Iter<'a, T>>,
}

impl<T, H: Handle> Clone for Iter<'_, T, H> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T, H: Handle> ExactSizeIterator for Iter<'_, T, H> {}
impl<T, H: Handle> iter::FusedIterator for Iter<'_, T, H> {}
impl<'a, T, H: Handle> Iterator for Iter<'a, T, H> {
    type Item = (H, &'a T);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T, H: Handle> DoubleEndedIterator for Iter<'_, T, H> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back()
    }
}

/// An iterator over the handles and mutable references to the values of a
/// [`HandleTable`], created from [`HandleTable::iter_mut`]
pub struct IterMut<'a, T, H: Handle = usize> {
    inner: iter::Zip<Handles<'a, H>, slice::IterMut<'a, T>>,
}

impl<T, H: Handle> ExactSizeIterator for IterMut<'_, T, H> {}
impl<T, H: Handle> iter::FusedIterator for IterMut<'_, T, H> {}
impl<'a, T, H: Handle> Iterator for IterMut<'a, T, H> {
    type Item = (H, &'a mut T);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T, H: Handle> DoubleEndedIterator for IterMut<'_, T, H> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back()
    }
}
