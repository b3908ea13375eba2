//! The error type shared by the checked operations of this crate

/// The ways a checked operation on a [`HandleTable`](crate::table::HandleTable)
/// or [`HandleTracker`](crate::tracker::HandleTracker) can fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Error<H> {
    /// The handle was never allocated, or has been erased and not handed out again
    #[error("handle {handle:?} is out of range")]
    OutOfRange {
        /// The rejected handle
        handle: H,
    },
    /// Every value of the handle type has already been allocated and none are
    /// waiting to be recycled
    #[error("handle space exhausted after allocating {count} handles")]
    Exhausted {
        /// The number of handles the table has allocated
        count: usize,
    },
}

impl<H> Error<H> {
    /// Returns true if this error came from accessing an invalid handle
    pub const fn is_out_of_range(&self) -> bool {
        matches!(self, Self::OutOfRange { .. })
    }
}
