//! see [`Handle`]

/// An unsigned integer type used as the identity of a value in a
/// [`HandleTable`](crate::table::HandleTable)
///
/// The width of the handle bounds how many distinct handles a table may
/// allocate over its whole lifetime. Recycled handles do not consume any new
/// values, but every fresh allocation does.
///
/// # Safety
///
/// `to_usize` must give the exact usize that was passed to `try_from_usize`,
/// `from_usize` or `from_usize_unchecked`
pub unsafe trait Handle:
    Copy + Eq + Ord + core::hash::Hash + core::fmt::Debug + crate::seal::Seal
{
    /// The number of handles a table using this type may allocate
    ///
    /// Handles are allocated from `0..MAX_COUNT`. `Self::MAX` is never handed
    /// out, so any count of handles also fits in `Self`.
    const MAX_COUNT: usize;

    /// Converts a usize to Self, returning None if it is not below [`Handle::MAX_COUNT`]
    fn try_from_usize(x: usize) -> Option<Self>;

    /// Converts a usize to Self
    ///
    /// # Panics
    ///
    /// x must be less than [`Handle::MAX_COUNT`]
    #[inline]
    fn from_usize(x: usize) -> Self {
        match Self::try_from_usize(x) {
            Some(handle) => handle,
            None => handle_overflow::<Self>(x),
        }
    }

    /// Casts from usize to Self without checking if usize is too large
    ///
    /// # Safety
    ///
    /// x must be less than [`Handle::MAX_COUNT`]
    unsafe fn from_usize_unchecked(x: usize) -> Self;

    /// Converts a number of handles to Self
    ///
    /// Any count up to and including [`Handle::MAX_COUNT`] fits
    fn from_count(count: usize) -> Self;

    /// Converts self to a usize
    ///
    /// Values that do not fit into a usize saturate to `usize::MAX`, which is
    /// never a valid position or handle index.
    fn to_usize(self) -> usize;
}

#[cold]
#[inline(never)]
fn handle_overflow<H: Handle>(x: usize) -> ! {
    panic!(
        "{x} does not fit in a handle of type {} (at most {} handles)",
        core::any::type_name::<H>(),
        H::MAX_COUNT
    )
}

macro_rules! prim {
    ($ty:ident) => {
        impl crate::seal::Seal for $ty {}
        // SAFETY: try_from_usize only accepts values below MAX_COUNT, which
        // fit in both Self and usize, so to_usize gives them back unchanged
        unsafe impl Handle for $ty {
            const MAX_COUNT: usize = if ($ty::MAX as u128) < (usize::MAX as u128) {
                $ty::MAX as usize
            } else {
                usize::MAX
            };

            #[inline]
            fn try_from_usize(x: usize) -> Option<Self> {
                if x < Self::MAX_COUNT {
                    Some(x as Self)
                } else {
                    None
                }
            }

            #[inline]
            unsafe fn from_usize_unchecked(x: usize) -> Self {
                debug_assert!(x < Self::MAX_COUNT);
                x as Self
            }

            #[inline]
            fn from_count(count: usize) -> Self {
                debug_assert!(count <= Self::MAX_COUNT);
                count as Self
            }

            #[inline]
            fn to_usize(self) -> usize {
                usize::try_from(self).unwrap_or(usize::MAX)
            }
        }
    };
}

prim!(u8);
prim!(u16);
prim!(u32);
prim!(u64);
prim!(u128);
prim!(usize);
