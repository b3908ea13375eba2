#![no_std]
#![forbid(
    clippy::missing_safety_doc,
    clippy::undocumented_unsafe_blocks,
    unsafe_op_in_unsafe_fn,
    missing_docs,
    clippy::std_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::alloc_instead_of_core
)]

//! # handle-table
//!
//! A dense table that hands out small integer handles for the values it stores.
//!
//! Values live contiguously in a single [`Vec`](alloc::vec::Vec), so iterating
//! over them is as fast as iterating over a slice. Callers never see positions
//! into that vector, only handles, so values can be moved around when others
//! are erased without invalidating anything the caller holds.
//!
//! ```
//! use handle_table::HandleTable;
//!
//! let mut table = HandleTable::<&str, u32>::new();
//! let a = table.insert("a");
//! let b = table.insert("b");
//! let c = table.insert("c");
//!
//! assert_eq!(table.erase(b), Ok("b"));
//! assert!(table.at(b).is_err());
//! assert_eq!(table[a], "a");
//! assert_eq!(table[c], "c");
//!
//! // the most recently erased handle is the next one handed out
//! let d = table.insert("d");
//! assert_eq!(d, b);
//! ```
//!
//! ## Handles
//!
//! A handle is any unsigned integer type (see [`Handle`]). Fresh handles are
//! allocated in increasing order starting from 0. Erased handles are recycled
//! before any fresh handle is allocated, the most recently erased one first.
//!
//! Handles carry no generation, so a handle kept around after it was erased
//! will refer to whatever value is inserted when it is recycled. If that is a
//! problem for your domain, use an arena with generational keys instead.
//!
//! ## Layout
//!
//! A [`HandleTable`] is a [`Vec`](alloc::vec::Vec) of values paired with a
//! [`HandleTracker`](tracker::HandleTracker), which maps handles to positions
//! in that vector and back. All of insertion, erasure and lookup are O(1), and
//! erasure moves exactly one value: the last one, into the erased position.
//!
//! The tracker is public, so you can pair it with your own set of arrays.
//!
//! ## Features
//!
//! * `std` (default): implement the `std` integrations of the dependencies.
//!   Without it the crate only needs `alloc`.

extern crate alloc;

#[macro_use]
mod polyfill;

pub mod error;
pub mod handle;
pub mod table;
pub mod tracker;

pub use error::Error;
pub use handle::Handle;
pub use table::HandleTable;

mod seal {
    pub trait Seal {}
}
