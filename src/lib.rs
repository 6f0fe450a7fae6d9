//! Physical page frame management for Windy.
//!
//! The core of this crate is the [`BuddyAllocator`](mem::buddy::BuddyAllocator),
//! which hands out power-of-two runs of page frames from an externally owned
//! array of [`Frame`](mem::frame::Frame) records.
#![deny(rust_2018_idioms, rustdoc::broken_intra_doc_links)]
#![cfg_attr(not(test), no_std)]

#[cfg(not(target_pointer_width = "64"))]
compile_error!("Windy can only run on 64 bit systems");

pub mod mem;
pub mod unit;

#[cfg(test)]
mod testing;

pub use mem::{buddy::BuddyAllocator, frame::Frame, locked::LockedAllocator};
pub use mem::{AllocStats, Error, PageAllocator, Result};
