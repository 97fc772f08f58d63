//! Cache module - disk-backed memoization
//!
//! Provides:
//! - Extension-dispatched artifact codecs (npy, npz, JSON objects)
//! - Atomic load/save under a cache root
//! - Path resolution from filename templates
//! - Cached function wrappers and an in-process memoizer
//! - Artifact inventory for manual inspection

pub mod cached;
pub mod codec;
pub mod inspect;
pub mod listing;
pub mod memo;
pub mod resolver;
pub mod store;
