//! Core module - Contains the fundamental data structures and utilities
//!
//! This module provides:
//! - Dynamic values and dense arrays
//! - Content fingerprints
//! - Filename templates and call arguments
//! - The error taxonomy
//! - Unified result model and renderer for the CLI
//! - Path normalization and file metadata utilities

pub mod args;
pub mod array;
pub mod error;
pub mod fingerprint;
pub mod model;
pub mod paths;
pub mod render;
pub mod serde_float;
pub mod template;
pub mod util;
pub mod value;
