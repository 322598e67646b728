//! Tax calculation modules.
//!
//! This module provides the progressive bracket engine and the rounding and
//! formatting helpers shared by everything that presents its results.

pub mod brackets;
pub mod common;

pub use brackets::{compute_effective_rate, compute_tax, range_label};
