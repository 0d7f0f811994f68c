//! Aggregation of the canonical store.
//!
//! This module splits daily totals into per-scenario series and derives the
//! rolling statistics, the date × scenario pivot, the acceleration ratios
//! against the baseline and their weekly means.

pub mod aggregate;
pub mod analyzer;
pub mod grade;
pub mod rolling;
pub mod types;
pub mod utility;
