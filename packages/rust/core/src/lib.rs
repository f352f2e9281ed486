//! Core domain logic for ogetheory.
//!
//! This crate ties the markup conversions to the theory datasets: grouping
//! items into task buckets, memoizing the grouped catalog, and assembling
//! standalone documents and export files.

pub mod assembler;
pub mod catalog;
pub mod taxonomy;
