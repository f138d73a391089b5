//! Trace-driven simulator of a single set-associative cache with LRU
//! replacement and a write-back / write-allocate policy.

mod bin;
pub mod cache;
pub mod common;
pub mod config;
pub mod decode;
pub mod geometry;
pub mod report;
pub mod set;
pub mod sim;
pub mod trace;

#[cfg(feature = "stat")]
pub mod stat;
