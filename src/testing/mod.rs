//! Testing utilities for crabclip
//!
//! An in-memory media backend that behaves like a phone camera stack,
//! enabling offline tests and demos without hardware.

pub mod synthetic_backend;

pub use synthetic_backend::{SyntheticBackend, SyntheticFaults, SyntheticTally};
