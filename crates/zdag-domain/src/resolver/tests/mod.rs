//! Tests for the graph resolver module.
//!
//! Organized by functionality:
//! - Check (direct edges, userset expansion, cycles, depth limits)
//! - Path explorer (shortest path, all paths, caps)
//! - Relation closures and authorization lookups
//! - Tree builder and forest
//! - Cycle guard for mutations
//! - Timeouts and cancellation
//! - Property-based path invariants


mod path_proptest;
