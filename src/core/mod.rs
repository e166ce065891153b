//! Core reconciliation functionality
//!
//! This module contains the engine that converges live packet-filter state
//! onto a declared configuration:
//!
//! - [`identity`]: Stable content-hash identity for rules and its embedded annotation
//! - [`align`]: Longest-common-subsequence alignment of identity sequences
//! - [`chain`]: Ordered chain reconciliation (minimal positional edit script)
//! - [`set`]: Member normalization and unordered set reconciliation
//! - [`backend`]: The Filter Adapter trait the reconcilers are written against
//! - [`iptables`]: Production backend shelling out to iptables/ip6tables/ipset
//! - [`engine`]: Init operations and the ordered task dispatch loop
//! - [`error`]: Error taxonomy and structured diagnostics

pub mod align;
pub mod backend;
pub mod chain;
pub mod engine;
pub mod error;
pub mod identity;
pub mod iptables;
pub mod set;

#[cfg(test)]
pub mod test_helpers;
