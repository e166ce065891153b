//! fwsync - declarative iptables/ipset state synchronizer
//!
//! Converges live packet-filter state onto a declared configuration by
//! computing the minimal set of mutations between what a chain or set
//! currently contains and what the task list says it should contain.
//!
//! # Architecture
//!
//! - [`core`] - Reconciliation engine: identity, alignment, chain/set sync, backends
//! - [`config`] - Declarative task-list configuration (JSON)
//!
//! # Reconciliation model
//!
//! Every rule inserted by this tool carries a content-hash annotation in a
//! match comment. On the next run the annotation identifies "the same
//! logical rule" in the live listing; the longest common subsequence of
//! observed and desired identities determines the minimal delete/insert
//! script, so unchanged rules (and their counters) are never touched.
//! Set membership is reconciled by plain set difference over normalized
//! member strings. There are no transactions: a failed operation is reported
//! and skipped, and re-running converges to the declared state.

// Allow pedantic clippy warnings that are not worth fixing for this codebase
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::missing_errors_doc)]

pub mod config;
pub mod core;

// Re-export commonly used types
pub use config::{RunConfig, Task};
pub use core::backend::{AddressFamily, FilterBackend, ObservedRule};
pub use core::error::{Error, Result};
pub use core::identity::RuleIdentity;
