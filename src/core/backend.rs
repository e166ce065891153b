//! Filter Adapter boundary
//!
//! The reconcilers speak to the packet-filter subsystem only through
//! [`FilterBackend`]: list/insert/delete over ordered chains, create/destroy
//! and add/remove over unordered sets. Production uses the
//! [`iptables`](crate::core::iptables) implementation; tests run against an
//! in-memory fake with the same contract, so no process is spawned in unit
//! tests.

use crate::core::error::Result;
use serde::{Deserialize, Serialize};

/// Address family the backend operates on.
///
/// Threaded explicitly into the backend constructor; there is no ambient
/// family state anywhere in the engine.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
pub enum AddressFamily {
    /// IPv4: `iptables`, default ipset family
    #[default]
    #[strum(serialize = "inet")]
    Inet,
    /// IPv6: `ip6tables`, ipset `family inet6`
    #[strum(serialize = "inet6")]
    Inet6,
}

impl AddressFamily {
    /// Rule-table executable for this family
    pub const fn iptables_exec(self) -> &'static str {
        match self {
            AddressFamily::Inet => "iptables",
            AddressFamily::Inet6 => "ip6tables",
        }
    }

    /// Trailing modifier for `ipset create`, empty for IPv4
    pub const fn ipset_modifier(self) -> &'static str {
        match self {
            AddressFamily::Inet => "",
            AddressFamily::Inet6 => "family inet6",
        }
    }
}

/// One entry of a live chain listing: 1-based position plus the rendered
/// rule text (which may carry an identity annotation in a comment clause).
/// Produced fresh each run; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservedRule {
    pub position: u64,
    pub text: String,
}

/// Primitive operations over the target packet-filter subsystem.
///
/// Mutating operations return `Err(CommandFailed)` on a non-zero status;
/// the caller decides whether that is fatal (it never is during rule or
/// member sync). Listing operations fail hard, since reconciliation cannot
/// proceed without a snapshot of observed state.
///
/// The engine is single-threaded and dispatches generically, so the futures
/// need no `Send` bound.
#[allow(async_fn_in_trait)]
pub trait FilterBackend {
    /// Lists a chain's rules in evaluation order with 1-based positions
    async fn list_chain(&mut self, table: &str, chain: &str) -> Result<Vec<ObservedRule>>;

    /// Inserts a rule so it ends up at `position` (1-based) in the chain
    async fn insert_rule_at(
        &mut self,
        table: &str,
        chain: &str,
        position: u64,
        rule_text: &str,
    ) -> Result<()>;

    /// Deletes the rule at `position` (1-based); higher positions shift down
    async fn delete_rule_at(&mut self, table: &str, chain: &str, position: u64) -> Result<()>;

    async fn chain_exists(&mut self, table: &str, chain: &str) -> Result<bool>;

    async fn flush_chain(&mut self, table: &str, chain: &str) -> Result<()>;

    async fn create_chain(&mut self, table: &str, chain: &str) -> Result<()>;

    /// Flushes every chain of the table
    async fn flush_table(&mut self, table: &str) -> Result<()>;

    /// Deletes all user-defined chains of the table
    async fn destroy_extra_chains(&mut self, table: &str) -> Result<()>;

    async fn set_exists(&mut self, name: &str) -> Result<bool>;

    async fn create_set(&mut self, name: &str, element_type: &str) -> Result<()>;

    async fn destroy_set(&mut self, name: &str) -> Result<()>;

    /// Lists a set's members as rendered by the subsystem (normalized form)
    async fn list_set_members(&mut self, name: &str) -> Result<Vec<String>>;

    async fn add_member(&mut self, name: &str, member: &str) -> Result<()>;

    async fn remove_member(&mut self, name: &str, member: &str) -> Result<()>;
}
