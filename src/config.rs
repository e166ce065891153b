//! Declarative task-list configuration
//!
//! The on-disk format is a JSON document with a single `task_list` array;
//! each entry carries a `type` tag and a `var_list` of per-operation
//! parameters. The five task kinds form a closed enum, so dispatch in the
//! engine is an exhaustive match rather than string comparison.
//!
//! ```json
//! {
//!   "task_list": [
//!     { "type": "init_set", "var_list": [ { "set": "blocklist", "type": "hash:net" } ] },
//!     { "type": "init_chain", "var_list": [ { "table": "filter", "chain": "input_custom" } ] },
//!     { "type": "sync_rules", "var_list": [ {
//!         "table": "filter", "chain": "input_custom",
//!         "rule_list": [ "-p tcp --dport 22 -j ACCEPT" ]
//!     } ] },
//!     { "type": "sync_members", "var_list": [ {
//!         "set": "blocklist", "member_list": [ "10.0.0.0/24" ]
//!     } ] }
//!   ]
//! }
//! ```

use crate::core::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Root of the configuration document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunConfig {
    pub task_list: Vec<Task>,
}

/// One declared task: a kind plus its ordered parameter entries
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "var_list", rename_all = "snake_case")]
pub enum Task {
    InitTable(Vec<InitTableVar>),
    InitChain(Vec<InitChainVar>),
    InitSet(Vec<InitSetVar>),
    SyncRules(Vec<SyncRulesVar>),
    SyncMembers(Vec<SyncMembersVar>),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InitTableVar {
    pub table: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InitChainVar {
    pub table: String,
    pub chain: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InitSetVar {
    pub set: String,
    /// ipset element type, e.g. `hash:ip` or `hash:net`
    #[serde(rename = "type")]
    pub element_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SyncRulesVar {
    pub table: String,
    pub chain: String,
    /// Desired rules in evaluation order; opaque iptables argument fragments
    pub rule_list: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SyncMembersVar {
    pub set: String,
    /// Desired members in any spelling; normalized before comparison
    pub member_list: Vec<String>,
}

/// Loads and parses the task-list configuration.
///
/// # Errors
///
/// Any read or parse failure is a fatal `Config` error: the run aborts
/// before issuing a single mutation.
pub async fn load_config(path: &Path) -> Result<RunConfig> {
    let json = tokio::fs::read_to_string(path).await.map_err(|e| {
        Error::config(format!(
            "Fail to load configuration file: {}: {e}",
            path.display()
        ))
    })?;
    serde_json::from_str(&json).map_err(|e| {
        Error::config(format!(
            "Fail to parse configuration file: {}: {e}",
            path.display()
        ))
    })
}
