//! Shared test utilities for core module tests
//!
//! Provides an in-memory [`MemoryBackend`] implementing the full
//! [`FilterBackend`] contract, so reconciliation tests never spawn a process
//! or touch real kernel state. The backend records every mutation in an
//! operation log, which is what the minimality and idempotence tests assert
//! against, and can inject failures for specific operations.

use crate::core::backend::{FilterBackend, ObservedRule};
use crate::core::error::{Error, Result};
use std::collections::{HashMap, HashSet};

/// In-memory stand-in for the packet-filter subsystem.
///
/// Chains are ordered vectors of the exact texts handed to insert (the
/// "rendered" form seen by a later listing, annotation included); sets are
/// hash sets of member strings plus their element type.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    chains: HashMap<(String, String), Vec<String>>,
    sets: HashMap<String, (String, HashSet<String>)>,
    /// Every mutation in issue order, as a pseudo command line
    pub op_log: Vec<String>,
    /// Ops whose log line contains any of these substrings fail with a
    /// non-zero status instead of applying
    pub fail_on: Vec<String>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a chain with pre-existing rendered rule texts
    pub fn with_chain(mut self, table: &str, chain: &str, rules: &[&str]) -> Self {
        self.chains.insert(
            (table.to_string(), chain.to_string()),
            rules.iter().map(ToString::to_string).collect(),
        );
        self
    }

    /// Seeds a set with pre-existing members
    pub fn with_set(mut self, name: &str, element_type: &str, members: &[&str]) -> Self {
        self.sets.insert(
            name.to_string(),
            (
                element_type.to_string(),
                members.iter().map(ToString::to_string).collect(),
            ),
        );
        self
    }

    /// Current rule texts of a chain, in order
    pub fn chain_rules(&self, table: &str, chain: &str) -> Vec<String> {
        self.chains
            .get(&(table.to_string(), chain.to_string()))
            .cloned()
            .unwrap_or_default()
    }

    /// Current members of a set
    pub fn set_members(&self, name: &str) -> HashSet<String> {
        self.sets
            .get(name)
            .map(|(_, members)| members.clone())
            .unwrap_or_default()
    }

    pub fn set_element_type(&self, name: &str) -> Option<&str> {
        self.sets.get(name).map(|(ty, _)| ty.as_str())
    }

    /// Number of logged operations whose line contains `needle`
    pub fn ops_matching(&self, needle: &str) -> usize {
        self.op_log.iter().filter(|op| op.contains(needle)).count()
    }

    fn record(&mut self, op: String) -> Result<()> {
        if self.fail_on.iter().any(|pat| op.contains(pat)) {
            self.op_log.push(format!("FAILED {op}"));
            return Err(Error::CommandFailed {
                command: op,
                exit_code: 1,
                stderr: Some("injected failure".to_string()),
            });
        }
        self.op_log.push(op);
        Ok(())
    }

    fn chain_mut(&mut self, table: &str, chain: &str) -> Option<&mut Vec<String>> {
        self.chains.get_mut(&(table.to_string(), chain.to_string()))
    }
}

impl FilterBackend for MemoryBackend {
    async fn list_chain(&mut self, table: &str, chain: &str) -> Result<Vec<ObservedRule>> {
        Ok(self
            .chain_rules(table, chain)
            .into_iter()
            .enumerate()
            .map(|(ix, text)| ObservedRule {
                position: ix as u64 + 1,
                text,
            })
            .collect())
    }

    async fn insert_rule_at(
        &mut self,
        table: &str,
        chain: &str,
        position: u64,
        rule_text: &str,
    ) -> Result<()> {
        self.record(format!("insert {table}/{chain} {position} {rule_text}"))?;
        let rules = self
            .chain_mut(table, chain)
            .ok_or_else(|| Error::Internal(format!("no such chain {table}/{chain}")))?;
        let ix = (position as usize - 1).min(rules.len());
        rules.insert(ix, rule_text.to_string());
        Ok(())
    }

    async fn delete_rule_at(&mut self, table: &str, chain: &str, position: u64) -> Result<()> {
        self.record(format!("delete {table}/{chain} {position}"))?;
        let rules = self
            .chain_mut(table, chain)
            .ok_or_else(|| Error::Internal(format!("no such chain {table}/{chain}")))?;
        let ix = position as usize - 1;
        if ix >= rules.len() {
            return Err(Error::Internal(format!(
                "delete position {position} out of range for {table}/{chain}"
            )));
        }
        rules.remove(ix);
        Ok(())
    }

    async fn chain_exists(&mut self, table: &str, chain: &str) -> Result<bool> {
        Ok(self
            .chains
            .contains_key(&(table.to_string(), chain.to_string())))
    }

    async fn flush_chain(&mut self, table: &str, chain: &str) -> Result<()> {
        self.record(format!("flush-chain {table}/{chain}"))?;
        if let Some(rules) = self.chain_mut(table, chain) {
            rules.clear();
        }
        Ok(())
    }

    async fn create_chain(&mut self, table: &str, chain: &str) -> Result<()> {
        self.record(format!("create-chain {table}/{chain}"))?;
        self.chains
            .insert((table.to_string(), chain.to_string()), Vec::new());
        Ok(())
    }

    async fn flush_table(&mut self, table: &str) -> Result<()> {
        self.record(format!("flush-table {table}"))?;
        for ((t, _), rules) in &mut self.chains {
            if t == table {
                rules.clear();
            }
        }
        Ok(())
    }

    async fn destroy_extra_chains(&mut self, table: &str) -> Result<()> {
        self.record(format!("destroy-extra-chains {table}"))?;
        self.chains.retain(|(t, _), _| t != table);
        Ok(())
    }

    async fn set_exists(&mut self, name: &str) -> Result<bool> {
        Ok(self.sets.contains_key(name))
    }

    async fn create_set(&mut self, name: &str, element_type: &str) -> Result<()> {
        self.record(format!("create-set {name} {element_type}"))?;
        self.sets.insert(
            name.to_string(),
            (element_type.to_string(), HashSet::new()),
        );
        Ok(())
    }

    async fn destroy_set(&mut self, name: &str) -> Result<()> {
        self.record(format!("destroy-set {name}"))?;
        self.sets.remove(name);
        Ok(())
    }

    async fn list_set_members(&mut self, name: &str) -> Result<Vec<String>> {
        self.sets
            .get(name)
            .map(|(_, members)| members.iter().cloned().collect())
            .ok_or_else(|| Error::listing(name, "no such set"))
    }

    async fn add_member(&mut self, name: &str, member: &str) -> Result<()> {
        self.record(format!("add-member {name} {member}"))?;
        let (_, members) = self
            .sets
            .get_mut(name)
            .ok_or_else(|| Error::Internal(format!("no such set {name}")))?;
        members.insert(member.to_string());
        Ok(())
    }

    async fn remove_member(&mut self, name: &str, member: &str) -> Result<()> {
        self.record(format!("remove-member {name} {member}"))?;
        let (_, members) = self
            .sets
            .get_mut(name)
            .ok_or_else(|| Error::Internal(format!("no such set {name}")))?;
        members.remove(member);
        Ok(())
    }
}
