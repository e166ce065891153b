//! Production backend over the iptables and ipset command-line tools
//!
//! Rule texts in the task list are pre-tokenized iptables argument fragments
//! (`-p tcp --dport 22 -j ACCEPT`), so commands are assembled as strings and
//! executed through `sh -c`. Listing output is decoded with small
//! line-oriented parsers; everything else is exit-status plumbing.

use crate::core::backend::{AddressFamily, FilterBackend, ObservedRule};
use crate::core::error::{Error, Result};
use std::process::Output;
use tracing::debug;

/// Number of header lines before the first rule in
/// `iptables -L <chain> -vn --line-number` output
const CHAIN_HEADER_LINES: usize = 2;

/// Shells out to `iptables`/`ip6tables` and `ipset` for one address family.
///
/// The family is fixed at construction; nothing in the engine consults
/// ambient state to decide which executable to run.
#[derive(Debug, Clone)]
pub struct IptablesBackend {
    family: AddressFamily,
    echo_commands: bool,
}

impl IptablesBackend {
    pub fn new(family: AddressFamily) -> Self {
        Self {
            family,
            echo_commands: false,
        }
    }

    /// Echoes every command at debug level before executing it
    pub fn with_command_echo(mut self, echo: bool) -> Self {
        self.echo_commands = echo;
        self
    }

    const fn iptables(&self) -> &'static str {
        self.family.iptables_exec()
    }

    async fn run(&self, command: &str) -> Result<Output> {
        if self.echo_commands {
            debug!("exec: {command}");
        }
        let output = tokio::process::Command::new("sh")
            .arg("-c")
            .arg(command)
            .output()
            .await?;
        Ok(output)
    }

    /// Runs a command where a non-zero exit is an operation failure
    async fn run_checked(&self, command: &str) -> Result<Output> {
        let output = self.run(command).await?;
        if output.status.success() {
            Ok(output)
        } else {
            Err(Error::CommandFailed {
                command: command.to_string(),
                exit_code: output.status.code().unwrap_or(-1),
                stderr: Some(String::from_utf8_lossy(&output.stderr).trim().to_string())
                    .filter(|s| !s.is_empty()),
            })
        }
    }

    /// Runs a probe command where a non-zero exit means "does not exist"
    async fn probe(&self, command: &str) -> Result<bool> {
        Ok(self.run(command).await?.status.success())
    }
}

/// Decodes `iptables -L <chain> -vn --line-number` output into ordered
/// observed rules.
///
/// The first two lines are the chain header and the column header; every
/// following non-empty line is one rule. Positions are assigned from the
/// running index, which matches the leading line-number column for any
/// well-formed listing.
fn parse_chain_listing(stdout: &str) -> Vec<ObservedRule> {
    stdout
        .lines()
        .skip(CHAIN_HEADER_LINES)
        .filter(|line| !line.trim().is_empty())
        .enumerate()
        .map(|(ix, line)| ObservedRule {
            position: ix as u64 + 1,
            text: line.to_string(),
        })
        .collect()
}

/// Decodes `ipset list <name>` output into member strings.
///
/// Members follow the `Members:` header line; a listing without that header
/// is malformed and fails the task (set sync has no degraded mode).
fn parse_set_listing(name: &str, stdout: &str) -> Result<Vec<String>> {
    let mut lines = stdout.lines();
    lines
        .by_ref()
        .find(|line| line.trim() == "Members:")
        .ok_or_else(|| Error::listing(name, "no 'Members:' section in ipset output"))?;
    Ok(lines
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect())
}

impl FilterBackend for IptablesBackend {
    async fn list_chain(&mut self, table: &str, chain: &str) -> Result<Vec<ObservedRule>> {
        let cmd = format!(
            "{} -t {table} -L {chain} -vn --line-number",
            self.iptables()
        );
        let output = self.run_checked(&cmd).await?;
        Ok(parse_chain_listing(&String::from_utf8_lossy(&output.stdout)))
    }

    async fn insert_rule_at(
        &mut self,
        table: &str,
        chain: &str,
        position: u64,
        rule_text: &str,
    ) -> Result<()> {
        let cmd = format!(
            "{} -t {table} -I {chain} {position} {rule_text}",
            self.iptables()
        );
        self.run_checked(&cmd).await.map(drop)
    }

    async fn delete_rule_at(&mut self, table: &str, chain: &str, position: u64) -> Result<()> {
        let cmd = format!("{} -t {table} -D {chain} {position}", self.iptables());
        self.run_checked(&cmd).await.map(drop)
    }

    async fn chain_exists(&mut self, table: &str, chain: &str) -> Result<bool> {
        let cmd = format!("{} -t {table} -L {chain} -vn", self.iptables());
        self.probe(&cmd).await
    }

    async fn flush_chain(&mut self, table: &str, chain: &str) -> Result<()> {
        let cmd = format!("{} -t {table} -F {chain}", self.iptables());
        self.run_checked(&cmd).await.map(drop)
    }

    async fn create_chain(&mut self, table: &str, chain: &str) -> Result<()> {
        let cmd = format!("{} -t {table} -N {chain}", self.iptables());
        self.run_checked(&cmd).await.map(drop)
    }

    async fn flush_table(&mut self, table: &str) -> Result<()> {
        let cmd = format!("{} -t {table} -F", self.iptables());
        self.run_checked(&cmd).await.map(drop)
    }

    async fn destroy_extra_chains(&mut self, table: &str) -> Result<()> {
        let cmd = format!("{} -t {table} -X", self.iptables());
        self.run_checked(&cmd).await.map(drop)
    }

    async fn set_exists(&mut self, name: &str) -> Result<bool> {
        self.probe(&format!("ipset list {name}")).await
    }

    async fn create_set(&mut self, name: &str, element_type: &str) -> Result<()> {
        let modifier = self.family.ipset_modifier();
        let cmd = if modifier.is_empty() {
            format!("ipset create {name} {element_type}")
        } else {
            format!("ipset create {name} {element_type} {modifier}")
        };
        self.run_checked(&cmd).await.map(drop)
    }

    async fn destroy_set(&mut self, name: &str) -> Result<()> {
        self.run_checked(&format!("ipset destroy {name}")).await.map(drop)
    }

    async fn list_set_members(&mut self, name: &str) -> Result<Vec<String>> {
        let output = self.run_checked(&format!("ipset list {name}")).await?;
        parse_set_listing(name, &String::from_utf8_lossy(&output.stdout))
    }

    async fn add_member(&mut self, name: &str, member: &str) -> Result<()> {
        self.run_checked(&format!("ipset add {name} {member}")).await.map(drop)
    }

    async fn remove_member(&mut self, name: &str, member: &str) -> Result<()> {
        self.run_checked(&format!("ipset del {name} {member}")).await.map(drop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::identity::RuleIdentity;

    const SAMPLE_CHAIN_LISTING: &str = "\
Chain input_custom (1 references)
num   pkts bytes target     prot opt in     out     source               destination
1        0     0 ACCEPT     tcp  --  *      *       0.0.0.0/0            0.0.0.0/0            tcp dpt:22 /* {\"rule_hash\":\"aa11\"} */
2        0     0 DROP       all  --  *      *       10.0.0.0/8           0.0.0.0/0
";

    const SAMPLE_SET_LISTING: &str = "\
Name: blocklist
Type: hash:net
Revision: 7
Header: family inet hashsize 1024 maxelem 65536 bucketsize 12 initval 0x1c0f3f23
Size in memory: 504
References: 1
Number of entries: 2
Members:
10.0.0.1
192.168.0.0/16
";

    #[test]
    fn test_parse_chain_listing_positions_and_text() {
        let rules = parse_chain_listing(SAMPLE_CHAIN_LISTING);
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].position, 1);
        assert_eq!(rules[1].position, 2);
        assert!(rules[0].text.contains("dpt:22"));
    }

    #[test]
    fn test_parse_chain_listing_annotation_roundtrip() {
        let rules = parse_chain_listing(SAMPLE_CHAIN_LISTING);
        assert_eq!(
            RuleIdentity::extract(&rules[0].text, rules[0].position),
            RuleIdentity::Tagged("aa11".to_string())
        );
        assert_eq!(
            RuleIdentity::extract(&rules[1].text, rules[1].position),
            RuleIdentity::Untagged(2)
        );
    }

    #[test]
    fn test_parse_chain_listing_empty_chain() {
        let listing = "Chain input_custom (1 references)\n\
             num   pkts bytes target     prot opt in     out     source               destination\n";
        assert!(parse_chain_listing(listing).is_empty());
    }

    #[test]
    fn test_parse_set_listing_members() {
        let members = parse_set_listing("blocklist", SAMPLE_SET_LISTING).unwrap();
        assert_eq!(members, vec!["10.0.0.1", "192.168.0.0/16"]);
    }

    #[test]
    fn test_parse_set_listing_empty_members() {
        let listing = "Name: empty\nType: hash:ip\nMembers:\n";
        assert!(parse_set_listing("empty", listing).unwrap().is_empty());
    }

    #[test]
    fn test_parse_set_listing_missing_header_is_fatal() {
        let err = parse_set_listing("broken", "garbage output\n").unwrap_err();
        assert!(matches!(err, Error::ListingParse { .. }));
    }
}
