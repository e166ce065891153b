//! Stable content identity for firewall rules
//!
//! A rule's identity is the SHA-256 of its exact desired text. When a rule is
//! inserted into the kernel it carries that digest in a trailing match-comment
//! clause, so a later run can recognize "the same logical rule" in the live
//! listing regardless of its position. Observed rules without a parseable
//! annotation get a run-local unmatchable marker instead: they can never be
//! mistaken for a desired rule and are always removed unless re-declared.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// JSON key carried inside the annotation comment
const ANNOTATION_KEY: &str = "rule_hash";

/// Identity of one rule, comparable across runs
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RuleIdentity {
    /// Content hash of the desired rule text (or one extracted from a live
    /// rule's annotation)
    Tagged(String),
    /// Observed rule with no recognizable annotation. The payload is the
    /// rule's 1-based listing position, which makes each marker distinct
    /// within a single listing; a marker never equals any `Tagged` value,
    /// so untagged rules are always classified as foreign.
    Untagged(u64),
}

impl RuleIdentity {
    /// Computes the identity of a desired rule: SHA-256 over the exact bytes,
    /// no canonicalization.
    pub fn of(text: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        RuleIdentity::Tagged(format!("{:x}", hasher.finalize()))
    }

    /// Recovers the identity embedded in a live rule's rendered text.
    ///
    /// iptables renders comments as `/* ... */`, but the annotation is
    /// accepted anywhere in the line: we scan for the `{"rule_hash": ...}`
    /// object itself and parse it with serde. Absence or any parse failure
    /// degrades to `Untagged(position)`, never an error.
    pub fn extract(rendered: &str, position: u64) -> Self {
        parse_annotation(rendered)
            .map_or(RuleIdentity::Untagged(position), RuleIdentity::Tagged)
    }

    /// Returns the hex digest for tagged identities
    pub fn digest(&self) -> Option<&str> {
        match self {
            RuleIdentity::Tagged(hash) => Some(hash),
            RuleIdentity::Untagged(_) => None,
        }
    }
}

/// Annotation record as embedded in the rule comment
#[derive(Debug, Serialize, Deserialize)]
struct Annotation {
    rule_hash: String,
}

fn parse_annotation(rendered: &str) -> Option<String> {
    let key_pattern = format!("{{\"{ANNOTATION_KEY}\"");
    let start = rendered.find(&key_pattern)?;
    let end = rendered[start..].find('}')? + start + 1;
    let annotation: Annotation = serde_json::from_str(&rendered[start..end]).ok()?;
    Some(annotation.rule_hash)
}

/// Appends the identity annotation to a rule text, producing the exact form
/// handed to the insert operation:
/// `<rule> -m comment --comment '{"rule_hash":"<hex>"}'`
///
/// The single quotes are shell-level quoting; the kernel stores and later
/// renders only the JSON object between them.
pub fn annotate(rule_text: &str, identity: &RuleIdentity) -> String {
    let hash = identity.digest().unwrap_or_default();
    format!("{rule_text} -m comment --comment '{{\"{ANNOTATION_KEY}\":\"{hash}\"}}'")
}
