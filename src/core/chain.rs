//! Ordered chain reconciliation
//!
//! Turns an observed chain listing and a desired rule list into the minimal
//! positional edit script: `|old| - |common|` deletions plus
//! `|new| - |common|` insertions, where `common` is the LCS of the two
//! identity sequences. Rules on the common subsequence are never touched, so
//! their packet/byte counters survive the run.

use crate::core::align::lcs;
use crate::core::backend::FilterBackend;
use crate::core::error::{Result, operation_diagnostic};
use crate::core::identity::{RuleIdentity, annotate};
use tracing::debug;

/// Reconciles one chain to exactly match `desired`, in order.
///
/// Listing failure aborts the task; each failed delete or insert is reported
/// as a diagnostic and the remaining script continues. Nothing is retried or
/// rolled back; idempotent re-invocation is the recovery path.
pub async fn sync_rules<B: FilterBackend>(
    backend: &mut B,
    table: &str,
    chain: &str,
    desired: &[String],
) -> Result<()> {
    let observed = backend.list_chain(table, chain).await?;

    let old_ids: Vec<RuleIdentity> = observed
        .iter()
        .map(|rule| RuleIdentity::extract(&rule.text, rule.position))
        .collect();
    let new_ids: Vec<RuleIdentity> = desired
        .iter()
        .map(|text| RuleIdentity::of(text))
        .collect();

    let common = lcs(&old_ids, &new_ids);
    debug!(
        "chain {table}/{chain}: {} observed, {} desired, {} common",
        old_ids.len(),
        new_ids.len(),
        common.len()
    );

    // Deletion pass, last position first so earlier positions stay valid as
    // the chain renumbers underneath us. `common` is consumed per occurrence
    // from its tail, which keeps duplicate identities honest: each common
    // slot excuses exactly one physical rule.
    let mut unconsumed = common.len();
    for (ix, id) in old_ids.iter().enumerate().rev() {
        if unconsumed > 0 && common[unconsumed - 1] == *id {
            unconsumed -= 1;
            continue;
        }
        let position = ix as u64 + 1;
        if let Err(err) = backend.delete_rule_at(table, chain, position).await {
            operation_diagnostic(&err).emit();
        }
    }

    // Insertion pass, also back to front. The cursor starts one past the
    // surviving rules; a common rule consumes a slot, a new rule is inserted
    // at the cursor and the cursor stays put (the next, lower insertion
    // pushes it down into place).
    let mut cursor = common.len() as u64 + 1;
    let mut consumed = common.len();
    for (id, text) in new_ids.iter().zip(desired).rev() {
        if consumed > 0 && common[consumed - 1] == *id {
            consumed -= 1;
            cursor -= 1;
            continue;
        }
        let annotated = annotate(text, id);
        if let Err(err) = backend.insert_rule_at(table, chain, cursor, &annotated).await {
            operation_diagnostic(&err).emit();
        }
    }

    Ok(())
}
