//! Unordered set reconciliation
//!
//! Membership sync is plain set difference over normalized member strings:
//! add what is desired but absent, remove what is present but undeclared.
//! Normalization collapses differently-spelled but identical inputs
//! (`10.0.0.1/32` and `10.0.0.1`) to one canonical string, so equality is a
//! string match against what the subsystem renders in its listing.

use crate::core::backend::FilterBackend;
use crate::core::error::{Error, Result, operation_diagnostic};
use ipnetwork::IpNetwork;
use std::collections::HashSet;
use tracing::debug;

/// Canonical textual form of an address or network.
///
/// A prefix covering exactly one address renders as the bare address; any
/// other prefix renders as `network/prefix` with host bits masked off.
///
/// # Errors
///
/// Returns `Err` if the input parses as neither an address nor a network.
pub fn normalize_member(raw: &str) -> Result<String> {
    let net: IpNetwork = raw
        .trim()
        .parse()
        .map_err(|e: ipnetwork::IpNetworkError| Error::InvalidMember {
            member: raw.to_string(),
            message: e.to_string(),
        })?;

    let normalized = match net {
        IpNetwork::V4(n) if n.prefix() == 32 => n.ip().to_string(),
        IpNetwork::V6(n) if n.prefix() == 128 => n.ip().to_string(),
        IpNetwork::V4(n) => format!("{}/{}", n.network(), n.prefix()),
        IpNetwork::V6(n) => format!("{}/{}", n.network(), n.prefix()),
    };
    Ok(normalized)
}

/// Reconciles a set's membership to exactly the normalized desired members.
///
/// Listing and normalization failures abort the task (a set sync has no safe
/// degraded mode); each failed add or remove is reported as a diagnostic and
/// the remaining operations continue. Operation order is unspecified since
/// membership changes commute.
pub async fn sync_members<B: FilterBackend>(
    backend: &mut B,
    name: &str,
    desired: &[String],
) -> Result<()> {
    let observed: HashSet<String> = backend.list_set_members(name).await?.into_iter().collect();

    let mut wanted = HashSet::with_capacity(desired.len());
    for raw in desired {
        wanted.insert(normalize_member(raw)?);
    }

    debug!(
        "set {name}: {} observed, {} desired after normalization",
        observed.len(),
        wanted.len()
    );

    for member in wanted.difference(&observed) {
        if let Err(err) = backend.add_member(name, member).await {
            operation_diagnostic(&err).emit();
        }
    }
    for member in observed.difference(&wanted) {
        if let Err(err) = backend.remove_member(name, member).await {
            operation_diagnostic(&err).emit();
        }
    }

    Ok(())
}
