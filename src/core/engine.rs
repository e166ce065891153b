//! Task orchestration
//!
//! Executes a declared task list strictly in order, dispatching each task
//! kind to the ordered reconciler, the set reconciler, or a direct init
//! sequence against the backend. No operation result feeds back into a later
//! decision within the run; convergence after partial failure comes from
//! re-running, not from retries.

use crate::config::Task;
use crate::core::backend::FilterBackend;
use crate::core::error::{Error, Result, operation_diagnostic};
use crate::core::{chain, set};
use tracing::info;

/// Reports a failed primitive and lets the init script continue with its
/// remaining operations
fn report(result: Result<()>) {
    if let Err(err) = result {
        operation_diagnostic(&err).emit();
    }
}

/// Flushes a table and deletes its user-defined chains. Destructive and
/// unconditional: each primitive's failure is reported as a diagnostic and
/// the next primitive is still issued.
pub async fn init_table<B: FilterBackend>(backend: &mut B, table: &str) -> Result<()> {
    report(backend.flush_table(table).await);
    report(backend.destroy_extra_chains(table).await);
    Ok(())
}

/// Flushes the chain if it exists, otherwise creates it empty.
///
/// The existence probe failing is a task error; a failed flush or create is
/// reported and the run moves on.
pub async fn init_chain<B: FilterBackend>(backend: &mut B, table: &str, chain: &str) -> Result<()> {
    if backend.chain_exists(table, chain).await? {
        report(backend.flush_chain(table, chain).await);
    } else {
        report(backend.create_chain(table, chain).await);
    }
    Ok(())
}

/// Destroys the set if it exists, then recreates it empty.
///
/// Always a full reset rather than a diff: a set's element type cannot be
/// changed in place, so the only safe way to honor a declared type is to
/// start over. A failed destroy is reported and the create is still
/// attempted (it then fails too on a live subsystem, producing its own
/// diagnostic).
pub async fn init_set<B: FilterBackend>(
    backend: &mut B,
    name: &str,
    element_type: &str,
) -> Result<()> {
    if backend.set_exists(name).await? {
        report(backend.destroy_set(name).await);
    }
    report(backend.create_set(name, element_type).await);
    Ok(())
}

/// Runs every task in declared order; within a task, `var_list` entries run
/// in declared order.
///
/// Individual failed mutations inside a sync or init have already been
/// reported as diagnostics and never surface here. An entry-level failure
/// (listing failure, bad member, failed existence probe) is likewise
/// reported and the run continues with the remaining entries; only the
/// aggregate outcome is returned, so a partially failed run still walks the
/// whole task list and re-running converges.
pub async fn run<B: FilterBackend>(backend: &mut B, tasks: &[Task]) -> Result<()> {
    let mut failed = 0usize;
    let mut check = |result: Result<()>| {
        if let Err(err) = result {
            operation_diagnostic(&err).emit();
            failed += 1;
        }
    };

    for task in tasks {
        match task {
            Task::InitTable(vars) => {
                for var in vars {
                    info!("init_table {}", var.table);
                    check(init_table(backend, &var.table).await);
                }
            }
            Task::InitChain(vars) => {
                for var in vars {
                    info!("init_chain {}/{}", var.table, var.chain);
                    check(init_chain(backend, &var.table, &var.chain).await);
                }
            }
            Task::InitSet(vars) => {
                for var in vars {
                    info!("init_set {} ({})", var.set, var.element_type);
                    check(init_set(backend, &var.set, &var.element_type).await);
                }
            }
            Task::SyncRules(vars) => {
                for var in vars {
                    info!(
                        "sync_rules {}/{} ({} desired)",
                        var.table,
                        var.chain,
                        var.rule_list.len()
                    );
                    check(chain::sync_rules(backend, &var.table, &var.chain, &var.rule_list).await);
                }
            }
            Task::SyncMembers(vars) => {
                for var in vars {
                    info!("sync_members {} ({} desired)", var.set, var.member_list.len());
                    check(set::sync_members(backend, &var.set, &var.member_list).await);
                }
            }
        }
    }

    if failed == 0 {
        Ok(())
    } else {
        Err(Error::TasksFailed(failed))
    }
}
