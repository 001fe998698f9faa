/*!
 * Shmem Sync Demo
 *
 * Runs a small workload on every PE of an in-process world:
 * - a shared counter on PE 0 incremented under the distributed lock
 * - a ring of flags signalled with put + quiet and awaited with wait_until
 *
 * Configured through SHMEM_* environment variables (SHMEM_NPES defaults to 4
 * here). Prints the merged lock/wait counters as JSON.
 */

use anyhow::{ensure, Context as _, Result};
use shmem_sync::{init_tracing, CmpOp, ShmemConfig, SyncStatsSnapshot, World};
use tracing::info;

const ROUNDS: u64 = 100;

fn main() -> Result<()> {
    init_tracing();

    let mut config = ShmemConfig::from_env().context("reading SHMEM_* configuration")?;
    if std::env::var_os("SHMEM_NPES").is_none() {
        config.n_pes = 4;
    }
    let world = World::new(config).context("creating world")?;
    let n_pes = world.n_pes();

    info!(n_pes, rounds = ROUNDS, "starting demo");

    let reports = world.run(|pe| -> Result<(u64, SyncStatsSnapshot)> {
        let lock = pe.alloc_lock()?;
        let counter = pe.alloc::<u64>()?;
        let flag = pe.alloc::<i32>()?;
        pe.barrier_all();

        for _ in 0..ROUNDS {
            let _held = pe.acquire(&lock);
            let value = pe.get_value(counter, 0);
            pe.put_value(counter, value + 1, 0);
            pe.quiet();
        }

        // ring: each PE signals its right neighbour, then waits on its own flag
        let right = (pe.my_pe() + 1) % pe.n_pes();
        pe.put_value(flag, pe.my_pe() as i32 + 1, right);
        pe.quiet();
        let left = (pe.my_pe() + pe.n_pes() - 1) % pe.n_pes();
        pe.wait_until(flag, CmpOp::Eq, left as i32 + 1);

        pe.barrier_all();
        Ok((pe.get_value(counter, 0), pe.stats()))
    });

    let mut total = SyncStatsSnapshot::default();
    for (rank, report) in reports.into_iter().enumerate() {
        let (counter, stats) = report.with_context(|| format!("PE {rank} failed"))?;
        ensure!(
            counter == ROUNDS * n_pes as u64,
            "PE {rank} saw counter {counter}, expected {}",
            ROUNDS * n_pes as u64
        );
        total.merge(&stats);
    }

    info!(
        acquisitions = total.acquisitions(),
        handoffs = total.release_handoff,
        "demo complete"
    );
    println!("{}", serde_json::to_string_pretty(&total)?);
    Ok(())
}
