/*!
 * World Launcher
 *
 * Starts one thread per PE over a shared [`LocalFabric`], hands each a
 * freshly initialized [`Pe`], and finalizes every PE once its body returns.
 * Results are collected in PE order.
 */

use super::pe::Pe;
use crate::core::config::ShmemConfig;
use crate::core::types::ShmemResult;
use crate::monitoring::pe_span;
use crate::transport::LocalFabric;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use tracing::info;

pub struct World {
    config: Arc<ShmemConfig>,
    fabric: Arc<LocalFabric>,
}

impl World {
    pub fn new(config: ShmemConfig) -> ShmemResult<Self> {
        config.validate()?;
        let fabric = LocalFabric::new(&config);
        info!(
            n_pes = config.n_pes,
            symmetric_size = config.symmetric_size,
            delivery = ?config.delivery,
            "world created"
        );
        Ok(Self {
            config: Arc::new(config),
            fabric,
        })
    }

    /// World configured from `SHMEM_*` environment variables
    pub fn from_env() -> ShmemResult<Self> {
        Self::new(ShmemConfig::from_env()?)
    }

    pub fn config(&self) -> &ShmemConfig {
        &self.config
    }

    pub fn n_pes(&self) -> usize {
        self.config.n_pes
    }

    /// Shared fabric, for inspecting partitions after a run
    pub fn fabric(&self) -> &Arc<LocalFabric> {
        &self.fabric
    }

    /// Run `body` on every PE and return the results indexed by PE
    ///
    /// Each PE is finalized after its body returns, so puts issued inside the
    /// body are visible once `run` returns. A panicking body still joins the
    /// finalize barrier before the panic is propagated.
    pub fn run<F, R>(&self, body: F) -> Vec<R>
    where
        F: Fn(&Pe) -> R + Sync,
        R: Send,
    {
        let body = &body;
        let results = thread::scope(|scope| {
            let handles: Vec<_> = (0..self.config.n_pes)
                .map(|rank| {
                    let transport = Arc::new(self.fabric.transport(rank));
                    let config = Arc::clone(&self.config);
                    scope.spawn(move || {
                        let _span = pe_span(rank, config.n_pes).entered();
                        let pe = Pe::init(transport, config);
                        let outcome = panic::catch_unwind(AssertUnwindSafe(|| body(&pe)));
                        pe.finalize();
                        outcome
                    })
                })
                .collect();

            handles
                .into_iter()
                .map(|handle| match handle.join() {
                    Ok(Ok(value)) => value,
                    Ok(Err(payload)) | Err(payload) => panic::resume_unwind(payload),
                })
                .collect::<Vec<_>>()
        });

        info!(n_pes = self.config.n_pes, "world finalized");
        results
    }
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("config", &self.config)
            .field("fabric", &self.fabric)
            .finish()
    }
}
