/*!
 * Context Manager
 * Owns every user-created context of one PE
 */

use super::types::{Context, ContextOptions, Team};
use crate::core::errors::ShmemError;
use crate::core::types::{ContextId, ShmemResult};
use ahash::RandomState;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::thread::{self, ThreadId};
use tracing::debug;

/// Bookkeeping for one live context
#[derive(Debug, Clone)]
pub struct ContextEntry {
    pub team: Team,
    pub options: ContextOptions,
    creator: ThreadId,
}

impl ContextEntry {
    pub fn created_by_current_thread(&self) -> bool {
        self.creator == thread::current().id()
    }
}

pub struct ContextManager {
    contexts: DashMap<ContextId, ContextEntry, RandomState>,
    next_id: AtomicU32,
    // Free IDs for recycling (prevents ID exhaustion)
    free_ids: Mutex<Vec<ContextId>>,
    world: Team,
    max_contexts: usize,
}

impl ContextManager {
    pub fn new(world: Team, max_contexts: usize) -> Self {
        Self {
            contexts: DashMap::with_hasher(RandomState::new()),
            next_id: AtomicU32::new(1),
            free_ids: Mutex::new(Vec::new()),
            world,
            max_contexts,
        }
    }

    pub fn world(&self) -> &Team {
        &self.world
    }

    /// Create a context bound to `team` (world team when `None`)
    pub fn create(&self, options: ContextOptions, team: Option<Team>) -> ShmemResult<Context> {
        let live = self.contexts.len();
        if live >= self.max_contexts {
            return Err(ShmemError::ContextLimit(live));
        }

        let team = team.unwrap_or(self.world);
        let id = match self.free_ids.lock().pop() {
            Some(recycled) => recycled,
            None => self.next_id.fetch_add(1, Ordering::SeqCst),
        };

        self.contexts.insert(
            id,
            ContextEntry {
                team,
                options,
                creator: thread::current().id(),
            },
        );

        debug!(ctx = id, team = team.id(), ?options, "context created");
        Ok(Context::from_id(id))
    }

    /// Destroy a context; only its creating thread may do so
    pub fn destroy(&self, ctx: Context) -> ShmemResult<()> {
        if ctx.is_default() {
            return Err(ShmemError::DefaultContext);
        }

        let entry = self
            .contexts
            .get(&ctx.id())
            .map(|e| e.value().clone())
            .ok_or(ShmemError::UnknownContext(ctx.id()))?;

        if !entry.created_by_current_thread() {
            return Err(ShmemError::WrongThread(ctx.id()));
        }

        self.contexts.remove(&ctx.id());
        self.free_ids.lock().push(ctx.id());

        debug!(ctx = ctx.id(), "context destroyed");
        Ok(())
    }

    /// Team of a live context; private contexts resolve only on their creator
    pub fn team_of(&self, ctx: Context) -> ShmemResult<Team> {
        if ctx.is_default() {
            return Ok(self.world);
        }

        let entry = self
            .contexts
            .get(&ctx.id())
            .ok_or(ShmemError::UnknownContext(ctx.id()))?;

        if entry.options.private && !entry.created_by_current_thread() {
            return Err(ShmemError::WrongThread(ctx.id()));
        }
        Ok(entry.team)
    }

    pub fn get(&self, ctx: Context) -> Option<ContextEntry> {
        self.contexts.get(&ctx.id()).map(|e| e.value().clone())
    }

    pub fn contains(&self, ctx: Context) -> bool {
        ctx.is_default() || self.contexts.contains_key(&ctx.id())
    }

    /// Number of live user contexts
    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }

    /// Ids of every live user context
    pub fn ids(&self) -> Vec<ContextId> {
        self.contexts.iter().map(|e| *e.key()).collect()
    }
}
