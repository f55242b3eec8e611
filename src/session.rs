use std::collections::HashSet;
use std::sync::Arc;

use futures::future::join_all;
use tracing::{info, warn};
use ulid::Ulid;

use crate::error::SlotError;
use crate::limits::MAX_BLOCKS_PER_SESSION;
use crate::model::*;
use crate::notify::NotifyHub;
use crate::reconciler::{Providers, Reconciler, ReconcilerContext};

/// A bulk-create form: several independent slot selections that share the
/// same providers and availability cache.
pub struct BookingSession {
    providers: Providers,
    hub: Arc<NotifyHub>,
    base: ReconcilerContext,
    blocks: Vec<Reconciler>,
}

impl BookingSession {
    pub fn new(base: ReconcilerContext, providers: Providers, hub: Arc<NotifyHub>) -> Self {
        Self {
            providers,
            hub,
            base,
            blocks: Vec::new(),
        }
    }

    /// Add a block on the session's base context.
    pub fn add_block(&mut self) -> Result<FormId, SlotError> {
        self.add_block_with(self.base.clone())
    }

    /// Add a block with its own context (e.g. a different room or date).
    pub fn add_block_with(&mut self, ctx: ReconcilerContext) -> Result<FormId, SlotError> {
        if self.blocks.len() >= MAX_BLOCKS_PER_SESSION {
            return Err(SlotError::LimitExceeded("too many blocks in session"));
        }
        let id = Ulid::new();
        let block = Reconciler::new(id, ctx, self.providers.clone())?.with_notify(self.hub.clone());
        self.blocks.push(block);
        info!("session: block {id} added ({} total)", self.blocks.len());
        Ok(id)
    }

    pub fn remove_block(&mut self, id: &FormId) -> bool {
        let Some(pos) = self.blocks.iter().position(|b| b.id() == *id) else {
            return false;
        };
        self.blocks.remove(pos);
        self.hub.remove(id);
        true
    }

    pub fn block(&self, id: &FormId) -> Option<&Reconciler> {
        self.blocks.iter().find(|b| b.id() == *id)
    }

    pub fn block_mut(&mut self, id: &FormId) -> Option<&mut Reconciler> {
        self.blocks.iter_mut().find(|b| b.id() == *id)
    }

    pub fn blocks(&self) -> &[Reconciler] {
        &self.blocks
    }

    /// Load every distinct resource-day once, concurrently, then refresh all
    /// blocks. Failed days turn closed. A block whose providers reject its
    /// context keeps its previous view. The first error, load or refresh, is
    /// returned after every block has been attempted.
    pub async fn reload_all(&mut self, force: bool) -> Result<(), SlotError> {
        let mut seen = HashSet::new();
        let keys: Vec<DayKey> = self
            .blocks
            .iter()
            .map(|b| b.context().day_key())
            .filter(|k| seen.insert(*k))
            .collect();

        let index = &self.providers.index;
        let results = join_all(keys.into_iter().map(|key| index.load(key, force))).await;

        let mut first_err = None;
        for result in results {
            if let Err(e) = result {
                warn!("session: availability load failed: {e}");
                first_err.get_or_insert(e);
            }
        }
        for block in &mut self.blocks {
            let refreshed = block.refresh().map(|_| ());
            if let Err(e) = refreshed {
                warn!("session: block {} refresh failed: {e}", block.id());
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    /// Every block's booked slot. Blocks on the same resource-day must not
    /// overlap each other.
    pub fn submissions(&self) -> Result<Vec<(ResourceId, BookedSlot)>, SlotError> {
        let mut out: Vec<(ResourceId, BookedSlot)> = Vec::with_capacity(self.blocks.len());
        for block in &self.blocks {
            let slot = block.submission()?;
            let resource = block.context().resource;
            let span = Span::new(slot.start, slot.end);
            let clash = out.iter().any(|(r, other)| {
                *r == resource
                    && other.date == slot.date
                    && Span::new(other.start, other.end).overlaps(&span)
            });
            if clash {
                return Err(SlotError::NotSubmittable("blocks overlap each other"));
            }
            out.push((resource, slot));
        }
        Ok(out)
    }
}
