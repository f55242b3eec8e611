use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::broadcast;

use crate::model::{FormId, SlotSelection};
use crate::reconciler::{Domains, Warnings};

/// What a rendering layer needs to redraw after a reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SlotNotice {
    DomainsChanged(Domains),
    SelectionChanged(SlotSelection),
    WarningsChanged(Warnings),
}

/// Broadcast hub for slot notices per open form.
pub struct NotifyHub {
    channels: DashMap<FormId, broadcast::Sender<SlotNotice>>,
    capacity: usize,
}

impl NotifyHub {
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: DashMap::new(),
            capacity: capacity.max(1),
        }
    }

    /// Subscribe to notices for a form. Creates the channel if needed.
    pub fn subscribe(&self, form: FormId) -> broadcast::Receiver<SlotNotice> {
        let sender = self
            .channels
            .entry(form)
            .or_insert_with(|| broadcast::channel(self.capacity).0);
        sender.subscribe()
    }

    /// Send a notice. No-op if nobody is listening.
    pub fn send(&self, form: FormId, notice: SlotNotice) {
        if let Some(sender) = self.channels.get(&form) {
            let _ = sender.send(notice);
        }
    }

    /// Drop a form's channel (form closed or booking submitted).
    pub fn remove(&self, form: &FormId) {
        self.channels.remove(form);
    }
}
