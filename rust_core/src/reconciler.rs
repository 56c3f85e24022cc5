//! Live status message reconciliation
//!
//! Keeps one message per destination chat in step with the latest report by
//! editing it in place. A message deleted remotely is recreated. Message ids
//! are persisted so a restart keeps editing the same messages.
//!
//! Per destination:
//! - `Unset`: no message known yet, the next sync sends one
//! - `Sent`: a message exists but its content is not known to match
//! - `Synced`: the message shows the last synced report

use crate::clients::{ChatApi, ChatError};
use crate::models::{Destination, MessageId};
use crate::storage::MessageIdStore;
use log::{debug, error, info, warn};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryState {
    Unset,
    Sent(MessageId),
    Synced(MessageId),
}

impl DeliveryState {
    pub fn message_id(&self) -> Option<MessageId> {
        match self {
            Self::Unset => None,
            Self::Sent(id) | Self::Synced(id) => Some(*id),
        }
    }
}

#[derive(Debug, Clone)]
struct Slot {
    destination: Destination,
    state: DeliveryState,
}

/// Counters for one `sync` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub sent: u32,
    pub edited: u32,
    pub recreated: u32,
    pub failed: u32,
    /// Nothing to do: report unchanged and every destination synced.
    pub unchanged: bool,
}

pub struct MessageReconciler<C> {
    chat: C,
    store: MessageIdStore,
    slots: Vec<Slot>,
    last_report: Option<String>,
}

impl<C: ChatApi> MessageReconciler<C> {
    /// Load persisted message ids for `destinations`. Known ids start as
    /// `Sent` since their current text is unknown.
    pub fn new(chat: C, store: MessageIdStore, destinations: Vec<Destination>) -> Self {
        let persisted = store.load();
        let slots = destinations
            .into_iter()
            .map(|destination| {
                let state = match persisted.get(&destination.chat_id) {
                    Some(id) => DeliveryState::Sent(*id),
                    None => DeliveryState::Unset,
                };
                Slot { destination, state }
            })
            .collect();

        Self {
            chat,
            store,
            slots,
            last_report: None,
        }
    }

    pub fn chat(&self) -> &C {
        &self.chat
    }

    pub fn last_report(&self) -> Option<&str> {
        self.last_report.as_deref()
    }

    pub fn state(&self, chat_id: &str) -> Option<DeliveryState> {
        self.slots
            .iter()
            .find(|s| s.destination.chat_id == chat_id)
            .map(|s| s.state)
    }

    /// Bring every destination's message to `report`.
    pub async fn sync(&mut self, report: &str) -> SyncSummary {
        let mut summary = SyncSummary::default();
        let changed = self.last_report.as_deref() != Some(report);

        if !changed && self.slots.iter().all(|s| matches!(s.state, DeliveryState::Synced(_))) {
            summary.unchanged = true;
            return summary;
        }

        for slot in &mut self.slots {
            if !changed && matches!(slot.state, DeliveryState::Synced(_)) {
                continue;
            }
            slot.state = deliver(&self.chat, &slot.destination, slot.state, report, &mut summary).await;
        }

        self.persist();
        self.last_report = Some(report.to_string());
        summary
    }

    fn persist(&self) {
        let ids: BTreeMap<String, MessageId> = self
            .slots
            .iter()
            .filter_map(|s| s.state.message_id().map(|id| (s.destination.chat_id.clone(), id)))
            .collect();

        if let Err(e) = self.store.save(&ids) {
            error!("Failed to persist message ids: {:#}", e);
        }
    }
}

/// One destination's transition for this cycle.
async fn deliver<C: ChatApi>(
    chat: &C,
    destination: &Destination,
    state: DeliveryState,
    report: &str,
    summary: &mut SyncSummary,
) -> DeliveryState {
    let message_id = match state {
        DeliveryState::Unset => {
            return match chat.send_message(destination, report).await {
                Ok(id) => {
                    info!("Posted status message {} to {}", id, destination.chat_id);
                    summary.sent += 1;
                    DeliveryState::Synced(id)
                }
                Err(e) => {
                    warn!("Failed to post status message to {}: {}", destination.chat_id, e);
                    summary.failed += 1;
                    DeliveryState::Unset
                }
            };
        }
        DeliveryState::Sent(id) | DeliveryState::Synced(id) => id,
    };

    match chat.edit_message(destination, message_id, report).await {
        Ok(()) => {
            debug!("Edited message {} in {}", message_id, destination.chat_id);
            summary.edited += 1;
            DeliveryState::Synced(message_id)
        }
        Err(ChatError::MessageNotFound(_)) => {
            info!(
                "Message {} vanished from {}; recreating",
                message_id, destination.chat_id
            );
            match chat.send_message(destination, report).await {
                Ok(id) => {
                    summary.recreated += 1;
                    DeliveryState::Synced(id)
                }
                Err(e) => {
                    warn!("Failed to recreate status message in {}: {}", destination.chat_id, e);
                    summary.failed += 1;
                    DeliveryState::Sent(message_id)
                }
            }
        }
        Err(e) => {
            warn!(
                "Failed to edit message {} in {}: {}",
                message_id, destination.chat_id, e
            );
            summary.failed += 1;
            DeliveryState::Sent(message_id)
        }
    }
}
