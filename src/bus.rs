//! Notification bus and observer lists with explicit subscription handles.
//!
//! Subscribers get a mailbox per subscription. Publishing drops a copy of the
//! notification into every matching mailbox; the owner drains it with
//! [`NotificationBus::take`] and must hand the handle back through
//! [`NotificationBus::unsubscribe`] when it goes away.

use bevy::prelude::*;
use std::collections::BTreeMap;

use crate::grid::MapLocation;
use crate::model::{FleetId, TradeRouteId};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Notification {
    FleetRouteUpdated(FleetId),
    TradeRouteEstablished(TradeRouteId),
    TradeRouteCancelled(TradeRouteId),
    ScreenRefreshRequired,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum NotificationKind {
    FleetRouteUpdated,
    TradeRouteEstablished,
    TradeRouteCancelled,
    ScreenRefreshRequired,
}

impl Notification {
    pub fn kind(&self) -> NotificationKind {
        match self {
            Notification::FleetRouteUpdated(_) => NotificationKind::FleetRouteUpdated,
            Notification::TradeRouteEstablished(_) => NotificationKind::TradeRouteEstablished,
            Notification::TradeRouteCancelled(_) => NotificationKind::TradeRouteCancelled,
            Notification::ScreenRefreshRequired => NotificationKind::ScreenRefreshRequired,
        }
    }
}

/// Handle returned by [`NotificationBus::subscribe`]. Not `Clone`: exactly one
/// owner hands it back.
#[derive(Debug, Eq, PartialEq)]
pub struct Subscription {
    id: u64,
}

#[derive(Debug)]
struct Mailbox {
    kinds: Vec<NotificationKind>,
    pending: Vec<Notification>,
}

#[derive(Resource, Debug, Default)]
pub struct NotificationBus {
    next_id: u64,
    mailboxes: BTreeMap<u64, Mailbox>,
}

impl NotificationBus {
    pub fn subscribe(&mut self, kinds: &[NotificationKind]) -> Subscription {
        self.next_id += 1;
        self.mailboxes.insert(
            self.next_id,
            Mailbox {
                kinds: kinds.to_vec(),
                pending: Vec::new(),
            },
        );
        Subscription { id: self.next_id }
    }

    pub fn unsubscribe(&mut self, subscription: Subscription) {
        self.mailboxes.remove(&subscription.id);
    }

    pub fn publish(&mut self, notification: Notification) {
        let kind = notification.kind();
        for mailbox in self.mailboxes.values_mut() {
            if mailbox.kinds.contains(&kind) {
                mailbox.pending.push(notification);
            }
        }
    }

    /// Drains the notifications delivered to this subscription.
    pub fn take(&mut self, subscription: &Subscription) -> Vec<Notification> {
        self.mailboxes
            .get_mut(&subscription.id)
            .map(|mailbox| std::mem::take(&mut mailbox.pending))
            .unwrap_or_default()
    }

    pub fn subscriber_count(&self) -> usize {
        self.mailboxes.len()
    }
}

// =============================================================================
// Observers
// =============================================================================

#[derive(Debug, Eq, PartialEq)]
pub struct ObserverHandle {
    id: u64,
}

type SectorCallback = Box<dyn FnMut(Option<MapLocation>) + Send + Sync>;

/// Callbacks for a sector-valued property such as the hovered sector.
#[derive(Default)]
pub struct SectorObservers {
    next_id: u64,
    callbacks: Vec<(u64, SectorCallback)>,
}

impl SectorObservers {
    pub fn observe(
        &mut self,
        callback: impl FnMut(Option<MapLocation>) + Send + Sync + 'static,
    ) -> ObserverHandle {
        self.next_id += 1;
        self.callbacks.push((self.next_id, Box::new(callback)));
        ObserverHandle { id: self.next_id }
    }

    pub fn unobserve(&mut self, handle: ObserverHandle) -> bool {
        let before = self.callbacks.len();
        self.callbacks.retain(|(id, _)| *id != handle.id);
        self.callbacks.len() != before
    }

    pub fn notify(&mut self, value: Option<MapLocation>) {
        for (_, callback) in self.callbacks.iter_mut() {
            callback(value);
        }
    }

    pub fn clear(&mut self) {
        self.callbacks.clear();
    }

    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }
}

impl std::fmt::Debug for SectorObservers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SectorObservers")
            .field("count", &self.callbacks.len())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
