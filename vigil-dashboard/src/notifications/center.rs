//! Bounded newest-first notification list with an unread counter

use std::collections::VecDeque;
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;
use vigil_common::events::{ChannelEvent, Priority};

use super::model::Notification;

/// Oldest entries are evicted past this length
pub const MAX_NOTIFICATIONS: usize = 50;

/// Low-priority notifications are removed this long after creation
pub const LOW_PRIORITY_TTL: Duration = Duration::from_secs(10);

/// Notification aggregator state
///
/// `unread` always equals the number of entries with `read == false`. Every
/// decrement saturates at zero.
#[derive(Debug, Clone)]
pub struct NotificationCenter {
    items: VecDeque<Notification>,
    unread: usize,
    capacity: usize,
    low_priority_ttl: Duration,
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self::with_limits(MAX_NOTIFICATIONS, LOW_PRIORITY_TTL)
    }

    pub fn with_limits(capacity: usize, low_priority_ttl: Duration) -> Self {
        Self {
            items: VecDeque::with_capacity(capacity),
            unread: 0,
            capacity: capacity.max(1),
            low_priority_ttl,
        }
    }

    /// Turn an inbound event into a notification at the head of the list
    ///
    /// Returns the stored notification, or `None` when the event does not
    /// notify.
    pub fn push_event(&mut self, event: &ChannelEvent, now: Instant) -> Option<Notification> {
        let notification = Notification::from_event(event)?;
        Some(self.push(notification, now))
    }

    pub fn push(&mut self, mut notification: Notification, now: Instant) -> Notification {
        if notification.priority == Priority::Low {
            notification.expires_at = Some(now + self.low_priority_ttl);
        }
        if !notification.read {
            self.unread += 1;
        }
        self.items.push_front(notification.clone());

        while self.items.len() > self.capacity {
            if let Some(evicted) = self.items.pop_back() {
                debug!("Notification list full, evicting {}", evicted.id);
                if !evicted.read {
                    self.unread = self.unread.saturating_sub(1);
                }
            }
        }
        notification
    }

    /// Mark one notification read; unknown or already-read ids change nothing
    pub fn mark_read(&mut self, id: &str) -> bool {
        match self.items.iter_mut().find(|n| n.id == id) {
            Some(n) if !n.read => {
                n.read = true;
                self.unread = self.unread.saturating_sub(1);
                true
            }
            _ => false,
        }
    }

    pub fn mark_all_read(&mut self) {
        for n in self.items.iter_mut() {
            n.read = true;
        }
        self.unread = 0;
    }

    /// Opening the panel acknowledges everything in it
    pub fn open_panel(&mut self) {
        self.mark_all_read();
    }

    /// Remove one notification; dismissing a missing id is a no-op
    pub fn dismiss(&mut self, id: &str) -> bool {
        match self.items.iter().position(|n| n.id == id) {
            Some(index) => {
                self.remove_at(index);
                true
            }
            None => false,
        }
    }

    pub fn clear_all(&mut self) {
        self.items.clear();
        self.unread = 0;
    }

    /// Remove every notification whose deadline is at or before `now`
    ///
    /// Returns how many were removed.
    pub fn expire_due(&mut self, now: Instant) -> usize {
        let before = self.items.len();
        let mut index = 0;
        while index < self.items.len() {
            if self.items[index].expires_at.is_some_and(|deadline| deadline <= now) {
                self.remove_at(index);
            } else {
                index += 1;
            }
        }
        before - self.items.len()
    }

    /// Earliest pending auto-dismiss deadline
    pub fn next_deadline(&self) -> Option<Instant> {
        self.items.iter().filter_map(|n| n.expires_at).min()
    }

    pub fn unread_count(&self) -> usize {
        self.unread
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Notification> {
        self.items.iter().find(|n| n.id == id)
    }

    /// Newest first
    pub fn iter(&self) -> impl Iterator<Item = &Notification> {
        self.items.iter()
    }

    pub fn to_vec(&self) -> Vec<Notification> {
        self.items.iter().cloned().collect()
    }

    fn remove_at(&mut self, index: usize) {
        if let Some(removed) = self.items.remove(index) {
            if !removed.read {
                self.unread = self.unread.saturating_sub(1);
            }
        }
    }
}
