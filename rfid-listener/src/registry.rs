//! Active listeners, at most one per notification channel

use crate::channel::NotificationChannel;
use crate::listener::{ListenerSettings, NotificationListener};
use rfid_core::{ReaderEvent, RfidResult};
use std::collections::HashMap;
use std::net::SocketAddr;
use tokio::sync::broadcast;

/// Keeps track of the running notification listeners
///
/// Subscribing an already active channel replaces its listener.
/// Subscribing or unsubscribing `All` also stops the `Alarm` and `Event`
/// listeners, so no frame is published twice.
pub struct SubscriptionRegistry {
    settings: ListenerSettings,
    events: broadcast::Sender<ReaderEvent>,
    listeners: HashMap<NotificationChannel, NotificationListener>,
}

impl SubscriptionRegistry {
    /// Listeners created by this registry publish on `events`
    pub fn new(settings: ListenerSettings, events: broadcast::Sender<ReaderEvent>) -> Self {
        Self {
            settings,
            events,
            listeners: HashMap::new(),
        }
    }

    /// Start a listener for `channel` on `address`
    ///
    /// Returns the bound address, which carries the real port when `address`
    /// asks for port 0.
    pub async fn subscribe(
        &mut self,
        channel: NotificationChannel,
        address: SocketAddr,
        ack: bool,
    ) -> RfidResult<SocketAddr> {
        if self.stop(channel).await {
            log::debug!("replacing active listeners covered by {}", channel);
        }

        let settings = self.settings.clone().with_ack(ack);
        let listener =
            NotificationListener::bind(channel, address, settings, self.events.clone()).await?;
        let local_addr = listener.local_addr();
        self.listeners.insert(channel, listener);
        Ok(local_addr)
    }

    /// Stop the listener of `channel`; returns whether any listener ran
    pub async fn unsubscribe(&mut self, channel: NotificationChannel) -> bool {
        self.stop(channel).await
    }

    async fn stop(&mut self, channel: NotificationChannel) -> bool {
        let mut stopped = false;
        for ch in channel.expand() {
            if let Some(listener) = self.listeners.remove(ch) {
                listener.stop().await;
                stopped = true;
            }
        }
        stopped
    }

    pub fn is_active(&self, channel: NotificationChannel) -> bool {
        self.listeners.contains_key(&channel)
    }

    pub fn local_addr(&self, channel: NotificationChannel) -> Option<SocketAddr> {
        self.listeners.get(&channel).map(|l| l.local_addr())
    }

    /// Stop every listener
    pub async fn stop_all(&mut self) {
        for (_, listener) in self.listeners.drain() {
            listener.stop().await;
        }
    }
}
