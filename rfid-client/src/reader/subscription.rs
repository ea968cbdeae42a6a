//! Subscriptions to reports and alarms

use super::{wire_bool, RfReader};
use rfid_codec::ParamNode;
use rfid_core::{RfidError, RfidResult};
use rfid_listener::NotificationChannel;
use std::net::{IpAddr, SocketAddr};

impl RfReader {
    /// Ask the reader to deliver `channel` data
    ///
    /// With an `address` a local listener is bound there first and the
    /// reader is told to push to it; the address must be reachable from
    /// the reader. Port 0 binds any free port, and the port actually bound
    /// is the one announced and returned. Without an address any listener
    /// of the channel is stopped and the reader sends its data on the
    /// command connection.
    ///
    /// `ack` acknowledges every frame received by the listener.
    /// [`RfReader::listener_address`] gives the configured push port.
    pub async fn subscribe(
        &mut self,
        channel: NotificationChannel,
        address: Option<SocketAddr>,
        buffer_tags: bool,
        ack: bool,
    ) -> RfidResult<Option<SocketAddr>> {
        if !self.is_connected() {
            return Err(RfidError::NoConnection(
                "subscribe needs a connected reader".to_string(),
            ));
        }

        let mut params = vec![ParamNode::leaf("type", channel)];
        let bound = match address {
            Some(address) => {
                let bound = self.subscriptions.subscribe(channel, address, ack).await?;
                params.push(ParamNode::leaf("iPAddress", address.ip()));
                params.push(ParamNode::leaf("port", bound.port()));
                Some(bound)
            }
            None => {
                self.subscriptions.unsubscribe(channel).await;
                None
            }
        };
        params.push(ParamNode::leaf("bufferTag", wire_bool(buffer_tags)));

        if let Err(e) = self.run("subscribe", params).await {
            if bound.is_some() {
                self.subscriptions.unsubscribe(channel).await;
            }
            return Err(e);
        }
        if let Some(bound) = bound {
            log::info!("subscribed to {} data on {}", channel, bound);
        }
        Ok(bound)
    }

    /// Stop delivery of `channel` data
    ///
    /// The local listener is stopped even when the reader cannot be told.
    pub async fn unsubscribe(&mut self, channel: NotificationChannel) -> RfidResult<()> {
        if self.subscriptions.unsubscribe(channel).await {
            log::debug!("stopped {} listener", channel);
        }
        if !self.is_connected() {
            return Err(RfidError::NoConnection(
                "unsubscribe needs a connected reader".to_string(),
            ));
        }
        self.run("unsubscribe", vec![ParamNode::leaf("type", channel)])
            .await?;
        Ok(())
    }

    /// `ip` with the configured `listener_port`, for [`RfReader::subscribe`]
    pub fn listener_address(&self, ip: IpAddr) -> SocketAddr {
        SocketAddr::new(ip, self.config().listener_port)
    }

    /// Whether a local listener runs for `channel`
    pub fn is_subscribed(&self, channel: NotificationChannel) -> bool {
        self.subscriptions.is_active(channel)
    }
}
