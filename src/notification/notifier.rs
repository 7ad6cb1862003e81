use std::sync::Arc;

use tokio::sync::broadcast;
use uuid::Uuid;

use crate::{
    message::{Message, MessageResponse},
    state::NotifierKind,
    websocket::ConnectionManager,
};

/// Pushes a freshly stored message towards its receiver.
///
/// Delivery is best-effort: implementations must return promptly, must not
/// fail the send that triggered them, and only hand the message off by
/// channel sends. Persisted history stays authoritative.
pub trait Notifier: Send + Sync {
    fn notify(&self, receiver_id: Uuid, message: &Message);
}

/// A message addressed to one receiver, as published on the in-process channel.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub receiver_id: Uuid,
    pub message: MessageResponse,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, _receiver_id: Uuid, _message: &Message) {}
}

/// Publishes deliveries on a broadcast channel; subscribers (the SSE
/// stream) filter by receiver.
#[derive(Clone)]
pub struct ChannelNotifier {
    tx: broadcast::Sender<Delivery>,
}

impl ChannelNotifier {
    pub fn new(tx: broadcast::Sender<Delivery>) -> Self {
        Self { tx }
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, receiver_id: Uuid, message: &Message) {
        let delivery = Delivery {
            receiver_id,
            message: MessageResponse::from(message),
        };

        if self.tx.send(delivery).is_err() {
            tracing::debug!("No stream subscribers for message {}", message.id);
        }
    }
}

#[derive(Clone, Default)]
pub struct FanoutNotifier {
    notifiers: Vec<Arc<dyn Notifier>>,
}

impl FanoutNotifier {
    pub fn new(notifiers: Vec<Arc<dyn Notifier>>) -> Self {
        Self { notifiers }
    }
}

impl Notifier for FanoutNotifier {
    fn notify(&self, receiver_id: Uuid, message: &Message) {
        for notifier in &self.notifiers {
            notifier.notify(receiver_id, message);
        }
    }
}

pub fn build_notifier(
    kind: NotifierKind,
    ws_connections: &ConnectionManager,
    message_tx: &broadcast::Sender<Delivery>,
) -> Arc<dyn Notifier> {
    match kind {
        NotifierKind::None => Arc::new(NoopNotifier),
        NotifierKind::WebSocket => Arc::new(ws_connections.clone()),
        NotifierKind::Channel => Arc::new(ChannelNotifier::new(message_tx.clone())),
        NotifierKind::Fanout => Arc::new(FanoutNotifier::new(vec![
            Arc::new(ws_connections.clone()),
            Arc::new(ChannelNotifier::new(message_tx.clone())),
        ])),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample_message() -> Message {
        Message {
            id: Uuid::new_v4(),
            seq: 1,
            conversation_id: Uuid::new_v4(),
            sender_id: Uuid::new_v4(),
            body: "hi".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_channel_notifier_publishes_delivery() {
        let (tx, mut rx) = broadcast::channel(8);
        let notifier = ChannelNotifier::new(tx);
        let receiver_id = Uuid::new_v4();
        let message = sample_message();

        notifier.notify(receiver_id, &message);

        let delivery = rx.try_recv().unwrap();
        assert_eq!(delivery.receiver_id, receiver_id);
        assert_eq!(delivery.message.id, message.id);
    }

    #[test]
    fn test_channel_notifier_without_subscribers_does_not_panic() {
        let (tx, rx) = broadcast::channel(8);
        drop(rx);
        ChannelNotifier::new(tx).notify(Uuid::new_v4(), &sample_message());
    }

    #[test]
    fn test_fanout_reaches_every_notifier() {
        let (tx_a, mut rx_a) = broadcast::channel(8);
        let (tx_b, mut rx_b) = broadcast::channel(8);
        let fanout = FanoutNotifier::new(vec![
            Arc::new(ChannelNotifier::new(tx_a)),
            Arc::new(NoopNotifier),
            Arc::new(ChannelNotifier::new(tx_b)),
        ]);

        fanout.notify(Uuid::new_v4(), &sample_message());

        assert!(rx_a.try_recv().is_ok());
        assert!(rx_b.try_recv().is_ok());
    }

    #[test]
    fn test_build_notifier_none_is_silent() {
        let (tx, mut rx) = broadcast::channel(8);
        let notifier = build_notifier(NotifierKind::None, &ConnectionManager::new(), &tx);

        notifier.notify(Uuid::new_v4(), &sample_message());
        assert!(rx.try_recv().is_err());
    }
}
