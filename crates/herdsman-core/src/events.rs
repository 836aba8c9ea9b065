//! Cluster event publication

use herdsman_api::{ClusterEvent, NodeSnapshot, NodeState};
use tokio::sync::broadcast;
use tracing::debug;

/// Fire-and-forget publisher of [`ClusterEvent`]s
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<ClusterEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Subscribe to future events
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ClusterEvent> {
        self.tx.subscribe()
    }

    /// Publish an event; having no subscribers is not an error
    pub fn publish(&self, event: ClusterEvent) {
        let _ = self.tx.send(event);
    }

    /// Publish a `NodeStateChanged` event
    pub fn node_state_changed(&self, node: NodeSnapshot, previous_state: NodeState) {
        debug!(node = %node.name, from = %previous_state, to = %node.state, "node state changed");
        self.publish(ClusterEvent::NodeStateChanged {
            node,
            previous_state,
        });
    }
}
