use std::sync::Arc;
use tokio::sync::broadcast;

use super::types::SiteEvent;

/// In-process event bus backed by `tokio::broadcast`.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: Arc<broadcast::Sender<SiteEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Publish to all current subscribers. Returns how many received it;
    /// having no subscribers is not an error.
    pub fn publish(&self, event: SiteEvent) -> usize {
        match self.sender.send(event) {
            Ok(delivered) => delivered,
            Err(_) => {
                tracing::trace!("event dropped, no subscribers");
                0
            }
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SiteEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::types::PageSavedEvent;
    use chrono::Utc;
    use uuid::Uuid;

    fn saved(site_id: Uuid) -> SiteEvent {
        SiteEvent::PageSaved(PageSavedEvent {
            site_id,
            slug: "home".to_string(),
            previous_version: Some("1.0".to_string()),
            migrated: true,
            section_count: 3,
            timestamp: Utc::now(),
        })
    }

    #[tokio::test]
    async fn page_saved_reaches_every_subscriber() {
        let bus = EventBus::new(16);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        let site_id = Uuid::new_v4();
        assert_eq!(bus.publish(saved(site_id)), 2);

        for rx in [&mut rx1, &mut rx2] {
            let SiteEvent::PageSaved(event) = rx.recv().await.unwrap();
            assert_eq!(event.site_id, site_id);
            assert_eq!(event.slug, "home");
        }
    }

    #[test]
    fn publish_without_subscribers_is_fine() {
        let bus = EventBus::default();
        assert_eq!(bus.publish(saved(Uuid::new_v4())), 0);
    }

    #[test]
    fn serializes_with_type_tag() {
        let value = serde_json::to_value(saved(Uuid::nil())).unwrap();
        assert_eq!(value["type"], "pageSaved");
        assert_eq!(value["sectionCount"], 3);
        assert_eq!(value["previousVersion"], "1.0");
    }
}
