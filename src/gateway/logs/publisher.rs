use async_trait::async_trait;
use tracing::info;
use crate::core::events::CirculationEvent;
use crate::core::library::LibraryError;
use crate::gateway::events::EventPublisher;

// LogPublisher writes each notification decision as a structured log line;
// an external delivery pipeline tails these in deployments.
#[derive(Debug, Default)]
pub struct LogPublisher {}

impl LogPublisher {
    pub fn new() -> Self {
        Self {}
    }
}

#[async_trait]
impl EventPublisher for LogPublisher {
    async fn publish(&self, event: &CirculationEvent) -> Result<(), LibraryError> {
        info!(
            kind = %event.kind,
            key = event.key.as_str(),
            book_id = event.book_id.as_str(),
            user_id = event.user_id.as_str(),
            "circulation event"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use crate::core::events::{CirculationEvent, CirculationEventKind};
    use crate::gateway::events::EventPublisher;
    use crate::gateway::logs::publisher::LogPublisher;

    #[tokio::test]
    async fn test_should_publish_to_log() {
        let data = HashMap::from([("a", 1)]);
        let event = CirculationEvent::new(
            CirculationEventKind::BookReturned, "loan1", "book1", "user1", &data).expect("build event");
        let publisher = LogPublisher::new();
        publisher.publish(&event).await.expect("should publish");
    }
}
