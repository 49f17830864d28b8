use async_trait::async_trait;
use crate::core::events::CirculationEvent;
use crate::core::library::LibraryError;

// The engine decides when to notify; implementations decide how. Publish
// results are advisory and never roll back the command that emitted them.
#[async_trait]
pub trait EventPublisher: Sync + Send {
    async fn publish(&self, event: &CirculationEvent) -> Result<(), LibraryError>;
}
