use async_trait::async_trait;

use crate::domain::user::events::UserCreatedEvent;
use crate::domain::user::events::UserDeletedEvent;
use crate::domain::user::events::UserEvent;
use crate::domain::user::events::UserUpdatedEvent;
use crate::outbound::messaging::bus::Bus;
use crate::outbound::messaging::messages::UserEventMessage;
use crate::outbound::messaging::transport::BusTransport;
use crate::user::errors::EventPublisherError;
use crate::user::ports::EventPublisher;

/// Publishes user domain events fire-and-forget over the message bus.
pub struct BusEventPublisher<T>
where
    T: BusTransport,
{
    bus: Bus<T>,
}

impl<T> BusEventPublisher<T>
where
    T: BusTransport,
{
    pub fn new(bus: Bus<T>) -> Self {
        Self { bus }
    }

    fn publish(&self, event: UserEvent) -> Result<(), EventPublisherError> {
        let message = serde_json::to_value(UserEventMessage::from(&event))
            .map_err(|e| EventPublisherError::SerializationFailed(e.to_string()))?;

        tracing::debug!(
            pattern = event.pattern(),
            event_id = event.event_id(),
            user_id = event.user_id(),
            "Publishing user event"
        );

        self.bus.publish(event.pattern(), &message);

        Ok(())
    }
}

#[async_trait]
impl<T> EventPublisher for BusEventPublisher<T>
where
    T: BusTransport,
{
    async fn publish_user_created(
        &self,
        event: &UserCreatedEvent,
    ) -> Result<(), EventPublisherError> {
        self.publish(event.clone().into())
    }

    async fn publish_user_updated(
        &self,
        event: &UserUpdatedEvent,
    ) -> Result<(), EventPublisherError> {
        self.publish(event.clone().into())
    }

    async fn publish_user_deleted(
        &self,
        event: &UserDeletedEvent,
    ) -> Result<(), EventPublisherError> {
        self.publish(event.clone().into())
    }
}
