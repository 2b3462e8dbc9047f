//! Messaging trait abstractions

use crate::messaging::error::MessagingResult;
use crate::messaging::events::ReceivedMessage;
use async_trait::async_trait;

/// Message producer trait
#[async_trait]
pub trait MessageProducer: Send + Sync {
    /// Publish a keyed message to a topic
    async fn publish(&self, topic: &str, key: &str, payload: &[u8]) -> MessagingResult<()>;

    /// Flush and close the producer
    async fn close(&self) -> MessagingResult<()> {
        Ok(())
    }
}

/// Message consumer trait
#[async_trait]
pub trait MessageConsumer: Send + Sync {
    /// Join the consumer group as a new member subscribed to `topic`.
    ///
    /// Each returned stream is an independent group member, so calling this
    /// once per worker fans deliveries out across workers.
    async fn subscribe(&self, topic: &str) -> MessagingResult<Box<dyn MessageStream>>;
}

/// Message stream trait for consuming messages
#[async_trait]
pub trait MessageStream: Send {
    /// Get the next message from the stream; `None` once the channel is closed
    async fn next(&mut self) -> MessagingResult<Option<ReceivedMessage>>;

    /// Acknowledge message processing (commit its offset)
    async fn ack(&mut self, message: &ReceivedMessage) -> MessagingResult<()>;

    /// Negative acknowledge (make the message deliverable again)
    async fn nack(&mut self, message: &ReceivedMessage) -> MessagingResult<()>;
}
