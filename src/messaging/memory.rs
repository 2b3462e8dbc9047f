//! In-process event channel
//!
//! Mirrors the delivery contract of the Kafka backend closely enough to run
//! the whole pipeline without a broker: every subscription on a topic shares
//! one queue (consumer-group semantics), a message taken but not acknowledged
//! goes back to the queue when nacked or when its stream is dropped.
//!
//! Each topic also keeps the most recent published messages for inspection;
//! older entries are evicted once `history_limit` is reached.

use crate::messaging::error::{MessagingError, MessagingResult};
use crate::messaging::events::ReceivedMessage;
use crate::messaging::traits::{MessageConsumer, MessageProducer, MessageStream};
use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// Published messages retained per topic unless configured otherwise
pub const DEFAULT_HISTORY_LIMIT: usize = 1024;

#[derive(Default)]
struct History {
    recent: VecDeque<ReceivedMessage>,
    next_offset: i64,
}

#[derive(Default)]
struct TopicQueue {
    queue: Mutex<VecDeque<ReceivedMessage>>,
    history: Mutex<History>,
    notify: Notify,
    acked: AtomicUsize,
}

/// In-process channel acting as both producer and consumer factory
#[derive(Clone)]
pub struct InMemoryChannel {
    topics: Arc<DashMap<String, Arc<TopicQueue>>>,
    closed: Arc<AtomicBool>,
    history_limit: usize,
}

impl Default for InMemoryChannel {
    fn default() -> Self {
        Self {
            topics: Arc::new(DashMap::new()),
            closed: Arc::new(AtomicBool::new(false)),
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

impl InMemoryChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep at most `limit` published messages per topic for `published`
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    fn topic(&self, name: &str) -> Arc<TopicQueue> {
        self.topics
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(TopicQueue::default()))
            .clone()
    }

    /// Stop accepting messages; idle streams return `None` once drained
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        for entry in self.topics.iter() {
            entry.value().notify.notify_waiters();
        }
    }

    /// Messages waiting for delivery on a topic
    pub fn pending(&self, topic: &str) -> usize {
        self.topic(topic).queue.lock().len()
    }

    /// Messages acknowledged on a topic
    pub fn acked(&self, topic: &str) -> usize {
        self.topic(topic).acked.load(Ordering::SeqCst)
    }

    /// Most recent messages published to a topic, in publish order
    pub fn published(&self, topic: &str) -> Vec<ReceivedMessage> {
        self.topic(topic).history.lock().recent.iter().cloned().collect()
    }
}

#[async_trait]
impl MessageProducer for InMemoryChannel {
    async fn publish(&self, topic: &str, key: &str, payload: &[u8]) -> MessagingResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(MessagingError::PublishFailed("channel is closed".to_string()));
        }

        let queue = self.topic(topic);
        {
            let mut history = queue.history.lock();
            let message = ReceivedMessage {
                topic: topic.to_string(),
                partition: 0,
                offset: history.next_offset,
                key: Some(key.to_string()),
                payload: payload.to_vec(),
            };
            history.next_offset += 1;

            if self.history_limit > 0 {
                if history.recent.len() == self.history_limit {
                    history.recent.pop_front();
                }
                history.recent.push_back(message.clone());
            }
            queue.queue.lock().push_back(message);
        }
        queue.notify.notify_one();
        Ok(())
    }
}

#[async_trait]
impl MessageConsumer for InMemoryChannel {
    async fn subscribe(&self, topic: &str) -> MessagingResult<Box<dyn MessageStream>> {
        Ok(Box::new(InMemoryStream {
            queue: self.topic(topic),
            closed: self.closed.clone(),
            in_flight: None,
        }))
    }
}

/// A group member reading from an in-process topic
pub struct InMemoryStream {
    queue: Arc<TopicQueue>,
    closed: Arc<AtomicBool>,
    in_flight: Option<ReceivedMessage>,
}

impl InMemoryStream {
    fn requeue(&mut self) {
        if let Some(message) = self.in_flight.take() {
            self.queue.queue.lock().push_front(message);
            self.queue.notify.notify_one();
        }
    }
}

#[async_trait]
impl MessageStream for InMemoryStream {
    async fn next(&mut self) -> MessagingResult<Option<ReceivedMessage>> {
        // A message fetched but never acked is redelivered
        self.requeue();

        loop {
            let notified = self.queue.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let popped = self.queue.queue.lock().pop_front();
            if let Some(message) = popped {
                self.in_flight = Some(message.clone());
                return Ok(Some(message));
            }

            if self.closed.load(Ordering::SeqCst) {
                return Ok(None);
            }

            notified.await;
        }
    }

    async fn ack(&mut self, message: &ReceivedMessage) -> MessagingResult<()> {
        match &self.in_flight {
            Some(current) if current.offset == message.offset => {
                self.in_flight = None;
                self.queue.acked.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
            _ => Err(MessagingError::CommitFailed(format!(
                "offset {} is not in flight on this stream",
                message.offset
            ))),
        }
    }

    async fn nack(&mut self, message: &ReceivedMessage) -> MessagingResult<()> {
        match &self.in_flight {
            Some(current) if current.offset == message.offset => {
                self.requeue();
                Ok(())
            }
            _ => Err(MessagingError::ConsumeFailed(format!(
                "offset {} is not in flight on this stream",
                message.offset
            ))),
        }
    }
}

impl Drop for InMemoryStream {
    fn drop(&mut self) {
        self.requeue();
    }
}
