//! Orchestration event log.
//!
//! A bounded, append-only record of what the orchestrator did, in the form of
//! chat messages the UI can render. When the log is full the oldest entry is
//! evicted. Appends are also broadcast to live subscribers (the SSE endpoint).

use std::collections::VecDeque;
use std::sync::RwLock;

use tokio::sync::broadcast;

use crate::models::{ChatMessage, ChatMessageType, ChatMetadata};

const BROADCAST_CAPACITY: usize = 256;

pub struct ChatLog {
    capacity: usize,
    messages: RwLock<VecDeque<ChatMessage>>,
    tx: broadcast::Sender<ChatMessage>,
}

impl ChatLog {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            capacity: capacity.max(1),
            messages: RwLock::new(VecDeque::new()),
            tx,
        }
    }

    /// Append a message and return the stored copy (with id and timestamp).
    pub fn append(
        &self,
        message_type: ChatMessageType,
        content: impl Into<String>,
        metadata: Option<ChatMetadata>,
    ) -> ChatMessage {
        let message = ChatMessage::new(message_type, content, metadata);
        {
            let mut messages = self.messages.write().unwrap_or_else(|e| e.into_inner());
            while messages.len() >= self.capacity {
                messages.pop_front();
            }
            messages.push_back(message.clone());
        }
        // No receivers is fine; the log itself is the source of truth.
        let _ = self.tx.send(message.clone());
        message
    }

    pub fn get_all(&self) -> Vec<ChatMessage> {
        self.read().iter().cloned().collect()
    }

    pub fn get_by_workflow(&self, workflow_id: &str) -> Vec<ChatMessage> {
        self.read()
            .iter()
            .filter(|m| m.workflow_id() == Some(workflow_id))
            .cloned()
            .collect()
    }

    pub fn clear(&self) {
        self.messages
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChatMessage> {
        self.tx.subscribe()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, VecDeque<ChatMessage>> {
        self.messages.read().unwrap_or_else(|e| e.into_inner())
    }
}
