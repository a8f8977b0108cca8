use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use tracr_protocols::payload::TraceroutePayload;

use super::ResultSink;
use crate::error::PublishError;

/// Keeps every accepted payload in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    payloads: Mutex<Vec<TraceroutePayload>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn payloads(&self) -> Vec<TraceroutePayload> {
        self.payloads
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.payloads.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ResultSink for MemorySink {
    async fn submit(&self, payload: &TraceroutePayload) -> Result<(), PublishError> {
        self.payloads
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(payload.clone());
        Ok(())
    }
}
