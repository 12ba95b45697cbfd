use std::fmt;

use async_trait::async_trait;
use tinct_model::SettingRecord;
use tokio::sync::broadcast;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tracing::warn;

use crate::error::Result;
use crate::ports::{ChangeBus, ChangeEvent, SettingChangeStream};

pub const DEFAULT_CAPACITY: usize = 256;

/// Fans accepted writes out to every engine in this process.
pub struct InProcChangeBus {
    sender: broadcast::Sender<SettingRecord>,
    capacity: usize,
}

impl fmt::Debug for InProcChangeBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InProcChangeBus")
            .field("capacity", &self.capacity)
            .field("subscribers", &self.sender.receiver_count())
            .finish()
    }
}

impl Default for InProcChangeBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl InProcChangeBus {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (sender, _) = broadcast::channel(capacity);
        Self { sender, capacity }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[async_trait]
impl ChangeBus for InProcChangeBus {
    async fn publish(&self, record: &SettingRecord) -> Result<()> {
        // No subscribers is not an error.
        let _ = self.sender.send(record.clone());
        Ok(())
    }

    async fn subscribe(&self) -> Result<SettingChangeStream> {
        let stream = BroadcastStream::new(self.sender.subscribe()).map(|item| match item {
            Ok(record) => ChangeEvent::Changed(record),
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                warn!(skipped, "settings change subscriber lagged; requesting resync");
                ChangeEvent::Resync
            }
        });
        Ok(Box::pin(stream))
    }
}
