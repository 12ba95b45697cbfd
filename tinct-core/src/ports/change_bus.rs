use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use tinct_model::SettingRecord;

use crate::error::Result;

/// What a bus delivers. Every variant is a hint: the engine re-reads the
/// store before touching its snapshot, so late or reordered deliveries
/// cannot roll a setting back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent {
    /// A write accepted by some session, with the value it carried.
    Changed(SettingRecord),
    /// A write to `setting_name` whose value the transport did not carry.
    Touched { setting_name: String },
    /// Deliveries may have been missed (reconnect, lagging receiver).
    Resync,
}

/// Stream of change events, possibly including this session's own writes.
///
/// Dropping the stream is the unsubscribe: adapters stop their background
/// delivery once the receiving side is gone.
pub type SettingChangeStream = Pin<Box<dyn Stream<Item = ChangeEvent> + Send>>;

/// Cross-session fan-out of accepted setting writes.
///
/// Delivery is at-least-once, so consumers must tolerate duplicates. An
/// adapter that loses its transport keeps the stream open, reconnects, and
/// yields [`ChangeEvent::Resync`] once it is listening again.
#[async_trait]
pub trait ChangeBus: Send + Sync {
    /// Announce a write the store has already acknowledged.
    ///
    /// Buses fed by the store itself (database triggers) treat this as a
    /// no-op.
    async fn publish(&self, record: &SettingRecord) -> Result<()>;

    async fn subscribe(&self) -> Result<SettingChangeStream>;
}
