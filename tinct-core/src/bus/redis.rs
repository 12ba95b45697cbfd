use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use redis::AsyncCommands;
use redis::aio::{ConnectionManager, PubSub};
use tinct_model::SettingRecord;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, trace, warn};

use crate::error::{Result, ThemeError};
use crate::ports::{ChangeBus, ChangeEvent, SettingChangeStream};

const DEFAULT_CHANNEL_CAPACITY: usize = 256;
const RECONNECT_DELAY_MS: u64 = 500;

/// Redis pub/sub on a single channel. Every accepted write is published as
/// the JSON record.
///
/// A dropped pub/sub connection is re-opened in the background; messages
/// published in the meantime are lost, so the stream yields
/// [`ChangeEvent::Resync`] after each resubscribe.
#[derive(Clone)]
pub struct RedisChangeBus {
    client: redis::Client,
    conn: ConnectionManager,
    channel: String,
    channel_capacity: usize,
    reconnect_delay: Duration,
}

impl fmt::Debug for RedisChangeBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisChangeBus")
            .field("connection", &"ConnectionManager")
            .field("channel", &self.channel)
            .finish()
    }
}

impl RedisChangeBus {
    pub async fn connect_with_channel(redis_url: &str, channel: &str) -> Result<Self> {
        info!("Connecting to Redis change bus at {}", redis_url);

        let client = redis::Client::open(redis_url).map_err(|e| {
            ThemeError::BusUnavailable(format!("Failed to create Redis client: {e}"))
        })?;
        let conn = ConnectionManager::new(client.clone()).await.map_err(|e| {
            ThemeError::BusUnavailable(format!("Failed to connect to Redis: {e}"))
        })?;

        Ok(Self {
            client,
            conn,
            channel: channel.to_string(),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            reconnect_delay: Duration::from_millis(RECONNECT_DELAY_MS),
        })
    }

    /// Buffer between the pub/sub connection and a subscriber.
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }
}

async fn open_pubsub(client: &redis::Client, channel: &str) -> Result<PubSub> {
    let mut pubsub = client.get_async_pubsub().await.map_err(|e| {
        ThemeError::BusUnavailable(format!("Failed to open Redis pub/sub: {e}"))
    })?;
    pubsub
        .subscribe(channel)
        .await
        .map_err(|e| ThemeError::BusUnavailable(format!("Redis SUBSCRIBE failed: {e}")))?;
    Ok(pubsub)
}

fn decode_message(message: &redis::Msg) -> Option<ChangeEvent> {
    let payload: String = match message.get_payload() {
        Ok(payload) => payload,
        Err(err) => {
            warn!(error = %err, "discarding non-text Redis message");
            return None;
        }
    };
    match serde_json::from_str::<SettingRecord>(&payload) {
        Ok(record) => Some(ChangeEvent::Changed(record)),
        Err(err) => {
            warn!(error = %err, "discarding malformed settings message");
            None
        }
    }
}

/// Forwards one pub/sub connection until it closes. Returns `false` once
/// the subscriber is gone.
async fn pump(pubsub: PubSub, channel: &str, tx: &mpsc::Sender<ChangeEvent>) -> bool {
    let mut messages = pubsub.into_on_message();
    loop {
        tokio::select! {
            _ = tx.closed() => {
                trace!(channel = %channel, "settings subscriber dropped; leaving Redis channel");
                return false;
            }
            message = messages.next() => {
                let Some(message) = message else {
                    warn!(channel = %channel, "Redis pub/sub connection closed");
                    return true;
                };
                if let Some(event) = decode_message(&message)
                    && tx.send(event).await.is_err()
                {
                    return false;
                }
            }
        }
    }
}

#[async_trait]
impl ChangeBus for RedisChangeBus {
    async fn publish(&self, record: &SettingRecord) -> Result<()> {
        let payload = serde_json::to_string(record)?;
        let mut conn = self.conn.clone();
        conn.publish::<_, _, ()>(&self.channel, payload)
            .await
            .map_err(|e| ThemeError::BusUnavailable(format!("Redis PUBLISH failed: {e}")))?;
        debug!(setting = %record.setting_name, "published settings change");
        Ok(())
    }

    async fn subscribe(&self) -> Result<SettingChangeStream> {
        let first = open_pubsub(&self.client, &self.channel).await?;

        let (tx, rx) = mpsc::channel(self.channel_capacity);
        let client = self.client.clone();
        let channel = self.channel.clone();
        let reconnect_delay = self.reconnect_delay;

        tokio::spawn(async move {
            let mut pubsub = first;
            loop {
                if !pump(pubsub, &channel, &tx).await {
                    return;
                }
                pubsub = loop {
                    tokio::select! {
                        _ = tx.closed() => return,
                        _ = sleep(reconnect_delay) => {}
                    }
                    match open_pubsub(&client, &channel).await {
                        Ok(pubsub) => break pubsub,
                        Err(err) => warn!(channel = %channel, error = %err, "Redis resubscribe failed"),
                    }
                };
                info!(channel = %channel, "Redis pub/sub resubscribed");
                if tx.send(ChangeEvent::Resync).await.is_err() {
                    return;
                }
            }
        });

        Ok(Box::pin(ReceiverStream::new(rx)))
    }
}
