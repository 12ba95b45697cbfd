use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use sqlx::PgPool;
use sqlx::postgres::PgListener;
use tinct_model::SettingRecord;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, error, info, trace, warn};

use super::DEFAULT_CHANNEL;
use crate::error::{Result, ThemeError};
use crate::ports::{ChangeBus, ChangeEvent, SettingChangeStream};

const DEFAULT_CHANNEL_CAPACITY: usize = 256;
const RECONNECT_DELAY_MS: u64 = 500;

#[derive(Clone, Debug)]
pub struct PostgresChangeBusConfig {
    /// Must match the channel the `design_settings` trigger notifies.
    pub channel: String,
    pub channel_capacity: usize,
    pub reconnect_delay: Duration,
}

impl Default for PostgresChangeBusConfig {
    fn default() -> Self {
        Self {
            channel: DEFAULT_CHANNEL.to_string(),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            reconnect_delay: Duration::from_millis(RECONNECT_DELAY_MS),
        }
    }
}

/// `LISTEN`s for the notifications the `design_settings` trigger emits.
///
/// The trigger fires for every accepted insert or update, local or remote,
/// so [`ChangeBus::publish`] has nothing left to do. Notifications carry
/// the setting name only.
///
/// Notifications sent while the LISTEN connection is down are gone for
/// good, so after every reconnect the stream yields
/// [`ChangeEvent::Resync`].
#[derive(Clone)]
pub struct PostgresChangeBus {
    pool: PgPool,
    config: PostgresChangeBusConfig,
}

impl fmt::Debug for PostgresChangeBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresChangeBus")
            .field("pool_size", &self.pool.size())
            .field("config", &self.config)
            .finish()
    }
}

impl PostgresChangeBus {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            config: PostgresChangeBusConfig::default(),
        }
    }

    pub fn with_config(pool: PgPool, config: PostgresChangeBusConfig) -> Self {
        Self { pool, config }
    }
}

#[derive(Debug, Deserialize)]
struct Notification {
    setting_name: String,
    #[serde(default)]
    setting_value: Option<String>,
}

fn decode_payload(payload: &str) -> Option<ChangeEvent> {
    match serde_json::from_str::<Notification>(payload) {
        Ok(Notification {
            setting_name,
            setting_value: Some(value),
        }) => Some(ChangeEvent::Changed(SettingRecord::new(setting_name, value))),
        Ok(Notification { setting_name, .. }) => Some(ChangeEvent::Touched { setting_name }),
        Err(err) => {
            warn!(error = %err, "discarding malformed settings notification");
            None
        }
    }
}

/// Re-issues the LISTEN until it sticks. `PgListener` reconnects on demand
/// and replays its channels. Returns `false` once the subscriber is gone.
async fn relisten(
    listener: &mut PgListener,
    channel: &str,
    delay: Duration,
    tx: &mpsc::Sender<ChangeEvent>,
) -> bool {
    loop {
        tokio::select! {
            _ = tx.closed() => return false,
            _ = sleep(delay) => {}
        }
        match listener.listen(channel).await {
            Ok(()) => {
                info!(channel = %channel, "settings listener reconnected");
                return true;
            }
            Err(err) => {
                warn!(channel = %channel, error = %err, "settings listener reconnect failed");
            }
        }
    }
}

#[async_trait]
impl ChangeBus for PostgresChangeBus {
    async fn publish(&self, _record: &SettingRecord) -> Result<()> {
        Ok(())
    }

    async fn subscribe(&self) -> Result<SettingChangeStream> {
        let mut listener = PgListener::connect_with(&self.pool).await.map_err(|e| {
            ThemeError::BusUnavailable(format!("Failed to open LISTEN connection: {e}"))
        })?;
        listener.listen(&self.config.channel).await.map_err(|e| {
            ThemeError::BusUnavailable(format!(
                "Failed to LISTEN on {}: {e}",
                self.config.channel
            ))
        })?;

        let (tx, rx) = mpsc::channel(self.config.channel_capacity);
        let channel = self.config.channel.clone();
        let reconnect_delay = self.config.reconnect_delay;

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = tx.closed() => {
                        trace!(channel = %channel, "settings subscriber dropped; stopping listener");
                        break;
                    }
                    received = listener.try_recv() => {
                        let event = match received {
                            Ok(Some(notification)) => {
                                let Some(event) = decode_payload(notification.payload()) else {
                                    continue;
                                };
                                debug!(?event, "settings notification received");
                                event
                            }
                            Ok(None) => {
                                warn!(channel = %channel, "settings listener connection lost");
                                if !relisten(&mut listener, &channel, reconnect_delay, &tx).await {
                                    break;
                                }
                                ChangeEvent::Resync
                            }
                            Err(err) => {
                                error!(channel = %channel, error = %err, "settings listener failed");
                                if !relisten(&mut listener, &channel, reconnect_delay, &tx).await {
                                    break;
                                }
                                ChangeEvent::Resync
                            }
                        };
                        if tx.send(event).await.is_err() {
                            break;
                        }
                    }
                }
            }
        });

        Ok(Box::pin(ReceiverStream::new(rx)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_name_only_trigger_payload() {
        assert_eq!(
            decode_payload(r#"{"setting_name": "site_description"}"#),
            Some(ChangeEvent::Touched {
                setting_name: "site_description".into()
            })
        );
    }

    #[test]
    fn keeps_value_when_present() {
        let event = decode_payload(
            r##"{"setting_name": "primary_color", "setting_value": "#00FF00"}"##,
        );
        assert_eq!(
            event,
            Some(ChangeEvent::Changed(SettingRecord::new(
                "primary_color",
                "#00FF00"
            )))
        );
    }

    #[test]
    fn rejects_foreign_payload() {
        assert_eq!(decode_payload("primary_color=#00FF00"), None);
        assert_eq!(decode_payload(r#"{"name": "x"}"#), None);
    }
}
