//! Notification dispatch: durable row first, best-effort real-time publish
//! second. The publish step can never fail a caller.

pub mod handlers;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use redis::{aio::MultiplexedConnection, AsyncCommands};
use serde_json::{json, Value};
use tracing::warn;
use uuid::Uuid;

use crate::errors::{bounded, AppError};
use crate::models::notification::NotificationRow;
use crate::stores::{NewNotification, NotificationStore};

/// Fire-and-forget transport to a user's private channel. The durable
/// notification row always exists before anything reaches this seam.
#[async_trait]
pub trait RealtimeChannel: Send + Sync {
    async fn publish(&self, user_id: Uuid, event: &str, data: &Value) -> Result<(), AppError>;
}

/// Publishes JSON events on `user:{id}` Redis channels. The socket fan-out
/// layer subscribed to those channels lives outside this service.
pub struct RedisRealtimeChannel {
    conn: MultiplexedConnection,
    op_timeout: Duration,
}

impl RedisRealtimeChannel {
    pub async fn connect(client: &redis::Client, op_timeout: Duration) -> Result<Self, AppError> {
        let conn = client.get_multiplexed_async_connection().await?;
        Ok(Self { conn, op_timeout })
    }
}

#[async_trait]
impl RealtimeChannel for RedisRealtimeChannel {
    async fn publish(&self, user_id: Uuid, event: &str, data: &Value) -> Result<(), AppError> {
        let mut conn = self.conn.clone();
        let channel = format!("user:{user_id}");
        let message = json!({ "event": event, "data": data }).to_string();
        bounded("realtime publish", self.op_timeout, async move {
            conn.publish::<_, _, ()>(&channel, &message).await?;
            Ok(())
        })
        .await
    }
}

/// Persist-then-publish, as two explicit steps. Persistence failures
/// propagate to the caller; publish failures are logged and dropped because
/// the row is already the durable record.
pub struct NotificationDispatcher {
    store: Arc<dyn NotificationStore>,
    channel: Arc<dyn RealtimeChannel>,
}

impl NotificationDispatcher {
    pub fn new(store: Arc<dyn NotificationStore>, channel: Arc<dyn RealtimeChannel>) -> Self {
        Self { store, channel }
    }

    pub async fn notify(
        &self,
        user_id: Uuid,
        message: &str,
        payload: Option<Value>,
    ) -> Result<NotificationRow, AppError> {
        let row = self
            .store
            .insert(NewNotification {
                user_id,
                message: message.to_string(),
                payload,
            })
            .await?;

        let event = json!({
            "id": row.id,
            "message": row.message,
            "payload": row.payload,
            "created_at": row.created_at,
        });
        if let Err(e) = self.channel.publish(user_id, "notification", &event).await {
            warn!(
                "Realtime publish to user {user_id} failed; notification {} stays persisted: {e}",
                row.id
            );
        }

        Ok(row)
    }
}
