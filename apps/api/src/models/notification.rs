use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// Durable notification record. The row is the source of truth; real-time
/// delivery is a best-effort copy of the same fields.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct NotificationRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub message: String,
    pub payload: Option<Value>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}
