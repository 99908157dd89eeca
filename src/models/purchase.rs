// src/models/purchase.rs

use serde::Serialize;
use sqlx::FromRow;

/// The only status this service ever writes. Payment is simulated.
pub const PURCHASE_COMPLETED: &str = "completed";

/// Represents the 'purchases' table. Unique per (user_id, quiz_id).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Purchase {
    pub id: i64,
    pub user_id: i64,
    pub quiz_id: i64,
    pub status: String,
    pub amount_cents: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}
