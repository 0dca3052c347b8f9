//! Scan session is the ephemeral cart a user fills from the barcode scanner
//! before committing it as a booking batch. Sessions expire after a week and
//! expired rows are reaped in the background.

use chrono::{DateTime, Duration, Utc};
use serde_json;
use validator::Validate;

use schema::scan_sessions;

/// Sessions live this long from creation.
pub const SCAN_SESSION_TTL_DAYS: i64 = 7;

/// One scanned position. Booking dates are filled in once the user picks a
/// rental window for the cart.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ScanItem {
    pub equipment_id: i32,
    pub barcode: String,
    pub name: String,
    pub category_id: Option<i32>,
    pub category_name: Option<String>,
    pub booking_start_date: Option<DateTime<Utc>>,
    pub booking_end_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize, Queryable, Identifiable, Clone)]
#[table_name = "scan_sessions"]
pub struct RawScanSession {
    pub id: i32,
    pub user_id: Option<i32>,
    pub name: String,
    pub items: serde_json::Value,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Session with the item list decoded for responses
#[derive(Debug, Serialize, Clone)]
pub struct ScanSession {
    pub id: i32,
    pub user_id: Option<i32>,
    pub name: String,
    pub items: Vec<ScanItem>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<RawScanSession> for ScanSession {
    fn from(raw: RawScanSession) -> Self {
        let items = serde_json::from_value(raw.items.clone()).unwrap_or_default();
        Self {
            id: raw.id,
            user_id: raw.user_id,
            name: raw.name,
            items,
            expires_at: raw.expires_at,
            created_at: raw.created_at,
            updated_at: raw.updated_at,
        }
    }
}

/// Payload for creating scan sessions
#[derive(Serialize, Deserialize, Validate, Clone, Debug)]
pub struct NewScanSession {
    #[validate(length(min = "1", max = "200"))]
    pub name: String,
    #[serde(default)]
    pub items: Vec<ScanItem>,
    pub user_id: Option<i32>,
}

/// Row as inserted, items encoded and the expiry stamped
#[derive(Serialize, Deserialize, Insertable, Clone, Debug)]
#[table_name = "scan_sessions"]
pub struct InsertScanSession {
    pub user_id: Option<i32>,
    pub name: String,
    pub items: serde_json::Value,
    pub expires_at: DateTime<Utc>,
}

impl InsertScanSession {
    pub fn from_payload(payload: NewScanSession, now: DateTime<Utc>) -> Self {
        Self {
            user_id: payload.user_id,
            name: payload.name,
            items: serde_json::to_value(&payload.items).unwrap_or(serde_json::Value::Array(vec![])),
            expires_at: now + Duration::days(SCAN_SESSION_TTL_DAYS),
        }
    }
}

/// Payload for updating scan sessions; the item list is replaced wholesale
#[derive(Serialize, Deserialize, Validate, Clone, Debug, Default)]
pub struct UpdateScanSession {
    #[validate(length(min = "1", max = "200"))]
    pub name: Option<String>,
    pub items: Option<Vec<ScanItem>>,
}

/// Changeset form of `UpdateScanSession`
#[derive(Insertable, AsChangeset, Clone, Debug)]
#[table_name = "scan_sessions"]
pub struct ScanSessionChangeset {
    pub name: Option<String>,
    pub items: Option<serde_json::Value>,
}

impl From<UpdateScanSession> for ScanSessionChangeset {
    fn from(payload: UpdateScanSession) -> Self {
        Self {
            name: payload.name,
            items: payload
                .items
                .map(|items| serde_json::to_value(&items).unwrap_or(serde_json::Value::Array(vec![]))),
        }
    }
}
