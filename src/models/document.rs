//! Document is stored file metadata attached to a client and optionally to a
//! booking. The file bytes themselves live outside this service.

use chrono::{DateTime, Utc};
use validator::Validate;

use schema::documents;

#[derive(Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Clone, Copy)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentType {
    Contract,
    Invoice,
    Receipt,
    Passport,
    DamageReport,
    Insurance,
    Other,
}

impl_varchar_enum!(DocumentType, {
    Contract => "CONTRACT",
    Invoice => "INVOICE",
    Receipt => "RECEIPT",
    Passport => "PASSPORT",
    DamageReport => "DAMAGE_REPORT",
    Insurance => "INSURANCE",
    Other => "OTHER",
});

#[derive(Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Clone, Copy)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentStatus {
    Draft,
    Pending,
    UnderReview,
    Approved,
    Rejected,
    Expired,
    Cancelled,
}

impl_varchar_enum!(DocumentStatus, {
    Draft => "DRAFT",
    Pending => "PENDING",
    UnderReview => "UNDER_REVIEW",
    Approved => "APPROVED",
    Rejected => "REJECTED",
    Expired => "EXPIRED",
    Cancelled => "CANCELLED",
});

#[derive(Debug, Serialize, Deserialize, Queryable, Identifiable, Clone)]
#[table_name = "documents"]
pub struct Document {
    pub id: i32,
    pub client_id: i32,
    pub booking_id: Option<i32>,
    #[serde(rename = "type")]
    pub type_: DocumentType,
    pub title: String,
    pub description: Option<String>,
    pub file_path: String,
    pub file_name: String,
    pub file_size: i32,
    pub mime_type: String,
    pub notes: Option<String>,
    pub status: DocumentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Payload for registering documents
#[derive(Serialize, Deserialize, Insertable, Validate, Clone, Debug)]
#[table_name = "documents"]
pub struct NewDocument {
    pub client_id: i32,
    pub booking_id: Option<i32>,
    #[serde(rename = "type")]
    pub type_: DocumentType,
    #[validate(length(min = "1", max = "200"))]
    pub title: String,
    #[validate(length(max = "1000"))]
    pub description: Option<String>,
    #[validate(length(min = "1", max = "500"))]
    pub file_path: String,
    #[validate(length(min = "1", max = "255"))]
    pub file_name: String,
    #[validate(range(min = "0"))]
    pub file_size: i32,
    #[validate(length(min = "1", max = "100"))]
    pub mime_type: String,
    #[validate(length(max = "1000"))]
    pub notes: Option<String>,
    #[serde(default = "default_document_status")]
    pub status: DocumentStatus,
}

fn default_document_status() -> DocumentStatus {
    DocumentStatus::Draft
}

/// Payload for updating documents
#[derive(Serialize, Deserialize, Insertable, AsChangeset, Validate, Clone, Debug, Default)]
#[table_name = "documents"]
pub struct UpdateDocument {
    pub booking_id: Option<i32>,
    #[validate(length(min = "1", max = "200"))]
    pub title: Option<String>,
    #[validate(length(max = "1000"))]
    pub description: Option<String>,
    #[validate(length(max = "1000"))]
    pub notes: Option<String>,
    pub status: Option<DocumentStatus>,
}
