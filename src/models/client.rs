//! Client is a renter. The name is a single free-form field; email and phone
//! are optional and deliberately not unique.

use chrono::{DateTime, Utc};
use validator::Validate;

use models::validation_rules::*;
use schema::clients;

#[derive(Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Clone, Copy)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientStatus {
    Active,
    Blocked,
    Archived,
}

impl_varchar_enum!(ClientStatus, {
    Active => "ACTIVE",
    Blocked => "BLOCKED",
    Archived => "ARCHIVED",
});

#[derive(Debug, Serialize, Deserialize, Queryable, Identifiable, Clone)]
#[table_name = "clients"]
pub struct Client {
    pub id: i32,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub status: ClientStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Payload for creating clients
#[derive(Serialize, Deserialize, Insertable, Validate, Clone, Debug)]
#[table_name = "clients"]
pub struct NewClient {
    #[validate(length(min = "1", max = "200"))]
    pub name: String,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(custom = "validate_phone")]
    pub phone: Option<String>,
    #[validate(length(max = "200"))]
    pub company: Option<String>,
    #[serde(default = "default_client_status")]
    pub status: ClientStatus,
    #[validate(length(max = "1000"))]
    pub notes: Option<String>,
}

fn default_client_status() -> ClientStatus {
    ClientStatus::Active
}

/// Payload for updating clients
#[derive(Serialize, Deserialize, Insertable, AsChangeset, Validate, Clone, Debug, Default)]
#[table_name = "clients"]
pub struct UpdateClient {
    #[validate(length(min = "1", max = "200"))]
    pub name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(custom = "validate_phone")]
    pub phone: Option<String>,
    #[validate(length(max = "200"))]
    pub company: Option<String>,
    pub status: Option<ClientStatus>,
    #[validate(length(max = "1000"))]
    pub notes: Option<String>,
}
