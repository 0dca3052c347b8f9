//! Project groups bookings of one client for aggregate views. The stored
//! payment status is derived from the member bookings, never set directly.

use chrono::{DateTime, Utc};
use validator::Validate;

use models::booking::PaymentStatus;
use schema::projects;

#[derive(Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Clone, Copy)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectStatus {
    Draft,
    Active,
    Completed,
    Cancelled,
}

impl_varchar_enum!(ProjectStatus, {
    Draft => "DRAFT",
    Active => "ACTIVE",
    Completed => "COMPLETED",
    Cancelled => "CANCELLED",
});

#[derive(Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Clone, Copy)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectPaymentStatus {
    Unpaid,
    PartiallyPaid,
    Paid,
}

impl_varchar_enum!(ProjectPaymentStatus, {
    Unpaid => "UNPAID",
    PartiallyPaid => "PARTIALLY_PAID",
    Paid => "PAID",
});

impl ProjectPaymentStatus {
    /// Rollup over member bookings: `Paid` when every member is paid,
    /// `Unpaid` when every member is still pending, mixed otherwise. An
    /// empty project counts as unpaid.
    pub fn derive_from(members: &[PaymentStatus]) -> ProjectPaymentStatus {
        if members.is_empty() {
            return ProjectPaymentStatus::Unpaid;
        }
        if members.iter().all(|status| *status == PaymentStatus::Paid) {
            ProjectPaymentStatus::Paid
        } else if members.iter().all(|status| *status == PaymentStatus::Pending) {
            ProjectPaymentStatus::Unpaid
        } else {
            ProjectPaymentStatus::PartiallyPaid
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Queryable, Identifiable, Clone)]
#[table_name = "projects"]
pub struct Project {
    pub id: i32,
    pub name: String,
    pub client_id: i32,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: ProjectStatus,
    pub payment_status: ProjectPaymentStatus,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Payload for creating projects
#[derive(Serialize, Deserialize, Validate, Clone, Debug)]
pub struct NewProject {
    #[validate(length(min = "1", max = "200"))]
    pub name: String,
    pub client_id: i32,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[validate(length(max = "1000"))]
    pub description: Option<String>,
    #[validate(length(max = "1000"))]
    pub notes: Option<String>,
}

/// Row as inserted with the derived defaults
#[derive(Serialize, Deserialize, Insertable, Clone, Debug)]
#[table_name = "projects"]
pub struct InsertProject {
    pub name: String,
    pub client_id: i32,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: ProjectStatus,
    pub payment_status: ProjectPaymentStatus,
    pub description: Option<String>,
    pub notes: Option<String>,
}

/// Payload for updating projects
#[derive(Serialize, Deserialize, Insertable, AsChangeset, Validate, Clone, Debug, Default)]
#[table_name = "projects"]
pub struct UpdateProject {
    #[validate(length(min = "1", max = "200"))]
    pub name: Option<String>,
    pub client_id: Option<i32>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub status: Option<ProjectStatus>,
    #[validate(length(max = "1000"))]
    pub description: Option<String>,
    #[validate(length(max = "1000"))]
    pub notes: Option<String>,
}

/// One member booking in a project view, annotated with the equipment name
/// and the printable category breadcrumb used by print layouts
#[derive(Debug, Serialize, Clone)]
pub struct ProjectBookingInfo {
    pub booking: super::booking::BookingWithDetails,
    pub category_sort_path: Vec<i32>,
    pub printable_categories: Vec<super::category::PrintableCategory>,
}

/// Project detail with its member bookings resolved
#[derive(Debug, Serialize, Clone)]
pub struct ProjectWithBookings {
    pub project: Project,
    pub bookings: Vec<ProjectBookingInfo>,
}

/// Filters for the projects listing
#[derive(Clone, Debug, Default)]
pub struct ProjectFilter {
    pub client_id: Option<i32>,
    pub status: Option<ProjectStatus>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}
