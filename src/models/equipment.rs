//! Equipment is a single physical rentable unit tracked by a globally unique
//! barcode. Status moves through a fixed machine; `Rented` is reachable only
//! through booking activation.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use validator::Validate;

use models::validation_rules::*;
use schema::equipment;

#[derive(Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Clone, Copy)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EquipmentStatus {
    Available,
    Rented,
    Maintenance,
    Broken,
    Retired,
}

impl_varchar_enum!(EquipmentStatus, {
    Available => "AVAILABLE",
    Rented => "RENTED",
    Maintenance => "MAINTENANCE",
    Broken => "BROKEN",
    Retired => "RETIRED",
});

impl EquipmentStatus {
    /// Transitions reachable from the current status. `Rented` appears here
    /// only for the booking engine; external callers are filtered out before
    /// this table is consulted.
    pub fn allowed_transitions(&self) -> &'static [EquipmentStatus] {
        match *self {
            EquipmentStatus::Available => &[
                EquipmentStatus::Rented,
                EquipmentStatus::Maintenance,
                EquipmentStatus::Broken,
                EquipmentStatus::Retired,
            ],
            EquipmentStatus::Rented => &[EquipmentStatus::Available, EquipmentStatus::Broken],
            EquipmentStatus::Maintenance => &[
                EquipmentStatus::Available,
                EquipmentStatus::Broken,
                EquipmentStatus::Retired,
            ],
            EquipmentStatus::Broken => &[EquipmentStatus::Maintenance, EquipmentStatus::Retired],
            EquipmentStatus::Retired => &[],
        }
    }

    pub fn can_transition_to(&self, next: EquipmentStatus) -> bool {
        self.allowed_transitions().contains(&next)
    }
}

#[derive(Debug, Serialize, Deserialize, Queryable, Identifiable, Clone)]
#[table_name = "equipment"]
pub struct Equipment {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub serial_number: Option<String>,
    pub barcode: String,
    pub category_id: i32,
    pub status: EquipmentStatus,
    pub replacement_cost: Decimal,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Payload for registering equipment. The barcode is minted by the allocator
/// unless a pre-printed `custom_barcode` is supplied.
#[derive(Serialize, Deserialize, Validate, Clone, Debug)]
pub struct NewEquipment {
    #[validate(length(min = "1", max = "200"))]
    pub name: String,
    #[validate(length(max = "1000"))]
    pub description: Option<String>,
    #[validate(length(max = "100"))]
    pub serial_number: Option<String>,
    pub category_id: i32,
    pub custom_barcode: Option<String>,
    /// Check the custom barcode against the checksum before accepting it.
    #[serde(default)]
    pub validate_barcode: bool,
    #[validate(custom = "validate_replacement_cost")]
    pub replacement_cost: Decimal,
    #[validate(length(max = "5000"))]
    pub notes: Option<String>,
}

/// Row as inserted once the barcode has been resolved
#[derive(Serialize, Deserialize, Insertable, Clone, Debug)]
#[table_name = "equipment"]
pub struct InsertEquipment {
    pub name: String,
    pub description: Option<String>,
    pub serial_number: Option<String>,
    pub barcode: String,
    pub category_id: i32,
    pub status: EquipmentStatus,
    pub replacement_cost: Decimal,
    pub notes: Option<String>,
}

/// Payload for updating equipment. Status and barcode deliberately have no
/// place here; both change only through their dedicated operations.
#[derive(Serialize, Deserialize, Insertable, AsChangeset, Validate, Clone, Debug, Default)]
#[table_name = "equipment"]
pub struct UpdateEquipment {
    #[validate(length(min = "1", max = "200"))]
    pub name: Option<String>,
    #[validate(length(max = "1000"))]
    pub description: Option<String>,
    #[validate(length(max = "100"))]
    pub serial_number: Option<String>,
    pub category_id: Option<i32>,
    #[validate(custom = "validate_replacement_cost")]
    pub replacement_cost: Option<Decimal>,
    #[validate(length(max = "5000"))]
    pub notes: Option<String>,
}

/// Equipment detail with its category breadcrumb resolved
#[derive(Debug, Serialize, Clone)]
pub struct EquipmentWithCategory {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub serial_number: Option<String>,
    pub barcode: String,
    pub category_id: i32,
    pub category_name: Option<String>,
    pub breadcrumbs: Vec<super::category::PrintableCategory>,
    pub status: EquipmentStatus,
    pub replacement_cost: Decimal,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EquipmentWithCategory {
    pub fn new(
        unit: Equipment,
        category_name: Option<String>,
        breadcrumbs: Vec<super::category::PrintableCategory>,
    ) -> Self {
        Self {
            id: unit.id,
            name: unit.name,
            description: unit.description,
            serial_number: unit.serial_number,
            barcode: unit.barcode,
            category_id: unit.category_id,
            category_name,
            breadcrumbs,
            status: unit.status,
            replacement_cost: unit.replacement_cost,
            notes: unit.notes,
            created_at: unit.created_at,
            updated_at: unit.updated_at,
        }
    }
}

/// Answer of the availability check over a closed date window
#[derive(Debug, Serialize, Clone)]
pub struct AvailabilityResponse {
    pub is_available: bool,
    pub equipment_status: EquipmentStatus,
    pub conflicts: Vec<super::booking::ConflictInfo>,
}

/// Filters for the equipment listing
#[derive(Clone, Debug, Default)]
pub struct EquipmentFilter {
    pub status: Option<EquipmentStatus>,
    pub category_id: Option<i32>,
    pub query: Option<String>,
    pub available_from: Option<DateTime<Utc>>,
    pub available_to: Option<DateTime<Utc>>,
}
