//! Subcategory prefixes are two-letter codes attached to a category, used on
//! printed equipment labels.

use chrono::{DateTime, Utc};
use validator::Validate;

use models::validation_rules::*;
use schema::subcategory_prefixes;

#[derive(Debug, Serialize, Deserialize, Queryable, Identifiable, Clone)]
#[table_name = "subcategory_prefixes"]
pub struct SubcategoryPrefix {
    pub id: i32,
    pub category_id: i32,
    pub name: String,
    pub prefix: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Payload for creating subcategory prefixes; the prefix is uppercased on
/// insert
#[derive(Serialize, Deserialize, Insertable, Validate, Clone, Debug)]
#[table_name = "subcategory_prefixes"]
pub struct NewSubcategoryPrefix {
    pub category_id: i32,
    #[validate(length(min = "1", max = "100"))]
    pub name: String,
    #[validate(custom = "validate_label_prefix")]
    pub prefix: String,
    #[validate(length(max = "500"))]
    pub description: Option<String>,
}

/// Payload for updating subcategory prefixes
#[derive(Serialize, Deserialize, Insertable, AsChangeset, Validate, Clone, Debug, Default)]
#[table_name = "subcategory_prefixes"]
pub struct UpdateSubcategoryPrefix {
    #[validate(length(min = "1", max = "100"))]
    pub name: Option<String>,
    #[validate(custom = "validate_label_prefix")]
    pub prefix: Option<String>,
    #[validate(length(max = "500"))]
    pub description: Option<String>,
}
