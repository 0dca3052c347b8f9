//! Category is a node of the equipment classification tree. The tree has
//! unbounded depth; the parent chain must stay acyclic.

use chrono::{DateTime, Utc};
use validator::Validate;

use schema::categories;

#[derive(Debug, Serialize, Deserialize, Queryable, Identifiable, Clone, PartialEq)]
#[table_name = "categories"]
pub struct Category {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub parent_id: Option<i32>,
    pub show_in_print_overview: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Payload for creating categories
#[derive(Serialize, Deserialize, Insertable, Validate, Clone, Debug)]
#[table_name = "categories"]
pub struct NewCategory {
    #[validate(length(min = "1", max = "100"))]
    pub name: String,
    #[validate(length(max = "500"))]
    pub description: Option<String>,
    pub parent_id: Option<i32>,
    #[serde(default = "default_show_in_print_overview")]
    pub show_in_print_overview: bool,
}

fn default_show_in_print_overview() -> bool {
    true
}

/// Payload for updating categories
#[derive(Serialize, Deserialize, Insertable, AsChangeset, Validate, Clone, Debug)]
#[table_name = "categories"]
pub struct UpdateCategory {
    #[validate(length(min = "1", max = "100"))]
    pub name: Option<String>,
    #[validate(length(max = "500"))]
    pub description: Option<String>,
    pub parent_id: Option<i32>,
    pub show_in_print_overview: Option<bool>,
}

/// Category annotated with the count of its direct non-deleted equipment
#[derive(Debug, Serialize, Clone)]
pub struct CategoryWithEquipmentCount {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub parent_id: Option<i32>,
    pub show_in_print_overview: bool,
    pub equipment_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CategoryWithEquipmentCount {
    pub fn new(category: Category, equipment_count: i64) -> Self {
        Self {
            id: category.id,
            name: category.name,
            description: category.description,
            parent_id: category.parent_id,
            show_in_print_overview: category.show_in_print_overview,
            equipment_count,
            created_at: category.created_at,
            updated_at: category.updated_at,
        }
    }
}

/// One level of the print overview breadcrumb. Levels are re-assigned from 1
/// after filtering by `show_in_print_overview`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PrintableCategory {
    pub id: i32,
    pub name: String,
    pub level: i32,
}
