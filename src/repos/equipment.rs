//! Equipment repo, presents CRUD operations with db for rentable units

use chrono::Utc;
use diesel;
use diesel::connection::AnsiTransactionManager;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::query_dsl::RunQueryDsl;
use diesel::Connection;
use failure::Fail;

use models::{Equipment, EquipmentFilter, EquipmentStatus, InsertEquipment, UpdateEquipment, Visibility};
use repos::pagination::Paginate;
use repos::types::RepoResult;
use schema::equipment::dsl::*;

/// Equipment repository, responsible for handling equipment rows
pub struct EquipmentRepoImpl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> {
    pub db_conn: &'a T,
}

pub trait EquipmentRepo {
    /// Find specific equipment by id
    fn find(&self, equipment_id_arg: i32, visibility: Visibility) -> RepoResult<Option<Equipment>>;

    /// Find non-deleted equipment by its unique barcode
    fn find_by_barcode(&self, barcode_arg: &str) -> RepoResult<Option<Equipment>>;

    /// Paginated listing. `category_ids`, when present, already contains the
    /// expanded subtree; `excluded_ids` removes units with conflicting
    /// bookings in the requested availability window.
    fn list(
        &self,
        filter: EquipmentFilter,
        category_ids: Option<Vec<i32>>,
        excluded_ids: Vec<i32>,
        visibility: Visibility,
        skip: i64,
        limit: i64,
    ) -> RepoResult<(Vec<Equipment>, i64)>;

    /// Creates new equipment
    fn create(&self, payload: InsertEquipment) -> RepoResult<Equipment>;

    /// Updates specific equipment
    fn update(&self, equipment_id_arg: i32, payload: UpdateEquipment) -> RepoResult<Equipment>;

    /// Sets equipment status; transition legality is checked by the service
    fn set_status(&self, equipment_id_arg: i32, status_arg: EquipmentStatus) -> RepoResult<Equipment>;

    /// Replaces the barcode of an equipment row
    fn set_barcode(&self, equipment_id_arg: i32, barcode_arg: &str) -> RepoResult<Equipment>;

    /// Stamps `deleted_at`
    fn soft_delete(&self, equipment_id_arg: i32) -> RepoResult<Equipment>;

    /// Count of non-deleted equipment in one category
    fn count_by_category(&self, category_id_arg: i32) -> RepoResult<i64>;
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> EquipmentRepoImpl<'a, T> {
    pub fn new(db_conn: &'a T) -> Self {
        Self { db_conn }
    }
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> EquipmentRepo
    for EquipmentRepoImpl<'a, T>
{
    fn find(&self, equipment_id_arg: i32, visibility: Visibility) -> RepoResult<Option<Equipment>> {
        debug!("Find in equipment with id {}.", equipment_id_arg);
        let query = equipment.find(equipment_id_arg);
        let unit = match visibility {
            Visibility::Active => query
                .filter(deleted_at.is_null())
                .get_result::<Equipment>(self.db_conn)
                .optional()?,
            Visibility::All => query.get_result::<Equipment>(self.db_conn).optional()?,
        };
        Ok(unit)
    }

    fn find_by_barcode(&self, barcode_arg: &str) -> RepoResult<Option<Equipment>> {
        debug!("Find in equipment with barcode {}.", barcode_arg);
        equipment
            .filter(barcode.eq(barcode_arg))
            .filter(deleted_at.is_null())
            .first::<Equipment>(self.db_conn)
            .optional()
            .map_err(|e: diesel::result::Error| {
                e.context(format!("Find equipment by barcode {} error occured", barcode_arg))
                    .into()
            })
    }

    fn list(
        &self,
        filter: EquipmentFilter,
        category_ids: Option<Vec<i32>>,
        excluded_ids: Vec<i32>,
        visibility: Visibility,
        skip: i64,
        limit: i64,
    ) -> RepoResult<(Vec<Equipment>, i64)> {
        debug!("List equipment with filter {:?} skip {} limit {}.", filter, skip, limit);
        let mut query = equipment.into_boxed();

        if let Visibility::Active = visibility {
            query = query.filter(deleted_at.is_null());
        }
        if let Some(status_arg) = filter.status {
            query = query.filter(status.eq(status_arg));
        }
        if let Some(ids) = category_ids {
            query = query.filter(category_id.eq_any(ids));
        }
        if let Some(term) = filter.query {
            let pattern = format!("%{}%", term);
            query = query.filter(
                name.ilike(pattern.clone())
                    .or(description.ilike(pattern.clone()))
                    .or(barcode.ilike(pattern.clone()))
                    .or(serial_number.ilike(pattern)),
            );
        }
        if !excluded_ids.is_empty() {
            query = query.filter(id.ne_all(excluded_ids));
        }

        query
            .order(name)
            .paginate(skip, limit)
            .load_and_total::<Equipment, _>(self.db_conn)
            .map_err(|e| e.context("List equipment error occured").into())
    }

    fn create(&self, payload: InsertEquipment) -> RepoResult<Equipment> {
        debug!("Create equipment {:?}.", payload);
        diesel::insert_into(equipment)
            .values(&payload)
            .get_result::<Equipment>(self.db_conn)
            .map_err(|e: diesel::result::Error| {
                e.context(format!("Create equipment {:?} error occured", payload)).into()
            })
    }

    fn update(&self, equipment_id_arg: i32, payload: UpdateEquipment) -> RepoResult<Equipment> {
        debug!("Updating equipment with id {} and payload {:?}.", equipment_id_arg, payload);
        let filter = equipment.filter(id.eq(equipment_id_arg)).filter(deleted_at.is_null());
        diesel::update(filter)
            .set(&payload)
            .get_result::<Equipment>(self.db_conn)
            .map_err(|e: diesel::result::Error| {
                e.context(format!(
                    "Updating equipment with id {} and payload {:?} error occured",
                    equipment_id_arg, payload
                )).into()
            })
    }

    fn set_status(&self, equipment_id_arg: i32, status_arg: EquipmentStatus) -> RepoResult<Equipment> {
        debug!("Set equipment {} status {}.", equipment_id_arg, status_arg);
        let filter = equipment.filter(id.eq(equipment_id_arg)).filter(deleted_at.is_null());
        diesel::update(filter)
            .set(status.eq(status_arg))
            .get_result::<Equipment>(self.db_conn)
            .map_err(|e: diesel::result::Error| {
                e.context(format!(
                    "Set equipment {} status {} error occured",
                    equipment_id_arg, status_arg
                )).into()
            })
    }

    fn set_barcode(&self, equipment_id_arg: i32, barcode_arg: &str) -> RepoResult<Equipment> {
        debug!("Set equipment {} barcode {}.", equipment_id_arg, barcode_arg);
        let filter = equipment.filter(id.eq(equipment_id_arg)).filter(deleted_at.is_null());
        diesel::update(filter)
            .set(barcode.eq(barcode_arg))
            .get_result::<Equipment>(self.db_conn)
            .map_err(|e: diesel::result::Error| {
                e.context(format!(
                    "Set equipment {} barcode {} error occured",
                    equipment_id_arg, barcode_arg
                )).into()
            })
    }

    fn soft_delete(&self, equipment_id_arg: i32) -> RepoResult<Equipment> {
        debug!("Soft delete equipment with id {}.", equipment_id_arg);
        let filter = equipment.filter(id.eq(equipment_id_arg)).filter(deleted_at.is_null());
        diesel::update(filter)
            .set(deleted_at.eq(Utc::now()))
            .get_result::<Equipment>(self.db_conn)
            .map_err(|e: diesel::result::Error| {
                e.context(format!("Soft delete equipment with id {} error occured", equipment_id_arg))
                    .into()
            })
    }

    fn count_by_category(&self, category_id_arg: i32) -> RepoResult<i64> {
        equipment
            .filter(category_id.eq(category_id_arg))
            .filter(deleted_at.is_null())
            .count()
            .get_result(self.db_conn)
            .map_err(|e: diesel::result::Error| {
                e.context(format!("Count equipment in category {} error occured", category_id_arg))
                    .into()
            })
    }
}
