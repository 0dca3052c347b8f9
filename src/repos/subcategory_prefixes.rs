//! Subcategory prefixes repo, presents CRUD operations with db for label
//! prefixes

use chrono::Utc;
use diesel;
use diesel::connection::AnsiTransactionManager;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::query_dsl::RunQueryDsl;
use diesel::Connection;
use failure::Fail;

use models::{NewSubcategoryPrefix, SubcategoryPrefix, UpdateSubcategoryPrefix};
use repos::types::RepoResult;
use schema::subcategory_prefixes::dsl::*;

pub struct SubcategoryPrefixesRepoImpl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> {
    pub db_conn: &'a T,
}

pub trait SubcategoryPrefixesRepo {
    fn find(&self, prefix_id_arg: i32) -> RepoResult<Option<SubcategoryPrefix>>;

    fn list_by_category(&self, category_id_arg: i32) -> RepoResult<Vec<SubcategoryPrefix>>;

    /// True when the category already has a prefix with this name or code
    fn exists(&self, category_id_arg: i32, name_arg: &str, prefix_arg: &str) -> RepoResult<bool>;

    fn create(&self, payload: NewSubcategoryPrefix) -> RepoResult<SubcategoryPrefix>;

    fn update(&self, prefix_id_arg: i32, payload: UpdateSubcategoryPrefix) -> RepoResult<SubcategoryPrefix>;

    fn soft_delete(&self, prefix_id_arg: i32) -> RepoResult<SubcategoryPrefix>;
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> SubcategoryPrefixesRepoImpl<'a, T> {
    pub fn new(db_conn: &'a T) -> Self {
        Self { db_conn }
    }
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> SubcategoryPrefixesRepo
    for SubcategoryPrefixesRepoImpl<'a, T>
{
    fn find(&self, prefix_id_arg: i32) -> RepoResult<Option<SubcategoryPrefix>> {
        subcategory_prefixes
            .find(prefix_id_arg)
            .filter(deleted_at.is_null())
            .get_result::<SubcategoryPrefix>(self.db_conn)
            .optional()
            .map_err(|e: diesel::result::Error| {
                e.context(format!("Find subcategory prefix with id {} error occured", prefix_id_arg))
                    .into()
            })
    }

    fn list_by_category(&self, category_id_arg: i32) -> RepoResult<Vec<SubcategoryPrefix>> {
        subcategory_prefixes
            .filter(category_id.eq(category_id_arg))
            .filter(deleted_at.is_null())
            .order(name)
            .load::<SubcategoryPrefix>(self.db_conn)
            .map_err(|e: diesel::result::Error| {
                e.context(format!(
                    "List subcategory prefixes of category {} error occured",
                    category_id_arg
                )).into()
            })
    }

    fn exists(&self, category_id_arg: i32, name_arg: &str, prefix_arg: &str) -> RepoResult<bool> {
        diesel::select(diesel::dsl::exists(
            subcategory_prefixes
                .filter(category_id.eq(category_id_arg))
                .filter(deleted_at.is_null())
                .filter(name.eq(name_arg).or(prefix.eq(prefix_arg))),
        )).get_result(self.db_conn)
            .map_err(|e: diesel::result::Error| {
                e.context(format!(
                    "Subcategory prefix exists check for category {} error occured",
                    category_id_arg
                )).into()
            })
    }

    fn create(&self, payload: NewSubcategoryPrefix) -> RepoResult<SubcategoryPrefix> {
        debug!("Create subcategory prefix {:?}.", payload);
        diesel::insert_into(subcategory_prefixes)
            .values(&payload)
            .get_result::<SubcategoryPrefix>(self.db_conn)
            .map_err(|e: diesel::result::Error| {
                e.context(format!("Create subcategory prefix {:?} error occured", payload))
                    .into()
            })
    }

    fn update(&self, prefix_id_arg: i32, payload: UpdateSubcategoryPrefix) -> RepoResult<SubcategoryPrefix> {
        debug!("Updating subcategory prefix with id {} and payload {:?}.", prefix_id_arg, payload);
        let filter = subcategory_prefixes
            .filter(id.eq(prefix_id_arg))
            .filter(deleted_at.is_null());
        diesel::update(filter)
            .set(&payload)
            .get_result::<SubcategoryPrefix>(self.db_conn)
            .map_err(|e: diesel::result::Error| {
                e.context(format!(
                    "Updating subcategory prefix with id {} and payload {:?} error occured",
                    prefix_id_arg, payload
                )).into()
            })
    }

    fn soft_delete(&self, prefix_id_arg: i32) -> RepoResult<SubcategoryPrefix> {
        debug!("Soft delete subcategory prefix with id {}.", prefix_id_arg);
        let filter = subcategory_prefixes
            .filter(id.eq(prefix_id_arg))
            .filter(deleted_at.is_null());
        diesel::update(filter)
            .set(deleted_at.eq(Utc::now()))
            .get_result::<SubcategoryPrefix>(self.db_conn)
            .map_err(|e: diesel::result::Error| {
                e.context(format!(
                    "Soft delete subcategory prefix with id {} error occured",
                    prefix_id_arg
                )).into()
            })
    }
}
