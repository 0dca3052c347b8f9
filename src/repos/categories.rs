//! Categories repo plus the in-memory tree walks shared by the hierarchy
//! engine: the whole tree is small enough to load and traverse per request.

use std::collections::HashMap;

use chrono::Utc;
use diesel;
use diesel::connection::AnsiTransactionManager;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::query_dsl::RunQueryDsl;
use diesel::Connection;
use failure::Error as FailureError;
use failure::Fail;

use models::{Category, NewCategory, UpdateCategory, Visibility};
use repos::types::RepoResult;
use schema::categories::dsl::*;
use schema::equipment::dsl as Equipment;

/// Categories repository, responsible for handling the category tree rows
pub struct CategoriesRepoImpl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> {
    pub db_conn: &'a T,
}

pub trait CategoriesRepo {
    /// Find specific category by id
    fn find(&self, category_id_arg: i32, visibility: Visibility) -> RepoResult<Option<Category>>;

    /// Find a non-deleted category by its unique name
    fn find_by_name(&self, name_arg: &str) -> RepoResult<Option<Category>>;

    /// Returns all non-deleted categories ordered by name
    fn list(&self) -> RepoResult<Vec<Category>>;

    /// Returns direct children of a category
    fn children(&self, parent_id_arg: i32) -> RepoResult<Vec<Category>>;

    /// Case-insensitive substring search by name
    fn search(&self, term: &str) -> RepoResult<Vec<Category>>;

    /// Creates new category
    fn create(&self, payload: NewCategory) -> RepoResult<Category>;

    /// Updates specific category
    fn update(&self, category_id_arg: i32, payload: UpdateCategory) -> RepoResult<Category>;

    /// Stamps `deleted_at`; never clears it
    fn soft_delete(&self, category_id_arg: i32) -> RepoResult<Category>;

    /// Count of direct non-deleted equipment per category
    fn equipment_counts(&self) -> RepoResult<HashMap<i32, i64>>;
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> CategoriesRepoImpl<'a, T> {
    pub fn new(db_conn: &'a T) -> Self {
        Self { db_conn }
    }
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> CategoriesRepo
    for CategoriesRepoImpl<'a, T>
{
    fn find(&self, category_id_arg: i32, visibility: Visibility) -> RepoResult<Option<Category>> {
        debug!("Find in categories with id {}.", category_id_arg);
        let query = categories.find(category_id_arg);
        let category = match visibility {
            Visibility::Active => query
                .filter(deleted_at.is_null())
                .get_result::<Category>(self.db_conn)
                .optional()?,
            Visibility::All => query.get_result::<Category>(self.db_conn).optional()?,
        };
        Ok(category)
    }

    fn find_by_name(&self, name_arg: &str) -> RepoResult<Option<Category>> {
        categories
            .filter(name.eq(name_arg))
            .filter(deleted_at.is_null())
            .first::<Category>(self.db_conn)
            .optional()
            .map_err(|e: diesel::result::Error| {
                e.context(format!("Find category by name {} error occured", name_arg))
                    .into()
            })
    }

    fn list(&self) -> RepoResult<Vec<Category>> {
        categories
            .filter(deleted_at.is_null())
            .order(name)
            .load::<Category>(self.db_conn)
            .map_err(|e| e.context("List categories error occured").into())
    }

    fn children(&self, parent_id_arg: i32) -> RepoResult<Vec<Category>> {
        categories
            .filter(parent_id.eq(parent_id_arg))
            .filter(deleted_at.is_null())
            .order(name)
            .load::<Category>(self.db_conn)
            .map_err(|e| {
                e.context(format!("Children of category {} error occured", parent_id_arg))
                    .into()
            })
    }

    fn search(&self, term: &str) -> RepoResult<Vec<Category>> {
        let pattern = format!("%{}%", term);
        categories
            .filter(deleted_at.is_null())
            .filter(name.ilike(pattern))
            .order(name)
            .load::<Category>(self.db_conn)
            .map_err(|e| e.context(format!("Search categories by {} error occured", term)).into())
    }

    fn create(&self, payload: NewCategory) -> RepoResult<Category> {
        debug!("Create new category {:?}.", payload);
        diesel::insert_into(categories)
            .values(&payload)
            .get_result::<Category>(self.db_conn)
            .map_err(|e: diesel::result::Error| {
                e.context(format!("Create new category {:?} error occured", payload)).into()
            })
    }

    fn update(&self, category_id_arg: i32, payload: UpdateCategory) -> RepoResult<Category> {
        debug!("Updating category with id {} and payload {:?}.", category_id_arg, payload);
        let filter = categories.filter(id.eq(category_id_arg)).filter(deleted_at.is_null());
        diesel::update(filter)
            .set(&payload)
            .get_result::<Category>(self.db_conn)
            .map_err(|e: diesel::result::Error| {
                e.context(format!(
                    "Updating category with id {} and payload {:?} error occured",
                    category_id_arg, payload
                )).into()
            })
    }

    fn soft_delete(&self, category_id_arg: i32) -> RepoResult<Category> {
        debug!("Soft delete category with id {}.", category_id_arg);
        let filter = categories.filter(id.eq(category_id_arg)).filter(deleted_at.is_null());
        diesel::update(filter)
            .set(deleted_at.eq(Utc::now()))
            .get_result::<Category>(self.db_conn)
            .map_err(|e: diesel::result::Error| {
                e.context(format!("Soft delete category with id {} error occured", category_id_arg))
                    .into()
            })
    }

    fn equipment_counts(&self) -> RepoResult<HashMap<i32, i64>> {
        let category_ids: Vec<i32> = Equipment::equipment
            .filter(Equipment::deleted_at.is_null())
            .select(Equipment::category_id)
            .load(self.db_conn)
            .map_err(|e: diesel::result::Error| -> FailureError {
                e.context("Equipment counts per category error occured").into()
            })?;
        let mut counts = HashMap::new();
        for category_id_value in category_ids {
            *counts.entry(category_id_value).or_insert(0) += 1;
        }
        Ok(counts)
    }
}

/// Ordered path `[root, …, category]`, walking the parent chain upward. A
/// break in the chain (deleted or missing parent) just truncates the path.
pub fn path_from_root(all: &[Category], category_id_arg: i32) -> Vec<Category> {
    let by_id: HashMap<i32, &Category> = all.iter().map(|cat| (cat.id, cat)).collect();
    let mut path = vec![];
    let mut current = by_id.get(&category_id_arg).cloned();
    while let Some(cat) = current {
        if path.iter().any(|c: &Category| c.id == cat.id) {
            // cycle in stored data; stop rather than loop forever
            break;
        }
        path.push(cat.clone());
        current = cat.parent_id.and_then(|pid| by_id.get(&pid).cloned());
    }
    path.reverse();
    path
}

/// The id itself plus every transitive descendant, breadth-first.
pub fn subtree_ids(all: &[Category], category_id_arg: i32) -> Vec<i32> {
    let mut result = vec![category_id_arg];
    let mut queue = ::std::collections::VecDeque::new();
    queue.push_back(category_id_arg);
    while let Some(current) = queue.pop_front() {
        for cat in all {
            if cat.parent_id == Some(current) && !result.contains(&cat.id) {
                result.push(cat.id);
                queue.push_back(cat.id);
            }
        }
    }
    result
}

/// True when `ancestor_id` appears in the parent chain of `category_id_arg`
/// (or is the category itself).
pub fn is_ancestor_of(all: &[Category], ancestor_id: i32, category_id_arg: i32) -> bool {
    let by_id: HashMap<i32, &Category> = all.iter().map(|cat| (cat.id, cat)).collect();
    let mut current = Some(category_id_arg);
    let mut hops = 0;
    while let Some(current_id) = current {
        if current_id == ancestor_id {
            return true;
        }
        hops += 1;
        if hops > all.len() {
            return false;
        }
        current = by_id.get(&current_id).and_then(|cat| cat.parent_id);
    }
    false
}

#[cfg(test)]
pub mod tests {
    use chrono::Utc;

    use super::*;

    pub fn category_fixture(category_id_arg: i32, parent: Option<i32>, printable: bool) -> Category {
        Category {
            id: category_id_arg,
            name: format!("category {}", category_id_arg),
            description: None,
            parent_id: parent,
            show_in_print_overview: printable,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            deleted_at: None,
        }
    }

    fn tree() -> Vec<Category> {
        // 1 -> 2 -> 4, 1 -> 3
        vec![
            category_fixture(1, None, true),
            category_fixture(2, Some(1), false),
            category_fixture(3, Some(1), true),
            category_fixture(4, Some(2), false),
        ]
    }

    #[test]
    fn test_path_from_root() {
        let cats = tree();
        let path: Vec<i32> = path_from_root(&cats, 4).into_iter().map(|c| c.id).collect();
        assert_eq!(path, vec![1, 2, 4]);
        let path: Vec<i32> = path_from_root(&cats, 1).into_iter().map(|c| c.id).collect();
        assert_eq!(path, vec![1]);
        assert!(path_from_root(&cats, 99).is_empty());
    }

    #[test]
    fn test_subtree_ids() {
        let cats = tree();
        let mut ids = subtree_ids(&cats, 1);
        ids.sort();
        assert_eq!(ids, vec![1, 2, 3, 4]);
        let mut ids = subtree_ids(&cats, 2);
        ids.sort();
        assert_eq!(ids, vec![2, 4]);
        assert_eq!(subtree_ids(&cats, 3), vec![3]);
    }

    #[test]
    fn test_is_ancestor_of() {
        let cats = tree();
        assert!(is_ancestor_of(&cats, 1, 4));
        assert!(is_ancestor_of(&cats, 4, 4));
        assert!(!is_ancestor_of(&cats, 3, 4));
    }
}
