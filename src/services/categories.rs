//! Categories service: the hierarchy engine. The tree is loaded whole and
//! walked in memory; the cycle guard runs on every parent reassignment.

use diesel::connection::AnsiTransactionManager;
use diesel::pg::Pg;
use diesel::Connection;
use failure::Error as FailureError;
use failure::Fail;
use futures::Future;
use futures_cpupool::CpuPool;
use r2d2::{ManageConnection, Pool};

use super::types::ServiceFuture;
use errors::{validation_error, Error};
use models::{
    Category, CategoryWithEquipmentCount, NewCategory, PrintableCategory, UpdateCategory, Visibility,
};
use repos::categories::{is_ancestor_of, path_from_root, subtree_ids};
use repos::ReposFactory;

pub trait CategoriesService {
    /// Returns category by ID
    fn get(&self, category_id: i32) -> ServiceFuture<Option<Category>>;
    /// Returns all categories
    fn list(&self) -> ServiceFuture<Vec<Category>>;
    /// Returns direct children of a category
    fn get_children(&self, category_id: i32) -> ServiceFuture<Vec<Category>>;
    /// Returns the category and every transitive descendant id
    fn get_all_subcategory_ids(&self, category_id: i32) -> ServiceFuture<Vec<i32>>;
    /// Returns the ordered path from the root to the category
    fn get_path_from_root(&self, category_id: i32) -> ServiceFuture<Vec<Category>>;
    /// Sort path plus print-overview breadcrumb for a category
    fn get_print_hierarchy_and_sort_path(
        &self,
        category_id: Option<i32>,
    ) -> ServiceFuture<(Vec<i32>, Vec<PrintableCategory>)>;
    /// Each category with the count of its direct non-deleted equipment
    fn with_equipment_count(&self) -> ServiceFuture<Vec<CategoryWithEquipmentCount>>;
    /// Case-insensitive substring search by name
    fn search(&self, term: String) -> ServiceFuture<Vec<Category>>;
    /// Creates new category
    fn create(&self, payload: NewCategory) -> ServiceFuture<Category>;
    /// Updates specific category
    fn update(&self, category_id: i32, payload: UpdateCategory) -> ServiceFuture<Category>;
    /// Soft-deletes a category without equipment
    fn delete(&self, category_id: i32) -> ServiceFuture<Category>;
}

/// Categories service, responsible for category tree operations
pub struct CategoriesServiceImpl<
    T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static,
    M: ManageConnection<Connection = T>,
    F: ReposFactory<T>,
> {
    pub db_pool: Pool<M>,
    pub cpu_pool: CpuPool,
    pub repo_factory: F,
}

impl<
        T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static,
        M: ManageConnection<Connection = T>,
        F: ReposFactory<T>,
    > CategoriesServiceImpl<T, M, F>
{
    pub fn new(db_pool: Pool<M>, cpu_pool: CpuPool, repo_factory: F) -> Self {
        Self {
            db_pool,
            cpu_pool,
            repo_factory,
        }
    }
}

/// Re-levels the printable members of a root path from 1; when nothing on
/// the path is printable the root alone is emitted at level 1.
pub fn printable_from_path(path: &[Category]) -> Vec<PrintableCategory> {
    let mut printable = vec![];
    let mut level = 1;
    for category in path {
        if category.show_in_print_overview {
            printable.push(PrintableCategory {
                id: category.id,
                name: category.name.clone(),
                level,
            });
            level += 1;
        }
    }
    if printable.is_empty() {
        if let Some(root) = path.first() {
            printable.push(PrintableCategory {
                id: root.id,
                name: root.name.clone(),
                level: 1,
            });
        }
    }
    printable
}

impl<
        T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static,
        M: ManageConnection<Connection = T>,
        F: ReposFactory<T>,
    > CategoriesService for CategoriesServiceImpl<T, M, F>
{
    fn get(&self, category_id: i32) -> ServiceFuture<Option<Category>> {
        let db_pool = self.db_pool.clone();
        let repo_factory = self.repo_factory.clone();

        Box::new(
            self.cpu_pool
                .spawn_fn(move || {
                    db_pool
                        .get()
                        .map_err(|e| -> FailureError {
                            format_err!("Could not get connection to db from pool! {}", e)
                        })
                        .and_then(move |conn| {
                            let categories_repo = repo_factory.create_categories_repo(&*conn);
                            categories_repo.find(category_id, Visibility::Active)
                        })
                })
                .map_err(|e: FailureError| e.context("Service Categories, get endpoint error occured.").into()),
        )
    }

    fn list(&self) -> ServiceFuture<Vec<Category>> {
        let db_pool = self.db_pool.clone();
        let repo_factory = self.repo_factory.clone();

        Box::new(
            self.cpu_pool
                .spawn_fn(move || {
                    db_pool
                        .get()
                        .map_err(|e| -> FailureError {
                            format_err!("Could not get connection to db from pool! {}", e)
                        })
                        .and_then(move |conn| {
                            let categories_repo = repo_factory.create_categories_repo(&*conn);
                            categories_repo.list()
                        })
                })
                .map_err(|e: FailureError| e.context("Service Categories, list endpoint error occured.").into()),
        )
    }

    fn get_children(&self, category_id: i32) -> ServiceFuture<Vec<Category>> {
        let db_pool = self.db_pool.clone();
        let repo_factory = self.repo_factory.clone();

        Box::new(
            self.cpu_pool
                .spawn_fn(move || {
                    db_pool
                        .get()
                        .map_err(|e| -> FailureError {
                            format_err!("Could not get connection to db from pool! {}", e)
                        })
                        .and_then(move |conn| {
                            let categories_repo = repo_factory.create_categories_repo(&*conn);
                            categories_repo
                                .find(category_id, Visibility::Active)?
                                .ok_or(Error::NotFound.into())
                                .and_then(|category| categories_repo.children(category.id))
                        })
                })
                .map_err(|e: FailureError| {
                    e.context("Service Categories, get_children endpoint error occured.").into()
                }),
        )
    }

    fn get_all_subcategory_ids(&self, category_id: i32) -> ServiceFuture<Vec<i32>> {
        let db_pool = self.db_pool.clone();
        let repo_factory = self.repo_factory.clone();

        Box::new(
            self.cpu_pool
                .spawn_fn(move || {
                    db_pool
                        .get()
                        .map_err(|e| -> FailureError {
                            format_err!("Could not get connection to db from pool! {}", e)
                        })
                        .and_then(move |conn| {
                            let categories_repo = repo_factory.create_categories_repo(&*conn);
                            if categories_repo.find(category_id, Visibility::Active)?.is_none() {
                                return Err(Error::NotFound.into());
                            }
                            let all = categories_repo.list()?;
                            Ok(subtree_ids(&all, category_id))
                        })
                })
                .map_err(|e: FailureError| {
                    e.context("Service Categories, get_all_subcategory_ids endpoint error occured.")
                        .into()
                }),
        )
    }

    fn get_path_from_root(&self, category_id: i32) -> ServiceFuture<Vec<Category>> {
        let db_pool = self.db_pool.clone();
        let repo_factory = self.repo_factory.clone();

        Box::new(
            self.cpu_pool
                .spawn_fn(move || {
                    db_pool
                        .get()
                        .map_err(|e| -> FailureError {
                            format_err!("Could not get connection to db from pool! {}", e)
                        })
                        .and_then(move |conn| {
                            let categories_repo = repo_factory.create_categories_repo(&*conn);
                            let all = categories_repo.list()?;
                            Ok(path_from_root(&all, category_id))
                        })
                })
                .map_err(|e: FailureError| {
                    e.context("Service Categories, get_path_from_root endpoint error occured.").into()
                }),
        )
    }

    fn get_print_hierarchy_and_sort_path(
        &self,
        category_id: Option<i32>,
    ) -> ServiceFuture<(Vec<i32>, Vec<PrintableCategory>)> {
        let db_pool = self.db_pool.clone();
        let repo_factory = self.repo_factory.clone();

        Box::new(
            self.cpu_pool
                .spawn_fn(move || {
                    let category_id = match category_id {
                        Some(category_id) => category_id,
                        None => return Ok((vec![], vec![])),
                    };
                    db_pool
                        .get()
                        .map_err(|e| -> FailureError {
                            format_err!("Could not get connection to db from pool! {}", e)
                        })
                        .and_then(move |conn| {
                            let categories_repo = repo_factory.create_categories_repo(&*conn);
                            let all = categories_repo.list()?;
                            let path = path_from_root(&all, category_id);
                            let sort_path = path.iter().map(|category| category.id).collect();
                            let printable = printable_from_path(&path);
                            Ok((sort_path, printable))
                        })
                })
                .map_err(|e: FailureError| {
                    e.context("Service Categories, print hierarchy endpoint error occured.").into()
                }),
        )
    }

    fn with_equipment_count(&self) -> ServiceFuture<Vec<CategoryWithEquipmentCount>> {
        let db_pool = self.db_pool.clone();
        let repo_factory = self.repo_factory.clone();

        Box::new(
            self.cpu_pool
                .spawn_fn(move || {
                    db_pool
                        .get()
                        .map_err(|e| -> FailureError {
                            format_err!("Could not get connection to db from pool! {}", e)
                        })
                        .and_then(move |conn| {
                            let categories_repo = repo_factory.create_categories_repo(&*conn);
                            let counts = categories_repo.equipment_counts()?;
                            let all = categories_repo.list()?;
                            Ok(all
                                .into_iter()
                                .map(|category| {
                                    let count = counts.get(&category.id).cloned().unwrap_or(0);
                                    CategoryWithEquipmentCount::new(category, count)
                                })
                                .collect())
                        })
                })
                .map_err(|e: FailureError| {
                    e.context("Service Categories, with_equipment_count endpoint error occured.").into()
                }),
        )
    }

    fn search(&self, term: String) -> ServiceFuture<Vec<Category>> {
        let db_pool = self.db_pool.clone();
        let repo_factory = self.repo_factory.clone();

        Box::new(
            self.cpu_pool
                .spawn_fn(move || {
                    if term.len() > 255 {
                        return Err(validation_error("query", "Search query is too long").into());
                    }
                    db_pool
                        .get()
                        .map_err(|e| -> FailureError {
                            format_err!("Could not get connection to db from pool! {}", e)
                        })
                        .and_then(move |conn| {
                            let categories_repo = repo_factory.create_categories_repo(&*conn);
                            categories_repo.search(&term)
                        })
                })
                .map_err(|e: FailureError| e.context("Service Categories, search endpoint error occured.").into()),
        )
    }

    fn create(&self, payload: NewCategory) -> ServiceFuture<Category> {
        let db_pool = self.db_pool.clone();
        let repo_factory = self.repo_factory.clone();

        Box::new(
            self.cpu_pool
                .spawn_fn(move || {
                    db_pool
                        .get()
                        .map_err(|e| -> FailureError {
                            format_err!("Could not get connection to db from pool! {}", e)
                        })
                        .and_then(move |conn| {
                            let categories_repo = repo_factory.create_categories_repo(&*conn);
                            conn.transaction::<Category, FailureError, _>(move || {
                                if categories_repo.find_by_name(&payload.name)?.is_some() {
                                    return Err(Error::Conflict(format!(
                                        "Category with name \"{}\" already exists",
                                        payload.name
                                    )).into());
                                }
                                if let Some(parent_id) = payload.parent_id {
                                    if categories_repo.find(parent_id, Visibility::Active)?.is_none() {
                                        return Err(Error::NotFound.into());
                                    }
                                }
                                categories_repo.create(payload)
                            })
                        })
                })
                .map_err(|e: FailureError| e.context("Service Categories, create endpoint error occured.").into()),
        )
    }

    fn update(&self, category_id: i32, payload: UpdateCategory) -> ServiceFuture<Category> {
        let db_pool = self.db_pool.clone();
        let repo_factory = self.repo_factory.clone();

        Box::new(
            self.cpu_pool
                .spawn_fn(move || {
                    db_pool
                        .get()
                        .map_err(|e| -> FailureError {
                            format_err!("Could not get connection to db from pool! {}", e)
                        })
                        .and_then(move |conn| {
                            let categories_repo = repo_factory.create_categories_repo(&*conn);
                            conn.transaction::<Category, FailureError, _>(move || {
                                let current = categories_repo
                                    .find(category_id, Visibility::Active)?
                                    .ok_or::<FailureError>(Error::NotFound.into())?;

                                if let Some(ref new_name) = payload.name {
                                    if *new_name != current.name
                                        && categories_repo.find_by_name(new_name)?.is_some()
                                    {
                                        return Err(Error::Conflict(format!(
                                            "Category with name \"{}\" already exists",
                                            new_name
                                        )).into());
                                    }
                                }

                                if let Some(parent_id) = payload.parent_id {
                                    if parent_id == category_id {
                                        return Err(validation_error(
                                            "parent_id",
                                            "Category cannot be its own parent",
                                        ).into());
                                    }
                                    if categories_repo.find(parent_id, Visibility::Active)?.is_none() {
                                        return Err(Error::NotFound.into());
                                    }
                                    let all = categories_repo.list()?;
                                    if is_ancestor_of(&all, category_id, parent_id) {
                                        return Err(validation_error(
                                            "parent_id",
                                            "Category cannot be its own ancestor",
                                        ).into());
                                    }
                                }

                                categories_repo.update(category_id, payload)
                            })
                        })
                })
                .map_err(|e: FailureError| e.context("Service Categories, update endpoint error occured.").into()),
        )
    }

    fn delete(&self, category_id: i32) -> ServiceFuture<Category> {
        let db_pool = self.db_pool.clone();
        let repo_factory = self.repo_factory.clone();

        Box::new(
            self.cpu_pool
                .spawn_fn(move || {
                    db_pool
                        .get()
                        .map_err(|e| -> FailureError {
                            format_err!("Could not get connection to db from pool! {}", e)
                        })
                        .and_then(move |conn| {
                            let categories_repo = repo_factory.create_categories_repo(&*conn);
                            let equipment_repo = repo_factory.create_equipment_repo(&*conn);
                            conn.transaction::<Category, FailureError, _>(move || {
                                if categories_repo.find(category_id, Visibility::Active)?.is_none() {
                                    return Err(Error::NotFound.into());
                                }
                                let equipment_count = equipment_repo.count_by_category(category_id)?;
                                if equipment_count > 0 {
                                    return Err(Error::Business(format!(
                                        "Cannot delete category with {} associated equipment",
                                        equipment_count
                                    )).into());
                                }
                                categories_repo.soft_delete(category_id)
                            })
                        })
                })
                .map_err(|e: FailureError| e.context("Service Categories, delete endpoint error occured.").into()),
        )
    }
}

#[cfg(test)]
pub mod tests {
    use futures_cpupool::CpuPool;
    use r2d2;
    use tokio_core::reactor::Core;

    use super::*;
    use repos::repo_factory::tests::*;

    fn create_categories_service() -> CategoriesServiceImpl<MockConnection, MockConnectionManager, ReposFactoryMock> {
        let manager = MockConnectionManager::default();
        let db_pool = r2d2::Pool::builder().build(manager).expect("Failed to create connection pool");
        let cpu_pool = CpuPool::new(1);

        CategoriesServiceImpl {
            db_pool,
            cpu_pool,
            repo_factory: ReposFactoryMock::default(),
        }
    }

    fn new_category(name: &str, parent_id: Option<i32>) -> NewCategory {
        NewCategory {
            name: name.to_string(),
            description: None,
            parent_id,
            show_in_print_overview: true,
        }
    }

    #[test]
    fn test_get_category() {
        let mut core = Core::new().unwrap();
        let service = create_categories_service();
        let category = core.run(service.get(MOCK_ROOT_CATEGORY_ID)).unwrap().unwrap();
        assert_eq!(category.id, MOCK_ROOT_CATEGORY_ID);
    }

    #[test]
    fn test_create_duplicate_name_conflicts() {
        let mut core = Core::new().unwrap();
        let service = create_categories_service();
        let result = core.run(service.create(new_category("Cameras", None)));
        assert!(result.is_err());
    }

    #[test]
    fn test_self_parent_rejected() {
        let mut core = Core::new().unwrap();
        let service = create_categories_service();
        let payload = UpdateCategory {
            name: None,
            description: None,
            parent_id: Some(MOCK_ROOT_CATEGORY_ID),
            show_in_print_overview: None,
        };
        let result = core.run(service.update(MOCK_ROOT_CATEGORY_ID, payload));
        assert!(result.is_err());
    }

    #[test]
    fn test_cycle_guard_rejects_descendant_parent() {
        let mut core = Core::new().unwrap();
        let service = create_categories_service();
        // Cameras <- Cinema Cameras; re-rooting Cameras under its child must fail.
        let payload = UpdateCategory {
            name: None,
            description: None,
            parent_id: Some(MOCK_CAMERA_CATEGORY_ID),
            show_in_print_overview: None,
        };
        let result = core.run(service.update(MOCK_ROOT_CATEGORY_ID, payload));
        assert!(result.is_err());
    }

    #[test]
    fn test_reparent_to_sibling_allowed() {
        let mut core = Core::new().unwrap();
        let service = create_categories_service();
        let payload = UpdateCategory {
            name: None,
            description: None,
            parent_id: Some(MOCK_ACCESSORY_CATEGORY_ID),
            show_in_print_overview: None,
        };
        let updated = core.run(service.update(MOCK_CAMERA_CATEGORY_ID, payload)).unwrap();
        assert_eq!(updated.parent_id, Some(MOCK_ACCESSORY_CATEGORY_ID));
    }

    #[test]
    fn test_subcategory_ids_include_self_and_descendants() {
        let mut core = Core::new().unwrap();
        let service = create_categories_service();
        let mut ids = core.run(service.get_all_subcategory_ids(MOCK_ROOT_CATEGORY_ID)).unwrap();
        ids.sort();
        assert_eq!(
            ids,
            vec![
                MOCK_ROOT_CATEGORY_ID,
                MOCK_CAMERA_CATEGORY_ID,
                MOCK_ACCESSORY_CATEGORY_ID,
                MOCK_PRINTABLE_LEAF_ID,
            ]
        );
    }

    #[test]
    fn test_delete_category_with_equipment_refused() {
        let mut core = Core::new().unwrap();
        let service = create_categories_service();
        let result = core.run(service.delete(MOCK_CAMERA_CATEGORY_ID));
        assert!(result.is_err());
    }

    #[test]
    fn test_delete_empty_category() {
        let mut core = Core::new().unwrap();
        let service = create_categories_service();
        let deleted = core.run(service.delete(MOCK_EMPTY_CATEGORY_ID)).unwrap();
        assert!(deleted.deleted_at.is_some());
    }

    #[test]
    fn test_path_from_root_walks_parent_chain() {
        let mut core = Core::new().unwrap();
        let service = create_categories_service();
        let path: Vec<i32> = core
            .run(service.get_path_from_root(MOCK_UNPRINTABLE_LEAF_ID))
            .unwrap()
            .into_iter()
            .map(|category| category.id)
            .collect();
        assert_eq!(path, vec![MOCK_UNPRINTABLE_ROOT_ID, MOCK_UNPRINTABLE_MID_ID, MOCK_UNPRINTABLE_LEAF_ID]);
    }

    #[test]
    fn test_print_hierarchy_none_is_empty() {
        let mut core = Core::new().unwrap();
        let service = create_categories_service();
        let (sort_path, printable) = core.run(service.get_print_hierarchy_and_sort_path(None)).unwrap();
        assert!(sort_path.is_empty());
        assert!(printable.is_empty());
    }

    #[test]
    fn test_print_hierarchy_filters_and_relevels() {
        let mut core = Core::new().unwrap();
        let service = create_categories_service();
        // Root printable, middle not, leaf printable: the unprintable middle
        // is skipped and the leaf re-levels to 2.
        let (sort_path, printable) = core
            .run(service.get_print_hierarchy_and_sort_path(Some(MOCK_PRINTABLE_LEAF_ID)))
            .unwrap();
        assert_eq!(
            sort_path,
            vec![MOCK_ROOT_CATEGORY_ID, MOCK_CAMERA_CATEGORY_ID, MOCK_PRINTABLE_LEAF_ID]
        );
        assert_eq!(printable.len(), 2);
        assert_eq!(printable[0].id, MOCK_ROOT_CATEGORY_ID);
        assert_eq!(printable[0].level, 1);
        assert_eq!(printable[1].id, MOCK_PRINTABLE_LEAF_ID);
        assert_eq!(printable[1].level, 2);
    }

    #[test]
    fn test_print_hierarchy_root_fallback() {
        let mut core = Core::new().unwrap();
        let service = create_categories_service();
        // Whole chain unprintable: the root alone is emitted at level 1.
        let (sort_path, printable) = core
            .run(service.get_print_hierarchy_and_sort_path(Some(MOCK_UNPRINTABLE_LEAF_ID)))
            .unwrap();
        assert_eq!(
            sort_path,
            vec![MOCK_UNPRINTABLE_ROOT_ID, MOCK_UNPRINTABLE_MID_ID, MOCK_UNPRINTABLE_LEAF_ID]
        );
        assert_eq!(printable.len(), 1);
        assert_eq!(printable[0].id, MOCK_UNPRINTABLE_ROOT_ID);
        assert_eq!(printable[0].level, 1);
    }

    #[test]
    fn test_equipment_counts_are_direct_only() {
        let mut core = Core::new().unwrap();
        let service = create_categories_service();
        let counted = core.run(service.with_equipment_count()).unwrap();
        let root = counted.iter().find(|c| c.id == MOCK_ROOT_CATEGORY_ID).unwrap();
        let cameras = counted.iter().find(|c| c.id == MOCK_CAMERA_CATEGORY_ID).unwrap();
        assert_eq!(root.equipment_count, 0);
        assert_eq!(cameras.equipment_count, 2);
    }
}
