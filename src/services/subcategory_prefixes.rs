//! Subcategory prefixes service: label-prefix bookkeeping for the printing
//! workflow. Prefixes are uppercased on the way in and unique per category.

use diesel::connection::AnsiTransactionManager;
use diesel::pg::Pg;
use diesel::Connection;
use failure::Error as FailureError;
use failure::Fail;
use futures::Future;
use futures_cpupool::CpuPool;
use r2d2::{ManageConnection, Pool};

use super::types::ServiceFuture;
use errors::Error;
use models::{NewSubcategoryPrefix, SubcategoryPrefix, UpdateSubcategoryPrefix, Visibility};
use repos::ReposFactory;

pub trait SubcategoryPrefixesService {
    /// Returns subcategory prefix by ID
    fn get(&self, prefix_id: i32) -> ServiceFuture<Option<SubcategoryPrefix>>;
    /// All prefixes of one category
    fn list_by_category(&self, category_id: i32) -> ServiceFuture<Vec<SubcategoryPrefix>>;
    /// Creates new subcategory prefix
    fn create(&self, payload: NewSubcategoryPrefix) -> ServiceFuture<SubcategoryPrefix>;
    /// Updates specific subcategory prefix
    fn update(&self, prefix_id: i32, payload: UpdateSubcategoryPrefix) -> ServiceFuture<SubcategoryPrefix>;
    /// Soft-deletes a subcategory prefix
    fn delete(&self, prefix_id: i32) -> ServiceFuture<SubcategoryPrefix>;
}

pub struct SubcategoryPrefixesServiceImpl<
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
    > SubcategoryPrefixesServiceImpl<T, M, F>
{
    pub fn new(db_pool: Pool<M>, cpu_pool: CpuPool, repo_factory: F) -> Self {
        Self {
            db_pool,
            cpu_pool,
            repo_factory,
        }
    }
}

impl<
        T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static,
        M: ManageConnection<Connection = T>,
        F: ReposFactory<T>,
    > SubcategoryPrefixesService for SubcategoryPrefixesServiceImpl<T, M, F>
{
    fn get(&self, prefix_id: i32) -> ServiceFuture<Option<SubcategoryPrefix>> {
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
                            let prefixes_repo = repo_factory.create_subcategory_prefixes_repo(&*conn);
                            prefixes_repo.find(prefix_id)
                        })
                })
                .map_err(|e: FailureError| {
                    e.context("Service SubcategoryPrefixes, get endpoint error occured.").into()
                }),
        )
    }

    fn list_by_category(&self, category_id: i32) -> ServiceFuture<Vec<SubcategoryPrefix>> {
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
                            let prefixes_repo = repo_factory.create_subcategory_prefixes_repo(&*conn);
                            if categories_repo.find(category_id, Visibility::Active)?.is_none() {
                                return Err(Error::NotFound.into());
                            }
                            prefixes_repo.list_by_category(category_id)
                        })
                })
                .map_err(|e: FailureError| {
                    e.context("Service SubcategoryPrefixes, list_by_category endpoint error occured.")
                        .into()
                }),
        )
    }

    fn create(&self, payload: NewSubcategoryPrefix) -> ServiceFuture<SubcategoryPrefix> {
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
                            let prefixes_repo = repo_factory.create_subcategory_prefixes_repo(&*conn);
                            conn.transaction::<SubcategoryPrefix, FailureError, _>(move || {
                                let mut payload = payload;
                                payload.prefix = payload.prefix.to_uppercase();
                                if categories_repo.find(payload.category_id, Visibility::Active)?.is_none() {
                                    return Err(Error::NotFound.into());
                                }
                                if prefixes_repo.exists(payload.category_id, &payload.name, &payload.prefix)? {
                                    return Err(Error::Conflict(format!(
                                        "Subcategory prefix \"{}\" already exists in category {}",
                                        payload.prefix, payload.category_id
                                    )).into());
                                }
                                prefixes_repo.create(payload)
                            })
                        })
                })
                .map_err(|e: FailureError| {
                    e.context("Service SubcategoryPrefixes, create endpoint error occured.").into()
                }),
        )
    }

    fn update(&self, prefix_id: i32, payload: UpdateSubcategoryPrefix) -> ServiceFuture<SubcategoryPrefix> {
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
                            let prefixes_repo = repo_factory.create_subcategory_prefixes_repo(&*conn);
                            conn.transaction::<SubcategoryPrefix, FailureError, _>(move || {
                                let mut payload = payload;
                                payload.prefix = payload.prefix.map(|prefix| prefix.to_uppercase());
                                if prefixes_repo.find(prefix_id)?.is_none() {
                                    return Err(Error::NotFound.into());
                                }
                                prefixes_repo.update(prefix_id, payload)
                            })
                        })
                })
                .map_err(|e: FailureError| {
                    e.context("Service SubcategoryPrefixes, update endpoint error occured.").into()
                }),
        )
    }

    fn delete(&self, prefix_id: i32) -> ServiceFuture<SubcategoryPrefix> {
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
                            let prefixes_repo = repo_factory.create_subcategory_prefixes_repo(&*conn);
                            if prefixes_repo.find(prefix_id)?.is_none() {
                                return Err(Error::NotFound.into());
                            }
                            prefixes_repo.soft_delete(prefix_id)
                        })
                })
                .map_err(|e: FailureError| {
                    e.context("Service SubcategoryPrefixes, delete endpoint error occured.").into()
                }),
        )
    }
}

#[cfg(test)]
mod tests {
    use futures_cpupool::CpuPool;
    use r2d2;
    use tokio_core::reactor::Core;

    use super::*;
    use repos::repo_factory::tests::*;

    fn create_prefixes_service(
        repo_factory: ReposFactoryMock,
    ) -> SubcategoryPrefixesServiceImpl<MockConnection, MockConnectionManager, ReposFactoryMock> {
        let manager = MockConnectionManager::default();
        let db_pool = r2d2::Pool::builder().build(manager).expect("Failed to create connection pool");
        let cpu_pool = CpuPool::new(1);

        SubcategoryPrefixesServiceImpl {
            db_pool,
            cpu_pool,
            repo_factory,
        }
    }

    fn new_prefix(prefix: &str) -> NewSubcategoryPrefix {
        NewSubcategoryPrefix {
            category_id: MOCK_CAMERA_CATEGORY_ID,
            name: "Cine".to_string(),
            prefix: prefix.to_string(),
            description: None,
        }
    }

    #[test]
    fn test_create_uppercases_prefix() {
        let mut core = Core::new().unwrap();
        let service = create_prefixes_service(ReposFactoryMock::default());
        let created = core.run(service.create(new_prefix("cc"))).unwrap();
        assert_eq!(created.prefix, "CC");
    }

    #[test]
    fn test_duplicate_prefix_conflicts() {
        let mut core = Core::new().unwrap();
        let service = create_prefixes_service(ReposFactoryMock::default());
        core.run(service.create(new_prefix("CC"))).unwrap();
        let result = core.run(service.create(new_prefix("cc")));
        assert!(result.is_err());
    }
}
