//! Clients service, presents CRUD operations with renters

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
use models::{Booking, Client, NewClient, UpdateClient, Visibility};
use repos::pagination::Page;
use repos::ReposFactory;

pub trait ClientsService {
    /// Returns client by ID
    fn get(&self, client_id: i32) -> ServiceFuture<Option<Client>>;
    /// Paginated listing, optionally narrowed by a search term
    fn list(&self, term: Option<String>, skip: i64, limit: i64) -> ServiceFuture<Page<Client>>;
    /// Creates new client
    fn create(&self, payload: NewClient) -> ServiceFuture<Client>;
    /// Updates specific client
    fn update(&self, client_id: i32, payload: UpdateClient) -> ServiceFuture<Client>;
    /// Soft-deletes a client without blocking bookings
    fn delete(&self, client_id: i32) -> ServiceFuture<Client>;
    /// All bookings of one client
    fn get_bookings(&self, client_id: i32) -> ServiceFuture<Vec<Booking>>;
}

/// Clients service, responsible for renter records
pub struct ClientsServiceImpl<
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
    > ClientsServiceImpl<T, M, F>
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
    > ClientsService for ClientsServiceImpl<T, M, F>
{
    fn get(&self, client_id: i32) -> ServiceFuture<Option<Client>> {
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
                            let clients_repo = repo_factory.create_clients_repo(&*conn);
                            clients_repo.find(client_id, Visibility::Active)
                        })
                })
                .map_err(|e: FailureError| e.context("Service Clients, get endpoint error occured.").into()),
        )
    }

    fn list(&self, term: Option<String>, skip: i64, limit: i64) -> ServiceFuture<Page<Client>> {
        let db_pool = self.db_pool.clone();
        let repo_factory = self.repo_factory.clone();

        Box::new(
            self.cpu_pool
                .spawn_fn(move || {
                    if let Some(ref term) = term {
                        if term.len() > 255 {
                            return Err(validation_error("query", "Search query is too long").into());
                        }
                    }
                    db_pool
                        .get()
                        .map_err(|e| -> FailureError {
                            format_err!("Could not get connection to db from pool! {}", e)
                        })
                        .and_then(move |conn| {
                            let clients_repo = repo_factory.create_clients_repo(&*conn);
                            let (items, total) = clients_repo.list(term, skip, limit)?;
                            Ok(Page::new(items, total, skip, limit))
                        })
                })
                .map_err(|e: FailureError| e.context("Service Clients, list endpoint error occured.").into()),
        )
    }

    fn create(&self, payload: NewClient) -> ServiceFuture<Client> {
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
                            let clients_repo = repo_factory.create_clients_repo(&*conn);
                            conn.transaction::<Client, FailureError, _>(move || clients_repo.create(payload))
                        })
                })
                .map_err(|e: FailureError| e.context("Service Clients, create endpoint error occured.").into()),
        )
    }

    fn update(&self, client_id: i32, payload: UpdateClient) -> ServiceFuture<Client> {
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
                            let clients_repo = repo_factory.create_clients_repo(&*conn);
                            conn.transaction::<Client, FailureError, _>(move || {
                                if clients_repo.find(client_id, Visibility::Active)?.is_none() {
                                    return Err(Error::NotFound.into());
                                }
                                clients_repo.update(client_id, payload)
                            })
                        })
                })
                .map_err(|e: FailureError| e.context("Service Clients, update endpoint error occured.").into()),
        )
    }

    fn delete(&self, client_id: i32) -> ServiceFuture<Client> {
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
                            let clients_repo = repo_factory.create_clients_repo(&*conn);
                            let bookings_repo = repo_factory.create_bookings_repo(&*conn);
                            conn.transaction::<Client, FailureError, _>(move || {
                                if clients_repo.find(client_id, Visibility::Active)?.is_none() {
                                    return Err(Error::NotFound.into());
                                }
                                if bookings_repo.has_blocking_for_client(client_id)? {
                                    return Err(Error::Business(
                                        "Cannot delete client with active bookings".to_string(),
                                    ).into());
                                }
                                clients_repo.soft_delete(client_id)
                            })
                        })
                })
                .map_err(|e: FailureError| e.context("Service Clients, delete endpoint error occured.").into()),
        )
    }

    fn get_bookings(&self, client_id: i32) -> ServiceFuture<Vec<Booking>> {
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
                            let clients_repo = repo_factory.create_clients_repo(&*conn);
                            let bookings_repo = repo_factory.create_bookings_repo(&*conn);
                            if clients_repo.find(client_id, Visibility::Active)?.is_none() {
                                return Err(Error::NotFound.into());
                            }
                            bookings_repo.list_by_client(client_id)
                        })
                })
                .map_err(|e: FailureError| e.context("Service Clients, get_bookings endpoint error occured.").into()),
        )
    }
}
