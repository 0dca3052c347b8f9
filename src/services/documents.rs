//! Documents service, presents CRUD operations with stored file metadata.
//! The files themselves are written by the upload layer; this service only
//! guards the references.

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
use models::{Document, NewDocument, UpdateDocument, Visibility};
use repos::pagination::Page;
use repos::ReposFactory;

pub trait DocumentsService {
    /// Returns document by ID
    fn get(&self, document_id: i32) -> ServiceFuture<Option<Document>>;
    /// Paginated listing, optionally narrowed to a client or booking
    fn list(
        &self,
        client_id: Option<i32>,
        booking_id: Option<i32>,
        skip: i64,
        limit: i64,
    ) -> ServiceFuture<Page<Document>>;
    /// Registers a document
    fn create(&self, payload: NewDocument) -> ServiceFuture<Document>;
    /// Updates specific document
    fn update(&self, document_id: i32, payload: UpdateDocument) -> ServiceFuture<Document>;
    /// Soft-deletes a document
    fn delete(&self, document_id: i32) -> ServiceFuture<Document>;
}

/// Documents service, responsible for file metadata
pub struct DocumentsServiceImpl<
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
    > DocumentsServiceImpl<T, M, F>
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
    > DocumentsService for DocumentsServiceImpl<T, M, F>
{
    fn get(&self, document_id: i32) -> ServiceFuture<Option<Document>> {
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
                            let documents_repo = repo_factory.create_documents_repo(&*conn);
                            documents_repo.find(document_id, Visibility::Active)
                        })
                })
                .map_err(|e: FailureError| e.context("Service Documents, get endpoint error occured.").into()),
        )
    }

    fn list(
        &self,
        client_id: Option<i32>,
        booking_id: Option<i32>,
        skip: i64,
        limit: i64,
    ) -> ServiceFuture<Page<Document>> {
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
                            let documents_repo = repo_factory.create_documents_repo(&*conn);
                            let (items, total) = documents_repo.list(client_id, booking_id, skip, limit)?;
                            Ok(Page::new(items, total, skip, limit))
                        })
                })
                .map_err(|e: FailureError| e.context("Service Documents, list endpoint error occured.").into()),
        )
    }

    fn create(&self, payload: NewDocument) -> ServiceFuture<Document> {
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
                            let documents_repo = repo_factory.create_documents_repo(&*conn);
                            let clients_repo = repo_factory.create_clients_repo(&*conn);
                            let bookings_repo = repo_factory.create_bookings_repo(&*conn);
                            conn.transaction::<Document, FailureError, _>(move || {
                                if clients_repo.find(payload.client_id, Visibility::Active)?.is_none() {
                                    return Err(Error::NotFound.into());
                                }
                                if let Some(booking_id) = payload.booking_id {
                                    if bookings_repo.find(booking_id)?.is_none() {
                                        return Err(Error::NotFound.into());
                                    }
                                }
                                documents_repo.create(payload)
                            })
                        })
                })
                .map_err(|e: FailureError| e.context("Service Documents, create endpoint error occured.").into()),
        )
    }

    fn update(&self, document_id: i32, payload: UpdateDocument) -> ServiceFuture<Document> {
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
                            let documents_repo = repo_factory.create_documents_repo(&*conn);
                            conn.transaction::<Document, FailureError, _>(move || {
                                if documents_repo.find(document_id, Visibility::Active)?.is_none() {
                                    return Err(Error::NotFound.into());
                                }
                                documents_repo.update(document_id, payload)
                            })
                        })
                })
                .map_err(|e: FailureError| e.context("Service Documents, update endpoint error occured.").into()),
        )
    }

    fn delete(&self, document_id: i32) -> ServiceFuture<Document> {
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
                            let documents_repo = repo_factory.create_documents_repo(&*conn);
                            conn.transaction::<Document, FailureError, _>(move || {
                                if documents_repo.find(document_id, Visibility::Active)?.is_none() {
                                    return Err(Error::NotFound.into());
                                }
                                documents_repo.soft_delete(document_id)
                            })
                        })
                })
                .map_err(|e: FailureError| e.context("Service Documents, delete endpoint error occured.").into()),
        )
    }
}
