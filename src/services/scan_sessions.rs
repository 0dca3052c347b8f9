//! Scan sessions service: the ephemeral cart store. Items are replaced
//! wholesale on update; a request without a user id sees no sessions at all,
//! which callers rely on.

use diesel::connection::AnsiTransactionManager;
use diesel::pg::Pg;
use diesel::Connection;
use failure::Error as FailureError;
use failure::Fail;
use futures::future;
use futures::Future;
use futures_cpupool::CpuPool;
use r2d2::{ManageConnection, Pool};

use super::types::ServiceFuture;
use chrono::Utc;
use errors::Error;
use models::{InsertScanSession, NewScanSession, ScanSession, ScanSessionChangeset, UpdateScanSession};
use repos::ReposFactory;

pub trait ScanSessionsService {
    /// Returns a live session by ID
    fn get(&self, session_id: i32) -> ServiceFuture<ScanSession>;
    /// Live sessions of one user; `None` deliberately yields nothing
    fn list_for_user(&self, user_id: Option<i32>) -> ServiceFuture<Vec<ScanSession>>;
    /// Creates a session expiring a week from now
    fn create(&self, payload: NewScanSession) -> ServiceFuture<ScanSession>;
    /// Renames the session and/or replaces its item list
    fn update(&self, session_id: i32, payload: UpdateScanSession) -> ServiceFuture<ScanSession>;
    /// Soft-deletes a session
    fn delete(&self, session_id: i32) -> ServiceFuture<ScanSession>;
    /// Hard-deletes expired sessions; safe to call repeatedly
    fn reap_expired(&self) -> ServiceFuture<usize>;
}

/// Scan sessions service, responsible for the scanner carts
pub struct ScanSessionsServiceImpl<
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
    > ScanSessionsServiceImpl<T, M, F>
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
    > ScanSessionsService for ScanSessionsServiceImpl<T, M, F>
{
    fn get(&self, session_id: i32) -> ServiceFuture<ScanSession> {
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
                            let scan_sessions_repo = repo_factory.create_scan_sessions_repo(&*conn);
                            scan_sessions_repo
                                .find(session_id)?
                                .map(From::from)
                                .ok_or(Error::NotFound.into())
                        })
                })
                .map_err(|e: FailureError| e.context("Service ScanSessions, get endpoint error occured.").into()),
        )
    }

    fn list_for_user(&self, user_id: Option<i32>) -> ServiceFuture<Vec<ScanSession>> {
        let user_id = match user_id {
            Some(user_id) => user_id,
            // Preserved quirk: an anonymous request sees an empty list, not
            // everyone's sessions.
            None => return Box::new(future::ok(vec![])),
        };
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
                            let scan_sessions_repo = repo_factory.create_scan_sessions_repo(&*conn);
                            let sessions = scan_sessions_repo.list_for_user(user_id)?;
                            Ok(sessions.into_iter().map(From::from).collect())
                        })
                })
                .map_err(|e: FailureError| {
                    e.context("Service ScanSessions, list_for_user endpoint error occured.").into()
                }),
        )
    }

    fn create(&self, payload: NewScanSession) -> ServiceFuture<ScanSession> {
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
                            let scan_sessions_repo = repo_factory.create_scan_sessions_repo(&*conn);
                            let insert = InsertScanSession::from_payload(payload, Utc::now());
                            scan_sessions_repo.create(insert).map(From::from)
                        })
                })
                .map_err(|e: FailureError| e.context("Service ScanSessions, create endpoint error occured.").into()),
        )
    }

    fn update(&self, session_id: i32, payload: UpdateScanSession) -> ServiceFuture<ScanSession> {
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
                            let scan_sessions_repo = repo_factory.create_scan_sessions_repo(&*conn);
                            if scan_sessions_repo.find(session_id)?.is_none() {
                                return Err(Error::NotFound.into());
                            }
                            scan_sessions_repo
                                .update(session_id, ScanSessionChangeset::from(payload))
                                .map(From::from)
                        })
                })
                .map_err(|e: FailureError| e.context("Service ScanSessions, update endpoint error occured.").into()),
        )
    }

    fn delete(&self, session_id: i32) -> ServiceFuture<ScanSession> {
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
                            let scan_sessions_repo = repo_factory.create_scan_sessions_repo(&*conn);
                            if scan_sessions_repo.find(session_id)?.is_none() {
                                return Err(Error::NotFound.into());
                            }
                            scan_sessions_repo.soft_delete(session_id).map(From::from)
                        })
                })
                .map_err(|e: FailureError| e.context("Service ScanSessions, delete endpoint error occured.").into()),
        )
    }

    fn reap_expired(&self) -> ServiceFuture<usize> {
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
                            let scan_sessions_repo = repo_factory.create_scan_sessions_repo(&*conn);
                            let reaped = scan_sessions_repo.reap_expired()?;
                            if reaped > 0 {
                                info!("Reaped {} expired scan sessions.", reaped);
                            }
                            Ok(reaped)
                        })
                })
                .map_err(|e: FailureError| {
                    e.context("Service ScanSessions, reap_expired endpoint error occured.").into()
                }),
        )
    }
}
