//! Scan sessions repo. Expired sessions are invisible to every read and are
//! hard-deleted by the background reaper.

use chrono::Utc;
use diesel;
use diesel::connection::AnsiTransactionManager;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::query_dsl::RunQueryDsl;
use diesel::Connection;
use failure::Fail;

use models::{InsertScanSession, RawScanSession, ScanSessionChangeset};
use repos::types::RepoResult;
use schema::scan_sessions::dsl::*;

/// Scan sessions repository, responsible for handling the ephemeral carts
pub struct ScanSessionsRepoImpl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> {
    pub db_conn: &'a T,
}

pub trait ScanSessionsRepo {
    /// Find a live (non-deleted, non-expired) session by id
    fn find(&self, session_id_arg: i32) -> RepoResult<Option<RawScanSession>>;

    /// Live sessions owned by the given user, most recent first
    fn list_for_user(&self, user_id_arg: i32) -> RepoResult<Vec<RawScanSession>>;

    /// Creates new scan session
    fn create(&self, payload: InsertScanSession) -> RepoResult<RawScanSession>;

    /// Replaces name and/or the whole items list
    fn update(&self, session_id_arg: i32, payload: ScanSessionChangeset) -> RepoResult<RawScanSession>;

    /// Stamps `deleted_at`
    fn soft_delete(&self, session_id_arg: i32) -> RepoResult<RawScanSession>;

    /// Hard-deletes expired sessions, returning how many went away.
    /// Idempotent by construction.
    fn reap_expired(&self) -> RepoResult<usize>;
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> ScanSessionsRepoImpl<'a, T> {
    pub fn new(db_conn: &'a T) -> Self {
        Self { db_conn }
    }
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> ScanSessionsRepo
    for ScanSessionsRepoImpl<'a, T>
{
    fn find(&self, session_id_arg: i32) -> RepoResult<Option<RawScanSession>> {
        debug!("Find in scan sessions with id {}.", session_id_arg);
        scan_sessions
            .find(session_id_arg)
            .filter(deleted_at.is_null())
            .filter(expires_at.ge(Utc::now()))
            .get_result::<RawScanSession>(self.db_conn)
            .optional()
            .map_err(|e: diesel::result::Error| {
                e.context(format!("Find scan session with id {} error occured", session_id_arg))
                    .into()
            })
    }

    fn list_for_user(&self, user_id_arg: i32) -> RepoResult<Vec<RawScanSession>> {
        debug!("List scan sessions of user {}.", user_id_arg);
        scan_sessions
            .filter(user_id.eq(user_id_arg))
            .filter(deleted_at.is_null())
            .filter(expires_at.ge(Utc::now()))
            .order(updated_at.desc())
            .load::<RawScanSession>(self.db_conn)
            .map_err(|e: diesel::result::Error| {
                e.context(format!("List scan sessions of user {} error occured", user_id_arg))
                    .into()
            })
    }

    fn create(&self, payload: InsertScanSession) -> RepoResult<RawScanSession> {
        debug!("Create scan session {:?}.", payload);
        diesel::insert_into(scan_sessions)
            .values(&payload)
            .get_result::<RawScanSession>(self.db_conn)
            .map_err(|e: diesel::result::Error| {
                e.context(format!("Create scan session {:?} error occured", payload)).into()
            })
    }

    fn update(&self, session_id_arg: i32, payload: ScanSessionChangeset) -> RepoResult<RawScanSession> {
        debug!("Updating scan session with id {}.", session_id_arg);
        let filter = scan_sessions
            .filter(id.eq(session_id_arg))
            .filter(deleted_at.is_null())
            .filter(expires_at.ge(Utc::now()));
        diesel::update(filter)
            .set(&payload)
            .get_result::<RawScanSession>(self.db_conn)
            .map_err(|e: diesel::result::Error| {
                e.context(format!("Updating scan session with id {} error occured", session_id_arg))
                    .into()
            })
    }

    fn soft_delete(&self, session_id_arg: i32) -> RepoResult<RawScanSession> {
        debug!("Soft delete scan session with id {}.", session_id_arg);
        let filter = scan_sessions.filter(id.eq(session_id_arg)).filter(deleted_at.is_null());
        diesel::update(filter)
            .set(deleted_at.eq(Utc::now()))
            .get_result::<RawScanSession>(self.db_conn)
            .map_err(|e: diesel::result::Error| {
                e.context(format!(
                    "Soft delete scan session with id {} error occured",
                    session_id_arg
                )).into()
            })
    }

    fn reap_expired(&self) -> RepoResult<usize> {
        diesel::delete(scan_sessions.filter(expires_at.lt(Utc::now())))
            .execute(self.db_conn)
            .map_err(|e: diesel::result::Error| e.context("Reap expired scan sessions error occured").into())
    }
}
