//! Documents repo, presents CRUD operations with db for file metadata

use chrono::Utc;
use diesel;
use diesel::connection::AnsiTransactionManager;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::query_dsl::RunQueryDsl;
use diesel::Connection;
use failure::Fail;

use models::{Document, NewDocument, UpdateDocument, Visibility};
use repos::pagination::Paginate;
use repos::types::RepoResult;
use schema::documents::dsl::*;

/// Documents repository, responsible for handling document rows
pub struct DocumentsRepoImpl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> {
    pub db_conn: &'a T,
}

pub trait DocumentsRepo {
    /// Find specific document by id
    fn find(&self, document_id_arg: i32, visibility: Visibility) -> RepoResult<Option<Document>>;

    /// Paginated listing, optionally narrowed to one client or booking
    fn list(
        &self,
        client_id_arg: Option<i32>,
        booking_id_arg: Option<i32>,
        skip: i64,
        limit: i64,
    ) -> RepoResult<(Vec<Document>, i64)>;

    /// Creates new document
    fn create(&self, payload: NewDocument) -> RepoResult<Document>;

    /// Updates specific document
    fn update(&self, document_id_arg: i32, payload: UpdateDocument) -> RepoResult<Document>;

    /// Clears `booking_id` in every document attached to the booking
    fn detach_booking(&self, booking_id_arg: i32) -> RepoResult<usize>;

    /// Stamps `deleted_at`
    fn soft_delete(&self, document_id_arg: i32) -> RepoResult<Document>;
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> DocumentsRepoImpl<'a, T> {
    pub fn new(db_conn: &'a T) -> Self {
        Self { db_conn }
    }
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> DocumentsRepo
    for DocumentsRepoImpl<'a, T>
{
    fn find(&self, document_id_arg: i32, visibility: Visibility) -> RepoResult<Option<Document>> {
        debug!("Find in documents with id {}.", document_id_arg);
        let query = documents.find(document_id_arg);
        let document = match visibility {
            Visibility::Active => query
                .filter(deleted_at.is_null())
                .get_result::<Document>(self.db_conn)
                .optional()?,
            Visibility::All => query.get_result::<Document>(self.db_conn).optional()?,
        };
        Ok(document)
    }

    fn list(
        &self,
        client_id_arg: Option<i32>,
        booking_id_arg: Option<i32>,
        skip: i64,
        limit: i64,
    ) -> RepoResult<(Vec<Document>, i64)> {
        debug!(
            "List documents for client {:?} booking {:?} skip {} limit {}.",
            client_id_arg, booking_id_arg, skip, limit
        );
        let mut query = documents.filter(deleted_at.is_null()).into_boxed();
        if let Some(client_id_value) = client_id_arg {
            query = query.filter(client_id.eq(client_id_value));
        }
        if let Some(booking_id_value) = booking_id_arg {
            query = query.filter(booking_id.eq(booking_id_value));
        }
        query
            .order(created_at.desc())
            .paginate(skip, limit)
            .load_and_total::<Document, _>(self.db_conn)
            .map_err(|e| e.context("List documents error occured").into())
    }

    fn create(&self, payload: NewDocument) -> RepoResult<Document> {
        debug!("Create document {:?}.", payload);
        diesel::insert_into(documents)
            .values(&payload)
            .get_result::<Document>(self.db_conn)
            .map_err(|e: diesel::result::Error| {
                e.context(format!("Create document {:?} error occured", payload)).into()
            })
    }

    fn update(&self, document_id_arg: i32, payload: UpdateDocument) -> RepoResult<Document> {
        debug!("Updating document with id {} and payload {:?}.", document_id_arg, payload);
        let filter = documents.filter(id.eq(document_id_arg)).filter(deleted_at.is_null());
        diesel::update(filter)
            .set(&payload)
            .get_result::<Document>(self.db_conn)
            .map_err(|e: diesel::result::Error| {
                e.context(format!(
                    "Updating document with id {} and payload {:?} error occured",
                    document_id_arg, payload
                )).into()
            })
    }

    fn detach_booking(&self, booking_id_arg: i32) -> RepoResult<usize> {
        debug!("Detach booking {} from documents.", booking_id_arg);
        let filter = documents.filter(booking_id.eq(booking_id_arg));
        diesel::update(filter)
            .set(booking_id.eq(None::<i32>))
            .execute(self.db_conn)
            .map_err(|e: diesel::result::Error| {
                e.context(format!("Detach booking {} from documents error occured", booking_id_arg))
                    .into()
            })
    }

    fn soft_delete(&self, document_id_arg: i32) -> RepoResult<Document> {
        debug!("Soft delete document with id {}.", document_id_arg);
        let filter = documents.filter(id.eq(document_id_arg)).filter(deleted_at.is_null());
        diesel::update(filter)
            .set(deleted_at.eq(Utc::now()))
            .get_result::<Document>(self.db_conn)
            .map_err(|e: diesel::result::Error| {
                e.context(format!("Soft delete document with id {} error occured", document_id_arg))
                    .into()
            })
    }
}
