//! Clients repo, presents CRUD operations with db for renters

use chrono::Utc;
use diesel;
use diesel::connection::AnsiTransactionManager;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::query_dsl::RunQueryDsl;
use diesel::Connection;
use failure::Fail;

use models::{Client, NewClient, UpdateClient, Visibility};
use repos::pagination::Paginate;
use repos::types::RepoResult;
use schema::clients::dsl::*;

/// Clients repository, responsible for handling client rows
pub struct ClientsRepoImpl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> {
    pub db_conn: &'a T,
}

pub trait ClientsRepo {
    /// Find specific client by id
    fn find(&self, client_id_arg: i32, visibility: Visibility) -> RepoResult<Option<Client>>;

    /// Paginated listing, optionally narrowed by a substring over
    /// name/email/phone/company
    fn list(&self, term: Option<String>, skip: i64, limit: i64) -> RepoResult<(Vec<Client>, i64)>;

    /// Creates new client
    fn create(&self, payload: NewClient) -> RepoResult<Client>;

    /// Updates specific client
    fn update(&self, client_id_arg: i32, payload: UpdateClient) -> RepoResult<Client>;

    /// Stamps `deleted_at`
    fn soft_delete(&self, client_id_arg: i32) -> RepoResult<Client>;
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> ClientsRepoImpl<'a, T> {
    pub fn new(db_conn: &'a T) -> Self {
        Self { db_conn }
    }
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> ClientsRepo
    for ClientsRepoImpl<'a, T>
{
    fn find(&self, client_id_arg: i32, visibility: Visibility) -> RepoResult<Option<Client>> {
        debug!("Find in clients with id {}.", client_id_arg);
        let query = clients.find(client_id_arg);
        let client = match visibility {
            Visibility::Active => query
                .filter(deleted_at.is_null())
                .get_result::<Client>(self.db_conn)
                .optional()?,
            Visibility::All => query.get_result::<Client>(self.db_conn).optional()?,
        };
        Ok(client)
    }

    fn list(&self, term: Option<String>, skip: i64, limit: i64) -> RepoResult<(Vec<Client>, i64)> {
        debug!("List clients with term {:?} skip {} limit {}.", term, skip, limit);
        let mut query = clients.filter(deleted_at.is_null()).into_boxed();
        if let Some(term) = term {
            let pattern = format!("%{}%", term);
            query = query.filter(
                name.ilike(pattern.clone())
                    .or(email.ilike(pattern.clone()))
                    .or(phone.ilike(pattern.clone()))
                    .or(company.ilike(pattern)),
            );
        }
        query
            .order(name)
            .paginate(skip, limit)
            .load_and_total::<Client, _>(self.db_conn)
            .map_err(|e| e.context("List clients error occured").into())
    }

    fn create(&self, payload: NewClient) -> RepoResult<Client> {
        debug!("Create client {:?}.", payload);
        diesel::insert_into(clients)
            .values(&payload)
            .get_result::<Client>(self.db_conn)
            .map_err(|e: diesel::result::Error| {
                e.context(format!("Create client {:?} error occured", payload)).into()
            })
    }

    fn update(&self, client_id_arg: i32, payload: UpdateClient) -> RepoResult<Client> {
        debug!("Updating client with id {} and payload {:?}.", client_id_arg, payload);
        let filter = clients.filter(id.eq(client_id_arg)).filter(deleted_at.is_null());
        diesel::update(filter)
            .set(&payload)
            .get_result::<Client>(self.db_conn)
            .map_err(|e: diesel::result::Error| {
                e.context(format!(
                    "Updating client with id {} and payload {:?} error occured",
                    client_id_arg, payload
                )).into()
            })
    }

    fn soft_delete(&self, client_id_arg: i32) -> RepoResult<Client> {
        debug!("Soft delete client with id {}.", client_id_arg);
        let filter = clients.filter(id.eq(client_id_arg)).filter(deleted_at.is_null());
        diesel::update(filter)
            .set(deleted_at.eq(Utc::now()))
            .get_result::<Client>(self.db_conn)
            .map_err(|e: diesel::result::Error| {
                e.context(format!("Soft delete client with id {} error occured", client_id_arg))
                    .into()
            })
    }
}
