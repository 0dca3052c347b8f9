//! Barcode sequence repo. The singleton row is read `FOR UPDATE` so
//! concurrent allocators serialize; the increment commits or rolls back with
//! the caller's transaction, which permits gaps but never duplicates.

use diesel;
use diesel::connection::AnsiTransactionManager;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::query_dsl::RunQueryDsl;
use diesel::Connection;
use failure::Fail;

use models::{BarcodeSequence, BARCODE_SEQUENCE_ID};
use repos::types::RepoResult;
use schema::barcode_sequences::dsl::*;

/// Barcode sequence repository over the singleton counter row
pub struct BarcodeSequencesRepoImpl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> {
    pub db_conn: &'a T,
}

pub trait BarcodeSequencesRepo {
    /// Locks the row, increments and returns the new sequence number.
    fn next_number(&self) -> RepoResult<i32>;

    /// The number the next `next_number` call would hand out, without
    /// consuming it.
    fn peek_next_number(&self) -> RepoResult<i32>;
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> BarcodeSequencesRepoImpl<'a, T> {
    pub fn new(db_conn: &'a T) -> Self {
        Self { db_conn }
    }

    fn current_locked(&self) -> RepoResult<BarcodeSequence> {
        let existing = barcode_sequences
            .find(BARCODE_SEQUENCE_ID)
            .for_update()
            .get_result::<BarcodeSequence>(self.db_conn)
            .optional()?;
        match existing {
            Some(row) => Ok(row),
            None => diesel::insert_into(barcode_sequences)
                .values((id.eq(BARCODE_SEQUENCE_ID), last_number.eq(0)))
                .get_result::<BarcodeSequence>(self.db_conn)
                .map_err(|e: diesel::result::Error| e.context("Seed barcode sequence error occured").into()),
        }
    }
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> BarcodeSequencesRepo
    for BarcodeSequencesRepoImpl<'a, T>
{
    fn next_number(&self) -> RepoResult<i32> {
        let current = self.current_locked()?;
        let next = current.last_number + 1;
        diesel::update(barcode_sequences.find(BARCODE_SEQUENCE_ID))
            .set(last_number.eq(next))
            .execute(self.db_conn)
            .map_err(|e: diesel::result::Error| -> ::failure::Error {
                e.context("Increment barcode sequence error occured").into()
            })?;
        debug!("Allocated barcode sequence number {}.", next);
        Ok(next)
    }

    fn peek_next_number(&self) -> RepoResult<i32> {
        let current = barcode_sequences
            .find(BARCODE_SEQUENCE_ID)
            .get_result::<BarcodeSequence>(self.db_conn)
            .optional()
            .map_err(|e: diesel::result::Error| -> ::failure::Error {
                e.context("Read barcode sequence error occured").into()
            })?;
        Ok(current.map(|row| row.last_number).unwrap_or(0) + 1)
    }
}
