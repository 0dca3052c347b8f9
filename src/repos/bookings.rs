//! Bookings repo. The overlap predicate lives here: closed-closed intervals,
//! so two windows conflict when `a_start <= b_end && b_start <= a_end`, and
//! only bookings in a blocking status count.

use chrono::{DateTime, Utc};
use diesel;
use diesel::connection::AnsiTransactionManager;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::query_dsl::RunQueryDsl;
use diesel::Connection;
use failure::Fail;

use models::{Booking, BookingFilter, BookingStatus, InsertBooking, PaymentStatus, UpdateBooking};
use repos::pagination::Paginate;
use repos::types::RepoResult;
use schema::bookings::dsl::*;
use schema::clients::dsl as Clients;
use schema::equipment::dsl as Equipment;

/// Bookings repository, responsible for handling booking rows
pub struct BookingsRepoImpl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> {
    pub db_conn: &'a T,
}

pub trait BookingsRepo {
    /// Find specific booking by id
    fn find(&self, booking_id_arg: i32) -> RepoResult<Option<Booking>>;

    /// Paginated listing with filters
    fn list(&self, filter: BookingFilter, skip: i64, limit: i64) -> RepoResult<(Vec<Booking>, i64)>;

    /// All non-deleted bookings of one equipment unit
    fn list_by_equipment(&self, equipment_id_arg: i32) -> RepoResult<Vec<Booking>>;

    /// All non-deleted bookings of one client
    fn list_by_client(&self, client_id_arg: i32) -> RepoResult<Vec<Booking>>;

    /// All non-deleted bookings attached to one project
    fn list_by_project(&self, project_id_arg: i32) -> RepoResult<Vec<Booking>>;

    /// Blocking bookings of the unit overlapping the closed window,
    /// optionally ignoring one booking (used by updates).
    fn find_overlapping(
        &self,
        equipment_id_arg: i32,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        exclude_booking_id: Option<i32>,
    ) -> RepoResult<Vec<Booking>>;

    /// Ids of equipment with any blocking booking overlapping the window
    fn equipment_ids_with_conflicts(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> RepoResult<Vec<i32>>;

    /// True when the unit still has any blocking booking
    fn has_blocking_for_equipment(&self, equipment_id_arg: i32) -> RepoResult<bool>;

    /// True when the client still has any blocking booking
    fn has_blocking_for_client(&self, client_id_arg: i32) -> RepoResult<bool>;

    /// Creates new booking
    fn create(&self, payload: InsertBooking) -> RepoResult<Booking>;

    /// Updates the window fields of a booking
    fn update(&self, booking_id_arg: i32, payload: UpdateBooking) -> RepoResult<Booking>;

    /// Sets booking status; transition legality is checked by the service
    fn set_status(&self, booking_id_arg: i32, status_arg: BookingStatus) -> RepoResult<Booking>;

    /// Sets payment status; transition legality is checked by the service
    fn set_payment_status(&self, booking_id_arg: i32, status_arg: PaymentStatus) -> RepoResult<Booking>;

    /// Attaches or detaches the booking from a project
    fn set_project(&self, booking_id_arg: i32, project_id_arg: Option<i32>) -> RepoResult<Booking>;

    /// Stamps `deleted_at`
    fn soft_delete(&self, booking_id_arg: i32) -> RepoResult<Booking>;
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> BookingsRepoImpl<'a, T> {
    pub fn new(db_conn: &'a T) -> Self {
        Self { db_conn }
    }
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> BookingsRepo
    for BookingsRepoImpl<'a, T>
{
    fn find(&self, booking_id_arg: i32) -> RepoResult<Option<Booking>> {
        debug!("Find in bookings with id {}.", booking_id_arg);
        bookings
            .find(booking_id_arg)
            .filter(deleted_at.is_null())
            .get_result::<Booking>(self.db_conn)
            .optional()
            .map_err(|e: diesel::result::Error| {
                e.context(format!("Find booking with id {} error occured", booking_id_arg))
                    .into()
            })
    }

    fn list(&self, filter: BookingFilter, skip: i64, limit: i64) -> RepoResult<(Vec<Booking>, i64)> {
        debug!("List bookings with filter {:?} skip {} limit {}.", filter, skip, limit);
        let mut query = bookings
            .inner_join(Clients::clients)
            .inner_join(Equipment::equipment)
            .select(::schema::bookings::all_columns)
            .filter(deleted_at.is_null())
            .into_boxed();

        if let Some(term) = filter.query {
            let pattern = format!("%{}%", term);
            query = query.filter(
                Clients::name
                    .ilike(pattern.clone())
                    .or(Clients::email.ilike(pattern.clone()))
                    .or(Clients::phone.ilike(pattern)),
            );
        }
        if let Some(term) = filter.equipment_query {
            let pattern = format!("%{}%", term);
            query = query.filter(
                Equipment::name
                    .ilike(pattern.clone())
                    .or(Equipment::serial_number.ilike(pattern)),
            );
        }
        if let Some(equipment_id_arg) = filter.equipment_id {
            query = query.filter(equipment_id.eq(equipment_id_arg));
        }
        if let Some(status_arg) = filter.booking_status {
            query = query.filter(booking_status.eq(status_arg));
        }
        if let Some(status_arg) = filter.payment_status {
            query = query.filter(payment_status.eq(status_arg));
        }
        if let Some(from) = filter.start_date {
            query = query.filter(end_date.ge(from));
        }
        if let Some(to) = filter.end_date {
            query = query.filter(start_date.le(to));
        }
        if filter.active_only {
            query = query.filter(booking_status.eq_any(BookingStatus::blocking()));
        }

        query
            .order(created_at.desc())
            .paginate(skip, limit)
            .load_and_total::<Booking, _>(self.db_conn)
            .map_err(|e| e.context("List bookings error occured").into())
    }

    fn list_by_equipment(&self, equipment_id_arg: i32) -> RepoResult<Vec<Booking>> {
        bookings
            .filter(equipment_id.eq(equipment_id_arg))
            .filter(deleted_at.is_null())
            .order(start_date)
            .load::<Booking>(self.db_conn)
            .map_err(|e: diesel::result::Error| {
                e.context(format!("List bookings of equipment {} error occured", equipment_id_arg))
                    .into()
            })
    }

    fn list_by_client(&self, client_id_arg: i32) -> RepoResult<Vec<Booking>> {
        bookings
            .filter(client_id.eq(client_id_arg))
            .filter(deleted_at.is_null())
            .order(start_date)
            .load::<Booking>(self.db_conn)
            .map_err(|e: diesel::result::Error| {
                e.context(format!("List bookings of client {} error occured", client_id_arg))
                    .into()
            })
    }

    fn list_by_project(&self, project_id_arg: i32) -> RepoResult<Vec<Booking>> {
        bookings
            .filter(project_id.eq(project_id_arg))
            .filter(deleted_at.is_null())
            .order(start_date)
            .load::<Booking>(self.db_conn)
            .map_err(|e: diesel::result::Error| {
                e.context(format!("List bookings of project {} error occured", project_id_arg))
                    .into()
            })
    }

    fn find_overlapping(
        &self,
        equipment_id_arg: i32,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        exclude_booking_id: Option<i32>,
    ) -> RepoResult<Vec<Booking>> {
        debug!(
            "Find overlapping bookings for equipment {} in [{}, {}].",
            equipment_id_arg, from, to
        );
        let mut query = bookings
            .filter(equipment_id.eq(equipment_id_arg))
            .filter(deleted_at.is_null())
            .filter(booking_status.eq_any(BookingStatus::blocking()))
            .filter(start_date.le(to))
            .filter(end_date.ge(from))
            .into_boxed();
        if let Some(excluded) = exclude_booking_id {
            query = query.filter(id.ne(excluded));
        }
        query
            .order(start_date)
            .load::<Booking>(self.db_conn)
            .map_err(|e: diesel::result::Error| {
                e.context(format!(
                    "Find overlapping bookings for equipment {} error occured",
                    equipment_id_arg
                )).into()
            })
    }

    fn equipment_ids_with_conflicts(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> RepoResult<Vec<i32>> {
        bookings
            .filter(deleted_at.is_null())
            .filter(booking_status.eq_any(BookingStatus::blocking()))
            .filter(start_date.le(to))
            .filter(end_date.ge(from))
            .select(equipment_id)
            .distinct()
            .load::<i32>(self.db_conn)
            .map_err(|e: diesel::result::Error| {
                e.context("Equipment ids with conflicting bookings error occured").into()
            })
    }

    fn has_blocking_for_equipment(&self, equipment_id_arg: i32) -> RepoResult<bool> {
        diesel::select(diesel::dsl::exists(
            bookings
                .filter(equipment_id.eq(equipment_id_arg))
                .filter(deleted_at.is_null())
                .filter(booking_status.eq_any(BookingStatus::blocking())),
        )).get_result(self.db_conn)
            .map_err(|e: diesel::result::Error| {
                e.context(format!(
                    "Blocking bookings check for equipment {} error occured",
                    equipment_id_arg
                )).into()
            })
    }

    fn has_blocking_for_client(&self, client_id_arg: i32) -> RepoResult<bool> {
        diesel::select(diesel::dsl::exists(
            bookings
                .filter(client_id.eq(client_id_arg))
                .filter(deleted_at.is_null())
                .filter(booking_status.eq_any(BookingStatus::blocking())),
        )).get_result(self.db_conn)
            .map_err(|e: diesel::result::Error| {
                e.context(format!(
                    "Blocking bookings check for client {} error occured",
                    client_id_arg
                )).into()
            })
    }

    fn create(&self, payload: InsertBooking) -> RepoResult<Booking> {
        debug!("Create booking {:?}.", payload);
        diesel::insert_into(bookings)
            .values(&payload)
            .get_result::<Booking>(self.db_conn)
            .map_err(|e: diesel::result::Error| {
                e.context(format!("Create booking {:?} error occured", payload)).into()
            })
    }

    fn update(&self, booking_id_arg: i32, payload: UpdateBooking) -> RepoResult<Booking> {
        debug!("Updating booking with id {} and payload {:?}.", booking_id_arg, payload);
        let filter = bookings.filter(id.eq(booking_id_arg)).filter(deleted_at.is_null());
        diesel::update(filter)
            .set(&payload)
            .get_result::<Booking>(self.db_conn)
            .map_err(|e: diesel::result::Error| {
                e.context(format!(
                    "Updating booking with id {} and payload {:?} error occured",
                    booking_id_arg, payload
                )).into()
            })
    }

    fn set_status(&self, booking_id_arg: i32, status_arg: BookingStatus) -> RepoResult<Booking> {
        debug!("Set booking {} status {}.", booking_id_arg, status_arg);
        let filter = bookings.filter(id.eq(booking_id_arg)).filter(deleted_at.is_null());
        diesel::update(filter)
            .set(booking_status.eq(status_arg))
            .get_result::<Booking>(self.db_conn)
            .map_err(|e: diesel::result::Error| {
                e.context(format!(
                    "Set booking {} status {} error occured",
                    booking_id_arg, status_arg
                )).into()
            })
    }

    fn set_payment_status(&self, booking_id_arg: i32, status_arg: PaymentStatus) -> RepoResult<Booking> {
        debug!("Set booking {} payment status {}.", booking_id_arg, status_arg);
        let filter = bookings.filter(id.eq(booking_id_arg)).filter(deleted_at.is_null());
        diesel::update(filter)
            .set(payment_status.eq(status_arg))
            .get_result::<Booking>(self.db_conn)
            .map_err(|e: diesel::result::Error| {
                e.context(format!(
                    "Set booking {} payment status {} error occured",
                    booking_id_arg, status_arg
                )).into()
            })
    }

    fn set_project(&self, booking_id_arg: i32, project_id_arg: Option<i32>) -> RepoResult<Booking> {
        debug!("Set booking {} project {:?}.", booking_id_arg, project_id_arg);
        let filter = bookings.filter(id.eq(booking_id_arg)).filter(deleted_at.is_null());
        diesel::update(filter)
            .set(project_id.eq(project_id_arg))
            .get_result::<Booking>(self.db_conn)
            .map_err(|e: diesel::result::Error| {
                e.context(format!(
                    "Set booking {} project {:?} error occured",
                    booking_id_arg, project_id_arg
                )).into()
            })
    }

    fn soft_delete(&self, booking_id_arg: i32) -> RepoResult<Booking> {
        debug!("Soft delete booking with id {}.", booking_id_arg);
        let filter = bookings.filter(id.eq(booking_id_arg)).filter(deleted_at.is_null());
        diesel::update(filter)
            .set(deleted_at.eq(Utc::now()))
            .get_result::<Booking>(self.db_conn)
            .map_err(|e: diesel::result::Error| {
                e.context(format!("Soft delete booking with id {} error occured", booking_id_arg))
                    .into()
            })
    }
}
