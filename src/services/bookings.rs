//! Bookings service: the booking and payment state machines, the atomic
//! cart commit and the cascade into equipment status. Every write runs in
//! one transaction scope; serialization failures are retried once.

use diesel;
use diesel::connection::AnsiTransactionManager;
use diesel::pg::Pg;
use diesel::result::DatabaseErrorKind;
use diesel::Connection;
use failure::Error as FailureError;
use failure::Fail;
use futures::Future;
use futures_cpupool::CpuPool;
use num_traits::Zero;
use r2d2::{ManageConnection, Pool};
use rust_decimal::Decimal;

use super::types::ServiceFuture;
use errors::{validation_error, Error};
use models::{
    BatchCreateResult, Booking, BookingFilter, BookingPatch, BookingStatus, BookingWithDetails,
    EquipmentStatus, FailedBooking, InsertBooking, NewBooking, PaymentStatus, ProjectPaymentStatus,
    UpdateBooking, Visibility,
};
use repos::pagination::Page;
use repos::{BookingsRepo, ClientsRepo, EquipmentRepo, ProjectsRepo, ReposFactory};

/// Freshly created bookings block their unit right away.
const DEFAULT_BOOKING_STATUS: BookingStatus = BookingStatus::Active;

/// Cart commits are capped at this many positions.
pub const MAX_BATCH_SIZE: usize = 100;

pub trait BookingsService {
    /// Returns booking by ID with client/equipment/project resolved
    fn get(&self, booking_id: i32) -> ServiceFuture<BookingWithDetails>;
    /// Paginated listing with filters
    fn list(&self, filter: BookingFilter, skip: i64, limit: i64) -> ServiceFuture<Page<BookingWithDetails>>;
    /// Creates a booking after the availability check
    fn create(&self, payload: NewBooking) -> ServiceFuture<BookingWithDetails>;
    /// Creates up to `MAX_BATCH_SIZE` bookings in one transaction; partial
    /// success commits, zero success rolls back
    fn batch_create(&self, payloads: Vec<NewBooking>, project_id: Option<i32>) -> ServiceFuture<BatchCreateResult>;
    /// Updates the rental window, re-checking availability without counting
    /// the booking itself
    fn update(&self, booking_id: i32, payload: UpdateBooking) -> ServiceFuture<BookingWithDetails>;
    /// Window update combined with optional status moves
    fn patch(&self, booking_id: i32, payload: BookingPatch) -> ServiceFuture<BookingWithDetails>;
    /// Booking status machine with the equipment cascade
    fn change_status(&self, booking_id: i32, new_status: BookingStatus) -> ServiceFuture<BookingWithDetails>;
    /// Payment status machine with the project rollup
    fn change_payment_status(&self, booking_id: i32, new_status: PaymentStatus) -> ServiceFuture<BookingWithDetails>;
    /// Soft-deletes the booking and clears references from documents
    fn delete(&self, booking_id: i32) -> ServiceFuture<Booking>;
}

/// Bookings service, responsible for the reservation lifecycle
pub struct BookingsServiceImpl<
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
    > BookingsServiceImpl<T, M, F>
{
    pub fn new(db_pool: Pool<M>, cpu_pool: CpuPool, repo_factory: F) -> Self {
        Self {
            db_pool,
            cpu_pool,
            repo_factory,
        }
    }
}

/// Runs `attempt` and, on a serialization failure, once more; a second
/// failure surfaces as a conflict.
pub fn with_serialization_retry<V, A>(mut attempt: A) -> Result<V, FailureError>
where
    A: FnMut() -> Result<V, FailureError>,
{
    match attempt() {
        Ok(value) => Ok(value),
        Err(error) => {
            let serialization_failure = error.iter_chain().any(|cause| {
                match cause.downcast_ref::<diesel::result::Error>() {
                    Some(&diesel::result::Error::DatabaseError(DatabaseErrorKind::SerializationFailure, _)) => true,
                    _ => false,
                }
            });
            if !serialization_failure {
                return Err(error);
            }
            warn!("Serialization failure, retrying once: {}", error);
            attempt().map_err(|retry_error| {
                let retryable = retry_error.iter_chain().any(|cause| {
                    match cause.downcast_ref::<diesel::result::Error>() {
                        Some(&diesel::result::Error::DatabaseError(
                            DatabaseErrorKind::SerializationFailure,
                            _,
                        )) => true,
                        _ => false,
                    }
                });
                if retryable {
                    retry_error
                        .context(Error::Conflict("Concurrent modification, try again".to_string()))
                        .into()
                } else {
                    retry_error
                }
            })
        }
    }
}

/// Maps an error to the wire name of its kind for batch failure reports.
fn error_kind_name(error: &FailureError) -> String {
    for cause in error.iter_chain() {
        if let Some(kind) = cause.downcast_ref::<Error>() {
            let name = match *kind {
                Error::NotFound => "NotFoundError",
                Error::Parse => "ParseError",
                Error::Validate(_) => "ValidationError",
                Error::Conflict(_) => "ConflictError",
                Error::Availability { .. } => "AvailabilityError",
                Error::StatusTransition { .. } => "StatusTransitionError",
                Error::Business(_) => "BusinessError",
                Error::Payment(_) => "PaymentError",
                Error::Document(_) => "DocumentError",
            };
            return name.to_string();
        }
    }
    "UnexpectedError".to_string()
}

/// Validates one booking payload and inserts it; shared by the single and
/// batch create paths so both see identical rules.
fn create_one(
    bookings_repo: &BookingsRepo,
    equipment_repo: &EquipmentRepo,
    clients_repo: &ClientsRepo,
    projects_repo: &ProjectsRepo,
    payload: NewBooking,
) -> Result<Booking, FailureError> {
    if payload.start_date >= payload.end_date {
        return Err(validation_error("start_date", "Start date must be before end date").into());
    }
    if payload.total_amount < Decimal::zero() {
        return Err(validation_error("total_amount", "Total amount must be non-negative").into());
    }
    if payload.quantity < 1 {
        return Err(validation_error("quantity", "Quantity must be at least 1").into());
    }

    let unit = equipment_repo
        .find(payload.equipment_id, Visibility::Active)?
        .ok_or::<FailureError>(Error::NotFound.into())?;
    if clients_repo.find(payload.client_id, Visibility::Active)?.is_none() {
        return Err(Error::NotFound.into());
    }
    if let Some(project_id) = payload.project_id {
        if projects_repo.find(project_id, Visibility::Active)?.is_none() {
            return Err(Error::NotFound.into());
        }
    }

    let conflicts =
        bookings_repo.find_overlapping(payload.equipment_id, payload.start_date, payload.end_date, None)?;
    if let Some(first) = conflicts.first() {
        return Err(Error::Availability {
            equipment_id: payload.equipment_id,
            conflicting_booking_id: Some(first.id),
        }.into());
    }
    if unit.status != EquipmentStatus::Available {
        return Err(Error::Availability {
            equipment_id: payload.equipment_id,
            conflicting_booking_id: None,
        }.into());
    }

    let deposit_amount = payload
        .deposit_amount
        .unwrap_or(payload.total_amount * Decimal::new(20, 2));
    bookings_repo.create(InsertBooking {
        client_id: payload.client_id,
        equipment_id: payload.equipment_id,
        project_id: payload.project_id,
        start_date: payload.start_date,
        end_date: payload.end_date,
        quantity: payload.quantity,
        booking_status: DEFAULT_BOOKING_STATUS,
        payment_status: PaymentStatus::Pending,
        total_amount: payload.total_amount,
        paid_amount: Decimal::zero(),
        deposit_amount,
        notes: payload.notes,
    })
}

/// Resolves the eager names for a booking response. Soft-deleted rows still
/// resolve so that historical bookings keep their labels.
fn resolve_details(
    booking: Booking,
    clients_repo: &ClientsRepo,
    equipment_repo: &EquipmentRepo,
    projects_repo: &ProjectsRepo,
) -> Result<BookingWithDetails, FailureError> {
    let client_name = clients_repo
        .find(booking.client_id, Visibility::All)?
        .map(|client| client.name)
        .unwrap_or_else(|| format!("Client {}", booking.client_id));
    let equipment_name = equipment_repo
        .find(booking.equipment_id, Visibility::All)?
        .map(|unit| unit.name)
        .unwrap_or_else(|| format!("Equipment {}", booking.equipment_id));
    let project_name = match booking.project_id {
        Some(project_id) => projects_repo.find(project_id, Visibility::All)?.map(|project| project.name),
        None => None,
    };
    Ok(BookingWithDetails::new(booking, client_name, equipment_name, project_name))
}

/// Re-derives and stores the payment rollup of a project from its members.
pub fn refresh_project_payment_status(
    bookings_repo: &BookingsRepo,
    projects_repo: &ProjectsRepo,
    project_id: i32,
) -> Result<(), FailureError> {
    let members: Vec<PaymentStatus> = bookings_repo
        .list_by_project(project_id)?
        .into_iter()
        .map(|booking| booking.payment_status)
        .collect();
    let rollup = ProjectPaymentStatus::derive_from(&members);
    projects_repo.set_payment_status(project_id, rollup)?;
    Ok(())
}

impl<
        T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static,
        M: ManageConnection<Connection = T>,
        F: ReposFactory<T>,
    > BookingsService for BookingsServiceImpl<T, M, F>
{
    fn get(&self, booking_id: i32) -> ServiceFuture<BookingWithDetails> {
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
                            let bookings_repo = repo_factory.create_bookings_repo(&*conn);
                            let clients_repo = repo_factory.create_clients_repo(&*conn);
                            let equipment_repo = repo_factory.create_equipment_repo(&*conn);
                            let projects_repo = repo_factory.create_projects_repo(&*conn);
                            let booking = bookings_repo
                                .find(booking_id)?
                                .ok_or::<FailureError>(Error::NotFound.into())?;
                            resolve_details(booking, &*clients_repo, &*equipment_repo, &*projects_repo)
                        })
                })
                .map_err(|e: FailureError| e.context("Service Bookings, get endpoint error occured.").into()),
        )
    }

    fn list(&self, filter: BookingFilter, skip: i64, limit: i64) -> ServiceFuture<Page<BookingWithDetails>> {
        let db_pool = self.db_pool.clone();
        let repo_factory = self.repo_factory.clone();

        Box::new(
            self.cpu_pool
                .spawn_fn(move || {
                    if let Some(ref term) = filter.query {
                        if term.len() > 255 {
                            return Err(validation_error("query", "Search query is too long").into());
                        }
                    }
                    if let Some(ref term) = filter.equipment_query {
                        if term.len() > 255 {
                            return Err(validation_error("equipment_query", "Search query is too long").into());
                        }
                    }
                    db_pool
                        .get()
                        .map_err(|e| -> FailureError {
                            format_err!("Could not get connection to db from pool! {}", e)
                        })
                        .and_then(move |conn| {
                            let bookings_repo = repo_factory.create_bookings_repo(&*conn);
                            let clients_repo = repo_factory.create_clients_repo(&*conn);
                            let equipment_repo = repo_factory.create_equipment_repo(&*conn);
                            let projects_repo = repo_factory.create_projects_repo(&*conn);
                            let (bookings, total) = bookings_repo.list(filter, skip, limit)?;
                            let mut items = vec![];
                            for booking in bookings {
                                items.push(resolve_details(
                                    booking,
                                    &*clients_repo,
                                    &*equipment_repo,
                                    &*projects_repo,
                                )?);
                            }
                            Ok(Page::new(items, total, skip, limit))
                        })
                })
                .map_err(|e: FailureError| e.context("Service Bookings, list endpoint error occured.").into()),
        )
    }

    fn create(&self, payload: NewBooking) -> ServiceFuture<BookingWithDetails> {
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
                            let bookings_repo = repo_factory.create_bookings_repo(&*conn);
                            let clients_repo = repo_factory.create_clients_repo(&*conn);
                            let equipment_repo = repo_factory.create_equipment_repo(&*conn);
                            let projects_repo = repo_factory.create_projects_repo(&*conn);
                            let created = with_serialization_retry(|| {
                                let payload = payload.clone();
                                conn.transaction::<Booking, FailureError, _>(|| {
                                    let created = create_one(
                                        &*bookings_repo,
                                        &*equipment_repo,
                                        &*clients_repo,
                                        &*projects_repo,
                                        payload,
                                    )?;
                                    if let Some(project_id) = created.project_id {
                                        refresh_project_payment_status(
                                            &*bookings_repo,
                                            &*projects_repo,
                                            project_id,
                                        )?;
                                    }
                                    Ok(created)
                                })
                            })?;
                            resolve_details(created, &*clients_repo, &*equipment_repo, &*projects_repo)
                        })
                })
                .map_err(|e: FailureError| e.context("Service Bookings, create endpoint error occured.").into()),
        )
    }

    fn batch_create(&self, payloads: Vec<NewBooking>, project_id: Option<i32>) -> ServiceFuture<BatchCreateResult> {
        let db_pool = self.db_pool.clone();
        let repo_factory = self.repo_factory.clone();

        Box::new(
            self.cpu_pool
                .spawn_fn(move || {
                    if payloads.is_empty() {
                        return Err(validation_error("bookings", "No booking data provided").into());
                    }
                    if payloads.len() > MAX_BATCH_SIZE {
                        return Err(validation_error("bookings", "Maximum 100 bookings per batch").into());
                    }
                    db_pool
                        .get()
                        .map_err(|e| -> FailureError {
                            format_err!("Could not get connection to db from pool! {}", e)
                        })
                        .and_then(move |conn| {
                            let bookings_repo = repo_factory.create_bookings_repo(&*conn);
                            let clients_repo = repo_factory.create_clients_repo(&*conn);
                            let equipment_repo = repo_factory.create_equipment_repo(&*conn);
                            let projects_repo = repo_factory.create_projects_repo(&*conn);

                            let result = conn.transaction::<BatchCreateResult, FailureError, _>(|| {
                                let mut created_bookings = vec![];
                                let mut failed_bookings = vec![];
                                for mut payload in payloads.clone() {
                                    if project_id.is_some() {
                                        payload.project_id = project_id;
                                    }
                                    let equipment_id = payload.equipment_id;
                                    match create_one(
                                        &*bookings_repo,
                                        &*equipment_repo,
                                        &*clients_repo,
                                        &*projects_repo,
                                        payload,
                                    ) {
                                        Ok(booking) => {
                                            let details = resolve_details(
                                                booking,
                                                &*clients_repo,
                                                &*equipment_repo,
                                                &*projects_repo,
                                            )?;
                                            created_bookings.push(details);
                                        }
                                        Err(error) => {
                                            warn!(
                                                "Batch booking for equipment {} failed: {}",
                                                equipment_id, error
                                            );
                                            failed_bookings.push(FailedBooking {
                                                equipment_id,
                                                error: format!("{}", error),
                                                error_type: error_kind_name(&error),
                                            });
                                        }
                                    }
                                }
                                if created_bookings.is_empty() {
                                    return Err(
                                        validation_error("bookings", "No bookings could be created").into()
                                    );
                                }
                                if let Some(project_id) = project_id {
                                    refresh_project_payment_status(&*bookings_repo, &*projects_repo, project_id)?;
                                }
                                Ok(BatchCreateResult {
                                    created_count: created_bookings.len(),
                                    failed_count: failed_bookings.len(),
                                    created_bookings,
                                    failed_bookings,
                                })
                            })?;
                            Ok(result)
                        })
                })
                .map_err(|e: FailureError| {
                    e.context("Service Bookings, batch_create endpoint error occured.").into()
                }),
        )
    }

    fn update(&self, booking_id: i32, payload: UpdateBooking) -> ServiceFuture<BookingWithDetails> {
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
                            let bookings_repo = repo_factory.create_bookings_repo(&*conn);
                            let clients_repo = repo_factory.create_clients_repo(&*conn);
                            let equipment_repo = repo_factory.create_equipment_repo(&*conn);
                            let projects_repo = repo_factory.create_projects_repo(&*conn);
                            let updated = conn.transaction::<Booking, FailureError, _>(|| {
                                let current = bookings_repo
                                    .find(booking_id)?
                                    .ok_or::<FailureError>(Error::NotFound.into())?;

                                let from = payload.start_date.unwrap_or(current.start_date);
                                let to = payload.end_date.unwrap_or(current.end_date);
                                if from >= to {
                                    return Err(validation_error(
                                        "start_date",
                                        "Start date must be before end date",
                                    ).into());
                                }
                                if let Some(quantity) = payload.quantity {
                                    if quantity < 1 {
                                        return Err(validation_error(
                                            "quantity",
                                            "Quantity must be at least 1",
                                        ).into());
                                    }
                                }

                                let conflicts = bookings_repo.find_overlapping(
                                    current.equipment_id,
                                    from,
                                    to,
                                    Some(current.id),
                                )?;
                                if let Some(first) = conflicts.first() {
                                    return Err(Error::Availability {
                                        equipment_id: current.equipment_id,
                                        conflicting_booking_id: Some(first.id),
                                    }.into());
                                }

                                bookings_repo.update(booking_id, payload)
                            })?;
                            resolve_details(updated, &*clients_repo, &*equipment_repo, &*projects_repo)
                        })
                })
                .map_err(|e: FailureError| e.context("Service Bookings, update endpoint error occured.").into()),
        )
    }

    fn patch(&self, booking_id: i32, payload: BookingPatch) -> ServiceFuture<BookingWithDetails> {
        let booking_status = payload.booking_status;
        let payment_status = payload.payment_status;
        let window = payload.window_changeset();

        let service = BookingsServiceImpl {
            db_pool: self.db_pool.clone(),
            cpu_pool: self.cpu_pool.clone(),
            repo_factory: self.repo_factory.clone(),
        };

        Box::new(self.update(booking_id, window).and_then(move |details| {
            let after_status: ServiceFuture<BookingWithDetails> = match booking_status {
                Some(new_status) => service.change_status(booking_id, new_status),
                None => Box::new(::futures::future::ok(details)),
            };
            after_status.and_then(move |details| match payment_status {
                Some(new_status) => service.change_payment_status(booking_id, new_status),
                None => Box::new(::futures::future::ok(details)) as ServiceFuture<BookingWithDetails>,
            })
        }))
    }

    fn change_status(&self, booking_id: i32, new_status: BookingStatus) -> ServiceFuture<BookingWithDetails> {
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
                            let bookings_repo = repo_factory.create_bookings_repo(&*conn);
                            let clients_repo = repo_factory.create_clients_repo(&*conn);
                            let equipment_repo = repo_factory.create_equipment_repo(&*conn);
                            let projects_repo = repo_factory.create_projects_repo(&*conn);
                            let updated = with_serialization_retry(|| {
                                conn.transaction::<Booking, FailureError, _>(|| {
                                    let current = bookings_repo
                                        .find(booking_id)?
                                        .ok_or::<FailureError>(Error::NotFound.into())?;
                                    if !current.booking_status.can_transition_to(new_status) {
                                        return Err(Error::StatusTransition {
                                            current: current.booking_status.to_string(),
                                            requested: new_status.to_string(),
                                            allowed: current
                                                .booking_status
                                                .allowed_transitions()
                                                .iter()
                                                .map(|status| status.to_string())
                                                .collect(),
                                        }.into());
                                    }

                                    let updated = bookings_repo.set_status(booking_id, new_status)?;

                                    match new_status {
                                        BookingStatus::Active => {
                                            let unit = equipment_repo
                                                .find(current.equipment_id, Visibility::Active)?
                                                .ok_or::<FailureError>(Error::NotFound.into())?;
                                            if unit.status != EquipmentStatus::Rented {
                                                if !unit.status.can_transition_to(EquipmentStatus::Rented) {
                                                    return Err(Error::StatusTransition {
                                                        current: unit.status.to_string(),
                                                        requested: EquipmentStatus::Rented.to_string(),
                                                        allowed: vec![],
                                                    }.into());
                                                }
                                                equipment_repo
                                                    .set_status(current.equipment_id, EquipmentStatus::Rented)?;
                                            }
                                        }
                                        BookingStatus::Completed | BookingStatus::Cancelled => {
                                            let still_blocked =
                                                bookings_repo.has_blocking_for_equipment(current.equipment_id)?;
                                            if !still_blocked {
                                                let unit = equipment_repo
                                                    .find(current.equipment_id, Visibility::Active)?;
                                                if let Some(unit) = unit {
                                                    if unit.status == EquipmentStatus::Rented {
                                                        equipment_repo.set_status(
                                                            current.equipment_id,
                                                            EquipmentStatus::Available,
                                                        )?;
                                                    }
                                                }
                                            }
                                        }
                                        _ => {}
                                    }

                                    Ok(updated)
                                })
                            })?;
                            resolve_details(updated, &*clients_repo, &*equipment_repo, &*projects_repo)
                        })
                })
                .map_err(|e: FailureError| {
                    e.context("Service Bookings, change_status endpoint error occured.").into()
                }),
        )
    }

    fn change_payment_status(&self, booking_id: i32, new_status: PaymentStatus) -> ServiceFuture<BookingWithDetails> {
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
                            let bookings_repo = repo_factory.create_bookings_repo(&*conn);
                            let clients_repo = repo_factory.create_clients_repo(&*conn);
                            let equipment_repo = repo_factory.create_equipment_repo(&*conn);
                            let projects_repo = repo_factory.create_projects_repo(&*conn);
                            let updated = conn.transaction::<Booking, FailureError, _>(|| {
                                let current = bookings_repo
                                    .find(booking_id)?
                                    .ok_or::<FailureError>(Error::NotFound.into())?;
                                if !current.payment_status.can_transition_to(new_status) {
                                    return Err(Error::StatusTransition {
                                        current: current.payment_status.to_string(),
                                        requested: new_status.to_string(),
                                        allowed: current
                                            .payment_status
                                            .allowed_transitions()
                                            .iter()
                                            .map(|status| status.to_string())
                                            .collect(),
                                    }.into());
                                }
                                let updated = bookings_repo.set_payment_status(booking_id, new_status)?;
                                if let Some(project_id) = updated.project_id {
                                    refresh_project_payment_status(&*bookings_repo, &*projects_repo, project_id)?;
                                }
                                Ok(updated)
                            })?;
                            resolve_details(updated, &*clients_repo, &*equipment_repo, &*projects_repo)
                        })
                })
                .map_err(|e: FailureError| {
                    e.context("Service Bookings, change_payment_status endpoint error occured.").into()
                }),
        )
    }

    fn delete(&self, booking_id: i32) -> ServiceFuture<Booking> {
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
                            let bookings_repo = repo_factory.create_bookings_repo(&*conn);
                            let documents_repo = repo_factory.create_documents_repo(&*conn);
                            let projects_repo = repo_factory.create_projects_repo(&*conn);
                            conn.transaction::<Booking, FailureError, _>(|| {
                                let current = bookings_repo
                                    .find(booking_id)?
                                    .ok_or::<FailureError>(Error::NotFound.into())?;
                                let deleted = bookings_repo.soft_delete(booking_id)?;
                                documents_repo.detach_booking(booking_id)?;
                                if let Some(project_id) = current.project_id {
                                    refresh_project_payment_status(&*bookings_repo, &*projects_repo, project_id)?;
                                }
                                Ok(deleted)
                            })
                        })
                })
                .map_err(|e: FailureError| e.context("Service Bookings, delete endpoint error occured.").into()),
        )
    }
}
