//! Equipment service: registration with barcode minting, the equipment
//! status machine and the availability check over the booking calendar.

use chrono::{DateTime, Utc};
use diesel::connection::AnsiTransactionManager;
use diesel::pg::Pg;
use diesel::Connection;
use failure::Error as FailureError;
use failure::Fail;
use futures::Future;
use futures_cpupool::CpuPool;
use r2d2::{ManageConnection, Pool};

use super::barcode::{compose_barcode, parse_barcode, validate_format};
use super::categories::printable_from_path;
use super::types::ServiceFuture;
use errors::{validation_error, Error};
use models::{
    AvailabilityResponse, Booking, ConflictInfo, Equipment, EquipmentFilter, EquipmentStatus,
    EquipmentWithCategory, InsertEquipment, NewEquipment, UpdateEquipment, Visibility,
};
use repos::categories::{path_from_root, subtree_ids};
use repos::pagination::Page;
use repos::{BookingsRepo, ProjectsRepo, ReposFactory};

pub trait EquipmentService {
    /// Returns equipment by ID with its category breadcrumb
    fn get(&self, equipment_id: i32, visibility: Visibility) -> ServiceFuture<Option<EquipmentWithCategory>>;
    /// Returns equipment by barcode
    fn get_by_barcode(&self, barcode: String) -> ServiceFuture<Option<EquipmentWithCategory>>;
    /// Paginated listing; a category filter covers the whole subtree and an
    /// availability window drops units with conflicting bookings
    fn list(&self, filter: EquipmentFilter, visibility: Visibility, skip: i64, limit: i64)
        -> ServiceFuture<Page<Equipment>>;
    /// Registers equipment, minting a barcode unless a custom one is given
    fn create(&self, payload: NewEquipment) -> ServiceFuture<Equipment>;
    /// Updates specific equipment
    fn update(&self, equipment_id: i32, payload: UpdateEquipment) -> ServiceFuture<Equipment>;
    /// Equipment status machine; `Rented` is refused here, it belongs to the
    /// booking engine
    fn set_status(&self, equipment_id: i32, status: EquipmentStatus) -> ServiceFuture<Equipment>;
    /// Soft-deletes a unit with no blocking bookings
    fn delete(&self, equipment_id: i32) -> ServiceFuture<Equipment>;
    /// Replaces the barcode with a freshly minted one
    fn regenerate_barcode(&self, equipment_id: i32) -> ServiceFuture<EquipmentWithCategory>;
    /// Availability of a unit over a closed window plus the conflicts
    fn check_availability(
        &self,
        equipment_id: i32,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> ServiceFuture<AvailabilityResponse>;
    /// All bookings of one unit
    fn get_bookings(&self, equipment_id: i32) -> ServiceFuture<Vec<Booking>>;
}

/// Equipment service, responsible for the rentable units
pub struct EquipmentServiceImpl<
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
    > EquipmentServiceImpl<T, M, F>
{
    pub fn new(db_pool: Pool<M>, cpu_pool: CpuPool, repo_factory: F) -> Self {
        Self {
            db_pool,
            cpu_pool,
            repo_factory,
        }
    }
}

/// Collects the blocking bookings of a unit inside `[from, to]` with their
/// project names resolved.
pub fn conflicts_for(
    bookings_repo: &BookingsRepo,
    projects_repo: &ProjectsRepo,
    equipment_id: i32,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    exclude_booking_id: Option<i32>,
) -> Result<Vec<ConflictInfo>, FailureError> {
    let overlapping = bookings_repo.find_overlapping(equipment_id, from, to, exclude_booking_id)?;
    let mut conflicts = vec![];
    for booking in overlapping {
        let project_name = match booking.project_id {
            Some(project_id) => projects_repo
                .find(project_id, Visibility::All)?
                .map(|project| project.name),
            None => None,
        };
        conflicts.push(ConflictInfo {
            booking_id: booking.id,
            start_date: booking.start_date,
            end_date: booking.end_date,
            booking_status: booking.booking_status,
            project_id: booking.project_id,
            project_name,
        });
    }
    Ok(conflicts)
}

fn with_category<T, F>(repo_factory: &F, conn: &T, unit: Equipment) -> Result<EquipmentWithCategory, FailureError>
where
    T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static,
    F: ReposFactory<T>,
{
    let categories_repo = repo_factory.create_categories_repo(conn);
    let all = categories_repo.list()?;
    let path = path_from_root(&all, unit.category_id);
    let category_name = all
        .iter()
        .find(|category| category.id == unit.category_id)
        .map(|category| category.name.clone());
    let breadcrumbs = printable_from_path(&path);
    Ok(EquipmentWithCategory::new(unit, category_name, breadcrumbs))
}

impl<
        T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static,
        M: ManageConnection<Connection = T>,
        F: ReposFactory<T>,
    > EquipmentService for EquipmentServiceImpl<T, M, F>
{
    fn get(&self, equipment_id: i32, visibility: Visibility) -> ServiceFuture<Option<EquipmentWithCategory>> {
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
                            let equipment_repo = repo_factory.create_equipment_repo(&*conn);
                            match equipment_repo.find(equipment_id, visibility)? {
                                Some(unit) => with_category(&repo_factory, &*conn, unit).map(Some),
                                None => Ok(None),
                            }
                        })
                })
                .map_err(|e: FailureError| e.context("Service Equipment, get endpoint error occured.").into()),
        )
    }

    fn get_by_barcode(&self, barcode: String) -> ServiceFuture<Option<EquipmentWithCategory>> {
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
                            let equipment_repo = repo_factory.create_equipment_repo(&*conn);
                            match equipment_repo.find_by_barcode(&barcode)? {
                                Some(unit) => with_category(&repo_factory, &*conn, unit).map(Some),
                                None => Ok(None),
                            }
                        })
                })
                .map_err(|e: FailureError| {
                    e.context("Service Equipment, get_by_barcode endpoint error occured.").into()
                }),
        )
    }

    fn list(
        &self,
        filter: EquipmentFilter,
        visibility: Visibility,
        skip: i64,
        limit: i64,
    ) -> ServiceFuture<Page<Equipment>> {
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
                    db_pool
                        .get()
                        .map_err(|e| -> FailureError {
                            format_err!("Could not get connection to db from pool! {}", e)
                        })
                        .and_then(move |conn| {
                            let categories_repo = repo_factory.create_categories_repo(&*conn);
                            let bookings_repo = repo_factory.create_bookings_repo(&*conn);
                            let equipment_repo = repo_factory.create_equipment_repo(&*conn);

                            let category_ids = match filter.category_id {
                                Some(category_id) => {
                                    let all = categories_repo.list()?;
                                    Some(subtree_ids(&all, category_id))
                                }
                                None => None,
                            };

                            let excluded_ids = match (filter.available_from, filter.available_to) {
                                (Some(from), Some(to)) => {
                                    if from >= to {
                                        return Err(validation_error(
                                            "start_date",
                                            "Start date must be before end date",
                                        ).into());
                                    }
                                    bookings_repo.equipment_ids_with_conflicts(from, to)?
                                }
                                _ => vec![],
                            };

                            let (items, total) =
                                equipment_repo.list(filter, category_ids, excluded_ids, visibility, skip, limit)?;
                            Ok(Page::new(items, total, skip, limit))
                        })
                })
                .map_err(|e: FailureError| e.context("Service Equipment, list endpoint error occured.").into()),
        )
    }

    fn create(&self, payload: NewEquipment) -> ServiceFuture<Equipment> {
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
                            let equipment_repo = repo_factory.create_equipment_repo(&*conn);
                            let sequences_repo = repo_factory.create_barcode_sequences_repo(&*conn);
                            conn.transaction::<Equipment, FailureError, _>(move || {
                                if categories_repo.find(payload.category_id, Visibility::Active)?.is_none() {
                                    return Err(Error::NotFound.into());
                                }

                                let barcode = match payload.custom_barcode {
                                    Some(ref custom) => {
                                        if payload.validate_barcode {
                                            parse_barcode(custom)?;
                                        } else if !validate_format(custom) {
                                            return Err(validation_error(
                                                "custom_barcode",
                                                "Barcode must be exactly 11 digits",
                                            ).into());
                                        }
                                        if equipment_repo.find_by_barcode(custom)?.is_some() {
                                            return Err(Error::Conflict(format!(
                                                "Equipment with barcode \"{}\" already exists",
                                                custom
                                            )).into());
                                        }
                                        custom.clone()
                                    }
                                    None => compose_barcode(sequences_repo.next_number()?),
                                };

                                equipment_repo.create(InsertEquipment {
                                    name: payload.name,
                                    description: payload.description,
                                    serial_number: payload.serial_number,
                                    barcode,
                                    category_id: payload.category_id,
                                    status: EquipmentStatus::Available,
                                    replacement_cost: payload.replacement_cost,
                                    notes: payload.notes,
                                })
                            })
                        })
                })
                .map_err(|e: FailureError| e.context("Service Equipment, create endpoint error occured.").into()),
        )
    }

    fn update(&self, equipment_id: i32, payload: UpdateEquipment) -> ServiceFuture<Equipment> {
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
                            let equipment_repo = repo_factory.create_equipment_repo(&*conn);
                            conn.transaction::<Equipment, FailureError, _>(move || {
                                if equipment_repo.find(equipment_id, Visibility::Active)?.is_none() {
                                    return Err(Error::NotFound.into());
                                }
                                if let Some(category_id) = payload.category_id {
                                    if categories_repo.find(category_id, Visibility::Active)?.is_none() {
                                        return Err(Error::NotFound.into());
                                    }
                                }
                                equipment_repo.update(equipment_id, payload)
                            })
                        })
                })
                .map_err(|e: FailureError| e.context("Service Equipment, update endpoint error occured.").into()),
        )
    }

    fn set_status(&self, equipment_id: i32, status: EquipmentStatus) -> ServiceFuture<Equipment> {
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
                            let equipment_repo = repo_factory.create_equipment_repo(&*conn);
                            conn.transaction::<Equipment, FailureError, _>(move || {
                                let unit = equipment_repo
                                    .find(equipment_id, Visibility::Active)?
                                    .ok_or::<FailureError>(Error::NotFound.into())?;
                                if status == EquipmentStatus::Rented {
                                    return Err(validation_error(
                                        "status",
                                        "Status RENTED can only be set through bookings",
                                    ).into());
                                }
                                if !unit.status.can_transition_to(status) {
                                    return Err(Error::StatusTransition {
                                        current: unit.status.to_string(),
                                        requested: status.to_string(),
                                        allowed: unit
                                            .status
                                            .allowed_transitions()
                                            .iter()
                                            .filter(|next| **next != EquipmentStatus::Rented)
                                            .map(|next| next.to_string())
                                            .collect(),
                                    }.into());
                                }
                                equipment_repo.set_status(equipment_id, status)
                            })
                        })
                })
                .map_err(|e: FailureError| e.context("Service Equipment, set_status endpoint error occured.").into()),
        )
    }

    fn delete(&self, equipment_id: i32) -> ServiceFuture<Equipment> {
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
                            let equipment_repo = repo_factory.create_equipment_repo(&*conn);
                            let bookings_repo = repo_factory.create_bookings_repo(&*conn);
                            conn.transaction::<Equipment, FailureError, _>(move || {
                                if equipment_repo.find(equipment_id, Visibility::Active)?.is_none() {
                                    return Err(Error::NotFound.into());
                                }
                                if bookings_repo.has_blocking_for_equipment(equipment_id)? {
                                    return Err(Error::Business(
                                        "Cannot delete equipment with active bookings".to_string(),
                                    ).into());
                                }
                                equipment_repo.soft_delete(equipment_id)
                            })
                        })
                })
                .map_err(|e: FailureError| e.context("Service Equipment, delete endpoint error occured.").into()),
        )
    }

    fn regenerate_barcode(&self, equipment_id: i32) -> ServiceFuture<EquipmentWithCategory> {
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
                            let equipment_repo = repo_factory.create_equipment_repo(&*conn);
                            let sequences_repo = repo_factory.create_barcode_sequences_repo(&*conn);
                            let updated = conn.transaction::<Equipment, FailureError, _>(move || {
                                if equipment_repo.find(equipment_id, Visibility::Active)?.is_none() {
                                    return Err(Error::NotFound.into());
                                }
                                let barcode = compose_barcode(sequences_repo.next_number()?);
                                equipment_repo.set_barcode(equipment_id, &barcode)
                            })?;
                            with_category(&repo_factory, &*conn, updated)
                        })
                })
                .map_err(|e: FailureError| {
                    e.context("Service Equipment, regenerate_barcode endpoint error occured.").into()
                }),
        )
    }

    fn check_availability(
        &self,
        equipment_id: i32,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> ServiceFuture<AvailabilityResponse> {
        let db_pool = self.db_pool.clone();
        let repo_factory = self.repo_factory.clone();

        Box::new(
            self.cpu_pool
                .spawn_fn(move || {
                    if from >= to {
                        return Err(validation_error("start_date", "Start date must be before end date").into());
                    }
                    db_pool
                        .get()
                        .map_err(|e| -> FailureError {
                            format_err!("Could not get connection to db from pool! {}", e)
                        })
                        .and_then(move |conn| {
                            let equipment_repo = repo_factory.create_equipment_repo(&*conn);
                            let bookings_repo = repo_factory.create_bookings_repo(&*conn);
                            let projects_repo = repo_factory.create_projects_repo(&*conn);

                            let unit = equipment_repo
                                .find(equipment_id, Visibility::Active)?
                                .ok_or::<FailureError>(Error::NotFound.into())?;
                            let conflicts =
                                conflicts_for(&*bookings_repo, &*projects_repo, equipment_id, from, to, None)?;
                            Ok(AvailabilityResponse {
                                is_available: conflicts.is_empty() && unit.status == EquipmentStatus::Available,
                                equipment_status: unit.status,
                                conflicts,
                            })
                        })
                })
                .map_err(|e: FailureError| {
                    e.context("Service Equipment, check_availability endpoint error occured.").into()
                }),
        )
    }

    fn get_bookings(&self, equipment_id: i32) -> ServiceFuture<Vec<Booking>> {
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
                            let equipment_repo = repo_factory.create_equipment_repo(&*conn);
                            let bookings_repo = repo_factory.create_bookings_repo(&*conn);
                            if equipment_repo.find(equipment_id, Visibility::Active)?.is_none() {
                                return Err(Error::NotFound.into());
                            }
                            bookings_repo.list_by_equipment(equipment_id)
                        })
                })
                .map_err(|e: FailureError| {
                    e.context("Service Equipment, get_bookings endpoint error occured.").into()
                }),
        )
    }
}
