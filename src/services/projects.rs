//! Projects service: the booking aggregator. Associations never cascade;
//! removing a project or a member only clears the link, and the stored
//! payment rollup is re-derived after every membership change.

use diesel::connection::AnsiTransactionManager;
use diesel::pg::Pg;
use diesel::Connection;
use failure::Error as FailureError;
use failure::Fail;
use futures::Future;
use futures_cpupool::CpuPool;
use r2d2::{ManageConnection, Pool};

use super::bookings::refresh_project_payment_status;
use super::categories::printable_from_path;
use super::types::ServiceFuture;
use errors::{validation_error, Error};
use models::{
    BookingWithDetails, InsertProject, NewProject, Project, ProjectBookingInfo, ProjectFilter,
    ProjectPaymentStatus, ProjectStatus, ProjectWithBookings, UpdateProject, Visibility,
};
use repos::categories::path_from_root;
use repos::pagination::Page;
use repos::ReposFactory;

pub trait ProjectsService {
    /// Returns project by ID
    fn get(&self, project_id: i32) -> ServiceFuture<Option<Project>>;
    /// Project with its member bookings and their category breadcrumbs
    fn get_with_bookings(&self, project_id: i32) -> ServiceFuture<ProjectWithBookings>;
    /// Paginated listing with filters
    fn list(&self, filter: ProjectFilter, skip: i64, limit: i64) -> ServiceFuture<Page<Project>>;
    /// Creates new project
    fn create(&self, payload: NewProject) -> ServiceFuture<Project>;
    /// Updates specific project
    fn update(&self, project_id: i32, payload: UpdateProject) -> ServiceFuture<Project>;
    /// Soft-deletes the project, detaching member bookings
    fn delete(&self, project_id: i32) -> ServiceFuture<Project>;
    /// Attaches a booking to the project
    fn add_booking(&self, project_id: i32, booking_id: i32) -> ServiceFuture<Project>;
    /// Detaches a booking from the project
    fn remove_booking(&self, project_id: i32, booking_id: i32) -> ServiceFuture<Project>;
}

/// Projects service, responsible for booking aggregation
pub struct ProjectsServiceImpl<
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
    > ProjectsServiceImpl<T, M, F>
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
    > ProjectsService for ProjectsServiceImpl<T, M, F>
{
    fn get(&self, project_id: i32) -> ServiceFuture<Option<Project>> {
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
                            let projects_repo = repo_factory.create_projects_repo(&*conn);
                            projects_repo.find(project_id, Visibility::Active)
                        })
                })
                .map_err(|e: FailureError| e.context("Service Projects, get endpoint error occured.").into()),
        )
    }

    fn get_with_bookings(&self, project_id: i32) -> ServiceFuture<ProjectWithBookings> {
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
                            let projects_repo = repo_factory.create_projects_repo(&*conn);
                            let bookings_repo = repo_factory.create_bookings_repo(&*conn);
                            let clients_repo = repo_factory.create_clients_repo(&*conn);
                            let equipment_repo = repo_factory.create_equipment_repo(&*conn);
                            let categories_repo = repo_factory.create_categories_repo(&*conn);

                            let project = projects_repo
                                .find(project_id, Visibility::Active)?
                                .ok_or::<FailureError>(Error::NotFound.into())?;
                            let members = bookings_repo.list_by_project(project_id)?;
                            let all_categories = categories_repo.list()?;

                            let mut bookings = vec![];
                            for booking in members {
                                let client_name = clients_repo
                                    .find(booking.client_id, Visibility::All)?
                                    .map(|client| client.name)
                                    .unwrap_or_else(|| format!("Client {}", booking.client_id));
                                let unit = equipment_repo.find(booking.equipment_id, Visibility::All)?;
                                let equipment_name = unit
                                    .as_ref()
                                    .map(|unit| unit.name.clone())
                                    .unwrap_or_else(|| format!("Equipment {}", booking.equipment_id));
                                let (sort_path, printable) = match unit {
                                    Some(ref unit) => {
                                        let path = path_from_root(&all_categories, unit.category_id);
                                        let sort_path =
                                            path.iter().map(|category| category.id).collect::<Vec<_>>();
                                        (sort_path, printable_from_path(&path))
                                    }
                                    None => (vec![], vec![]),
                                };
                                bookings.push(ProjectBookingInfo {
                                    booking: BookingWithDetails::new(
                                        booking,
                                        client_name,
                                        equipment_name,
                                        Some(project.name.clone()),
                                    ),
                                    category_sort_path: sort_path,
                                    printable_categories: printable,
                                });
                            }
                            Ok(ProjectWithBookings { project, bookings })
                        })
                })
                .map_err(|e: FailureError| {
                    e.context("Service Projects, get_with_bookings endpoint error occured.").into()
                }),
        )
    }

    fn list(&self, filter: ProjectFilter, skip: i64, limit: i64) -> ServiceFuture<Page<Project>> {
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
                            let projects_repo = repo_factory.create_projects_repo(&*conn);
                            let (items, total) = projects_repo.list(filter, skip, limit)?;
                            Ok(Page::new(items, total, skip, limit))
                        })
                })
                .map_err(|e: FailureError| e.context("Service Projects, list endpoint error occured.").into()),
        )
    }

    fn create(&self, payload: NewProject) -> ServiceFuture<Project> {
        let db_pool = self.db_pool.clone();
        let repo_factory = self.repo_factory.clone();

        Box::new(
            self.cpu_pool
                .spawn_fn(move || {
                    if payload.start_date >= payload.end_date {
                        return Err(validation_error("start_date", "Start date must be before end date").into());
                    }
                    db_pool
                        .get()
                        .map_err(|e| -> FailureError {
                            format_err!("Could not get connection to db from pool! {}", e)
                        })
                        .and_then(move |conn| {
                            let projects_repo = repo_factory.create_projects_repo(&*conn);
                            let clients_repo = repo_factory.create_clients_repo(&*conn);
                            conn.transaction::<Project, FailureError, _>(move || {
                                if clients_repo.find(payload.client_id, Visibility::Active)?.is_none() {
                                    return Err(Error::NotFound.into());
                                }
                                projects_repo.create(InsertProject {
                                    name: payload.name,
                                    client_id: payload.client_id,
                                    start_date: payload.start_date,
                                    end_date: payload.end_date,
                                    status: ProjectStatus::Draft,
                                    payment_status: ProjectPaymentStatus::Unpaid,
                                    description: payload.description,
                                    notes: payload.notes,
                                })
                            })
                        })
                })
                .map_err(|e: FailureError| e.context("Service Projects, create endpoint error occured.").into()),
        )
    }

    fn update(&self, project_id: i32, payload: UpdateProject) -> ServiceFuture<Project> {
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
                            let projects_repo = repo_factory.create_projects_repo(&*conn);
                            conn.transaction::<Project, FailureError, _>(move || {
                                let current = projects_repo
                                    .find(project_id, Visibility::Active)?
                                    .ok_or::<FailureError>(Error::NotFound.into())?;
                                let from = payload.start_date.unwrap_or(current.start_date);
                                let to = payload.end_date.unwrap_or(current.end_date);
                                if from >= to {
                                    return Err(validation_error(
                                        "start_date",
                                        "Start date must be before end date",
                                    ).into());
                                }
                                projects_repo.update(project_id, payload)
                            })
                        })
                })
                .map_err(|e: FailureError| e.context("Service Projects, update endpoint error occured.").into()),
        )
    }

    fn delete(&self, project_id: i32) -> ServiceFuture<Project> {
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
                            let projects_repo = repo_factory.create_projects_repo(&*conn);
                            let bookings_repo = repo_factory.create_bookings_repo(&*conn);
                            conn.transaction::<Project, FailureError, _>(move || {
                                if projects_repo.find(project_id, Visibility::Active)?.is_none() {
                                    return Err(Error::NotFound.into());
                                }
                                // Members survive the project; only the link goes away.
                                for booking in bookings_repo.list_by_project(project_id)? {
                                    bookings_repo.set_project(booking.id, None)?;
                                }
                                projects_repo.soft_delete(project_id)
                            })
                        })
                })
                .map_err(|e: FailureError| e.context("Service Projects, delete endpoint error occured.").into()),
        )
    }

    fn add_booking(&self, project_id: i32, booking_id: i32) -> ServiceFuture<Project> {
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
                            let projects_repo = repo_factory.create_projects_repo(&*conn);
                            let bookings_repo = repo_factory.create_bookings_repo(&*conn);
                            conn.transaction::<Project, FailureError, _>(move || {
                                let project = projects_repo
                                    .find(project_id, Visibility::Active)?
                                    .ok_or::<FailureError>(Error::NotFound.into())?;
                                if bookings_repo.find(booking_id)?.is_none() {
                                    return Err(Error::NotFound.into());
                                }
                                bookings_repo.set_project(booking_id, Some(project_id))?;
                                refresh_project_payment_status(&*bookings_repo, &*projects_repo, project_id)?;
                                projects_repo
                                    .find(project.id, Visibility::Active)?
                                    .ok_or::<FailureError>(Error::NotFound.into())
                            })
                        })
                })
                .map_err(|e: FailureError| e.context("Service Projects, add_booking endpoint error occured.").into()),
        )
    }

    fn remove_booking(&self, project_id: i32, booking_id: i32) -> ServiceFuture<Project> {
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
                            let projects_repo = repo_factory.create_projects_repo(&*conn);
                            let bookings_repo = repo_factory.create_bookings_repo(&*conn);
                            conn.transaction::<Project, FailureError, _>(move || {
                                if projects_repo.find(project_id, Visibility::Active)?.is_none() {
                                    return Err(Error::NotFound.into());
                                }
                                let booking = bookings_repo
                                    .find(booking_id)?
                                    .ok_or::<FailureError>(Error::NotFound.into())?;
                                if booking.project_id != Some(project_id) {
                                    return Err(Error::NotFound.into());
                                }
                                bookings_repo.set_project(booking_id, None)?;
                                refresh_project_payment_status(&*bookings_repo, &*projects_repo, project_id)?;
                                projects_repo
                                    .find(project_id, Visibility::Active)?
                                    .ok_or::<FailureError>(Error::NotFound.into())
                            })
                        })
                })
                .map_err(|e: FailureError| {
                    e.context("Service Projects, remove_booking endpoint error occured.").into()
                }),
        )
    }
}

#[cfg(test)]
pub mod tests {
    use futures_cpupool::CpuPool;
    use r2d2;
    use tokio_core::reactor::Core;

    use super::*;
    use repos::repo_factory::tests::*;
    use services::bookings::tests::{create_bookings_service, new_booking};
    use services::bookings::BookingsService;

    fn create_projects_service(
        repo_factory: ReposFactoryMock,
    ) -> ProjectsServiceImpl<MockConnection, MockConnectionManager, ReposFactoryMock> {
        let manager = MockConnectionManager::default();
        let db_pool = r2d2::Pool::builder().build(manager).expect("Failed to create connection pool");
        let cpu_pool = CpuPool::new(1);

        ProjectsServiceImpl {
            db_pool,
            cpu_pool,
            repo_factory,
        }
    }

    #[test]
    fn test_create_project_validates_dates() {
        let mut core = Core::new().unwrap();
        let service = create_projects_service(ReposFactoryMock::default());
        let result = core.run(service.create(NewProject {
            name: "Backwards".to_string(),
            client_id: MOCK_CLIENT_ID,
            start_date: utc("2025-02-01T00:00:00Z"),
            end_date: utc("2025-01-01T00:00:00Z"),
            description: None,
            notes: None,
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_add_and_remove_booking_updates_rollup() {
        let mut core = Core::new().unwrap();
        let factory = ReposFactoryMock::default();
        let bookings = create_bookings_service(factory.clone());
        let booking = core
            .run(bookings.create(new_booking(
                MOCK_AVAILABLE_EQUIPMENT_ID,
                "2025-01-10T00:00:00Z",
                "2025-01-20T00:00:00Z",
            )))
            .unwrap();

        let service = create_projects_service(factory.clone());
        core.run(service.add_booking(MOCK_PROJECT_ID, booking.id)).unwrap();
        {
            let stored = factory.state.bookings.lock().unwrap();
            assert_eq!(stored[0].project_id, Some(MOCK_PROJECT_ID));
        }

        core.run(service.remove_booking(MOCK_PROJECT_ID, booking.id)).unwrap();
        {
            let stored = factory.state.bookings.lock().unwrap();
            assert_eq!(stored[0].project_id, None);
            let projects = factory.state.projects.lock().unwrap();
            // No members left, the rollup falls back to unpaid.
            assert_eq!(projects[0].payment_status, ProjectPaymentStatus::Unpaid);
        }
    }

    #[test]
    fn test_delete_project_detaches_members() {
        let mut core = Core::new().unwrap();
        let factory = ReposFactoryMock::default();
        let bookings = create_bookings_service(factory.clone());
        let booking = core
            .run(bookings.create(new_booking(
                MOCK_AVAILABLE_EQUIPMENT_ID,
                "2025-01-10T00:00:00Z",
                "2025-01-20T00:00:00Z",
            )))
            .unwrap();
        let service = create_projects_service(factory.clone());
        core.run(service.add_booking(MOCK_PROJECT_ID, booking.id)).unwrap();

        core.run(service.delete(MOCK_PROJECT_ID)).unwrap();
        let stored = factory.state.bookings.lock().unwrap();
        // The booking itself survives, only the association is gone.
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].project_id, None);
        assert!(stored[0].deleted_at.is_none());
    }

    #[test]
    fn test_get_with_bookings_carries_breadcrumbs() {
        let mut core = Core::new().unwrap();
        let factory = ReposFactoryMock::default();
        let bookings = create_bookings_service(factory.clone());
        let booking = core
            .run(bookings.create(new_booking(
                MOCK_AVAILABLE_EQUIPMENT_ID,
                "2025-01-10T00:00:00Z",
                "2025-01-20T00:00:00Z",
            )))
            .unwrap();
        let service = create_projects_service(factory);
        core.run(service.add_booking(MOCK_PROJECT_ID, booking.id)).unwrap();

        let detail = core.run(service.get_with_bookings(MOCK_PROJECT_ID)).unwrap();
        assert_eq!(detail.bookings.len(), 1);
        let info = &detail.bookings[0];
        assert_eq!(info.booking.equipment_name, "RED Komodo");
        assert_eq!(
            info.category_sort_path,
            vec![MOCK_ROOT_CATEGORY_ID, MOCK_CAMERA_CATEGORY_ID]
        );
        // Cinema Cameras is not printable; the root carries the breadcrumb.
        assert_eq!(info.printable_categories.len(), 1);
        assert_eq!(info.printable_categories[0].id, MOCK_ROOT_CATEGORY_ID);
    }
}
