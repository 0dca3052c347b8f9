//! `Controller` is a top layer that handles all http-related
//! stuff like reading bodies, parsing params, forming a response.
//! Basically it provides inputs to `Service` layer and converts outputs
//! of `Service` layer to http responses

pub mod routes;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use diesel::connection::AnsiTransactionManager;
use diesel::pg::Pg;
use diesel::Connection;
use failure::Fail;
use futures::future;
use futures::Future;
use futures::IntoFuture;
use futures_cpupool::CpuPool;
use hyper::server::Request;
use hyper::Method;
use hyper::{Delete, Get, Post, Put};
use r2d2::{ManageConnection, Pool};
use validator::Validate;

use self::routes::{Route, RouteParser};
use errors::Error;
use http::controller::{Controller, ControllerFuture};
use http::errors::ErrorMessageWrapper;
use http::request_util::{parse_body, serialize_future};
use models::*;
use repos::repo_factory::ReposFactory;
use sentry_integration::log_and_capture_error;
use services::barcode::{BarcodeService, BarcodeServiceImpl};
use services::bookings::{BookingsService, BookingsServiceImpl};
use services::categories::{CategoriesService, CategoriesServiceImpl};
use services::clients::{ClientsService, ClientsServiceImpl};
use services::documents::{DocumentsService, DocumentsServiceImpl};
use services::equipment::{EquipmentService, EquipmentServiceImpl};
use services::projects::{ProjectsService, ProjectsServiceImpl};
use services::scan_sessions::{ScanSessionsService, ScanSessionsServiceImpl};
use services::subcategory_prefixes::{SubcategoryPrefixesService, SubcategoryPrefixesServiceImpl};

const DEFAULT_LIMIT: i64 = 100;

/// Controller handles route parsing and calling `Service` layer
pub struct ControllerImpl<T, M, F>
where
    T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static,
    M: ManageConnection<Connection = T>,
    F: ReposFactory<T>,
{
    pub db_pool: Pool<M>,
    pub cpu_pool: CpuPool,
    pub repo_factory: F,
    pub route_parser: Arc<RouteParser>,
}

impl<
        T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static,
        M: ManageConnection<Connection = T>,
        F: ReposFactory<T>,
    > ControllerImpl<T, M, F>
{
    /// Create a new controller based on the shared pools; the route parser
    /// is compiled once at startup and shared between connections
    pub fn new(db_pool: Pool<M>, cpu_pool: CpuPool, repo_factory: F, route_parser: Arc<RouteParser>) -> Self {
        Self {
            db_pool,
            cpu_pool,
            repo_factory,
            route_parser,
        }
    }

    fn categories_service(&self) -> CategoriesServiceImpl<T, M, F> {
        CategoriesServiceImpl::new(self.db_pool.clone(), self.cpu_pool.clone(), self.repo_factory.clone())
    }

    fn equipment_service(&self) -> EquipmentServiceImpl<T, M, F> {
        EquipmentServiceImpl::new(self.db_pool.clone(), self.cpu_pool.clone(), self.repo_factory.clone())
    }

    fn bookings_service(&self) -> BookingsServiceImpl<T, M, F> {
        BookingsServiceImpl::new(self.db_pool.clone(), self.cpu_pool.clone(), self.repo_factory.clone())
    }

    fn clients_service(&self) -> ClientsServiceImpl<T, M, F> {
        ClientsServiceImpl::new(self.db_pool.clone(), self.cpu_pool.clone(), self.repo_factory.clone())
    }

    fn projects_service(&self) -> ProjectsServiceImpl<T, M, F> {
        ProjectsServiceImpl::new(self.db_pool.clone(), self.cpu_pool.clone(), self.repo_factory.clone())
    }

    fn documents_service(&self) -> DocumentsServiceImpl<T, M, F> {
        DocumentsServiceImpl::new(self.db_pool.clone(), self.cpu_pool.clone(), self.repo_factory.clone())
    }

    fn scan_sessions_service(&self) -> ScanSessionsServiceImpl<T, M, F> {
        ScanSessionsServiceImpl::new(self.db_pool.clone(), self.cpu_pool.clone(), self.repo_factory.clone())
    }

    fn barcode_service(&self) -> BarcodeServiceImpl<T, M, F> {
        BarcodeServiceImpl::new(self.db_pool.clone(), self.cpu_pool.clone(), self.repo_factory.clone())
    }

    fn subcategory_prefixes_service(&self) -> SubcategoryPrefixesServiceImpl<T, M, F> {
        SubcategoryPrefixesServiceImpl::new(self.db_pool.clone(), self.cpu_pool.clone(), self.repo_factory.clone())
    }
}

impl<
        T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static,
        M: ManageConnection<Connection = T>,
        F: ReposFactory<T>,
    > Controller for ControllerImpl<T, M, F>
{
    /// Handle a request and get future response
    fn call(&self, req: Request) -> ControllerFuture {
        let path = req.path().to_string();
        let method = req.method().clone();
        debug!("Received request {} {}", method, path);

        let fut = match (&method, self.route_parser.test(req.path())) {
            // GET /healthcheck
            (&Get, Some(Route::Healthcheck)) => serialize_future(future::ok("Ok".to_string())),

            // POST /equipment
            (&Post, Some(Route::Equipment)) => {
                let service = self.equipment_service();
                serialize_future(
                    parse_body::<NewEquipment>(req.body())
                        .map_err(|e| {
                            e.context("Parsing body // POST /equipment in NewEquipment failed!")
                                .context(Error::Parse)
                                .into()
                        })
                        .and_then(move |payload| {
                            payload
                                .validate()
                                .map_err(|e| {
                                    format_err!("Validation of NewEquipment failed!")
                                        .context(Error::Validate(e))
                                        .into()
                                })
                                .into_future()
                                .and_then(move |_| service.create(payload))
                        }),
                )
            }

            // GET /equipment
            (&Get, Some(Route::Equipment)) => {
                let query = req.query().unwrap_or_default();
                let (status, category_id, search, available_from, available_to) = parse_query!(
                    query,
                    "status" => EquipmentStatus,
                    "category_id" => i32,
                    "query" => String,
                    "available_from" => DateTime<Utc>,
                    "available_to" => DateTime<Utc>
                );
                let (include_deleted, skip, limit) = parse_query!(
                    query,
                    "include_deleted" => bool,
                    "skip" => i64,
                    "limit" => i64
                );
                let filter = EquipmentFilter {
                    status,
                    category_id,
                    query: search,
                    available_from,
                    available_to,
                };
                let visibility = if include_deleted.unwrap_or(false) {
                    Visibility::All
                } else {
                    Visibility::Active
                };
                serialize_future(self.equipment_service().list(
                    filter,
                    visibility,
                    skip.unwrap_or(0),
                    limit.unwrap_or(DEFAULT_LIMIT),
                ))
            }

            // GET /equipment/<id>
            (&Get, Some(Route::EquipmentUnit(equipment_id))) => serialize_future(
                self.equipment_service()
                    .get(equipment_id, Visibility::Active)
                    .and_then(|unit| unit.ok_or(Error::NotFound.into())),
            ),

            // PUT /equipment/<id>
            (&Put, Some(Route::EquipmentUnit(equipment_id))) => {
                let service = self.equipment_service();
                serialize_future(
                    parse_body::<UpdateEquipment>(req.body())
                        .map_err(|e| {
                            e.context("Parsing body // PUT /equipment/<id> in UpdateEquipment failed!")
                                .context(Error::Parse)
                                .into()
                        })
                        .and_then(move |payload| {
                            payload
                                .validate()
                                .map_err(|e| {
                                    format_err!("Validation of UpdateEquipment failed!")
                                        .context(Error::Validate(e))
                                        .into()
                                })
                                .into_future()
                                .and_then(move |_| service.update(equipment_id, payload))
                        }),
                )
            }

            // DELETE /equipment/<id>
            (&Delete, Some(Route::EquipmentUnit(equipment_id))) => {
                serialize_future(self.equipment_service().delete(equipment_id))
            }

            // GET /equipment/barcode/<barcode>
            (&Get, Some(Route::EquipmentByBarcode(barcode))) => serialize_future(
                self.equipment_service()
                    .get_by_barcode(barcode)
                    .and_then(|unit| unit.ok_or(Error::NotFound.into())),
            ),

            // POST /equipment/<id>/regenerate-barcode
            (&Post, Some(Route::EquipmentRegenerateBarcode(equipment_id))) => {
                serialize_future(self.equipment_service().regenerate_barcode(equipment_id))
            }

            // GET /equipment/<id>/availability
            (&Get, Some(Route::EquipmentAvailability(equipment_id))) => {
                let query = req.query().unwrap_or_default();
                let (start_date, end_date) = parse_query!(
                    query,
                    "start_date" => DateTime<Utc>,
                    "end_date" => DateTime<Utc>
                );
                if let (Some(from), Some(to)) = (start_date, end_date) {
                    serialize_future(self.equipment_service().check_availability(equipment_id, from, to))
                } else {
                    Box::new(future::err(
                        format_err!("Parsing query parameters // GET /equipment/<id>/availability failed!")
                            .context(Error::Parse)
                            .into(),
                    ))
                }
            }

            // GET /equipment/<id>/bookings
            (&Get, Some(Route::EquipmentBookings(equipment_id))) => {
                serialize_future(self.equipment_service().get_bookings(equipment_id))
            }

            // PATCH /equipment/<id>/status
            (&Method::Patch, Some(Route::EquipmentStatus(equipment_id))) => {
                #[derive(Deserialize)]
                struct StatusPayload {
                    status: EquipmentStatus,
                }
                let service = self.equipment_service();
                serialize_future(
                    parse_body::<StatusPayload>(req.body())
                        .map_err(|e| {
                            e.context("Parsing body // PATCH /equipment/<id>/status in StatusPayload failed!")
                                .context(Error::Parse)
                                .into()
                        })
                        .and_then(move |payload| service.set_status(equipment_id, payload.status)),
                )
            }

            // POST /bookings
            (&Post, Some(Route::Bookings)) => {
                let service = self.bookings_service();
                serialize_future(
                    parse_body::<NewBooking>(req.body())
                        .map_err(|e| {
                            e.context("Parsing body // POST /bookings in NewBooking failed!")
                                .context(Error::Parse)
                                .into()
                        })
                        .and_then(move |payload| {
                            payload
                                .validate()
                                .map_err(|e| {
                                    format_err!("Validation of NewBooking failed!")
                                        .context(Error::Validate(e))
                                        .into()
                                })
                                .into_future()
                                .and_then(move |_| service.create(payload))
                        }),
                )
            }

            // GET /bookings
            (&Get, Some(Route::Bookings)) => {
                let query = req.query().unwrap_or_default();
                let (search, equipment_query, equipment_id, booking_status, payment_status) = parse_query!(
                    query,
                    "query" => String,
                    "equipment_query" => String,
                    "equipment_id" => i32,
                    "booking_status" => BookingStatus,
                    "payment_status" => PaymentStatus
                );
                let (start_date, end_date, active_only, skip, limit) = parse_query!(
                    query,
                    "start_date" => DateTime<Utc>,
                    "end_date" => DateTime<Utc>,
                    "active_only" => bool,
                    "skip" => i64,
                    "limit" => i64
                );
                let filter = BookingFilter {
                    query: search,
                    equipment_query,
                    equipment_id,
                    booking_status,
                    payment_status,
                    start_date,
                    end_date,
                    active_only: active_only.unwrap_or(false),
                };
                serialize_future(
                    self.bookings_service()
                        .list(filter, skip.unwrap_or(0), limit.unwrap_or(DEFAULT_LIMIT)),
                )
            }

            // POST /bookings/batch
            (&Post, Some(Route::BookingsBatch)) => {
                let query = req.query().unwrap_or_default();
                let project_id = parse_query!(query, "project_id" => i32);
                let service = self.bookings_service();
                serialize_future(
                    parse_body::<Vec<NewBooking>>(req.body())
                        .map_err(|e| {
                            e.context("Parsing body // POST /bookings/batch in Vec<NewBooking> failed!")
                                .context(Error::Parse)
                                .into()
                        })
                        .and_then(move |payloads| service.batch_create(payloads, project_id)),
                )
            }

            // GET /bookings/<id>
            (&Get, Some(Route::Booking(booking_id))) => serialize_future(self.bookings_service().get(booking_id)),

            // PUT /bookings/<id>
            (&Put, Some(Route::Booking(booking_id))) => {
                let service = self.bookings_service();
                serialize_future(
                    parse_body::<UpdateBooking>(req.body())
                        .map_err(|e| {
                            e.context("Parsing body // PUT /bookings/<id> in UpdateBooking failed!")
                                .context(Error::Parse)
                                .into()
                        })
                        .and_then(move |payload| {
                            payload
                                .validate()
                                .map_err(|e| {
                                    format_err!("Validation of UpdateBooking failed!")
                                        .context(Error::Validate(e))
                                        .into()
                                })
                                .into_future()
                                .and_then(move |_| service.update(booking_id, payload))
                        }),
                )
            }

            // PATCH /bookings/<id>
            (&Method::Patch, Some(Route::Booking(booking_id))) => {
                let service = self.bookings_service();
                serialize_future(
                    parse_body::<BookingPatch>(req.body())
                        .map_err(|e| {
                            e.context("Parsing body // PATCH /bookings/<id> in BookingPatch failed!")
                                .context(Error::Parse)
                                .into()
                        })
                        .and_then(move |payload| {
                            payload
                                .validate()
                                .map_err(|e| {
                                    format_err!("Validation of BookingPatch failed!")
                                        .context(Error::Validate(e))
                                        .into()
                                })
                                .into_future()
                                .and_then(move |_| service.patch(booking_id, payload))
                        }),
                )
            }

            // DELETE /bookings/<id>
            (&Delete, Some(Route::Booking(booking_id))) => {
                serialize_future(self.bookings_service().delete(booking_id))
            }

            // PATCH /bookings/<id>/status
            (&Method::Patch, Some(Route::BookingStatus(booking_id))) => {
                #[derive(Deserialize)]
                struct StatusPayload {
                    booking_status: BookingStatus,
                }
                let service = self.bookings_service();
                serialize_future(
                    parse_body::<StatusPayload>(req.body())
                        .map_err(|e| {
                            e.context("Parsing body // PATCH /bookings/<id>/status in StatusPayload failed!")
                                .context(Error::Parse)
                                .into()
                        })
                        .and_then(move |payload| service.change_status(booking_id, payload.booking_status)),
                )
            }

            // PATCH /bookings/<id>/payment
            (&Method::Patch, Some(Route::BookingPayment(booking_id))) => {
                #[derive(Deserialize)]
                struct PaymentPayload {
                    payment_status: PaymentStatus,
                }
                let service = self.bookings_service();
                serialize_future(
                    parse_body::<PaymentPayload>(req.body())
                        .map_err(|e| {
                            e.context("Parsing body // PATCH /bookings/<id>/payment in PaymentPayload failed!")
                                .context(Error::Parse)
                                .into()
                        })
                        .and_then(move |payload| service.change_payment_status(booking_id, payload.payment_status)),
                )
            }

            // GET /categories
            (&Get, Some(Route::Categories)) => serialize_future(self.categories_service().list()),

            // POST /categories
            (&Post, Some(Route::Categories)) => {
                let service = self.categories_service();
                serialize_future(
                    parse_body::<NewCategory>(req.body())
                        .map_err(|e| {
                            e.context("Parsing body // POST /categories in NewCategory failed!")
                                .context(Error::Parse)
                                .into()
                        })
                        .and_then(move |payload| {
                            payload
                                .validate()
                                .map_err(|e| {
                                    format_err!("Validation of NewCategory failed!")
                                        .context(Error::Validate(e))
                                        .into()
                                })
                                .into_future()
                                .and_then(move |_| service.create(payload))
                        }),
                )
            }

            // GET /categories/with-equipment-count
            (&Get, Some(Route::CategoriesWithEquipmentCount)) => {
                serialize_future(self.categories_service().with_equipment_count())
            }

            // GET /categories/search
            (&Get, Some(Route::CategoriesSearch)) => {
                if let Some(term) = parse_query!(req.query().unwrap_or_default(), "query" => String) {
                    serialize_future(self.categories_service().search(term))
                } else {
                    Box::new(future::err(
                        format_err!("Parsing query parameters // GET /categories/search failed!")
                            .context(Error::Parse)
                            .into(),
                    ))
                }
            }

            // GET /categories/<id>/subcategories
            (&Get, Some(Route::CategorySubcategories(category_id))) => {
                serialize_future(self.categories_service().get_children(category_id))
            }

            // GET /categories/<id>
            (&Get, Some(Route::Category(category_id))) => serialize_future(
                self.categories_service()
                    .get(category_id)
                    .and_then(|category| category.ok_or(Error::NotFound.into())),
            ),

            // PUT /categories/<id>
            (&Put, Some(Route::Category(category_id))) => {
                let service = self.categories_service();
                serialize_future(
                    parse_body::<UpdateCategory>(req.body())
                        .map_err(|e| {
                            e.context("Parsing body // PUT /categories/<id> in UpdateCategory failed!")
                                .context(Error::Parse)
                                .into()
                        })
                        .and_then(move |payload| {
                            payload
                                .validate()
                                .map_err(|e| {
                                    format_err!("Validation of UpdateCategory failed!")
                                        .context(Error::Validate(e))
                                        .into()
                                })
                                .into_future()
                                .and_then(move |_| service.update(category_id, payload))
                        }),
                )
            }

            // DELETE /categories/<id>
            (&Delete, Some(Route::Category(category_id))) => {
                serialize_future(self.categories_service().delete(category_id))
            }

            // GET /clients
            (&Get, Some(Route::Clients)) => {
                let query = req.query().unwrap_or_default();
                let (term, skip, limit) = parse_query!(query, "query" => String, "skip" => i64, "limit" => i64);
                serialize_future(
                    self.clients_service()
                        .list(term, skip.unwrap_or(0), limit.unwrap_or(DEFAULT_LIMIT)),
                )
            }

            // POST /clients
            (&Post, Some(Route::Clients)) => {
                let service = self.clients_service();
                serialize_future(
                    parse_body::<NewClient>(req.body())
                        .map_err(|e| {
                            e.context("Parsing body // POST /clients in NewClient failed!")
                                .context(Error::Parse)
                                .into()
                        })
                        .and_then(move |payload| {
                            payload
                                .validate()
                                .map_err(|e| {
                                    format_err!("Validation of NewClient failed!")
                                        .context(Error::Validate(e))
                                        .into()
                                })
                                .into_future()
                                .and_then(move |_| service.create(payload))
                        }),
                )
            }

            // GET /clients/<id>
            (&Get, Some(Route::Client(client_id))) => serialize_future(
                self.clients_service()
                    .get(client_id)
                    .and_then(|client| client.ok_or(Error::NotFound.into())),
            ),

            // PUT /clients/<id>
            (&Put, Some(Route::Client(client_id))) => {
                let service = self.clients_service();
                serialize_future(
                    parse_body::<UpdateClient>(req.body())
                        .map_err(|e| {
                            e.context("Parsing body // PUT /clients/<id> in UpdateClient failed!")
                                .context(Error::Parse)
                                .into()
                        })
                        .and_then(move |payload| {
                            payload
                                .validate()
                                .map_err(|e| {
                                    format_err!("Validation of UpdateClient failed!")
                                        .context(Error::Validate(e))
                                        .into()
                                })
                                .into_future()
                                .and_then(move |_| service.update(client_id, payload))
                        }),
                )
            }

            // DELETE /clients/<id>
            (&Delete, Some(Route::Client(client_id))) => serialize_future(self.clients_service().delete(client_id)),

            // GET /clients/<id>/bookings
            (&Get, Some(Route::ClientBookings(client_id))) => {
                serialize_future(self.clients_service().get_bookings(client_id))
            }

            // GET /projects
            (&Get, Some(Route::Projects)) => {
                let query = req.query().unwrap_or_default();
                let (client_id, project_status, start_date, end_date, skip, limit) = parse_query!(
                    query,
                    "client_id" => i32,
                    "project_status" => ProjectStatus,
                    "start_date" => DateTime<Utc>,
                    "end_date" => DateTime<Utc>,
                    "skip" => i64,
                    "limit" => i64
                );
                let filter = ProjectFilter {
                    client_id,
                    status: project_status,
                    start_date,
                    end_date,
                };
                serialize_future(
                    self.projects_service()
                        .list(filter, skip.unwrap_or(0), limit.unwrap_or(DEFAULT_LIMIT)),
                )
            }

            // POST /projects
            (&Post, Some(Route::Projects)) => {
                let service = self.projects_service();
                serialize_future(
                    parse_body::<NewProject>(req.body())
                        .map_err(|e| {
                            e.context("Parsing body // POST /projects in NewProject failed!")
                                .context(Error::Parse)
                                .into()
                        })
                        .and_then(move |payload| {
                            payload
                                .validate()
                                .map_err(|e| {
                                    format_err!("Validation of NewProject failed!")
                                        .context(Error::Validate(e))
                                        .into()
                                })
                                .into_future()
                                .and_then(move |_| service.create(payload))
                        }),
                )
            }

            // GET /projects/<id>
            (&Get, Some(Route::Project(project_id))) => {
                serialize_future(self.projects_service().get_with_bookings(project_id))
            }

            // PUT /projects/<id>
            (&Put, Some(Route::Project(project_id))) => {
                let service = self.projects_service();
                serialize_future(
                    parse_body::<UpdateProject>(req.body())
                        .map_err(|e| {
                            e.context("Parsing body // PUT /projects/<id> in UpdateProject failed!")
                                .context(Error::Parse)
                                .into()
                        })
                        .and_then(move |payload| {
                            payload
                                .validate()
                                .map_err(|e| {
                                    format_err!("Validation of UpdateProject failed!")
                                        .context(Error::Validate(e))
                                        .into()
                                })
                                .into_future()
                                .and_then(move |_| service.update(project_id, payload))
                        }),
                )
            }

            // DELETE /projects/<id>
            (&Delete, Some(Route::Project(project_id))) => {
                serialize_future(self.projects_service().delete(project_id))
            }

            // GET /projects/<id>/bookings
            (&Get, Some(Route::ProjectBookings(project_id))) => serialize_future(
                self.projects_service()
                    .get_with_bookings(project_id)
                    .map(|detail| detail.bookings),
            ),

            // POST /projects/<id>/bookings/<booking_id>
            (&Post, Some(Route::ProjectBooking(project_id, booking_id))) => {
                serialize_future(self.projects_service().add_booking(project_id, booking_id))
            }

            // DELETE /projects/<id>/bookings/<booking_id>
            (&Delete, Some(Route::ProjectBooking(project_id, booking_id))) => {
                serialize_future(self.projects_service().remove_booking(project_id, booking_id))
            }

            // GET /documents
            (&Get, Some(Route::Documents)) => {
                let query = req.query().unwrap_or_default();
                let (client_id, booking_id, skip, limit) = parse_query!(
                    query,
                    "client_id" => i32,
                    "booking_id" => i32,
                    "skip" => i64,
                    "limit" => i64
                );
                serialize_future(self.documents_service().list(
                    client_id,
                    booking_id,
                    skip.unwrap_or(0),
                    limit.unwrap_or(DEFAULT_LIMIT),
                ))
            }

            // POST /documents
            (&Post, Some(Route::Documents)) => {
                let service = self.documents_service();
                serialize_future(
                    parse_body::<NewDocument>(req.body())
                        .map_err(|e| {
                            e.context("Parsing body // POST /documents in NewDocument failed!")
                                .context(Error::Parse)
                                .into()
                        })
                        .and_then(move |payload| {
                            payload
                                .validate()
                                .map_err(|e| {
                                    format_err!("Validation of NewDocument failed!")
                                        .context(Error::Validate(e))
                                        .into()
                                })
                                .into_future()
                                .and_then(move |_| service.create(payload))
                        }),
                )
            }

            // GET /documents/<id>
            (&Get, Some(Route::Document(document_id))) => serialize_future(
                self.documents_service()
                    .get(document_id)
                    .and_then(|document| document.ok_or(Error::NotFound.into())),
            ),

            // PUT /documents/<id>
            (&Put, Some(Route::Document(document_id))) => {
                let service = self.documents_service();
                serialize_future(
                    parse_body::<UpdateDocument>(req.body())
                        .map_err(|e| {
                            e.context("Parsing body // PUT /documents/<id> in UpdateDocument failed!")
                                .context(Error::Parse)
                                .into()
                        })
                        .and_then(move |payload| {
                            payload
                                .validate()
                                .map_err(|e| {
                                    format_err!("Validation of UpdateDocument failed!")
                                        .context(Error::Validate(e))
                                        .into()
                                })
                                .into_future()
                                .and_then(move |_| service.update(document_id, payload))
                        }),
                )
            }

            // DELETE /documents/<id>
            (&Delete, Some(Route::Document(document_id))) => {
                serialize_future(self.documents_service().delete(document_id))
            }

            // POST /scan-sessions
            (&Post, Some(Route::ScanSessions)) => {
                let service = self.scan_sessions_service();
                serialize_future(
                    parse_body::<NewScanSession>(req.body())
                        .map_err(|e| {
                            e.context("Parsing body // POST /scan-sessions in NewScanSession failed!")
                                .context(Error::Parse)
                                .into()
                        })
                        .and_then(move |payload| {
                            payload
                                .validate()
                                .map_err(|e| {
                                    format_err!("Validation of NewScanSession failed!")
                                        .context(Error::Validate(e))
                                        .into()
                                })
                                .into_future()
                                .and_then(move |_| service.create(payload))
                        }),
                )
            }

            // GET /scan-sessions
            (&Get, Some(Route::ScanSessions)) => {
                let user_id = parse_query!(req.query().unwrap_or_default(), "user_id" => i32);
                serialize_future(self.scan_sessions_service().list_for_user(user_id))
            }

            // GET /scan-sessions/user/<user_id>
            (&Get, Some(Route::ScanSessionsByUser(user_id))) => {
                serialize_future(self.scan_sessions_service().list_for_user(Some(user_id)))
            }

            // GET /scan-sessions/<id>
            (&Get, Some(Route::ScanSession(session_id))) => {
                serialize_future(self.scan_sessions_service().get(session_id))
            }

            // PUT /scan-sessions/<id>
            (&Put, Some(Route::ScanSession(session_id))) => {
                let service = self.scan_sessions_service();
                serialize_future(
                    parse_body::<UpdateScanSession>(req.body())
                        .map_err(|e| {
                            e.context("Parsing body // PUT /scan-sessions/<id> in UpdateScanSession failed!")
                                .context(Error::Parse)
                                .into()
                        })
                        .and_then(move |payload| {
                            payload
                                .validate()
                                .map_err(|e| {
                                    format_err!("Validation of UpdateScanSession failed!")
                                        .context(Error::Validate(e))
                                        .into()
                                })
                                .into_future()
                                .and_then(move |_| service.update(session_id, payload))
                        }),
                )
            }

            // DELETE /scan-sessions/<id>
            (&Delete, Some(Route::ScanSession(session_id))) => {
                serialize_future(self.scan_sessions_service().delete(session_id))
            }

            // GET /subcategory-prefixes
            (&Get, Some(Route::SubcategoryPrefixes)) => {
                if let Some(category_id) = parse_query!(req.query().unwrap_or_default(), "category_id" => i32) {
                    serialize_future(self.subcategory_prefixes_service().list_by_category(category_id))
                } else {
                    Box::new(future::err(
                        format_err!("Parsing query parameters // GET /subcategory-prefixes failed!")
                            .context(Error::Parse)
                            .into(),
                    ))
                }
            }

            // POST /subcategory-prefixes
            (&Post, Some(Route::SubcategoryPrefixes)) => {
                let service = self.subcategory_prefixes_service();
                serialize_future(
                    parse_body::<NewSubcategoryPrefix>(req.body())
                        .map_err(|e| {
                            e.context("Parsing body // POST /subcategory-prefixes in NewSubcategoryPrefix failed!")
                                .context(Error::Parse)
                                .into()
                        })
                        .and_then(move |payload| {
                            payload
                                .validate()
                                .map_err(|e| {
                                    format_err!("Validation of NewSubcategoryPrefix failed!")
                                        .context(Error::Validate(e))
                                        .into()
                                })
                                .into_future()
                                .and_then(move |_| service.create(payload))
                        }),
                )
            }

            // GET /subcategory-prefixes/<id>
            (&Get, Some(Route::SubcategoryPrefix(prefix_id))) => serialize_future(
                self.subcategory_prefixes_service()
                    .get(prefix_id)
                    .and_then(|prefix| prefix.ok_or(Error::NotFound.into())),
            ),

            // PUT /subcategory-prefixes/<id>
            (&Put, Some(Route::SubcategoryPrefix(prefix_id))) => {
                let service = self.subcategory_prefixes_service();
                serialize_future(
                    parse_body::<UpdateSubcategoryPrefix>(req.body())
                        .map_err(|e| {
                            e.context("Parsing body // PUT /subcategory-prefixes/<id> in UpdateSubcategoryPrefix failed!")
                                .context(Error::Parse)
                                .into()
                        })
                        .and_then(move |payload| {
                            payload
                                .validate()
                                .map_err(|e| {
                                    format_err!("Validation of UpdateSubcategoryPrefix failed!")
                                        .context(Error::Validate(e))
                                        .into()
                                })
                                .into_future()
                                .and_then(move |_| service.update(prefix_id, payload))
                        }),
                )
            }

            // DELETE /subcategory-prefixes/<id>
            (&Delete, Some(Route::SubcategoryPrefix(prefix_id))) => {
                serialize_future(self.subcategory_prefixes_service().delete(prefix_id))
            }

            // POST /barcodes/generate
            (&Post, Some(Route::BarcodesGenerate)) => serialize_future(self.barcode_service().generate()),

            // POST /barcodes/validate
            (&Post, Some(Route::BarcodesValidate)) => {
                let service = self.barcode_service();
                serialize_future(
                    parse_body::<ValidateBarcode>(req.body())
                        .map_err(|e| {
                            e.context("Parsing body // POST /barcodes/validate in ValidateBarcode failed!")
                                .context(Error::Parse)
                                .into()
                        })
                        .and_then(move |payload| service.validate(payload.barcode)),
                )
            }

            // GET /barcodes/next
            (&Get, Some(Route::BarcodesNext)) => serialize_future(self.barcode_service().peek_next_sequence()),

            // Fallback
            (m, _) => Box::new(future::err(
                format_err!("Request to non existing endpoint in rentals microservice! {:?} {:?}", m, path)
                    .context(Error::NotFound)
                    .into(),
            )),
        }.map_err(|err| {
            let wrapper = ErrorMessageWrapper::<Error>::from(&err);
            if wrapper.inner.code == 500 {
                log_and_capture_error(&err);
            }
            err
        });

        Box::new(fut)
    }
}
