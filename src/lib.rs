//! Rentals is a microservice responsible for the booking calendar, the
//! equipment catalog and the clients of a cinema equipment rental house.
//! The layered structure of the app is
//!
//! `Application -> Controller -> Service -> Repo`
//!
//! Each layer can only face exceptions in its base layers and can only
//! expose its own errors. The controller maps typed error kinds onto http
//! statuses; everything unexpected renders as a bare 500 and is captured.

extern crate chrono;
extern crate config as config_crate;
#[macro_use]
extern crate diesel;
extern crate env_logger;
#[macro_use]
extern crate failure;
extern crate futures;
extern crate futures_cpupool;
extern crate hyper;
#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate log;
extern crate num_traits;
extern crate r2d2;
extern crate r2d2_diesel;
extern crate regex;
extern crate rust_decimal;
extern crate sentry;
extern crate serde;
#[macro_use]
extern crate serde_derive;
#[macro_use]
extern crate serde_json;
extern crate tokio_core;
extern crate tokio_signal;
extern crate validator;
#[macro_use]
extern crate validator_derive;

#[macro_use]
pub mod macros;
pub mod config;
pub mod controller;
pub mod errors;
pub mod http;
pub mod models;
pub mod repos;
pub mod schema;
pub mod sentry_integration;
pub mod services;

use std::env;
use std::io::Write;
use std::process;
use std::sync::Arc;
use std::time::Duration;

use chrono::prelude::*;
use diesel::pg::PgConnection;
use env_logger::Builder as LogBuilder;
use futures::future;
use futures::{Future, Stream};
use futures_cpupool::CpuPool;
use hyper::server::Http;
use log::LevelFilter as LogLevelFilter;
use r2d2_diesel::ConnectionManager;
use tokio_core::reactor::{Core, Interval};

use config::Config;
use controller::ControllerImpl;
use errors::Error;
use http::controller::Application;
use repos::repo_factory::ReposFactoryImpl;
use services::scan_sessions::{ScanSessionsService, ScanSessionsServiceImpl};

/// How often the expired scan session reaper runs.
const SCAN_SESSION_SWEEP_INTERVAL_S: u64 = 3600;

/// Starts new web service from provided `Config`
pub fn start_server(config: Config) {
    let mut builder = LogBuilder::new();
    builder
        .format(|formatter, record| {
            let now = Utc::now();
            writeln!(formatter, "{} - {} - {}", now.to_rfc3339(), record.level(), record.args())
        })
        .filter(None, LogLevelFilter::Info);

    if env::var("RUST_LOG").is_ok() {
        builder.parse(&env::var("RUST_LOG").unwrap());
    }

    // Prepare logger
    builder.init();

    // Error capture
    let _sentry_guard = sentry_integration::init(config.sentry.as_ref());

    // Prepare reactor
    let mut core = Core::new().expect("Unexpected error creating event loop core");
    let handle = Arc::new(core.handle());

    // Prepare database pool
    let database_url = config.postgres.database_url();
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    let r2d2_pool = r2d2::Pool::builder().build(manager).expect("Failed to create connection pool");

    let thread_count = config.server.thread_count;

    // Prepare CPU pool
    let cpu_pool = CpuPool::new(thread_count);

    // Prepare server
    let address = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .expect("Could not parse address");

    // Repo factory
    let repo_factory = ReposFactoryImpl::default();

    // Route table, compiled once
    let route_parser = Arc::new(controller::routes::create_route_parser());

    let serve_pool = r2d2_pool.clone();
    let serve_cpu_pool = cpu_pool.clone();
    let serve = Http::new()
        .serve_addr_handle(&address, &handle, move || {
            let controller =
                ControllerImpl::new(serve_pool.clone(), serve_cpu_pool.clone(), repo_factory, route_parser.clone());

            // Prepare application
            let app = Application::<Error>::new(controller);

            Ok(app)
        })
        .unwrap_or_else(|why| {
            error!("Http Server Initialization Error: {}", why);
            process::exit(1);
        });

    let handle_arc2 = handle.clone();
    handle.spawn(
        serve
            .for_each(move |conn| {
                handle_arc2.spawn(conn.map(|_| ()).map_err(|why| error!("Server Error: {}", why)));
                Ok(())
            })
            .map_err(|_| ()),
    );

    // Expired scan session reaper; idempotent, off the request path
    let sweep_interval = Interval::new(Duration::from_secs(SCAN_SESSION_SWEEP_INTERVAL_S), &handle)
        .expect("Could not create reaper interval");
    let sweep_service = ScanSessionsServiceImpl::new(r2d2_pool.clone(), cpu_pool.clone(), ReposFactoryImpl::default());
    handle.spawn(
        sweep_interval
            .map_err(|why| error!("Reaper timer error: {}", why))
            .for_each(move |_| {
                sweep_service
                    .reap_expired()
                    .map(|_| ())
                    .map_err(|why| error!("Scan session reaper error: {}", why))
            }),
    );

    info!("Listening on http://{}, threads: {}", address, thread_count);

    // Run until SIGINT; the reactor drop rolls back whatever was in flight
    let shutdown = tokio_signal::ctrl_c()
        .flatten_stream()
        .into_future()
        .then(|_| future::ok::<(), ()>(()));
    core.run(shutdown).unwrap();
    info!("Shutting down.");
}
