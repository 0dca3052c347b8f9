//! Rentals is a microservice responsible for the booking calendar, the
//! equipment catalog and the clients of a cinema equipment rental house.
//! This crate runs the service from `rentals_lib`. See `rentals_lib` for
//! details.

extern crate rentals_lib;

fn main() {
    let config = rentals_lib::config::Config::new().expect("Can't load app config!");
    rentals_lib::start_server(config);
}
