use regex::Regex;

/// List of all routes with params for the app
#[derive(Clone, Debug, PartialEq)]
pub enum Route {
    Healthcheck,
    Equipment,
    EquipmentUnit(i32),
    EquipmentByBarcode(String),
    EquipmentRegenerateBarcode(i32),
    EquipmentAvailability(i32),
    EquipmentBookings(i32),
    EquipmentStatus(i32),
    Bookings,
    Booking(i32),
    BookingsBatch,
    BookingStatus(i32),
    BookingPayment(i32),
    Categories,
    Category(i32),
    CategoriesWithEquipmentCount,
    CategoriesSearch,
    CategorySubcategories(i32),
    Clients,
    Client(i32),
    ClientBookings(i32),
    Projects,
    Project(i32),
    ProjectBookings(i32),
    ProjectBooking(i32, i32),
    Documents,
    Document(i32),
    ScanSessions,
    ScanSession(i32),
    ScanSessionsByUser(i32),
    SubcategoryPrefixes,
    SubcategoryPrefix(i32),
    BarcodesGenerate,
    BarcodesValidate,
    BarcodesNext,
}

/// RouteParser class maps regex to type-safe list of routes, defined by `enum Route`
pub struct RouteParser {
    regex_and_converters: Vec<(Regex, Box<ParamsConverter>)>,
}

type ParamsConverter = Fn(Vec<&str>) -> Option<Route> + Send + Sync;

impl RouteParser {
    /// Creates new Router
    pub fn new() -> Self {
        Self {
            regex_and_converters: Vec::new(),
        }
    }

    /// Adds mapping between regex and route
    pub fn add_route(&mut self, regex_pattern: &str, route: Route) -> &Self {
        self.add_route_with_params(regex_pattern, move |_| Some(route.clone()));
        self
    }

    /// Adds mapping between regex and route with params; the converter turns
    /// captured strings into typed route params
    pub fn add_route_with_params<F>(&mut self, regex_pattern: &str, converter: F) -> &Self
    where
        F: Fn(Vec<&str>) -> Option<Route> + Send + Sync + 'static,
    {
        let regex = Regex::new(regex_pattern).unwrap();
        self.regex_and_converters.push((regex, Box::new(converter)));
        self
    }

    /// Tests string router for matches
    /// Returns Some(route) if there's a match
    pub fn test(&self, route: &str) -> Option<Route> {
        self.regex_and_converters
            .iter()
            .fold(None, |acc, ref regex_and_converter| {
                if acc.is_some() {
                    return acc;
                }
                RouteParser::get_matches(&regex_and_converter.0, route).and_then(|params| regex_and_converter.1(params))
            })
    }

    fn get_matches<'a>(regex: &Regex, string: &'a str) -> Option<Vec<&'a str>> {
        regex.captures(string).and_then(|captures| {
            captures
                .iter()
                .skip(1)
                .fold(Some(Vec::<&str>::new()), |mut maybe_acc, maybe_match| {
                    if let Some(ref mut acc) = maybe_acc {
                        if let Some(mtch) = maybe_match {
                            acc.push(mtch.as_str());
                        }
                    }
                    maybe_acc
                })
        })
    }
}

fn parse_id(params: &[&str], at: usize) -> Option<i32> {
    params.get(at).and_then(|string_id| string_id.parse::<i32>().ok())
}

pub fn create_route_parser() -> RouteParser {
    let mut router = RouteParser::new();

    // Healthcheck
    router.add_route(r"^/healthcheck$", Route::Healthcheck);

    // Equipment routes
    router.add_route(r"^/equipment$", Route::Equipment);
    router.add_route_with_params(r"^/equipment/barcode/(\w+)$", |params| {
        params.get(0).map(|barcode| Route::EquipmentByBarcode(barcode.to_string()))
    });
    router.add_route_with_params(r"^/equipment/(\d+)/regenerate-barcode$", |params| {
        parse_id(&params, 0).map(Route::EquipmentRegenerateBarcode)
    });
    router.add_route_with_params(r"^/equipment/(\d+)/availability$", |params| {
        parse_id(&params, 0).map(Route::EquipmentAvailability)
    });
    router.add_route_with_params(r"^/equipment/(\d+)/bookings$", |params| {
        parse_id(&params, 0).map(Route::EquipmentBookings)
    });
    router.add_route_with_params(r"^/equipment/(\d+)/status$", |params| {
        parse_id(&params, 0).map(Route::EquipmentStatus)
    });
    router.add_route_with_params(r"^/equipment/(\d+)$", |params| {
        parse_id(&params, 0).map(Route::EquipmentUnit)
    });

    // Bookings routes
    router.add_route(r"^/bookings$", Route::Bookings);
    router.add_route(r"^/bookings/batch$", Route::BookingsBatch);
    router.add_route_with_params(r"^/bookings/(\d+)/status$", |params| {
        parse_id(&params, 0).map(Route::BookingStatus)
    });
    router.add_route_with_params(r"^/bookings/(\d+)/payment$", |params| {
        parse_id(&params, 0).map(Route::BookingPayment)
    });
    router.add_route_with_params(r"^/bookings/(\d+)$", |params| {
        parse_id(&params, 0).map(Route::Booking)
    });

    // Categories routes
    router.add_route(r"^/categories$", Route::Categories);
    router.add_route(r"^/categories/with-equipment-count$", Route::CategoriesWithEquipmentCount);
    router.add_route(r"^/categories/search$", Route::CategoriesSearch);
    router.add_route_with_params(r"^/categories/(\d+)/subcategories$", |params| {
        parse_id(&params, 0).map(Route::CategorySubcategories)
    });
    router.add_route_with_params(r"^/categories/(\d+)$", |params| {
        parse_id(&params, 0).map(Route::Category)
    });

    // Clients routes
    router.add_route(r"^/clients$", Route::Clients);
    router.add_route_with_params(r"^/clients/(\d+)/bookings$", |params| {
        parse_id(&params, 0).map(Route::ClientBookings)
    });
    router.add_route_with_params(r"^/clients/(\d+)$", |params| {
        parse_id(&params, 0).map(Route::Client)
    });

    // Projects routes
    router.add_route(r"^/projects$", Route::Projects);
    router.add_route_with_params(r"^/projects/(\d+)/bookings$", |params| {
        parse_id(&params, 0).map(Route::ProjectBookings)
    });
    router.add_route_with_params(r"^/projects/(\d+)/bookings/(\d+)$", |params| {
        match (parse_id(&params, 0), parse_id(&params, 1)) {
            (Some(project_id), Some(booking_id)) => Some(Route::ProjectBooking(project_id, booking_id)),
            _ => None,
        }
    });
    router.add_route_with_params(r"^/projects/(\d+)$", |params| {
        parse_id(&params, 0).map(Route::Project)
    });

    // Documents routes
    router.add_route(r"^/documents$", Route::Documents);
    router.add_route_with_params(r"^/documents/(\d+)$", |params| {
        parse_id(&params, 0).map(Route::Document)
    });

    // Scan sessions routes
    router.add_route(r"^/scan-sessions$", Route::ScanSessions);
    router.add_route_with_params(r"^/scan-sessions/user/(\d+)$", |params| {
        parse_id(&params, 0).map(Route::ScanSessionsByUser)
    });
    router.add_route_with_params(r"^/scan-sessions/(\d+)$", |params| {
        parse_id(&params, 0).map(Route::ScanSession)
    });

    // Subcategory prefixes routes
    router.add_route(r"^/subcategory-prefixes$", Route::SubcategoryPrefixes);
    router.add_route_with_params(r"^/subcategory-prefixes/(\d+)$", |params| {
        parse_id(&params, 0).map(Route::SubcategoryPrefix)
    });

    // Barcodes routes
    router.add_route(r"^/barcodes/generate$", Route::BarcodesGenerate);
    router.add_route(r"^/barcodes/validate$", Route::BarcodesValidate);
    router.add_route(r"^/barcodes/next$", Route::BarcodesNext);

    router
}
