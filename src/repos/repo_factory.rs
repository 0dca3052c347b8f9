use diesel::connection::AnsiTransactionManager;
use diesel::pg::Pg;
use diesel::Connection;

use repos::*;

/// Hands out repos bound to one connection, so a service can compose several
/// repos inside a single transaction scope.
pub trait ReposFactory<C: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static>:
    Clone + Send + Sync + 'static
{
    fn create_categories_repo<'a>(&self, db_conn: &'a C) -> Box<CategoriesRepo + 'a>;
    fn create_equipment_repo<'a>(&self, db_conn: &'a C) -> Box<EquipmentRepo + 'a>;
    fn create_clients_repo<'a>(&self, db_conn: &'a C) -> Box<ClientsRepo + 'a>;
    fn create_bookings_repo<'a>(&self, db_conn: &'a C) -> Box<BookingsRepo + 'a>;
    fn create_projects_repo<'a>(&self, db_conn: &'a C) -> Box<ProjectsRepo + 'a>;
    fn create_documents_repo<'a>(&self, db_conn: &'a C) -> Box<DocumentsRepo + 'a>;
    fn create_scan_sessions_repo<'a>(&self, db_conn: &'a C) -> Box<ScanSessionsRepo + 'a>;
    fn create_barcode_sequences_repo<'a>(&self, db_conn: &'a C) -> Box<BarcodeSequencesRepo + 'a>;
    fn create_subcategory_prefixes_repo<'a>(&self, db_conn: &'a C) -> Box<SubcategoryPrefixesRepo + 'a>;
}

#[derive(Clone, Copy, Default)]
pub struct ReposFactoryImpl;

impl<C: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> ReposFactory<C>
    for ReposFactoryImpl
{
    fn create_categories_repo<'a>(&self, db_conn: &'a C) -> Box<CategoriesRepo + 'a> {
        Box::new(CategoriesRepoImpl::new(db_conn)) as Box<CategoriesRepo>
    }
    fn create_equipment_repo<'a>(&self, db_conn: &'a C) -> Box<EquipmentRepo + 'a> {
        Box::new(EquipmentRepoImpl::new(db_conn)) as Box<EquipmentRepo>
    }
    fn create_clients_repo<'a>(&self, db_conn: &'a C) -> Box<ClientsRepo + 'a> {
        Box::new(ClientsRepoImpl::new(db_conn)) as Box<ClientsRepo>
    }
    fn create_bookings_repo<'a>(&self, db_conn: &'a C) -> Box<BookingsRepo + 'a> {
        Box::new(BookingsRepoImpl::new(db_conn)) as Box<BookingsRepo>
    }
    fn create_projects_repo<'a>(&self, db_conn: &'a C) -> Box<ProjectsRepo + 'a> {
        Box::new(ProjectsRepoImpl::new(db_conn)) as Box<ProjectsRepo>
    }
    fn create_documents_repo<'a>(&self, db_conn: &'a C) -> Box<DocumentsRepo + 'a> {
        Box::new(DocumentsRepoImpl::new(db_conn)) as Box<DocumentsRepo>
    }
    fn create_scan_sessions_repo<'a>(&self, db_conn: &'a C) -> Box<ScanSessionsRepo + 'a> {
        Box::new(ScanSessionsRepoImpl::new(db_conn)) as Box<ScanSessionsRepo>
    }
    fn create_barcode_sequences_repo<'a>(&self, db_conn: &'a C) -> Box<BarcodeSequencesRepo + 'a> {
        Box::new(BarcodeSequencesRepoImpl::new(db_conn)) as Box<BarcodeSequencesRepo>
    }
    fn create_subcategory_prefixes_repo<'a>(&self, db_conn: &'a C) -> Box<SubcategoryPrefixesRepo + 'a> {
        Box::new(SubcategoryPrefixesRepoImpl::new(db_conn)) as Box<SubcategoryPrefixesRepo>
    }
}

#[cfg(test)]
pub mod tests {
    use std::error::Error;
    use std::fmt;
    use std::sync::{Arc, Mutex};

    use chrono::{DateTime, Duration, Utc};
    use diesel::connection::AnsiTransactionManager;
    use diesel::connection::SimpleConnection;
    use diesel::deserialize::QueryableByName;
    use diesel::pg::Pg;
    use diesel::query_builder::AsQuery;
    use diesel::query_builder::QueryFragment;
    use diesel::query_builder::QueryId;
    use diesel::sql_types::HasSqlType;
    use diesel::Connection;
    use diesel::ConnectionResult;
    use diesel::QueryResult;
    use diesel::Queryable;
    use r2d2::ManageConnection;
    use rust_decimal::Decimal;
    use serde_json;

    use models::*;
    use repos::*;

    pub static MOCK_USER_ID: i32 = 1;
    pub static MOCK_CLIENT_ID: i32 = 1;
    pub static MOCK_AVAILABLE_EQUIPMENT_ID: i32 = 1;
    pub static MOCK_MAINTENANCE_EQUIPMENT_ID: i32 = 2;
    pub static MOCK_ACCESSORY_EQUIPMENT_ID: i32 = 3;
    pub static MOCK_ROOT_CATEGORY_ID: i32 = 1;
    pub static MOCK_CAMERA_CATEGORY_ID: i32 = 2;
    pub static MOCK_ACCESSORY_CATEGORY_ID: i32 = 3;
    pub static MOCK_UNPRINTABLE_ROOT_ID: i32 = 4;
    pub static MOCK_UNPRINTABLE_MID_ID: i32 = 5;
    pub static MOCK_UNPRINTABLE_LEAF_ID: i32 = 6;
    pub static MOCK_EMPTY_CATEGORY_ID: i32 = 7;
    pub static MOCK_PRINTABLE_LEAF_ID: i32 = 8;
    pub static MOCK_PROJECT_ID: i32 = 1;

    pub fn utc(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn category_row(id: i32, name: &str, parent_id: Option<i32>, printable: bool) -> Category {
        Category {
            id,
            name: name.to_string(),
            description: None,
            parent_id,
            show_in_print_overview: printable,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            deleted_at: None,
        }
    }

    fn equipment_row(id: i32, name: &str, category_id: i32, barcode: &str, status: EquipmentStatus) -> Equipment {
        Equipment {
            id,
            name: name.to_string(),
            description: None,
            serial_number: Some(format!("SN-{}", id)),
            barcode: barcode.to_string(),
            category_id,
            status,
            replacement_cost: Decimal::new(500_000, 2),
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            deleted_at: None,
        }
    }

    /// Shared in-memory tables behind the mock repos, so every repo handed
    /// out by one factory observes the same writes.
    pub struct MockState {
        pub categories: Mutex<Vec<Category>>,
        pub equipment: Mutex<Vec<Equipment>>,
        pub clients: Mutex<Vec<Client>>,
        pub bookings: Mutex<Vec<Booking>>,
        pub projects: Mutex<Vec<Project>>,
        pub documents: Mutex<Vec<Document>>,
        pub scan_sessions: Mutex<Vec<RawScanSession>>,
        pub subcategory_prefixes: Mutex<Vec<SubcategoryPrefix>>,
        pub sequence: Mutex<i32>,
    }

    impl Default for MockState {
        fn default() -> Self {
            let client = Client {
                id: MOCK_CLIENT_ID,
                name: "John Doe".to_string(),
                email: Some("john@example.com".to_string()),
                phone: Some("79991234567".to_string()),
                company: None,
                status: ClientStatus::Active,
                notes: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
                deleted_at: None,
            };
            let project = Project {
                id: MOCK_PROJECT_ID,
                name: "Night Shoot".to_string(),
                client_id: MOCK_CLIENT_ID,
                start_date: utc("2025-01-01T00:00:00Z"),
                end_date: utc("2025-02-01T00:00:00Z"),
                status: ProjectStatus::Active,
                payment_status: ProjectPaymentStatus::Unpaid,
                description: None,
                notes: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
                deleted_at: None,
            };
            MockState {
                categories: Mutex::new(vec![
                    category_row(MOCK_ROOT_CATEGORY_ID, "Cameras", None, true),
                    category_row(MOCK_CAMERA_CATEGORY_ID, "Cinema Cameras", Some(MOCK_ROOT_CATEGORY_ID), false),
                    category_row(MOCK_ACCESSORY_CATEGORY_ID, "Accessories", Some(MOCK_ROOT_CATEGORY_ID), true),
                    category_row(MOCK_UNPRINTABLE_ROOT_ID, "Grip", None, false),
                    category_row(MOCK_UNPRINTABLE_MID_ID, "Stands", Some(MOCK_UNPRINTABLE_ROOT_ID), false),
                    category_row(MOCK_UNPRINTABLE_LEAF_ID, "C-Stands", Some(MOCK_UNPRINTABLE_MID_ID), false),
                    category_row(MOCK_EMPTY_CATEGORY_ID, "Empty", None, true),
                    category_row(MOCK_PRINTABLE_LEAF_ID, "8K Bodies", Some(MOCK_CAMERA_CATEGORY_ID), true),
                ]),
                equipment: Mutex::new(vec![
                    equipment_row(
                        MOCK_AVAILABLE_EQUIPMENT_ID,
                        "RED Komodo",
                        MOCK_CAMERA_CATEGORY_ID,
                        "00000000102",
                        EquipmentStatus::Available,
                    ),
                    equipment_row(
                        MOCK_MAINTENANCE_EQUIPMENT_ID,
                        "ARRI Alexa Mini",
                        MOCK_CAMERA_CATEGORY_ID,
                        "00000000204",
                        EquipmentStatus::Maintenance,
                    ),
                    equipment_row(
                        MOCK_ACCESSORY_EQUIPMENT_ID,
                        "Follow Focus",
                        MOCK_ACCESSORY_CATEGORY_ID,
                        "00000000306",
                        EquipmentStatus::Available,
                    ),
                ]),
                clients: Mutex::new(vec![client]),
                bookings: Mutex::new(vec![]),
                projects: Mutex::new(vec![project]),
                documents: Mutex::new(vec![]),
                scan_sessions: Mutex::new(vec![]),
                subcategory_prefixes: Mutex::new(vec![]),
                sequence: Mutex::new(3),
            }
        }
    }

    #[derive(Clone, Default)]
    pub struct ReposFactoryMock {
        pub state: Arc<MockState>,
    }

    impl<C: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> ReposFactory<C>
        for ReposFactoryMock
    {
        fn create_categories_repo<'a>(&self, _db_conn: &'a C) -> Box<CategoriesRepo + 'a> {
            Box::new(CategoriesRepoMock {
                state: self.state.clone(),
            }) as Box<CategoriesRepo>
        }
        fn create_equipment_repo<'a>(&self, _db_conn: &'a C) -> Box<EquipmentRepo + 'a> {
            Box::new(EquipmentRepoMock {
                state: self.state.clone(),
            }) as Box<EquipmentRepo>
        }
        fn create_clients_repo<'a>(&self, _db_conn: &'a C) -> Box<ClientsRepo + 'a> {
            Box::new(ClientsRepoMock {
                state: self.state.clone(),
            }) as Box<ClientsRepo>
        }
        fn create_bookings_repo<'a>(&self, _db_conn: &'a C) -> Box<BookingsRepo + 'a> {
            Box::new(BookingsRepoMock {
                state: self.state.clone(),
            }) as Box<BookingsRepo>
        }
        fn create_projects_repo<'a>(&self, _db_conn: &'a C) -> Box<ProjectsRepo + 'a> {
            Box::new(ProjectsRepoMock {
                state: self.state.clone(),
            }) as Box<ProjectsRepo>
        }
        fn create_documents_repo<'a>(&self, _db_conn: &'a C) -> Box<DocumentsRepo + 'a> {
            Box::new(DocumentsRepoMock {
                state: self.state.clone(),
            }) as Box<DocumentsRepo>
        }
        fn create_scan_sessions_repo<'a>(&self, _db_conn: &'a C) -> Box<ScanSessionsRepo + 'a> {
            Box::new(ScanSessionsRepoMock {
                state: self.state.clone(),
            }) as Box<ScanSessionsRepo>
        }
        fn create_barcode_sequences_repo<'a>(&self, _db_conn: &'a C) -> Box<BarcodeSequencesRepo + 'a> {
            Box::new(BarcodeSequencesRepoMock {
                state: self.state.clone(),
            }) as Box<BarcodeSequencesRepo>
        }
        fn create_subcategory_prefixes_repo<'a>(&self, _db_conn: &'a C) -> Box<SubcategoryPrefixesRepo + 'a> {
            Box::new(SubcategoryPrefixesRepoMock {
                state: self.state.clone(),
            }) as Box<SubcategoryPrefixesRepo>
        }
    }

    #[derive(Clone)]
    pub struct CategoriesRepoMock {
        pub state: Arc<MockState>,
    }

    impl CategoriesRepo for CategoriesRepoMock {
        fn find(&self, category_id_arg: i32, visibility: Visibility) -> RepoResult<Option<Category>> {
            let rows = self.state.categories.lock().unwrap();
            Ok(rows
                .iter()
                .find(|cat| {
                    cat.id == category_id_arg
                        && match visibility {
                            Visibility::Active => cat.deleted_at.is_none(),
                            Visibility::All => true,
                        }
                })
                .cloned())
        }

        fn find_by_name(&self, name_arg: &str) -> RepoResult<Option<Category>> {
            let rows = self.state.categories.lock().unwrap();
            Ok(rows
                .iter()
                .find(|cat| cat.name == name_arg && cat.deleted_at.is_none())
                .cloned())
        }

        fn list(&self) -> RepoResult<Vec<Category>> {
            let rows = self.state.categories.lock().unwrap();
            Ok(rows.iter().filter(|cat| cat.deleted_at.is_none()).cloned().collect())
        }

        fn children(&self, parent_id_arg: i32) -> RepoResult<Vec<Category>> {
            let rows = self.state.categories.lock().unwrap();
            Ok(rows
                .iter()
                .filter(|cat| cat.parent_id == Some(parent_id_arg) && cat.deleted_at.is_none())
                .cloned()
                .collect())
        }

        fn search(&self, term: &str) -> RepoResult<Vec<Category>> {
            let needle = term.to_lowercase();
            let rows = self.state.categories.lock().unwrap();
            Ok(rows
                .iter()
                .filter(|cat| cat.deleted_at.is_none() && cat.name.to_lowercase().contains(&needle))
                .cloned()
                .collect())
        }

        fn create(&self, payload: NewCategory) -> RepoResult<Category> {
            let mut rows = self.state.categories.lock().unwrap();
            let id = rows.iter().map(|cat| cat.id).max().unwrap_or(0) + 1;
            let category = Category {
                id,
                name: payload.name,
                description: payload.description,
                parent_id: payload.parent_id,
                show_in_print_overview: payload.show_in_print_overview,
                created_at: Utc::now(),
                updated_at: Utc::now(),
                deleted_at: None,
            };
            rows.push(category.clone());
            Ok(category)
        }

        fn update(&self, category_id_arg: i32, payload: UpdateCategory) -> RepoResult<Category> {
            let mut rows = self.state.categories.lock().unwrap();
            let category = rows
                .iter_mut()
                .find(|cat| cat.id == category_id_arg && cat.deleted_at.is_none())
                .ok_or(::diesel::result::Error::NotFound)?;
            if let Some(name) = payload.name {
                category.name = name;
            }
            if let Some(description) = payload.description {
                category.description = Some(description);
            }
            if let Some(parent_id) = payload.parent_id {
                category.parent_id = Some(parent_id);
            }
            if let Some(printable) = payload.show_in_print_overview {
                category.show_in_print_overview = printable;
            }
            category.updated_at = Utc::now();
            Ok(category.clone())
        }

        fn soft_delete(&self, category_id_arg: i32) -> RepoResult<Category> {
            let mut rows = self.state.categories.lock().unwrap();
            let category = rows
                .iter_mut()
                .find(|cat| cat.id == category_id_arg && cat.deleted_at.is_none())
                .ok_or(::diesel::result::Error::NotFound)?;
            category.deleted_at = Some(Utc::now());
            Ok(category.clone())
        }

        fn equipment_counts(&self) -> RepoResult<::std::collections::HashMap<i32, i64>> {
            let rows = self.state.equipment.lock().unwrap();
            let mut counts = ::std::collections::HashMap::new();
            for unit in rows.iter().filter(|unit| unit.deleted_at.is_none()) {
                *counts.entry(unit.category_id).or_insert(0) += 1;
            }
            Ok(counts)
        }
    }

    #[derive(Clone)]
    pub struct EquipmentRepoMock {
        pub state: Arc<MockState>,
    }

    impl EquipmentRepo for EquipmentRepoMock {
        fn find(&self, equipment_id_arg: i32, visibility: Visibility) -> RepoResult<Option<Equipment>> {
            let rows = self.state.equipment.lock().unwrap();
            Ok(rows
                .iter()
                .find(|unit| {
                    unit.id == equipment_id_arg
                        && match visibility {
                            Visibility::Active => unit.deleted_at.is_none(),
                            Visibility::All => true,
                        }
                })
                .cloned())
        }

        fn find_by_barcode(&self, barcode_arg: &str) -> RepoResult<Option<Equipment>> {
            let rows = self.state.equipment.lock().unwrap();
            Ok(rows
                .iter()
                .find(|unit| unit.barcode == barcode_arg && unit.deleted_at.is_none())
                .cloned())
        }

        fn list(
            &self,
            filter: EquipmentFilter,
            category_ids: Option<Vec<i32>>,
            excluded_ids: Vec<i32>,
            visibility: Visibility,
            skip: i64,
            limit: i64,
        ) -> RepoResult<(Vec<Equipment>, i64)> {
            let rows = self.state.equipment.lock().unwrap();
            let matching: Vec<Equipment> = rows
                .iter()
                .filter(|unit| match visibility {
                    Visibility::Active => unit.deleted_at.is_none(),
                    Visibility::All => true,
                })
                .filter(|unit| filter.status.map(|status| unit.status == status).unwrap_or(true))
                .filter(|unit| {
                    category_ids
                        .as_ref()
                        .map(|ids| ids.contains(&unit.category_id))
                        .unwrap_or(true)
                })
                .filter(|unit| {
                    filter
                        .query
                        .as_ref()
                        .map(|term| {
                            let needle = term.to_lowercase();
                            unit.name.to_lowercase().contains(&needle)
                                || unit.barcode.contains(&needle)
                                || unit
                                    .serial_number
                                    .as_ref()
                                    .map(|serial| serial.to_lowercase().contains(&needle))
                                    .unwrap_or(false)
                        })
                        .unwrap_or(true)
                })
                .filter(|unit| !excluded_ids.contains(&unit.id))
                .cloned()
                .collect();
            let total = matching.len() as i64;
            let page = matching
                .into_iter()
                .skip(skip as usize)
                .take(limit as usize)
                .collect();
            Ok((page, total))
        }

        fn create(&self, payload: InsertEquipment) -> RepoResult<Equipment> {
            let mut rows = self.state.equipment.lock().unwrap();
            if rows.iter().any(|unit| unit.barcode == payload.barcode && unit.deleted_at.is_none()) {
                return Err(::diesel::result::Error::NotFound.into());
            }
            let id = rows.iter().map(|unit| unit.id).max().unwrap_or(0) + 1;
            let unit = Equipment {
                id,
                name: payload.name,
                description: payload.description,
                serial_number: payload.serial_number,
                barcode: payload.barcode,
                category_id: payload.category_id,
                status: payload.status,
                replacement_cost: payload.replacement_cost,
                notes: payload.notes,
                created_at: Utc::now(),
                updated_at: Utc::now(),
                deleted_at: None,
            };
            rows.push(unit.clone());
            Ok(unit)
        }

        fn update(&self, equipment_id_arg: i32, payload: UpdateEquipment) -> RepoResult<Equipment> {
            let mut rows = self.state.equipment.lock().unwrap();
            let unit = rows
                .iter_mut()
                .find(|unit| unit.id == equipment_id_arg && unit.deleted_at.is_none())
                .ok_or(::diesel::result::Error::NotFound)?;
            if let Some(name) = payload.name {
                unit.name = name;
            }
            if let Some(description) = payload.description {
                unit.description = Some(description);
            }
            if let Some(serial_number) = payload.serial_number {
                unit.serial_number = Some(serial_number);
            }
            if let Some(category_id) = payload.category_id {
                unit.category_id = category_id;
            }
            if let Some(replacement_cost) = payload.replacement_cost {
                unit.replacement_cost = replacement_cost;
            }
            if let Some(notes) = payload.notes {
                unit.notes = Some(notes);
            }
            unit.updated_at = Utc::now();
            Ok(unit.clone())
        }

        fn set_status(&self, equipment_id_arg: i32, status_arg: EquipmentStatus) -> RepoResult<Equipment> {
            let mut rows = self.state.equipment.lock().unwrap();
            let unit = rows
                .iter_mut()
                .find(|unit| unit.id == equipment_id_arg && unit.deleted_at.is_none())
                .ok_or(::diesel::result::Error::NotFound)?;
            unit.status = status_arg;
            Ok(unit.clone())
        }

        fn set_barcode(&self, equipment_id_arg: i32, barcode_arg: &str) -> RepoResult<Equipment> {
            let mut rows = self.state.equipment.lock().unwrap();
            let unit = rows
                .iter_mut()
                .find(|unit| unit.id == equipment_id_arg && unit.deleted_at.is_none())
                .ok_or(::diesel::result::Error::NotFound)?;
            unit.barcode = barcode_arg.to_string();
            Ok(unit.clone())
        }

        fn soft_delete(&self, equipment_id_arg: i32) -> RepoResult<Equipment> {
            let mut rows = self.state.equipment.lock().unwrap();
            let unit = rows
                .iter_mut()
                .find(|unit| unit.id == equipment_id_arg && unit.deleted_at.is_none())
                .ok_or(::diesel::result::Error::NotFound)?;
            unit.deleted_at = Some(Utc::now());
            Ok(unit.clone())
        }

        fn count_by_category(&self, category_id_arg: i32) -> RepoResult<i64> {
            let rows = self.state.equipment.lock().unwrap();
            Ok(rows
                .iter()
                .filter(|unit| unit.category_id == category_id_arg && unit.deleted_at.is_none())
                .count() as i64)
        }
    }

    #[derive(Clone)]
    pub struct ClientsRepoMock {
        pub state: Arc<MockState>,
    }

    impl ClientsRepo for ClientsRepoMock {
        fn find(&self, client_id_arg: i32, visibility: Visibility) -> RepoResult<Option<Client>> {
            let rows = self.state.clients.lock().unwrap();
            Ok(rows
                .iter()
                .find(|client| {
                    client.id == client_id_arg
                        && match visibility {
                            Visibility::Active => client.deleted_at.is_none(),
                            Visibility::All => true,
                        }
                })
                .cloned())
        }

        fn list(&self, term: Option<String>, skip: i64, limit: i64) -> RepoResult<(Vec<Client>, i64)> {
            let rows = self.state.clients.lock().unwrap();
            let matching: Vec<Client> = rows
                .iter()
                .filter(|client| client.deleted_at.is_none())
                .filter(|client| {
                    term.as_ref()
                        .map(|term| {
                            let needle = term.to_lowercase();
                            client.name.to_lowercase().contains(&needle)
                                || client
                                    .email
                                    .as_ref()
                                    .map(|email| email.to_lowercase().contains(&needle))
                                    .unwrap_or(false)
                                || client
                                    .phone
                                    .as_ref()
                                    .map(|phone| phone.contains(&needle))
                                    .unwrap_or(false)
                        })
                        .unwrap_or(true)
                })
                .cloned()
                .collect();
            let total = matching.len() as i64;
            let page = matching
                .into_iter()
                .skip(skip as usize)
                .take(limit as usize)
                .collect();
            Ok((page, total))
        }

        fn create(&self, payload: NewClient) -> RepoResult<Client> {
            let mut rows = self.state.clients.lock().unwrap();
            let id = rows.iter().map(|client| client.id).max().unwrap_or(0) + 1;
            let client = Client {
                id,
                name: payload.name,
                email: payload.email,
                phone: payload.phone,
                company: payload.company,
                status: payload.status,
                notes: payload.notes,
                created_at: Utc::now(),
                updated_at: Utc::now(),
                deleted_at: None,
            };
            rows.push(client.clone());
            Ok(client)
        }

        fn update(&self, client_id_arg: i32, payload: UpdateClient) -> RepoResult<Client> {
            let mut rows = self.state.clients.lock().unwrap();
            let client = rows
                .iter_mut()
                .find(|client| client.id == client_id_arg && client.deleted_at.is_none())
                .ok_or(::diesel::result::Error::NotFound)?;
            if let Some(name) = payload.name {
                client.name = name;
            }
            if let Some(email) = payload.email {
                client.email = Some(email);
            }
            if let Some(phone) = payload.phone {
                client.phone = Some(phone);
            }
            if let Some(company) = payload.company {
                client.company = Some(company);
            }
            if let Some(status) = payload.status {
                client.status = status;
            }
            if let Some(notes) = payload.notes {
                client.notes = Some(notes);
            }
            client.updated_at = Utc::now();
            Ok(client.clone())
        }

        fn soft_delete(&self, client_id_arg: i32) -> RepoResult<Client> {
            let mut rows = self.state.clients.lock().unwrap();
            let client = rows
                .iter_mut()
                .find(|client| client.id == client_id_arg && client.deleted_at.is_none())
                .ok_or(::diesel::result::Error::NotFound)?;
            client.deleted_at = Some(Utc::now());
            Ok(client.clone())
        }
    }

    #[derive(Clone)]
    pub struct BookingsRepoMock {
        pub state: Arc<MockState>,
    }

    impl BookingsRepoMock {
        fn overlaps(booking: &Booking, from: DateTime<Utc>, to: DateTime<Utc>) -> bool {
            booking.start_date <= to && from <= booking.end_date
        }
    }

    impl BookingsRepo for BookingsRepoMock {
        fn find(&self, booking_id_arg: i32) -> RepoResult<Option<Booking>> {
            let rows = self.state.bookings.lock().unwrap();
            Ok(rows
                .iter()
                .find(|booking| booking.id == booking_id_arg && booking.deleted_at.is_none())
                .cloned())
        }

        fn list(&self, filter: BookingFilter, skip: i64, limit: i64) -> RepoResult<(Vec<Booking>, i64)> {
            let rows = self.state.bookings.lock().unwrap();
            let matching: Vec<Booking> = rows
                .iter()
                .filter(|booking| booking.deleted_at.is_none())
                .filter(|booking| {
                    filter
                        .equipment_id
                        .map(|id| booking.equipment_id == id)
                        .unwrap_or(true)
                })
                .filter(|booking| {
                    filter
                        .booking_status
                        .map(|status| booking.booking_status == status)
                        .unwrap_or(true)
                })
                .filter(|booking| {
                    filter
                        .payment_status
                        .map(|status| booking.payment_status == status)
                        .unwrap_or(true)
                })
                .filter(|booking| filter.start_date.map(|from| booking.end_date >= from).unwrap_or(true))
                .filter(|booking| filter.end_date.map(|to| booking.start_date <= to).unwrap_or(true))
                .filter(|booking| !filter.active_only || booking.booking_status.is_blocking())
                .cloned()
                .collect();
            let total = matching.len() as i64;
            let page = matching
                .into_iter()
                .skip(skip as usize)
                .take(limit as usize)
                .collect();
            Ok((page, total))
        }

        fn list_by_equipment(&self, equipment_id_arg: i32) -> RepoResult<Vec<Booking>> {
            let rows = self.state.bookings.lock().unwrap();
            Ok(rows
                .iter()
                .filter(|booking| booking.equipment_id == equipment_id_arg && booking.deleted_at.is_none())
                .cloned()
                .collect())
        }

        fn list_by_client(&self, client_id_arg: i32) -> RepoResult<Vec<Booking>> {
            let rows = self.state.bookings.lock().unwrap();
            Ok(rows
                .iter()
                .filter(|booking| booking.client_id == client_id_arg && booking.deleted_at.is_none())
                .cloned()
                .collect())
        }

        fn list_by_project(&self, project_id_arg: i32) -> RepoResult<Vec<Booking>> {
            let rows = self.state.bookings.lock().unwrap();
            Ok(rows
                .iter()
                .filter(|booking| booking.project_id == Some(project_id_arg) && booking.deleted_at.is_none())
                .cloned()
                .collect())
        }

        fn find_overlapping(
            &self,
            equipment_id_arg: i32,
            from: DateTime<Utc>,
            to: DateTime<Utc>,
            exclude_booking_id: Option<i32>,
        ) -> RepoResult<Vec<Booking>> {
            let rows = self.state.bookings.lock().unwrap();
            Ok(rows
                .iter()
                .filter(|booking| booking.equipment_id == equipment_id_arg)
                .filter(|booking| booking.deleted_at.is_none())
                .filter(|booking| booking.booking_status.is_blocking())
                .filter(|booking| Self::overlaps(booking, from, to))
                .filter(|booking| exclude_booking_id.map(|id| booking.id != id).unwrap_or(true))
                .cloned()
                .collect())
        }

        fn equipment_ids_with_conflicts(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> RepoResult<Vec<i32>> {
            let rows = self.state.bookings.lock().unwrap();
            let mut ids: Vec<i32> = rows
                .iter()
                .filter(|booking| booking.deleted_at.is_none())
                .filter(|booking| booking.booking_status.is_blocking())
                .filter(|booking| Self::overlaps(booking, from, to))
                .map(|booking| booking.equipment_id)
                .collect();
            ids.sort();
            ids.dedup();
            Ok(ids)
        }

        fn has_blocking_for_equipment(&self, equipment_id_arg: i32) -> RepoResult<bool> {
            let rows = self.state.bookings.lock().unwrap();
            Ok(rows.iter().any(|booking| {
                booking.equipment_id == equipment_id_arg
                    && booking.deleted_at.is_none()
                    && booking.booking_status.is_blocking()
            }))
        }

        fn has_blocking_for_client(&self, client_id_arg: i32) -> RepoResult<bool> {
            let rows = self.state.bookings.lock().unwrap();
            Ok(rows.iter().any(|booking| {
                booking.client_id == client_id_arg
                    && booking.deleted_at.is_none()
                    && booking.booking_status.is_blocking()
            }))
        }

        fn create(&self, payload: InsertBooking) -> RepoResult<Booking> {
            let mut rows = self.state.bookings.lock().unwrap();
            let id = rows.iter().map(|booking| booking.id).max().unwrap_or(0) + 1;
            let booking = Booking {
                id,
                client_id: payload.client_id,
                equipment_id: payload.equipment_id,
                project_id: payload.project_id,
                start_date: payload.start_date,
                end_date: payload.end_date,
                quantity: payload.quantity,
                booking_status: payload.booking_status,
                payment_status: payload.payment_status,
                total_amount: payload.total_amount,
                paid_amount: payload.paid_amount,
                deposit_amount: payload.deposit_amount,
                notes: payload.notes,
                created_at: Utc::now(),
                updated_at: Utc::now(),
                deleted_at: None,
            };
            rows.push(booking.clone());
            Ok(booking)
        }

        fn update(&self, booking_id_arg: i32, payload: UpdateBooking) -> RepoResult<Booking> {
            let mut rows = self.state.bookings.lock().unwrap();
            let booking = rows
                .iter_mut()
                .find(|booking| booking.id == booking_id_arg && booking.deleted_at.is_none())
                .ok_or(::diesel::result::Error::NotFound)?;
            if let Some(start_date) = payload.start_date {
                booking.start_date = start_date;
            }
            if let Some(end_date) = payload.end_date {
                booking.end_date = end_date;
            }
            if let Some(quantity) = payload.quantity {
                booking.quantity = quantity;
            }
            if let Some(total_amount) = payload.total_amount {
                booking.total_amount = total_amount;
            }
            if let Some(paid_amount) = payload.paid_amount {
                booking.paid_amount = paid_amount;
            }
            if let Some(notes) = payload.notes {
                booking.notes = Some(notes);
            }
            booking.updated_at = Utc::now();
            Ok(booking.clone())
        }

        fn set_status(&self, booking_id_arg: i32, status_arg: BookingStatus) -> RepoResult<Booking> {
            let mut rows = self.state.bookings.lock().unwrap();
            let booking = rows
                .iter_mut()
                .find(|booking| booking.id == booking_id_arg && booking.deleted_at.is_none())
                .ok_or(::diesel::result::Error::NotFound)?;
            booking.booking_status = status_arg;
            Ok(booking.clone())
        }

        fn set_payment_status(&self, booking_id_arg: i32, status_arg: PaymentStatus) -> RepoResult<Booking> {
            let mut rows = self.state.bookings.lock().unwrap();
            let booking = rows
                .iter_mut()
                .find(|booking| booking.id == booking_id_arg && booking.deleted_at.is_none())
                .ok_or(::diesel::result::Error::NotFound)?;
            booking.payment_status = status_arg;
            Ok(booking.clone())
        }

        fn set_project(&self, booking_id_arg: i32, project_id_arg: Option<i32>) -> RepoResult<Booking> {
            let mut rows = self.state.bookings.lock().unwrap();
            let booking = rows
                .iter_mut()
                .find(|booking| booking.id == booking_id_arg && booking.deleted_at.is_none())
                .ok_or(::diesel::result::Error::NotFound)?;
            booking.project_id = project_id_arg;
            Ok(booking.clone())
        }

        fn soft_delete(&self, booking_id_arg: i32) -> RepoResult<Booking> {
            let mut rows = self.state.bookings.lock().unwrap();
            let booking = rows
                .iter_mut()
                .find(|booking| booking.id == booking_id_arg && booking.deleted_at.is_none())
                .ok_or(::diesel::result::Error::NotFound)?;
            booking.deleted_at = Some(Utc::now());
            Ok(booking.clone())
        }
    }

    #[derive(Clone)]
    pub struct ProjectsRepoMock {
        pub state: Arc<MockState>,
    }

    impl ProjectsRepo for ProjectsRepoMock {
        fn find(&self, project_id_arg: i32, visibility: Visibility) -> RepoResult<Option<Project>> {
            let rows = self.state.projects.lock().unwrap();
            Ok(rows
                .iter()
                .find(|project| {
                    project.id == project_id_arg
                        && match visibility {
                            Visibility::Active => project.deleted_at.is_none(),
                            Visibility::All => true,
                        }
                })
                .cloned())
        }

        fn list(&self, filter: ProjectFilter, skip: i64, limit: i64) -> RepoResult<(Vec<Project>, i64)> {
            let rows = self.state.projects.lock().unwrap();
            let matching: Vec<Project> = rows
                .iter()
                .filter(|project| project.deleted_at.is_none())
                .filter(|project| filter.client_id.map(|id| project.client_id == id).unwrap_or(true))
                .filter(|project| filter.status.map(|status| project.status == status).unwrap_or(true))
                .cloned()
                .collect();
            let total = matching.len() as i64;
            let page = matching
                .into_iter()
                .skip(skip as usize)
                .take(limit as usize)
                .collect();
            Ok((page, total))
        }

        fn create(&self, payload: InsertProject) -> RepoResult<Project> {
            let mut rows = self.state.projects.lock().unwrap();
            let id = rows.iter().map(|project| project.id).max().unwrap_or(0) + 1;
            let project = Project {
                id,
                name: payload.name,
                client_id: payload.client_id,
                start_date: payload.start_date,
                end_date: payload.end_date,
                status: payload.status,
                payment_status: payload.payment_status,
                description: payload.description,
                notes: payload.notes,
                created_at: Utc::now(),
                updated_at: Utc::now(),
                deleted_at: None,
            };
            rows.push(project.clone());
            Ok(project)
        }

        fn update(&self, project_id_arg: i32, payload: UpdateProject) -> RepoResult<Project> {
            let mut rows = self.state.projects.lock().unwrap();
            let project = rows
                .iter_mut()
                .find(|project| project.id == project_id_arg && project.deleted_at.is_none())
                .ok_or(::diesel::result::Error::NotFound)?;
            if let Some(name) = payload.name {
                project.name = name;
            }
            if let Some(client_id) = payload.client_id {
                project.client_id = client_id;
            }
            if let Some(start_date) = payload.start_date {
                project.start_date = start_date;
            }
            if let Some(end_date) = payload.end_date {
                project.end_date = end_date;
            }
            if let Some(status) = payload.status {
                project.status = status;
            }
            if let Some(description) = payload.description {
                project.description = Some(description);
            }
            if let Some(notes) = payload.notes {
                project.notes = Some(notes);
            }
            project.updated_at = Utc::now();
            Ok(project.clone())
        }

        fn set_payment_status(&self, project_id_arg: i32, status_arg: ProjectPaymentStatus) -> RepoResult<Project> {
            let mut rows = self.state.projects.lock().unwrap();
            let project = rows
                .iter_mut()
                .find(|project| project.id == project_id_arg && project.deleted_at.is_none())
                .ok_or(::diesel::result::Error::NotFound)?;
            project.payment_status = status_arg;
            Ok(project.clone())
        }

        fn soft_delete(&self, project_id_arg: i32) -> RepoResult<Project> {
            let mut rows = self.state.projects.lock().unwrap();
            let project = rows
                .iter_mut()
                .find(|project| project.id == project_id_arg && project.deleted_at.is_none())
                .ok_or(::diesel::result::Error::NotFound)?;
            project.deleted_at = Some(Utc::now());
            Ok(project.clone())
        }
    }

    #[derive(Clone)]
    pub struct DocumentsRepoMock {
        pub state: Arc<MockState>,
    }

    impl DocumentsRepo for DocumentsRepoMock {
        fn find(&self, document_id_arg: i32, visibility: Visibility) -> RepoResult<Option<Document>> {
            let rows = self.state.documents.lock().unwrap();
            Ok(rows
                .iter()
                .find(|document| {
                    document.id == document_id_arg
                        && match visibility {
                            Visibility::Active => document.deleted_at.is_none(),
                            Visibility::All => true,
                        }
                })
                .cloned())
        }

        fn list(
            &self,
            client_id_arg: Option<i32>,
            booking_id_arg: Option<i32>,
            skip: i64,
            limit: i64,
        ) -> RepoResult<(Vec<Document>, i64)> {
            let rows = self.state.documents.lock().unwrap();
            let matching: Vec<Document> = rows
                .iter()
                .filter(|document| document.deleted_at.is_none())
                .filter(|document| client_id_arg.map(|id| document.client_id == id).unwrap_or(true))
                .filter(|document| booking_id_arg.map(|id| document.booking_id == Some(id)).unwrap_or(true))
                .cloned()
                .collect();
            let total = matching.len() as i64;
            let page = matching
                .into_iter()
                .skip(skip as usize)
                .take(limit as usize)
                .collect();
            Ok((page, total))
        }

        fn create(&self, payload: NewDocument) -> RepoResult<Document> {
            let mut rows = self.state.documents.lock().unwrap();
            let id = rows.iter().map(|document| document.id).max().unwrap_or(0) + 1;
            let document = Document {
                id,
                client_id: payload.client_id,
                booking_id: payload.booking_id,
                type_: payload.type_,
                title: payload.title,
                description: payload.description,
                file_path: payload.file_path,
                file_name: payload.file_name,
                file_size: payload.file_size,
                mime_type: payload.mime_type,
                notes: payload.notes,
                status: payload.status,
                created_at: Utc::now(),
                updated_at: Utc::now(),
                deleted_at: None,
            };
            rows.push(document.clone());
            Ok(document)
        }

        fn update(&self, document_id_arg: i32, payload: UpdateDocument) -> RepoResult<Document> {
            let mut rows = self.state.documents.lock().unwrap();
            let document = rows
                .iter_mut()
                .find(|document| document.id == document_id_arg && document.deleted_at.is_none())
                .ok_or(::diesel::result::Error::NotFound)?;
            if let Some(booking_id) = payload.booking_id {
                document.booking_id = Some(booking_id);
            }
            if let Some(title) = payload.title {
                document.title = title;
            }
            if let Some(description) = payload.description {
                document.description = Some(description);
            }
            if let Some(notes) = payload.notes {
                document.notes = Some(notes);
            }
            if let Some(status) = payload.status {
                document.status = status;
            }
            document.updated_at = Utc::now();
            Ok(document.clone())
        }

        fn detach_booking(&self, booking_id_arg: i32) -> RepoResult<usize> {
            let mut rows = self.state.documents.lock().unwrap();
            let mut detached = 0;
            for document in rows.iter_mut() {
                if document.booking_id == Some(booking_id_arg) {
                    document.booking_id = None;
                    detached += 1;
                }
            }
            Ok(detached)
        }

        fn soft_delete(&self, document_id_arg: i32) -> RepoResult<Document> {
            let mut rows = self.state.documents.lock().unwrap();
            let document = rows
                .iter_mut()
                .find(|document| document.id == document_id_arg && document.deleted_at.is_none())
                .ok_or(::diesel::result::Error::NotFound)?;
            document.deleted_at = Some(Utc::now());
            Ok(document.clone())
        }
    }

    #[derive(Clone)]
    pub struct ScanSessionsRepoMock {
        pub state: Arc<MockState>,
    }

    impl ScanSessionsRepo for ScanSessionsRepoMock {
        fn find(&self, session_id_arg: i32) -> RepoResult<Option<RawScanSession>> {
            let rows = self.state.scan_sessions.lock().unwrap();
            Ok(rows
                .iter()
                .find(|session| {
                    session.id == session_id_arg
                        && session.deleted_at.is_none()
                        && session.expires_at >= Utc::now()
                })
                .cloned())
        }

        fn list_for_user(&self, user_id_arg: i32) -> RepoResult<Vec<RawScanSession>> {
            let rows = self.state.scan_sessions.lock().unwrap();
            Ok(rows
                .iter()
                .filter(|session| {
                    session.user_id == Some(user_id_arg)
                        && session.deleted_at.is_none()
                        && session.expires_at >= Utc::now()
                })
                .cloned()
                .collect())
        }

        fn create(&self, payload: InsertScanSession) -> RepoResult<RawScanSession> {
            let mut rows = self.state.scan_sessions.lock().unwrap();
            let id = rows.iter().map(|session| session.id).max().unwrap_or(0) + 1;
            let session = RawScanSession {
                id,
                user_id: payload.user_id,
                name: payload.name,
                items: payload.items,
                expires_at: payload.expires_at,
                created_at: Utc::now(),
                updated_at: Utc::now(),
                deleted_at: None,
            };
            rows.push(session.clone());
            Ok(session)
        }

        fn update(&self, session_id_arg: i32, payload: ScanSessionChangeset) -> RepoResult<RawScanSession> {
            let mut rows = self.state.scan_sessions.lock().unwrap();
            let session = rows
                .iter_mut()
                .find(|session| session.id == session_id_arg && session.deleted_at.is_none())
                .ok_or(::diesel::result::Error::NotFound)?;
            if let Some(name) = payload.name {
                session.name = name;
            }
            if let Some(items) = payload.items {
                session.items = items;
            }
            session.updated_at = Utc::now();
            Ok(session.clone())
        }

        fn soft_delete(&self, session_id_arg: i32) -> RepoResult<RawScanSession> {
            let mut rows = self.state.scan_sessions.lock().unwrap();
            let session = rows
                .iter_mut()
                .find(|session| session.id == session_id_arg && session.deleted_at.is_none())
                .ok_or(::diesel::result::Error::NotFound)?;
            session.deleted_at = Some(Utc::now());
            Ok(session.clone())
        }

        fn reap_expired(&self) -> RepoResult<usize> {
            let mut rows = self.state.scan_sessions.lock().unwrap();
            let before = rows.len();
            let now = Utc::now();
            rows.retain(|session| session.expires_at >= now);
            Ok(before - rows.len())
        }
    }

    #[derive(Clone)]
    pub struct BarcodeSequencesRepoMock {
        pub state: Arc<MockState>,
    }

    impl BarcodeSequencesRepo for BarcodeSequencesRepoMock {
        fn next_number(&self) -> RepoResult<i32> {
            let mut sequence = self.state.sequence.lock().unwrap();
            *sequence += 1;
            Ok(*sequence)
        }

        fn peek_next_number(&self) -> RepoResult<i32> {
            let sequence = self.state.sequence.lock().unwrap();
            Ok(*sequence + 1)
        }
    }

    #[derive(Clone)]
    pub struct SubcategoryPrefixesRepoMock {
        pub state: Arc<MockState>,
    }

    impl SubcategoryPrefixesRepo for SubcategoryPrefixesRepoMock {
        fn find(&self, prefix_id_arg: i32) -> RepoResult<Option<SubcategoryPrefix>> {
            let rows = self.state.subcategory_prefixes.lock().unwrap();
            Ok(rows
                .iter()
                .find(|prefix| prefix.id == prefix_id_arg && prefix.deleted_at.is_none())
                .cloned())
        }

        fn list_by_category(&self, category_id_arg: i32) -> RepoResult<Vec<SubcategoryPrefix>> {
            let rows = self.state.subcategory_prefixes.lock().unwrap();
            Ok(rows
                .iter()
                .filter(|prefix| prefix.category_id == category_id_arg && prefix.deleted_at.is_none())
                .cloned()
                .collect())
        }

        fn exists(&self, category_id_arg: i32, name_arg: &str, prefix_arg: &str) -> RepoResult<bool> {
            let rows = self.state.subcategory_prefixes.lock().unwrap();
            Ok(rows.iter().any(|prefix| {
                prefix.category_id == category_id_arg
                    && prefix.deleted_at.is_none()
                    && (prefix.name == name_arg || prefix.prefix == prefix_arg)
            }))
        }

        fn create(&self, payload: NewSubcategoryPrefix) -> RepoResult<SubcategoryPrefix> {
            let mut rows = self.state.subcategory_prefixes.lock().unwrap();
            let id = rows.iter().map(|prefix| prefix.id).max().unwrap_or(0) + 1;
            let prefix = SubcategoryPrefix {
                id,
                category_id: payload.category_id,
                name: payload.name,
                prefix: payload.prefix,
                description: payload.description,
                created_at: Utc::now(),
                updated_at: Utc::now(),
                deleted_at: None,
            };
            rows.push(prefix.clone());
            Ok(prefix)
        }

        fn update(&self, prefix_id_arg: i32, payload: UpdateSubcategoryPrefix) -> RepoResult<SubcategoryPrefix> {
            let mut rows = self.state.subcategory_prefixes.lock().unwrap();
            let prefix = rows
                .iter_mut()
                .find(|prefix| prefix.id == prefix_id_arg && prefix.deleted_at.is_none())
                .ok_or(::diesel::result::Error::NotFound)?;
            if let Some(name) = payload.name {
                prefix.name = name;
            }
            if let Some(code) = payload.prefix {
                prefix.prefix = code;
            }
            if let Some(description) = payload.description {
                prefix.description = Some(description);
            }
            prefix.updated_at = Utc::now();
            Ok(prefix.clone())
        }

        fn soft_delete(&self, prefix_id_arg: i32) -> RepoResult<SubcategoryPrefix> {
            let mut rows = self.state.subcategory_prefixes.lock().unwrap();
            let prefix = rows
                .iter_mut()
                .find(|prefix| prefix.id == prefix_id_arg && prefix.deleted_at.is_none())
                .ok_or(::diesel::result::Error::NotFound)?;
            prefix.deleted_at = Some(Utc::now());
            Ok(prefix.clone())
        }
    }

    /// Connection stub; queries never reach it because the repos above are
    /// in-memory, but transactions still need a working manager.
    #[derive(Default)]
    pub struct MockConnection {
        tr: AnsiTransactionManager,
    }

    impl Connection for MockConnection {
        type Backend = Pg;
        type TransactionManager = AnsiTransactionManager;

        fn establish(_database_url: &str) -> ConnectionResult<MockConnection> {
            Ok(MockConnection::default())
        }

        fn execute(&self, _query: &str) -> QueryResult<usize> {
            Ok(0)
        }

        fn query_by_index<T, U>(&self, _source: T) -> QueryResult<Vec<U>>
        where
            T: AsQuery,
            T::Query: QueryFragment<Pg> + QueryId,
            Pg: HasSqlType<T::SqlType>,
            U: Queryable<T::SqlType, Pg>,
        {
            unimplemented!()
        }

        fn query_by_name<T, U>(&self, _source: &T) -> QueryResult<Vec<U>>
        where
            T: QueryFragment<Pg> + QueryId,
            U: QueryableByName<Pg>,
        {
            unimplemented!()
        }

        fn execute_returning_count<T>(&self, _source: &T) -> QueryResult<usize>
        where
            T: QueryFragment<Pg> + QueryId,
        {
            Ok(0)
        }

        fn transaction_manager(&self) -> &Self::TransactionManager {
            &self.tr
        }
    }

    impl SimpleConnection for MockConnection {
        fn batch_execute(&self, _query: &str) -> QueryResult<()> {
            Ok(())
        }
    }

    #[derive(Default)]
    pub struct MockConnectionManager;

    impl ManageConnection for MockConnectionManager {
        type Connection = MockConnection;
        type Error = MockError;

        fn connect(&self) -> Result<MockConnection, MockError> {
            Ok(MockConnection::default())
        }

        fn is_valid(&self, _conn: &mut MockConnection) -> Result<(), MockError> {
            Ok(())
        }

        fn has_broken(&self, _conn: &mut MockConnection) -> bool {
            false
        }
    }

    #[derive(Debug)]
    pub struct MockError {}

    impl fmt::Display for MockError {
        fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
            write!(f, "Mock connection error")
        }
    }

    impl Error for MockError {
        fn description(&self) -> &str {
            "Mock connection error"
        }

        fn cause(&self) -> Option<&Error> {
            None
        }
    }

    pub fn scan_item(equipment_id: i32, barcode: &str, name: &str) -> ScanItem {
        ScanItem {
            equipment_id,
            barcode: barcode.to_string(),
            name: name.to_string(),
            category_id: Some(MOCK_CAMERA_CATEGORY_ID),
            category_name: None,
            booking_start_date: None,
            booking_end_date: None,
        }
    }

    pub fn expired_session(id: i32, user_id: Option<i32>) -> RawScanSession {
        RawScanSession {
            id,
            user_id,
            name: "stale".to_string(),
            items: serde_json::Value::Array(vec![]),
            expires_at: Utc::now() - Duration::days(1),
            created_at: Utc::now() - Duration::days(8),
            updated_at: Utc::now() - Duration::days(8),
            deleted_at: None,
        }
    }
}
