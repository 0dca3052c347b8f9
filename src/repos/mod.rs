//! Repos is a module responsible for interacting with postgres db

pub mod barcode_sequences;
pub mod bookings;
pub mod categories;
pub mod clients;
pub mod documents;
pub mod equipment;
pub mod pagination;
pub mod projects;
pub mod repo_factory;
pub mod scan_sessions;
pub mod subcategory_prefixes;
pub mod types;

pub use self::barcode_sequences::*;
pub use self::bookings::*;
pub use self::categories::*;
pub use self::clients::*;
pub use self::documents::*;
pub use self::equipment::*;
pub use self::pagination::*;
pub use self::projects::*;
pub use self::repo_factory::*;
pub use self::scan_sessions::*;
pub use self::subcategory_prefixes::*;
pub use self::types::*;
