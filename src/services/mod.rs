//! Services is a core layer for the app business logic: validation, the
//! state machines, availability and the transaction scopes around them.

pub mod barcode;
pub mod bookings;
pub mod categories;
pub mod clients;
pub mod documents;
pub mod equipment;
pub mod projects;
pub mod scan_sessions;
pub mod subcategory_prefixes;
pub mod types;

pub use self::barcode::*;
pub use self::bookings::*;
pub use self::categories::*;
pub use self::clients::*;
pub use self::documents::*;
pub use self::equipment::*;
pub use self::projects::*;
pub use self::scan_sessions::*;
pub use self::subcategory_prefixes::*;
pub use self::types::*;
