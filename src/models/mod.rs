//! Models contains all structures that are used in different
//! modules of the app

pub mod barcode;
pub mod booking;
pub mod category;
pub mod client;
pub mod document;
pub mod equipment;
pub mod project;
pub mod scan_session;
pub mod subcategory_prefix;
pub mod validation_rules;
pub mod visibility;

pub use self::barcode::*;
pub use self::booking::*;
pub use self::category::*;
pub use self::client::*;
pub use self::document::*;
pub use self::equipment::*;
pub use self::project::*;
pub use self::scan_session::*;
pub use self::subcategory_prefix::*;
pub use self::validation_rules::*;
pub use self::visibility::*;
