//! Barcode sequence singleton. A barcode is 11 characters: a 9-digit
//! zero-padded global sequence number followed by a 2-digit checksum. The
//! checksum recipe is relied on by deployed hardware scanners and must not
//! change.

use chrono::{DateTime, Utc};

use schema::barcode_sequences;

/// Id of the single sequence row.
pub const BARCODE_SEQUENCE_ID: i32 = 1;

pub const BARCODE_SEQUENCE_DIGITS: usize = 9;
pub const BARCODE_LENGTH: usize = 11;

#[derive(Debug, Serialize, Deserialize, Queryable, Identifiable, Clone)]
#[table_name = "barcode_sequences"]
pub struct BarcodeSequence {
    pub id: i32,
    pub last_number: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for validating a scanned barcode
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ValidateBarcode {
    pub barcode: String,
}

/// Validation outcome with the decoded sequence number
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct BarcodeValidation {
    pub is_valid: bool,
    pub sequence_number: i32,
}
