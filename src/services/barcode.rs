//! Barcode allocator. A barcode is the 9-digit zero-padded global sequence
//! number plus a 2-digit checksum. Deployed scanners validate the checksum
//! offline, so the recipe below is frozen.

use diesel::connection::AnsiTransactionManager;
use diesel::pg::Pg;
use diesel::Connection;
use failure::Error as FailureError;
use failure::Fail;
use futures::future;
use futures::Future;
use futures_cpupool::CpuPool;
use r2d2::{ManageConnection, Pool};
use regex::Regex;

use super::types::ServiceFuture;
use errors::validation_error;
use models::{BarcodeValidation, BARCODE_SEQUENCE_DIGITS};
use repos::ReposFactory;

/// Luhn-style checksum over the 9 sequence digits: walking right to left,
/// every digit at an even offset is doubled (minus nine when it overflows a
/// digit), the sum is taken modulo 100.
pub fn checksum(sequence_number: i32) -> u32 {
    let digits = format!("{:09}", sequence_number);
    let mut sum = 0u32;
    for (offset, ch) in digits.chars().rev().enumerate() {
        let mut digit = ch.to_digit(10).unwrap_or(0);
        if offset % 2 == 0 {
            digit *= 2;
            if digit > 9 {
                digit -= 9;
            }
        }
        sum += digit;
    }
    sum % 100
}

/// Renders the full 11-character barcode for a sequence number.
pub fn compose_barcode(sequence_number: i32) -> String {
    format!("{:09}{:02}", sequence_number, checksum(sequence_number))
}

/// Shape check only; the checksum is verified by `parse_barcode`.
pub fn validate_format(barcode: &str) -> bool {
    lazy_static! {
        static ref BARCODE_RE: Regex = Regex::new(r"^\d{11}$").unwrap();
    }
    BARCODE_RE.is_match(barcode)
}

/// Decodes a barcode back into its sequence number, failing on a bad shape
/// or a checksum mismatch.
pub fn parse_barcode(barcode: &str) -> Result<i32, FailureError> {
    if !validate_format(barcode) {
        return Err(validation_error("barcode", "Barcode must be exactly 11 digits").into());
    }
    let sequence_number: i32 = barcode[..BARCODE_SEQUENCE_DIGITS]
        .parse()
        .map_err(|_| validation_error("barcode", "Barcode sequence number is out of range"))?;
    let expected: u32 = barcode[BARCODE_SEQUENCE_DIGITS..]
        .parse()
        .map_err(|_| validation_error("barcode", "Barcode checksum is not numeric"))?;
    if checksum(sequence_number) != expected {
        return Err(validation_error("barcode", "Barcode checksum mismatch").into());
    }
    Ok(sequence_number)
}

pub trait BarcodeService {
    /// Mints the next barcode, consuming a sequence number
    fn generate(&self) -> ServiceFuture<String>;
    /// Validates shape and checksum, returning the decoded sequence number
    fn validate(&self, barcode: String) -> ServiceFuture<BarcodeValidation>;
    /// The sequence number the next generate call would use
    fn peek_next_sequence(&self) -> ServiceFuture<i32>;
}

/// Barcode service over the sequence singleton
pub struct BarcodeServiceImpl<
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
    > BarcodeServiceImpl<T, M, F>
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
    > BarcodeService for BarcodeServiceImpl<T, M, F>
{
    fn generate(&self) -> ServiceFuture<String> {
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
                            let sequences_repo = repo_factory.create_barcode_sequences_repo(&*conn);
                            conn.transaction::<String, FailureError, _>(move || {
                                let sequence_number = sequences_repo.next_number()?;
                                Ok(compose_barcode(sequence_number))
                            })
                        })
                })
                .map_err(|e: FailureError| e.context("Service Barcode, generate endpoint error occured.").into()),
        )
    }

    fn validate(&self, barcode: String) -> ServiceFuture<BarcodeValidation> {
        let validation = match parse_barcode(&barcode) {
            Ok(sequence_number) => BarcodeValidation {
                is_valid: true,
                sequence_number,
            },
            Err(_) => BarcodeValidation {
                is_valid: false,
                sequence_number: 0,
            },
        };
        Box::new(future::ok(validation))
    }

    fn peek_next_sequence(&self) -> ServiceFuture<i32> {
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
                            let sequences_repo = repo_factory.create_barcode_sequences_repo(&*conn);
                            sequences_repo.peek_next_number()
                        })
                })
                .map_err(|e: FailureError| {
                    e.context("Service Barcode, next sequence endpoint error occured.").into()
                }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_is_stable() {
        // Pinned values: deployed scanners derive the same numbers.
        assert_eq!(checksum(1), 2);
        assert_eq!(checksum(2), 4);
        assert_eq!(checksum(9), 9);
        assert_eq!(checksum(123456789), 43);
    }

    #[test]
    fn test_compose_and_parse_round_trip() {
        for sequence in &[1, 2, 9, 10, 99, 123456789, 999999999] {
            let barcode = compose_barcode(*sequence);
            assert_eq!(barcode.len(), 11);
            assert_eq!(parse_barcode(&barcode).unwrap(), *sequence);
        }
    }

    #[test]
    fn test_parse_rejects_bad_shapes() {
        assert!(parse_barcode("123").is_err());
        assert!(parse_barcode("abcdefghijk").is_err());
        assert!(parse_barcode("000000001xx").is_err());
    }

    #[test]
    fn test_parse_rejects_checksum_mismatch() {
        // Valid shape, wrong trailing checksum.
        assert!(parse_barcode("00000000199").is_err());
    }

    #[test]
    fn test_validate_format() {
        assert!(validate_format("00000000102"));
        assert!(!validate_format("0000000102"));
        assert!(!validate_format("000000001020"));
        assert!(!validate_format("0000000010a"));
    }
}
