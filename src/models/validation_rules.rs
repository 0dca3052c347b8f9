use std::borrow::Cow;
use std::collections::HashMap;

use regex::Regex;
use rust_decimal::Decimal;
use validator::ValidationError;

/// Replacement cost must fit Numeric(10, 2): non-negative and below 10^8.
pub fn validate_replacement_cost(cost: &Decimal) -> Result<(), ValidationError> {
    lazy_static! {
        static ref COST_LIMIT: Decimal = Decimal::new(100_000_000, 0);
    }

    if *cost >= Decimal::new(0, 0) && *cost < *COST_LIMIT {
        Ok(())
    } else {
        Err(ValidationError {
            code: Cow::from("replacement_cost"),
            message: Some(Cow::from("Replacement cost must be in [0, 100000000).")),
            params: HashMap::new(),
        })
    }
}

pub fn validate_phone(phone: &String) -> Result<(), ValidationError> {
    lazy_static! {
        static ref PHONE_VALIDATION_RE: Regex = Regex::new(r"^\+?\d{7}\d*$").unwrap();
    }

    if PHONE_VALIDATION_RE.is_match(phone) {
        Ok(())
    } else {
        Err(ValidationError {
            code: Cow::from("phone"),
            message: Some(Cow::from("Incorrect phone format")),
            params: HashMap::new(),
        })
    }
}

/// Label prefixes are exactly two alphanumeric characters, stored uppercased.
pub fn validate_label_prefix(prefix: &String) -> Result<(), ValidationError> {
    lazy_static! {
        static ref PREFIX_VALIDATION_RE: Regex = Regex::new(r"^[A-Za-z0-9]{2}$").unwrap();
    }

    if PREFIX_VALIDATION_RE.is_match(prefix) {
        Ok(())
    } else {
        Err(ValidationError {
            code: Cow::from("prefix"),
            message: Some(Cow::from("Prefix must be exactly 2 alphanumeric characters")),
            params: HashMap::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replacement_cost_bounds() {
        assert!(validate_replacement_cost(&Decimal::new(0, 0)).is_ok());
        assert!(validate_replacement_cost(&Decimal::new(9_999_999_999, 2)).is_ok());
        assert!(validate_replacement_cost(&Decimal::new(-1, 0)).is_err());
        assert!(validate_replacement_cost(&Decimal::new(100_000_000, 0)).is_err());
    }

    #[test]
    fn test_label_prefix() {
        assert!(validate_label_prefix(&"CM".to_string()).is_ok());
        assert!(validate_label_prefix(&"c1".to_string()).is_ok());
        assert!(validate_label_prefix(&"CAM".to_string()).is_err());
        assert!(validate_label_prefix(&"C".to_string()).is_err());
        assert!(validate_label_prefix(&"C!".to_string()).is_err());
    }
}
