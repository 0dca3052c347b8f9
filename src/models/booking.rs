//! Booking reserves one equipment unit for a client over a closed time
//! window. Two machines live here: the booking lifecycle and the payment
//! lifecycle. A booking in a blocking state keeps its unit off the market.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use validator::Validate;

use schema::bookings;

#[derive(Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Clone, Copy)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Active,
    Completed,
    Cancelled,
    Overdue,
}

impl_varchar_enum!(BookingStatus, {
    Pending => "PENDING",
    Confirmed => "CONFIRMED",
    Active => "ACTIVE",
    Completed => "COMPLETED",
    Cancelled => "CANCELLED",
    Overdue => "OVERDUE",
});

impl BookingStatus {
    pub fn allowed_transitions(&self) -> &'static [BookingStatus] {
        match *self {
            BookingStatus::Pending => &[BookingStatus::Confirmed, BookingStatus::Cancelled],
            BookingStatus::Confirmed => &[BookingStatus::Active, BookingStatus::Cancelled],
            BookingStatus::Active => &[BookingStatus::Completed, BookingStatus::Overdue],
            BookingStatus::Overdue => &[BookingStatus::Completed, BookingStatus::Active],
            BookingStatus::Completed => &[],
            BookingStatus::Cancelled => &[],
        }
    }

    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        self.allowed_transitions().contains(&next)
    }

    /// Blocking statuses reserve the underlying unit: any availability query
    /// counts them as conflicts.
    pub fn is_blocking(&self) -> bool {
        match *self {
            BookingStatus::Pending | BookingStatus::Confirmed | BookingStatus::Active => true,
            _ => false,
        }
    }

    pub fn blocking() -> &'static [BookingStatus] {
        &[BookingStatus::Pending, BookingStatus::Confirmed, BookingStatus::Active]
    }
}

#[derive(Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Clone, Copy)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Partial,
    Paid,
    Refunded,
    Overdue,
}

impl_varchar_enum!(PaymentStatus, {
    Pending => "PENDING",
    Partial => "PARTIAL",
    Paid => "PAID",
    Refunded => "REFUNDED",
    Overdue => "OVERDUE",
});

impl PaymentStatus {
    pub fn allowed_transitions(&self) -> &'static [PaymentStatus] {
        match *self {
            PaymentStatus::Pending => &[
                PaymentStatus::Partial,
                PaymentStatus::Paid,
                PaymentStatus::Overdue,
            ],
            PaymentStatus::Partial => &[
                PaymentStatus::Paid,
                PaymentStatus::Refunded,
                PaymentStatus::Overdue,
            ],
            PaymentStatus::Paid => &[PaymentStatus::Refunded],
            PaymentStatus::Overdue => &[PaymentStatus::Partial, PaymentStatus::Paid],
            PaymentStatus::Refunded => &[],
        }
    }

    pub fn can_transition_to(&self, next: PaymentStatus) -> bool {
        self.allowed_transitions().contains(&next)
    }
}

#[derive(Debug, Serialize, Deserialize, Queryable, Identifiable, Clone)]
#[table_name = "bookings"]
pub struct Booking {
    pub id: i32,
    pub client_id: i32,
    pub equipment_id: i32,
    pub project_id: Option<i32>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub quantity: i32,
    pub booking_status: BookingStatus,
    pub payment_status: PaymentStatus,
    pub total_amount: Decimal,
    pub paid_amount: Decimal,
    pub deposit_amount: Decimal,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Payload for creating bookings, one cart position per equipment unit
#[derive(Serialize, Deserialize, Validate, Clone, Debug)]
pub struct NewBooking {
    pub client_id: i32,
    pub equipment_id: i32,
    pub project_id: Option<i32>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub total_amount: Decimal,
    /// Defaults to 20% of `total_amount` when omitted.
    pub deposit_amount: Option<Decimal>,
    #[validate(range(min = "1"))]
    #[serde(default = "default_quantity")]
    pub quantity: i32,
    #[validate(length(max = "1000"))]
    pub notes: Option<String>,
}

fn default_quantity() -> i32 {
    1
}

/// Row as inserted; statuses carry the repository defaults
#[derive(Serialize, Deserialize, Insertable, Clone, Debug)]
#[table_name = "bookings"]
pub struct InsertBooking {
    pub client_id: i32,
    pub equipment_id: i32,
    pub project_id: Option<i32>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub quantity: i32,
    pub booking_status: BookingStatus,
    pub payment_status: PaymentStatus,
    pub total_amount: Decimal,
    pub paid_amount: Decimal,
    pub deposit_amount: Decimal,
    pub notes: Option<String>,
}

/// Payload for updating a booking window. Status changes travel through the
/// dedicated transitions, not through this changeset.
#[derive(Serialize, Deserialize, Insertable, AsChangeset, Validate, Clone, Debug, Default)]
#[table_name = "bookings"]
pub struct UpdateBooking {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    #[validate(range(min = "1"))]
    pub quantity: Option<i32>,
    pub total_amount: Option<Decimal>,
    pub paid_amount: Option<Decimal>,
    #[validate(length(max = "1000"))]
    pub notes: Option<String>,
}

/// PATCH payload combining a window update with optional status moves
#[derive(Serialize, Deserialize, Validate, Clone, Debug, Default)]
pub struct BookingPatch {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    #[validate(range(min = "1"))]
    pub quantity: Option<i32>,
    pub total_amount: Option<Decimal>,
    pub paid_amount: Option<Decimal>,
    #[validate(length(max = "1000"))]
    pub notes: Option<String>,
    pub booking_status: Option<BookingStatus>,
    pub payment_status: Option<PaymentStatus>,
}

impl BookingPatch {
    pub fn window_changeset(&self) -> UpdateBooking {
        UpdateBooking {
            start_date: self.start_date,
            end_date: self.end_date,
            quantity: self.quantity,
            total_amount: self.total_amount,
            paid_amount: self.paid_amount,
            notes: self.notes.clone(),
        }
    }
}

/// Booking with its client, equipment and project resolved eagerly, the
/// shape every booking response uses
#[derive(Debug, Serialize, Clone)]
pub struct BookingWithDetails {
    pub id: i32,
    pub client_id: i32,
    pub equipment_id: i32,
    pub project_id: Option<i32>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub quantity: i32,
    pub booking_status: BookingStatus,
    pub payment_status: PaymentStatus,
    pub total_amount: Decimal,
    pub paid_amount: Decimal,
    pub deposit_amount: Decimal,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub client_name: String,
    pub equipment_name: String,
    pub project_name: Option<String>,
}

impl BookingWithDetails {
    pub fn new(
        booking: Booking,
        client_name: String,
        equipment_name: String,
        project_name: Option<String>,
    ) -> Self {
        Self {
            id: booking.id,
            client_id: booking.client_id,
            equipment_id: booking.equipment_id,
            project_id: booking.project_id,
            start_date: booking.start_date,
            end_date: booking.end_date,
            quantity: booking.quantity,
            booking_status: booking.booking_status,
            payment_status: booking.payment_status,
            total_amount: booking.total_amount,
            paid_amount: booking.paid_amount,
            deposit_amount: booking.deposit_amount,
            notes: booking.notes,
            created_at: booking.created_at,
            updated_at: booking.updated_at,
            client_name,
            equipment_name,
            project_name,
        }
    }
}

/// One conflicting booking in an availability answer
#[derive(Debug, Serialize, Clone)]
pub struct ConflictInfo {
    pub booking_id: i32,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub booking_status: BookingStatus,
    pub project_id: Option<i32>,
    pub project_name: Option<String>,
}

/// Outcome of a batch cart commit: successes commit even when some items
/// fail, but zero successes roll the whole batch back
#[derive(Debug, Serialize, Clone)]
pub struct BatchCreateResult {
    pub created_count: usize,
    pub failed_count: usize,
    pub created_bookings: Vec<BookingWithDetails>,
    pub failed_bookings: Vec<FailedBooking>,
}

/// One failed batch position with the original equipment id
#[derive(Debug, Serialize, Clone)]
pub struct FailedBooking {
    pub equipment_id: i32,
    pub error: String,
    pub error_type: String,
}

/// Filters for the bookings listing
#[derive(Clone, Debug, Default)]
pub struct BookingFilter {
    /// Substring match over client name, email or phone.
    pub query: Option<String>,
    /// Substring match over equipment name or serial number.
    pub equipment_query: Option<String>,
    pub equipment_id: Option<i32>,
    pub booking_status: Option<BookingStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub active_only: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_booking_terminal_states() {
        assert!(BookingStatus::Completed.allowed_transitions().is_empty());
        assert!(BookingStatus::Cancelled.allowed_transitions().is_empty());
    }

    #[test]
    fn test_booking_transitions_closed() {
        // Every adjacent pair outside the table is rejected.
        let all = [
            BookingStatus::Pending,
            BookingStatus::Confirmed,
            BookingStatus::Active,
            BookingStatus::Completed,
            BookingStatus::Cancelled,
            BookingStatus::Overdue,
        ];
        for from in &all {
            for to in &all {
                let allowed = from.allowed_transitions().contains(to);
                assert_eq!(from.can_transition_to(*to), allowed);
            }
        }
        assert!(BookingStatus::Overdue.can_transition_to(BookingStatus::Active));
        assert!(!BookingStatus::Completed.can_transition_to(BookingStatus::Pending));
    }

    #[test]
    fn test_blocking_states() {
        assert!(BookingStatus::Pending.is_blocking());
        assert!(BookingStatus::Confirmed.is_blocking());
        assert!(BookingStatus::Active.is_blocking());
        assert!(!BookingStatus::Completed.is_blocking());
        assert!(!BookingStatus::Cancelled.is_blocking());
        assert!(!BookingStatus::Overdue.is_blocking());
    }

    #[test]
    fn test_payment_refunded_terminal() {
        assert!(PaymentStatus::Refunded.allowed_transitions().is_empty());
        assert!(PaymentStatus::Paid.can_transition_to(PaymentStatus::Refunded));
        assert!(!PaymentStatus::Paid.can_transition_to(PaymentStatus::Pending));
    }
}
