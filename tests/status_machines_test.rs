extern crate rentals_lib;

use rentals_lib::models::{BookingStatus, EquipmentStatus, PaymentStatus};

const ALL_BOOKING: [BookingStatus; 6] = [
    BookingStatus::Pending,
    BookingStatus::Confirmed,
    BookingStatus::Active,
    BookingStatus::Completed,
    BookingStatus::Cancelled,
    BookingStatus::Overdue,
];

const ALL_PAYMENT: [PaymentStatus; 5] = [
    PaymentStatus::Pending,
    PaymentStatus::Partial,
    PaymentStatus::Paid,
    PaymentStatus::Refunded,
    PaymentStatus::Overdue,
];

const ALL_EQUIPMENT: [EquipmentStatus; 5] = [
    EquipmentStatus::Available,
    EquipmentStatus::Rented,
    EquipmentStatus::Maintenance,
    EquipmentStatus::Broken,
    EquipmentStatus::Retired,
];

#[test]
fn test_booking_transition_closure() {
    // can_transition_to answers exactly what the table names, nothing more.
    for from in &ALL_BOOKING {
        for to in &ALL_BOOKING {
            assert_eq!(
                from.can_transition_to(*to),
                from.allowed_transitions().contains(to),
                "{} -> {}",
                from,
                to
            );
        }
    }
}

#[test]
fn test_booking_terminal_states_stay_terminal() {
    for to in &ALL_BOOKING {
        assert!(!BookingStatus::Completed.can_transition_to(*to));
        assert!(!BookingStatus::Cancelled.can_transition_to(*to));
    }
}

#[test]
fn test_overdue_can_recover() {
    assert!(BookingStatus::Overdue.can_transition_to(BookingStatus::Active));
    assert!(BookingStatus::Overdue.can_transition_to(BookingStatus::Completed));
    assert!(!BookingStatus::Overdue.can_transition_to(BookingStatus::Cancelled));
}

#[test]
fn test_blocking_states_are_exactly_the_live_ones() {
    let blocking: Vec<&BookingStatus> = ALL_BOOKING.iter().filter(|status| status.is_blocking()).collect();
    assert_eq!(
        blocking,
        vec![&BookingStatus::Pending, &BookingStatus::Confirmed, &BookingStatus::Active]
    );
}

#[test]
fn test_payment_refund_paths() {
    for from in &ALL_PAYMENT {
        for to in &ALL_PAYMENT {
            assert_eq!(from.can_transition_to(*to), from.allowed_transitions().contains(to));
        }
    }
    // A refund follows some payment, full or partial, never a blank slate.
    assert!(!PaymentStatus::Pending.can_transition_to(PaymentStatus::Refunded));
    assert!(PaymentStatus::Partial.can_transition_to(PaymentStatus::Refunded));
    assert!(PaymentStatus::Paid.can_transition_to(PaymentStatus::Refunded));
    for to in &ALL_PAYMENT {
        assert!(!PaymentStatus::Refunded.can_transition_to(*to));
    }
}

#[test]
fn test_equipment_rented_is_guarded() {
    // Only Available can become Rented, and nothing terminal moves again.
    for from in &ALL_EQUIPMENT {
        let can_rent = from.can_transition_to(EquipmentStatus::Rented);
        assert_eq!(can_rent, *from == EquipmentStatus::Available, "{}", from);
        assert!(!EquipmentStatus::Retired.can_transition_to(*from));
    }
}

#[test]
fn test_status_names_round_trip_through_db_form() {
    for status in &ALL_BOOKING {
        let db_form = format!("{}", status);
        assert_eq!(db_form.parse::<BookingStatus>(), Ok(*status));
    }
    for status in &ALL_PAYMENT {
        let db_form = format!("{}", status);
        assert_eq!(db_form.parse::<PaymentStatus>(), Ok(*status));
    }
    for status in &ALL_EQUIPMENT {
        let db_form = format!("{}", status);
        assert_eq!(db_form.parse::<EquipmentStatus>(), Ok(*status));
    }
}
