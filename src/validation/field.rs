use crate::models::{GuestField, ValidationState};
use lazy_static::lazy_static;
use regex::Regex;

/// Maximum number of digits kept in a mobile number.
pub const MOBILE_DIGITS: usize = 10;

lazy_static! {
    static ref MOBILE_PATTERN: Regex = Regex::new(r"^\d{10}$").unwrap();
    // Two letters (state), two digits (district), two letters, four digits: "AB12CD3456".
    static ref VEHICLE_PATTERN: Regex = Regex::new(r"^[A-Z]{2}\d{2}[A-Z]{2}\d{4}$").unwrap();
    static ref ROOM_PATTERN: Regex = Regex::new(r"^[A-Za-z0-9-]+$").unwrap();
}

/// Normalization and validation rules for guest record fields.
pub struct FieldValidator;

impl FieldValidator {
    /// Apply the field's edit-time normalization. Free-text fields are stored as typed.
    pub fn normalize(field: GuestField, input: &str) -> String {
        match field {
            GuestField::MobileNumber => input
                .chars()
                .filter(|c| c.is_ascii_digit())
                .take(MOBILE_DIGITS)
                .collect(),
            GuestField::VehicleNumber => Self::strip_spaces(input).to_uppercase(),
            GuestField::RoomNumber => Self::strip_spaces(input),
            _ => input.to_string(),
        }
    }

    /// Classify an already normalized value for display.
    pub fn classify(field: GuestField, value: &str) -> ValidationState {
        if value.trim().is_empty() {
            return ValidationState::Neutral;
        }
        let valid = match field {
            GuestField::MobileNumber => Self::is_valid_mobile_number(value),
            GuestField::VehicleNumber => Self::is_valid_vehicle_number(value),
            GuestField::RoomNumber => Self::is_valid_room_number(value),
            _ => true,
        };
        if valid {
            ValidationState::Valid
        } else {
            ValidationState::Invalid
        }
    }

    /// Normalize then classify, as done on every edit.
    pub fn evaluate(field: GuestField, input: &str) -> (String, ValidationState) {
        let normalized = Self::normalize(field, input);
        let state = Self::classify(field, &normalized);
        (normalized, state)
    }

    pub fn is_valid_mobile_number(input: &str) -> bool {
        MOBILE_PATTERN.is_match(input)
    }

    pub fn is_valid_vehicle_number(input: &str) -> bool {
        let normalized = Self::strip_spaces(input).to_uppercase();
        VEHICLE_PATTERN.is_match(&normalized)
    }

    pub fn is_valid_room_number(input: &str) -> bool {
        !input.trim().is_empty() && ROOM_PATTERN.is_match(input)
    }

    fn strip_spaces(input: &str) -> String {
        input.chars().filter(|c| !c.is_whitespace()).collect()
    }
}
