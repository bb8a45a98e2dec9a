use serde::{Deserialize, Serialize};
use std::fmt;

/// Every editable field of a guest record, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GuestField {
    Name,
    DateOfBirth,
    Gender,
    Address,
    ComingFrom,
    GoingTo,
    MobileNumber,
    VehicleNumber,
    RoomNumber,
}

impl GuestField {
    pub const ALL: [GuestField; 9] = [
        GuestField::Name,
        GuestField::DateOfBirth,
        GuestField::Gender,
        GuestField::Address,
        GuestField::ComingFrom,
        GuestField::GoingTo,
        GuestField::MobileNumber,
        GuestField::VehicleNumber,
        GuestField::RoomNumber,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            GuestField::Name => "Name",
            GuestField::DateOfBirth => "Date of Birth",
            GuestField::Gender => "Gender",
            GuestField::Address => "Address",
            GuestField::ComingFrom => "Coming From",
            GuestField::GoingTo => "Going To",
            GuestField::MobileNumber => "Mobile Number",
            GuestField::VehicleNumber => "Vehicle Number",
            GuestField::RoomNumber => "Room Number",
        }
    }

    /// Parse a user-supplied field name ("mobile", "Room Number", "vehicle_number", ...).
    pub fn parse(name: &str) -> Option<GuestField> {
        let key: String = name
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match key.as_str() {
            "name" => Some(GuestField::Name),
            "dob" | "dateofbirth" => Some(GuestField::DateOfBirth),
            "gender" => Some(GuestField::Gender),
            "address" => Some(GuestField::Address),
            "comingfrom" | "from" => Some(GuestField::ComingFrom),
            "goingto" | "to" => Some(GuestField::GoingTo),
            "mobile" | "mobilenumber" => Some(GuestField::MobileNumber),
            "vehicle" | "vehiclenumber" => Some(GuestField::VehicleNumber),
            "room" | "roomnumber" => Some(GuestField::RoomNumber),
            _ => None,
        }
    }
}

impl fmt::Display for GuestField {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Structured guest data extracted from one capture.
///
/// Values are never mutated in place: every edit produces a new record via
/// [`GuestRecord::with_field`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestRecord {
    pub name: String,
    pub date_of_birth: String,
    pub gender: String,
    pub address: String,
    pub coming_from: String,
    pub going_to: String,
    pub mobile_number: String,
    pub vehicle_number: String,
    pub room_number: String,
}

impl GuestRecord {
    pub fn empty() -> Self {
        GuestRecord::default()
    }

    pub fn is_empty(&self) -> bool {
        GuestField::ALL.iter().all(|field| self.get(*field).is_empty())
    }

    pub fn get(&self, field: GuestField) -> &str {
        match field {
            GuestField::Name => &self.name,
            GuestField::DateOfBirth => &self.date_of_birth,
            GuestField::Gender => &self.gender,
            GuestField::Address => &self.address,
            GuestField::ComingFrom => &self.coming_from,
            GuestField::GoingTo => &self.going_to,
            GuestField::MobileNumber => &self.mobile_number,
            GuestField::VehicleNumber => &self.vehicle_number,
            GuestField::RoomNumber => &self.room_number,
        }
    }

    /// Copy of this record with one field replaced. The value is stored as given;
    /// normalization is the caller's concern.
    pub fn with_field(&self, field: GuestField, value: impl Into<String>) -> GuestRecord {
        let value = value.into();
        let mut next = self.clone();
        match field {
            GuestField::Name => next.name = value,
            GuestField::DateOfBirth => next.date_of_birth = value,
            GuestField::Gender => next.gender = value,
            GuestField::Address => next.address = value,
            GuestField::ComingFrom => next.coming_from = value,
            GuestField::GoingTo => next.going_to = value,
            GuestField::MobileNumber => next.mobile_number = value,
            GuestField::VehicleNumber => next.vehicle_number = value,
            GuestField::RoomNumber => next.room_number = value,
        }
        next
    }

    /// Fields paired with their current values, in display order.
    pub fn fields(&self) -> impl Iterator<Item = (GuestField, &str)> + '_ {
        GuestField::ALL.iter().map(move |field| (*field, self.get(*field)))
    }
}

/// Presentation feedback for a single field's current text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationState {
    Neutral,
    Valid,
    Invalid,
}

impl fmt::Display for ValidationState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ValidationState::Neutral => write!(f, "-"),
            ValidationState::Valid => write!(f, "OK"),
            ValidationState::Invalid => write!(f, "INVALID"),
        }
    }
}
