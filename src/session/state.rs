use crate::models::{GuestField, GuestRecord, ValidationState};
use crate::validation::FieldValidator;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Advisory shown when a pass produced no usable record.
pub const MANUAL_ENTRY_MESSAGE: &str = "Recognition failed. Please enter the details manually.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Screen {
    Home,
    Camera,
    Processing,
    Verification,
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Screen::Home => write!(f, "Home"),
            Screen::Camera => write!(f, "Camera"),
            Screen::Processing => write!(f, "Processing"),
            Screen::Verification => write!(f, "Verification"),
        }
    }
}

/// Immutable view of the session published after every transition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub screen: Screen,
    pub record: GuestRecord,
    pub error_message: Option<String>,
    /// Path of the capture currently held, if any.
    pub capture: Option<PathBuf>,
    /// Number of processing passes that reached Verification.
    pub completed_passes: u64,
}

impl SessionSnapshot {
    pub fn home() -> Self {
        SessionSnapshot {
            screen: Screen::Home,
            record: GuestRecord::empty(),
            error_message: None,
            capture: None,
            completed_passes: 0,
        }
    }

    /// One row per field as the verification form shows it.
    pub fn field_views(&self) -> Vec<FieldView> {
        self.record
            .fields()
            .map(|(field, value)| FieldView {
                field,
                label: field.label(),
                value: value.to_string(),
                state: FieldValidator::classify(field, value),
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldView {
    pub field: GuestField,
    pub label: &'static str,
    pub value: String,
    pub state: ValidationState,
}
