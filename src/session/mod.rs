pub mod capture;
pub mod controller;
pub mod state;

pub use capture::CapturedImage;
pub use controller::SessionController;
pub use state::{FieldView, Screen, SessionSnapshot, MANUAL_ENTRY_MESSAGE};
