pub mod config;
pub mod models;
pub mod processing;
pub mod session;
pub mod utils;
pub mod validation;

pub use config::ScannerConfig;
pub use models::{GuestField, GuestRecord, ValidationState};
pub use processing::ExtractionPipeline;
pub use session::{CapturedImage, Screen, SessionController};
pub use utils::ScanError;
