pub mod field;

pub use field::FieldValidator;
