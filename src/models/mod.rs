pub mod data;
pub mod regions;

pub use data::{GuestField, GuestRecord, ValidationState};
pub use regions::{
    DocumentLayout, HandwrittenField, ReferenceRect, RegionDescriptor, RegionTag, ScaledRegion,
    REFERENCE_HEIGHT, REFERENCE_WIDTH,
};
