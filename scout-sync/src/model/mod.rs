//! Data model shared by every component

pub mod assignment;
pub mod field;
pub mod record;
pub mod team;

pub use assignment::{parse_route_id, Alliance, Assignment, AssignmentLocator, Scout};
pub use field::{fields_from_value, FieldDescriptor, FieldType, FormSchema, MatrixRow};
pub use record::{CanonicalRecord, CapturedValues, NaturalKey, ObservationRecord, ObservationTarget};
pub use scout_common::Variant;
pub use team::{SessionUser, Team};
