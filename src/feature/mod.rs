//! Feature schema registry — the four feature variants, their fields and
//! the construct-and-validate step that turns collected answers into a
//! document.

pub mod model;
pub mod schema;

pub use model::{Collected, CollectedValue, FeatureDocument};
pub use schema::{
    FeatureKind, FieldPath, construct, fields_for, is_required, serialize_order,
};
