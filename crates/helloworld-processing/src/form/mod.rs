//! Form schemas
//!
//! A schema lists the fields a submission type accepts, the filters applied to each raw
//! value and the rules the filtered value must satisfy. Filtering always runs before
//! validation and every rule violation is collected.

pub mod filters;
pub mod rules;
pub mod schema;

pub use filters::{FilterKind, FilterSet};
pub use rules::{CompiledRule, Rule};
pub use schema::{FieldError, FieldSpec, FormError, FormSchema};
