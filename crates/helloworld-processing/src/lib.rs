//! Helloworld Processing Library
//!
//! Pure, synchronous checks applied to a submission before anything is persisted:
//! form schemas (filters and validation rules), upload filename cleaning and the media
//! policy validator. Nothing in this crate performs I/O.

pub mod filename;
pub mod form;
pub mod validator;

pub use filename::{make_safe, sanitize_upload_name};
pub use form::{FieldError, FieldSpec, FilterKind, FormError, FormSchema, Rule};
pub use validator::{MediaValidator, ValidationError};
