//! Field types, transaction model and error taxonomy.
//!
//! Scalar types validate on demand rather than on construction, so a
//! request can be checked field by field and every violation reported.

mod error;
mod fields;
mod model;
pub mod tax_id;

pub use error::*;
pub use fields::*;
pub use model::*;
pub use tax_id::check_tax_id;
