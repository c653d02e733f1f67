//! # Spec Module
//!
//! Turns an OpenAPI 3.1 document into [`OperationDefinition`]s: one per
//! (method, path template) pair, each carrying an object schema for every
//! parameter location the operation declares plus the JSON request body schema.
//!
//! ```rust,ignore
//! use openapi_guard::spec::load_spec;
//!
//! let operations = load_spec("openapi.yml")?;
//! for op in &operations {
//!     println!("{} {:?}", op.key(), op.locations().collect::<Vec<_>>());
//! }
//! ```
mod build;
mod load;
mod types;

pub use build::*;
pub use load::*;
pub use types::*;
