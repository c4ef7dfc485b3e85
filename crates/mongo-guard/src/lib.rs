//! Mongo Guard
//!
//! Validation and sanitization for agent-generated MongoDB input. Nothing in
//! this crate talks to a database: it decides whether a filter, update,
//! document or aggregation pipeline may be forwarded to the driver, and
//! returns a cleaned copy when it may.
//!
//! # Components
//!
//! - [`sanitizer`]: depth, node count and string length bounds; control
//!   character stripping
//! - [`operators`]: classification of `$`-prefixed keys and stage names
//! - [`validator`]: filter/update/document validation
//! - [`pipeline`]: aggregation pipeline validation
//! - [`policy`] and [`gate`]: the immutable per-process policy and the
//!   operation-level write gate
//! - [`bound`]: result count limiting
//!
//! # Example
//!
//! ```rust
//! use mongo_guard::{validate_document, Policy, Value, ViolationKind};
//! use serde_json::json;
//!
//! let policy = Policy::safe();
//!
//! let ok = validate_document(&Value::from(json!({"price": {"$gt": 100}})), &policy);
//! assert!(ok.is_valid());
//!
//! let rejected = validate_document(&Value::from(json!({"$where": "this.price > 100"})), &policy);
//! let violations = rejected.violations().unwrap();
//! assert_eq!(violations.kinds(), vec![ViolationKind::DisallowedOperator]);
//! ```

pub mod bound;
pub mod errors;
pub mod gate;
pub mod names;
pub mod operators;
pub mod pipeline;
pub mod policy;
pub mod sanitizer;
pub mod validator;
pub mod value;

pub use bound::{bound, effective_limit, Bounded};
pub use errors::{format_path, PathSegment, ValidationOutcome, Violation, ViolationKind, Violations};
pub use gate::Operation;
pub use names::{ValidatedCollectionName, ValidatedDatabaseName};
pub use operators::{classify, classify_stage, OperatorClass, StageVerdict};
pub use pipeline::validate_pipeline;
pub use policy::{Policy, PolicyConfig, PolicySummary};
pub use sanitizer::{sanitize, Limits, Sanitizer};
pub use validator::validate_document;
pub use value::Value;
