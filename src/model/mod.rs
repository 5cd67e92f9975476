//! # Graph Model
//!
//! DTOs for the nodes a traversal returns. These types cross every
//! boundary: storage ↔ executor ↔ resolver ↔ API layer.
//!
//! Design rule: no transport types and no query text here.
//! This module is pure data: no I/O, no state, no async.

pub mod node;
pub mod value;
pub mod property_map;

pub use node::{Node, Uid, TYPE_PREDICATE};
pub use value::Value;
pub use property_map::{PropertyMap, Arguments, arguments};
