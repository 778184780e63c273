//! Capability values tagged with their concrete type.
//!
//! ## Wire format
//!
//! A flat JSON object. The first key is `"Type"`, holding the
//! [`type_path`](crate::info::TypePath::type_path) of the concrete type,
//! followed by the fields the concrete type serializes itself, in the order
//! it writes them:
//!
//! ```text
//! {"Type":"zoo::Dog","Name":"Rex","IsBarking":true}
//! ```
//!
//! Only types listed in a [`CapabilityRegistry`] are written or read.

mod converter;
mod registry;
mod tag;

pub use converter::{PolymorphicConverter, Tagged};
pub use registry::{CapabilityRegistry, Implementation};
