//! The registry of known type paths.
//!
//! [`TypeRegistry`] answers "which type does this path name" for the
//! polymorphic converter, so a discriminator naming a real type that is not
//! an implementation of the capability can be told apart from a path nobody
//! knows.

mod type_registry;

pub use type_registry::{TypeRegistry, TypeRegistryArc};
