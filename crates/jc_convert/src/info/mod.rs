//! Stable type identity.
//!
//! - [`TypePath`]: A trait for obtaining type names, without prefix `::`.
//!     - [`type_path`](TypePath::type_path): Full name, the value written to the `"Type"` discriminator.
//!     - [`type_name`](TypePath::type_name): The name without module path, may be duplicated.
//!     - [`type_ident`](TypePath::type_ident): The name without generics and module path.
//!     - [`module_path`](TypePath::module_path): optional module path(e.g. "jc_convert::info").
//!
//! - [`TypePathTable`]: Four function pointers for a single type's `TypePath` implementation.

mod type_path;

pub use type_path::{TypePath, TypePathTable};
