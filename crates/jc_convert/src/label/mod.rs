//! Enum values written as custom string labels.
//!
//! A member's label is its `#[convert(label = "...")]` value if present,
//! otherwise its identifier verbatim. The mapping is built once per enum type
//! into a [`LabelTable`] and shared by every converter for the rest of the
//! process.
//!
//! Entry points:
//!
//! - [`EnumLabelConverter`]: bound to one enum type.
//! - [`Labeled`] and [`as_label`]: serde adapters built on it.
//! - [`EnumLabelFactory`]: type-erased, selects a converter by [`TypeId`].
//!
//! [`TypeId`]: core::any::TypeId

mod converter;
mod factory;
mod member;
mod table;

pub use converter::{EnumLabelConverter, Labeled, as_label};
pub use factory::{EnumLabelFactory, ErasedLabels};
pub use member::{LabeledEnum, Member};
pub use table::LabelTable;
