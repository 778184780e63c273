//! Provide some tools for parsing token stream.

// -----------------------------------------------------------------------------
// Modules

mod attributes;
mod labeled_enum;
mod type_meta;

// -----------------------------------------------------------------------------
// Internal API

pub(crate) use attributes::{TypeAttributes, VariantAttributes};
pub(crate) use labeled_enum::LabeledEnumDerive;
pub(crate) use type_meta::TypeMeta;
