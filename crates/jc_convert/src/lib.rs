#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

// -----------------------------------------------------------------------------
// Extern Self

// Generated code names this crate as `::jc_convert`, which has to resolve in
// this crate's own unit tests as well.
extern crate self as jc_convert;

extern crate alloc;

// -----------------------------------------------------------------------------
// Modules

mod capability;
mod error;
mod fields;
mod options;

pub mod info;
pub mod label;
pub mod polymorphic;
pub mod redirect;
pub mod registry;

// -----------------------------------------------------------------------------
// Top-Level exports

#[doc(hidden)]
pub mod __macro_exports;

pub use capability::{Capability, Implements};
pub use error::ConvertError;
pub use options::ConvertOptions;

pub use label::{EnumLabelConverter, EnumLabelFactory, Labeled, LabeledEnum};
pub use polymorphic::{CapabilityRegistry, PolymorphicConverter};
pub use redirect::InterfaceConverter;

pub use jc_convert_derive as derive;

/// The reserved object key carrying the type discriminator of polymorphic values.
pub const TYPE_KEY: &str = "Type";
