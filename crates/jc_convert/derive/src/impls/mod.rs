mod auto_register;
mod trait_labeled_enum;
mod trait_type_path;

pub(crate) use auto_register::get_auto_register_impl;
pub(crate) use trait_labeled_enum::impl_trait_labeled_enum;
pub(crate) use trait_type_path::impl_trait_type_path;
