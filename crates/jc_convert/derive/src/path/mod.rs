//! Paths of the `jc_convert` items that generated code names.

use proc_macro2::TokenStream;
use quote::quote;

// -----------------------------------------------------------------------------
// Crate Path

/// Get the correct access path to the `jc_convert` crate.
///
/// 1. For crates that depend on `jc_convert`, `::jc_convert` is returned here.
/// 2. For crates that depend on `jc_core`, `::jc_core::convert` is returned here.
/// 3. For other situations, `::jc_convert` is returned here, but this may be incorrect.
///
/// Reading the manifest is relatively expensive, so the path is obtained once
/// per macro invocation and passed around.
pub(crate) fn jc_convert() -> syn::Path {
    jc_macro_utils::Manifest::shared(|manifest| manifest.get_crate_path("jc_convert"))
}

// -----------------------------------------------------------------------------
// Internal API

#[inline(always)]
pub(crate) fn type_path_(jc_convert_path: &syn::Path) -> TokenStream {
    quote! {
        #jc_convert_path::info::TypePath
    }
}

#[inline(always)]
pub(crate) fn labeled_enum_(jc_convert_path: &syn::Path) -> TokenStream {
    quote! {
        #jc_convert_path::label::LabeledEnum
    }
}

#[inline(always)]
pub(crate) fn member_(jc_convert_path: &syn::Path) -> TokenStream {
    quote! {
        #jc_convert_path::label::Member
    }
}

#[cfg(feature = "auto_register")]
#[inline(always)]
pub(crate) fn auto_register_(jc_convert_path: &syn::Path) -> TokenStream {
    quote! {
        #jc_convert_path::__macro_exports::auto_register
    }
}

/// `::core::option::Option`, unaffected by user shadowing.
pub(crate) struct OptionFP;

impl quote::ToTokens for OptionFP {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        tokens.extend(quote!(::core::option::Option));
    }
}
