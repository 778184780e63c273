//! See following macros:
//!
//! - [`TypePath`]
//! - [`LabeledEnum`]
//! - [`impl_auto_register`]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(clippy::std_instead_of_core, reason = "proc-macro lib")]
#![allow(clippy::std_instead_of_alloc, reason = "proc-macro lib")]

use proc_macro::TokenStream;
use quote::quote;
use syn::{DeriveInput, parse_macro_input};

static CONVERT_ATTRIBUTE_NAME: &str = "convert";

// -----------------------------------------------------------------------------
// Modules

mod derive_data;
mod impls;
mod path;
mod utils;

// -----------------------------------------------------------------------------
// Macros

/// Implements `TypePath` for a non-generic type.
///
/// The default path is `module_path!()` joined with the type's identifier.
/// Because the path is written into JSON by the polymorphic converter, moving
/// the definition changes the wire format; pin it with a custom path:
///
/// ```rust, ignore
/// #[derive(TypePath)]
/// #[convert(type_path = "zoo::Dog")]
/// struct Dog { /* ... */ }
/// ```
///
/// The last segment becomes `type_name` and `type_ident`, the others
/// `module_path`.
///
/// `#[convert(auto_register)]` adds the type to the list collected by
/// `TypeRegistry::auto_register`. It is a no-op when the `auto_register`
/// feature is disabled.
#[proc_macro_derive(TypePath, attributes(convert))]
pub fn derive_type_path(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);

    let meta = match derive_data::TypeMeta::from_input(&ast) {
        Ok(meta) => meta,
        Err(err) => return err.into_compile_error().into(),
    };

    if !meta.attrs().impl_type_path {
        return syn::Error::new(
            ast.ident.span(),
            "`TypePath = false` disables the only trait this derive implements",
        )
        .into_compile_error()
        .into();
    }

    let type_path_impls = impls::impl_trait_type_path(&meta);
    let auto_register = impls::get_auto_register_impl(&meta, false);

    TokenStream::from(quote! {
        const _: () = {
            #type_path_impls

            #auto_register
        };
    })
}

/// Implements `LabeledEnum` (and `TypePath`) for a fieldless enum.
///
/// Each member is labeled with its `#[convert(label = "...")]` value or, when
/// absent, its identifier verbatim.
///
/// ```rust, ignore
/// #[derive(LabeledEnum, Clone, Copy, PartialEq, Eq, Hash)]
/// enum TestEnum {
///     #[convert(label = "first_value")]
///     FirstValue,
///     #[convert(label = "second_value")]
///     SecondValue,
///     ThirdValue,
/// }
/// ```
///
/// The enum must also implement `Copy`, `Eq` and `Hash`.
///
/// Type level attributes are the same as for [`TypePath`]:
///
/// - `#[convert(type_path = "...")]`
/// - `#[convert(TypePath = false)]`, implement `TypePath` manually.
/// - `#[convert(auto_register)]`, also registers the enum with
///   `EnumLabelFactory::auto_register`.
///
/// Variants with fields and generic enums are rejected. Labels must be unique;
/// a duplicate is reported when the label table is first built.
///
/// Discriminants are exposed as `i64`. `#[repr(u128)]` and `#[repr(i128)]`
/// are rejected, and under `#[repr(u64)]` or `#[repr(usize)]` a discriminant
/// above `i64::MAX` fails to compile.
#[proc_macro_derive(LabeledEnum, attributes(convert))]
pub fn derive_labeled_enum(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);

    let info = match derive_data::LabeledEnumDerive::from_input(&ast) {
        Ok(info) => info,
        Err(err) => return err.into_compile_error().into(),
    };

    let type_path_impls = impls::impl_trait_type_path(&info.meta);
    let labeled_enum_impls = impls::impl_trait_labeled_enum(&info);
    let auto_register = impls::get_auto_register_impl(&info.meta, true);

    TokenStream::from(quote! {
        const _: () = {
            #type_path_impls

            #labeled_enum_impls

            #auto_register
        };
    })
}

/// Add the type to the automatic registry.
///
/// If the feature is not enabled, this macro will not do anything.
///
/// The type must implement `TypePath` and be concrete.
///
/// ## Example
///
/// ```ignore
/// impl_auto_register!(foo::Foo);
/// ```
///
/// This is not conflict with `convert(auto_register)` attribute.
#[proc_macro]
pub fn impl_auto_register(_input: TokenStream) -> TokenStream {
    #[cfg(not(feature = "auto_register"))]
    return utils::empty().into();

    #[cfg(feature = "auto_register")]
    {
        let type_path = syn::parse_macro_input!(_input as syn::Type);

        let jc_convert_path = path::jc_convert();
        let auto_register_ = path::auto_register_(&jc_convert_path);

        TokenStream::from(quote! {
            const _: () = {
                #auto_register_::inventory::submit!{
                    #auto_register_::__AutoRegisterFunc(
                        <#type_path as #auto_register_::__RegisterType>::__register
                    )
                }
            };
        })
    }
}
