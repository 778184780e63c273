use proc_macro2::TokenStream;
use quote::quote;

use crate::derive_data::TypeMeta;
use crate::path::OptionFP;

/// Generate implementation codes for `TypePath`
pub(crate) fn impl_trait_type_path(meta: &TypeMeta) -> TokenStream {
    if !meta.attrs().impl_type_path {
        return crate::utils::empty();
    }

    let trait_type_path_ = crate::path::type_path_(meta.jc_convert_path());
    let real_ident = meta.real_ident();

    let type_path = meta.type_path();
    let type_ident = meta.type_ident();
    let module_path = match meta.module_path() {
        Some(tokens) => quote!(#OptionFP::Some(#tokens)),
        None => quote!(#OptionFP::None),
    };

    quote! {
        impl #trait_type_path_ for #real_ident {
            #[inline]
            fn type_path() -> &'static str {
                #type_path
            }

            #[inline]
            fn type_name() -> &'static str {
                #type_ident
            }

            #[inline]
            fn type_ident() -> &'static str {
                #type_ident
            }

            #[inline]
            fn module_path() -> #OptionFP<&'static str> {
                #module_path
            }
        }
    }
}
