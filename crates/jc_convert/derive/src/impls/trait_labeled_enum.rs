use proc_macro2::TokenStream;
use quote::quote;
use syn::LitStr;

use crate::derive_data::LabeledEnumDerive;
use crate::path::OptionFP;

/// Generate implementation codes for `LabeledEnum`
pub(crate) fn impl_trait_labeled_enum(info: &LabeledEnumDerive) -> TokenStream {
    let jc_convert_path = info.meta.jc_convert_path();
    let labeled_enum_ = crate::path::labeled_enum_(jc_convert_path);
    let member_ = crate::path::member_(jc_convert_path);
    let real_ident = info.meta.real_ident();

    let members = info.variants.iter().map(|variant| {
        let ident = variant.ident;
        let name = LitStr::new(&crate::utils::unraw(ident), ident.span());
        let label = match &variant.attrs.label {
            Some(label) => quote!(#OptionFP::Some(#label)),
            None => quote!(#OptionFP::None),
        };
        quote! {
            #member_::new(Self::#ident, #name, #label)
        }
    });

    // Zero-variant enums cannot be cast.
    let discriminant = if info.variants.is_empty() {
        quote!(match self {})
    } else {
        quote!(self as i64)
    };

    // Compile-time check that unsigned discriminants stay within `i64`.
    let in_range = info.unsigned_repr.then(|| {
        let checks = info.variants.iter().map(|variant| {
            let ident = variant.ident;
            let message = LitStr::new(
                &format!(
                    "discriminant of `{}::{}` exceeds `i64::MAX`",
                    info.meta.real_ident(),
                    crate::utils::unraw(ident),
                ),
                ident.span(),
            );
            quote! {
                ::core::assert!((#real_ident::#ident as i128) <= (i64::MAX as i128), #message);
            }
        });
        quote! {
            const _: () = { #(#checks)* };
        }
    });

    quote! {
        #in_range

        impl #labeled_enum_ for #real_ident {
            const MEMBERS: &'static [#member_<Self>] = &[
                #(#members),*
            ];

            #[inline]
            fn discriminant(self) -> i64 {
                #discriminant
            }
        }
    }
}
