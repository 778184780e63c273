use proc_macro2::TokenStream;

use crate::derive_data::TypeMeta;

/// Generate `auto_register` implementation.
///
/// Every type is submitted to the type registry, enums deriving
/// `LabeledEnum` additionally to the enum label factory.
#[cfg(feature = "auto_register")]
pub(crate) fn get_auto_register_impl(meta: &TypeMeta, labeled_enum: bool) -> TokenStream {
    use quote::quote_spanned;

    let Some(span) = meta.attrs().auto_register else {
        return crate::utils::empty();
    };

    let auto_register_ = crate::path::auto_register_(meta.jc_convert_path());
    let real_ident = meta.real_ident();

    let register_type = quote_spanned! { span =>
        #auto_register_::inventory::submit!{
            #auto_register_::__AutoRegisterFunc(
                <#real_ident as #auto_register_::__RegisterType>::__register
            )
        }
    };

    if !labeled_enum {
        return register_type;
    }

    quote_spanned! { span =>
        #register_type

        #auto_register_::inventory::submit!{
            #auto_register_::__AutoRegisterEnum(
                <#real_ident as #auto_register_::__RegisterEnum>::__register_enum
            )
        }
    }
}

/// Generate `auto_register` implementation.
#[cfg(not(feature = "auto_register"))]
pub(crate) fn get_auto_register_impl(_: &TypeMeta, _: bool) -> TokenStream {
    crate::utils::empty()
}
