use proc_macro2::TokenStream;
use quote::{ToTokens, quote};
use syn::spanned::Spanned;
use syn::{DeriveInput, Ident, LitStr, Path};

use super::TypeAttributes;

/// Everything needed to name a non-generic local type.
pub(crate) struct TypeMeta<'a> {
    ident: &'a Ident,
    attrs: TypeAttributes,
    jc_convert_path: Path,
}

impl<'a> TypeMeta<'a> {
    pub fn from_input(input: &'a DeriveInput) -> syn::Result<Self> {
        if !input.generics.params.is_empty() {
            return Err(syn::Error::new(
                input.generics.span(),
                "generic types are not supported by `convert` derives",
            ));
        }

        Ok(Self {
            ident: &input.ident,
            attrs: TypeAttributes::parse_attrs(&input.attrs)?,
            jc_convert_path: crate::path::jc_convert(),
        })
    }

    #[inline]
    pub fn attrs(&self) -> &TypeAttributes {
        &self.attrs
    }

    #[inline]
    pub fn jc_convert_path(&self) -> &Path {
        &self.jc_convert_path
    }

    /// This name is used in `impl ... for #real_ident {...}`.
    #[inline]
    pub fn real_ident(&self) -> TokenStream {
        self.ident.to_token_stream()
    }

    /// The last segment of the custom path, or the declared ident.
    pub fn type_ident(&self) -> TokenStream {
        let ident = match &self.attrs.custom_path {
            Some(path) => path.segments.last().map_or(self.ident, |s| &s.ident),
            None => self.ident,
        };
        LitStr::new(&crate::utils::unraw(ident), ident.span()).to_token_stream()
    }

    /// `Some(module)` as a `&'static str` expression.
    ///
    /// `None` for a single segment custom path.
    pub fn module_path(&self) -> Option<TokenStream> {
        match &self.attrs.custom_path {
            Some(path) => {
                let module = path
                    .segments
                    .iter()
                    .take(path.segments.len().saturating_sub(1))
                    .map(|segment| crate::utils::unraw(&segment.ident))
                    .reduce(|path, ident| path + "::" + &ident)?;
                Some(LitStr::new(&module, path.span()).to_token_stream())
            }
            None => Some(quote!(::core::module_path!())),
        }
    }

    pub fn type_path(&self) -> TokenStream {
        let type_ident = self.type_ident();
        match self.module_path() {
            Some(module_path) => quote! {
                ::core::concat!(#module_path, "::", #type_ident)
            },
            None => type_ident,
        }
    }
}
