use proc_macro2::TokenStream;

/// An empty token stream.
#[inline(always)]
pub(crate) fn empty() -> TokenStream {
    TokenStream::new()
}

/// The identifier as written, without a leading `r#`.
#[inline]
pub(crate) fn unraw(ident: &syn::Ident) -> String {
    use syn::ext::IdentExt;
    ident.unraw().to_string()
}
