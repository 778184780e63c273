//! `#[convert(...)]` attribute parsing.

use proc_macro2::Span;
use syn::{Attribute, LitBool, LitStr, Path};

use crate::CONVERT_ATTRIBUTE_NAME;

// -----------------------------------------------------------------------------
// TypeAttributes

/// Type level attributes.
///
/// - `#[convert(type_path = "my_crate::foo::Bar")]`
/// - `#[convert(TypePath = false)]`
/// - `#[convert(auto_register)]`
#[derive(Debug)]
pub(crate) struct TypeAttributes {
    /// Custom path replacing `module_path!()` and the ident.
    pub custom_path: Option<Path>,
    /// Default is `true`, use `#[convert(TypePath = false)]` to disable it.
    /// Then Users can(must) impl it in a more customized way.
    pub impl_type_path: bool,
    pub auto_register: Option<Span>,
}

impl Default for TypeAttributes {
    fn default() -> Self {
        Self {
            custom_path: None,
            impl_type_path: true,
            auto_register: None,
        }
    }
}

impl TypeAttributes {
    pub fn parse_attrs(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut this = Self::default();

        for attr in attrs {
            if !attr.path().is_ident(CONVERT_ATTRIBUTE_NAME) {
                continue;
            }

            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("type_path") {
                    if this.custom_path.is_some() {
                        return Err(meta.error("duplicate `type_path` attribute"));
                    }
                    let lit: LitStr = meta.value()?.parse()?;
                    let path: Path = lit.parse()?;
                    if path.leading_colon.is_some() {
                        return Err(syn::Error::new(
                            lit.span(),
                            "`type_path` must not start with `::`",
                        ));
                    }
                    this.custom_path = Some(path);
                    Ok(())
                } else if meta.path.is_ident("TypePath") {
                    let lit: LitBool = meta.value()?.parse()?;
                    this.impl_type_path = lit.value;
                    Ok(())
                } else if meta.path.is_ident("auto_register") {
                    this.auto_register = Some(meta.path.require_ident()?.span());
                    Ok(())
                } else if meta.path.is_ident("label") {
                    Err(meta.error("`label` is only valid on enum variants"))
                } else {
                    Err(meta.error("unsupported `convert` attribute"))
                }
            })?;
        }

        Ok(this)
    }
}

// -----------------------------------------------------------------------------
// VariantAttributes

/// Variant level attributes.
///
/// - `#[convert(label = "custom")]`
#[derive(Debug, Default)]
pub(crate) struct VariantAttributes {
    pub label: Option<LitStr>,
}

impl VariantAttributes {
    pub fn parse_attrs(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut this = Self::default();

        for attr in attrs {
            if !attr.path().is_ident(CONVERT_ATTRIBUTE_NAME) {
                continue;
            }

            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("label") {
                    if this.label.is_some() {
                        return Err(meta.error("duplicate `label` attribute"));
                    }
                    this.label = Some(meta.value()?.parse()?);
                    Ok(())
                } else {
                    Err(meta.error("unsupported `convert` attribute on a variant"))
                }
            })?;
        }

        Ok(this)
    }
}
