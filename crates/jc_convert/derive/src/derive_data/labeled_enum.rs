use syn::punctuated::Punctuated;
use syn::spanned::Spanned;
use syn::{Attribute, Data, DeriveInput, Fields, Ident, Meta, Token};

use super::{TypeMeta, VariantAttributes};

/// A fieldless enum with its per-variant attributes.
pub(crate) struct LabeledEnumDerive<'a> {
    pub meta: TypeMeta<'a>,
    pub variants: Vec<LabeledVariant<'a>>,
    /// `#[repr(u64)]` or `#[repr(usize)]`: discriminants may exceed `i64::MAX`.
    pub unsigned_repr: bool,
}

pub(crate) struct LabeledVariant<'a> {
    pub ident: &'a Ident,
    pub attrs: VariantAttributes,
}

impl<'a> LabeledEnumDerive<'a> {
    pub fn from_input(input: &'a DeriveInput) -> syn::Result<Self> {
        let Data::Enum(data) = &input.data else {
            return Err(syn::Error::new(
                input.ident.span(),
                "`LabeledEnum` can only be derived for enums",
            ));
        };

        let meta = TypeMeta::from_input(input)?;
        let unsigned_repr = parse_repr(&input.attrs)?;

        let mut errors: Option<syn::Error> = None;
        let mut variants = Vec::with_capacity(data.variants.len());

        for variant in &data.variants {
            let result = match &variant.fields {
                Fields::Unit => VariantAttributes::parse_attrs(&variant.attrs),
                fields => Err(syn::Error::new(
                    fields.span(),
                    "`LabeledEnum` only supports fieldless variants",
                )),
            };

            match result {
                Ok(attrs) => variants.push(LabeledVariant {
                    ident: &variant.ident,
                    attrs,
                }),
                Err(err) => match &mut errors {
                    Some(errors) => errors.combine(err),
                    None => errors = Some(err),
                },
            }
        }

        match errors {
            Some(errors) => Err(errors),
            None => Ok(Self {
                meta,
                variants,
                unsigned_repr,
            }),
        }
    }
}

/// Discriminants are reported as `i64`, 128-bit reprs cannot be.
fn parse_repr(attrs: &[Attribute]) -> syn::Result<bool> {
    let mut unsigned = false;

    for attr in attrs {
        if !attr.path().is_ident("repr") {
            continue;
        }

        let reprs = attr.parse_args_with(Punctuated::<Meta, Token![,]>::parse_terminated)?;
        for repr in &reprs {
            let path = repr.path();
            if path.is_ident("u128") || path.is_ident("i128") {
                return Err(syn::Error::new(
                    repr.span(),
                    "`LabeledEnum` discriminants must fit in `i64`, 128-bit reprs are not supported",
                ));
            }
            if path.is_ident("u64") || path.is_ident("usize") {
                unsigned = true;
            }
        }
    }

    Ok(unsigned)
}
