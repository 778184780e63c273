use core::hash::Hash;

use crate::info::TypePath;

// -----------------------------------------------------------------------------
// Member

/// One declared member of a [`LabeledEnum`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Member<E> {
    value: E,
    ident: &'static str,
    label: Option<&'static str>,
}

impl<E: Copy> Member<E> {
    #[inline]
    pub const fn new(value: E, ident: &'static str, label: Option<&'static str>) -> Self {
        Self {
            value,
            ident,
            label,
        }
    }

    #[inline]
    pub const fn value(&self) -> E {
        self.value
    }

    /// The identifier as declared in source.
    #[inline]
    pub const fn ident(&self) -> &'static str {
        self.ident
    }

    /// The explicit label, if one was declared.
    #[inline]
    pub const fn label(&self) -> Option<&'static str> {
        self.label
    }

    /// The explicit label, falling back to the identifier.
    #[inline]
    pub const fn resolved_label(&self) -> &'static str {
        match self.label {
            Some(label) => label,
            None => self.ident,
        }
    }
}

// -----------------------------------------------------------------------------
// LabeledEnum

/// A fieldless enum whose members carry string labels.
///
/// Usually derived:
///
/// ```
/// use jc_convert::LabeledEnum;
/// use jc_convert::derive::LabeledEnum;
///
/// #[derive(LabeledEnum, Clone, Copy, PartialEq, Eq, Hash, Debug)]
/// enum Level {
///     #[convert(label = "lo")]
///     Low,
///     High,
/// }
///
/// assert_eq!(Level::MEMBERS.len(), 2);
/// assert_eq!(Level::MEMBERS[0].resolved_label(), "lo");
/// assert_eq!(Level::MEMBERS[1].resolved_label(), "High");
/// assert_eq!(Level::High.discriminant(), 1);
/// ```
///
/// A manual implementation must list every member; a value missing from
/// [`MEMBERS`](LabeledEnum::MEMBERS) cannot be written.
pub trait LabeledEnum: TypePath + Copy + Eq + Hash + Send + Sync {
    /// Every member in declaration order.
    const MEMBERS: &'static [Member<Self>];

    /// The integer discriminant of `self`.
    ///
    /// The derive refuses enums whose discriminants do not fit in `i64`.
    fn discriminant(self) -> i64;
}
