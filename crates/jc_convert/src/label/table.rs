use alloc::sync::Arc;
use alloc::vec::Vec;
use core::any::{Any, TypeId};
use std::sync::{PoisonError, RwLock};

use jc_utils::TypeIdMap;
use jc_utils::hash::{HashMap, fixed_hash_state};

use super::LabeledEnum;
use crate::ConvertError;

// -----------------------------------------------------------------------------
// LabelTable

/// The bidirectional mapping between the members of `E` and their labels.
///
/// Immutable once built. Every member appears exactly once in each direction
/// and no two members share a label.
///
/// # Examples
///
/// ```
/// use jc_convert::derive::LabeledEnum;
/// use jc_convert::label::LabelTable;
///
/// #[derive(LabeledEnum, Clone, Copy, PartialEq, Eq, Hash, Debug)]
/// enum Level {
///     #[convert(label = "lo")]
///     Low,
///     High,
/// }
///
/// let table = LabelTable::<Level>::shared().unwrap();
/// assert_eq!(table.label(Level::Low), Some("lo"));
/// assert_eq!(table.value("High"), Some(Level::High));
/// assert_eq!(table.value("Low"), None);
/// ```
pub struct LabelTable<E> {
    members: Vec<(E, &'static str)>,
    by_label: HashMap<&'static str, E>,
    by_value: HashMap<E, &'static str>,
    by_discriminant: HashMap<i64, E>,
}

static TABLES: RwLock<TypeIdMap<Arc<dyn Any + Send + Sync>>> = RwLock::new(TypeIdMap::new());

impl<E: LabeledEnum> LabelTable<E> {
    /// Build a fresh table from [`LabeledEnum::MEMBERS`].
    ///
    /// Prefer [`shared`](Self::shared), which builds at most one table per
    /// enum type for the whole process.
    pub fn build() -> Result<Self, ConvertError> {
        let members = E::MEMBERS;
        let mut table = Self {
            members: Vec::with_capacity(members.len()),
            by_label: HashMap::with_capacity_and_hasher(members.len(), fixed_hash_state()),
            by_value: HashMap::with_capacity_and_hasher(members.len(), fixed_hash_state()),
            by_discriminant: HashMap::with_capacity_and_hasher(members.len(), fixed_hash_state()),
        };

        for member in members {
            let value = member.value();
            let label = member.resolved_label();

            if table.by_value.contains_key(&value) {
                return Err(ConvertError::DuplicateMember {
                    member: member.ident(),
                    enum_type: E::type_path(),
                });
            }

            if let Some(first) = table.by_label.get(label) {
                let first = members
                    .iter()
                    .find(|m| m.value() == *first)
                    .map_or(label, |m| m.ident());
                return Err(ConvertError::DuplicateLabel {
                    label,
                    enum_type: E::type_path(),
                    first,
                    second: member.ident(),
                });
            }

            table.members.push((value, label));
            table.by_label.insert(label, value);
            table.by_value.insert(value, label);
            table.by_discriminant.insert(value.discriminant(), value);
        }

        Ok(table)
    }

    /// The process-wide table for `E`, built on first use.
    ///
    /// Concurrent first calls may each build a table, but only the first one
    /// installed is ever returned. A failed build is not cached.
    pub fn shared() -> Result<Arc<Self>, ConvertError> {
        let type_id = TypeId::of::<E>();

        let cached = TABLES
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&type_id)
            .cloned();

        if let Some(table) = cached.and_then(|any| Arc::downcast::<Self>(any).ok()) {
            return Ok(table);
        }

        let built = Arc::new(Self::build()?);

        let installed = TABLES
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .get_or_insert(type_id, || built.clone() as Arc<dyn Any + Send + Sync>)
            .clone();

        match Arc::downcast::<Self>(installed) {
            Ok(installed) => {
                if Arc::ptr_eq(&installed, &built) {
                    log::debug!(
                        "built label table for `{}` with {} members",
                        E::type_path(),
                        installed.len(),
                    );
                } else {
                    log::trace!("discarded concurrent label table for `{}`", E::type_path());
                }
                Ok(installed)
            }
            Err(_) => Ok(built),
        }
    }

    /// The label of `value`.
    #[inline]
    pub fn label(&self, value: E) -> Option<&'static str> {
        self.by_value.get(&value).copied()
    }

    /// The member whose label is exactly `label`.
    #[inline]
    pub fn value(&self, label: &str) -> Option<E> {
        self.by_label.get(label).copied()
    }

    /// The member with the given discriminant.
    #[inline]
    pub fn value_of_discriminant(&self, discriminant: i64) -> Option<E> {
        self.by_discriminant.get(&discriminant).copied()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Members and their labels in declaration order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (E, &'static str)> + '_ {
        self.members.iter().copied()
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::sync::Arc;
    use alloc::vec::Vec;

    use super::LabelTable;
    use crate::ConvertError;
    use crate::derive::LabeledEnum;
    use crate::info::TypePath;
    use crate::label::{LabeledEnum, Member};

    #[derive(LabeledEnum, Clone, Copy, PartialEq, Eq, Hash, Debug)]
    enum Weather {
        #[convert(label = "sunny")]
        Sun,
        Rain = 5,
        #[convert(label = "snowy")]
        Snow,
    }

    #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
    enum Clash {
        Left,
        Right,
    }

    impl TypePath for Clash {
        fn type_path() -> &'static str {
            "tests::Clash"
        }
        fn type_name() -> &'static str {
            "Clash"
        }
        fn type_ident() -> &'static str {
            "Clash"
        }
    }

    impl LabeledEnum for Clash {
        const MEMBERS: &'static [Member<Self>] = &[
            Member::new(Clash::Left, "Left", Some("Right")),
            Member::new(Clash::Right, "Right", None),
        ];

        fn discriminant(self) -> i64 {
            self as i64
        }
    }

    #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
    enum Twice {
        Once,
    }

    impl TypePath for Twice {
        fn type_path() -> &'static str {
            "tests::Twice"
        }
        fn type_name() -> &'static str {
            "Twice"
        }
        fn type_ident() -> &'static str {
            "Twice"
        }
    }

    impl LabeledEnum for Twice {
        const MEMBERS: &'static [Member<Self>] = &[
            Member::new(Twice::Once, "Once", None),
            Member::new(Twice::Once, "Once", Some("again")),
        ];

        fn discriminant(self) -> i64 {
            self as i64
        }
    }

    #[test]
    fn both_directions() {
        let table = LabelTable::<Weather>::build().unwrap();

        assert_eq!(table.len(), 3);
        assert_eq!(table.label(Weather::Sun), Some("sunny"));
        assert_eq!(table.label(Weather::Rain), Some("Rain"));
        assert_eq!(table.value("snowy"), Some(Weather::Snow));
        assert_eq!(table.value("Snow"), None);
        assert_eq!(table.value("SUNNY"), None);
        assert_eq!(table.value_of_discriminant(5), Some(Weather::Rain));
        assert_eq!(table.value_of_discriminant(6), Some(Weather::Snow));

        let labels: Vec<_> = table.iter().map(|(_, label)| label).collect();
        assert_eq!(labels, ["sunny", "Rain", "snowy"]);
    }

    #[test]
    fn duplicate_label_fails() {
        let err = LabelTable::<Clash>::shared().err().unwrap();
        assert_eq!(
            err,
            ConvertError::DuplicateLabel {
                label: "Right",
                enum_type: "tests::Clash",
                first: "Left",
                second: "Right",
            }
        );
        // Not cached, the same failure every time.
        assert_eq!(LabelTable::<Clash>::shared().err(), Some(err));
    }

    #[test]
    fn duplicate_member_fails() {
        assert!(matches!(
            LabelTable::<Twice>::build(),
            Err(ConvertError::DuplicateMember { member: "Once", .. })
        ));
    }

    #[test]
    fn concurrent_first_use() {
        let handles: Vec<_> = (0..8)
            .map(|_| std::thread::spawn(|| LabelTable::<Weather>::shared().unwrap()))
            .collect();

        let tables: Vec<Arc<LabelTable<Weather>>> =
            handles.into_iter().map(|h| h.join().unwrap()).collect();

        let canonical = LabelTable::<Weather>::shared().unwrap();
        assert!(tables.iter().all(|t| Arc::ptr_eq(t, &canonical)));
    }
}
