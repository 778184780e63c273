//! Hash containers over *hashbrown*, hashed with a fixed *foldhash* seed.

pub use foldhash;
pub use hashbrown;

/// The hash state of the string and enum keyed tables.
///
/// Seeded rather than random, so a table's iteration order does not change
/// between runs.
pub type FixedHashState = foldhash::fast::FixedState;

/// The seed behind [`fixed_hash_state`].
const SEED: u64 = 0x6A63_5F63_6F6E_7631;

/// A [`FixedHashState`] with this crate's seed, usable in `const` context.
///
/// # Examples
///
/// ```
/// use core::hash::BuildHasher;
/// use jc_utils::hash::fixed_hash_state;
///
/// let a = fixed_hash_state().hash_one("first_value");
/// let b = fixed_hash_state().hash_one("first_value");
/// assert_eq!(a, b);
/// ```
#[inline]
pub const fn fixed_hash_state() -> FixedHashState {
    FixedHashState::with_seed(SEED)
}

/// A [`hashbrown::HashMap`] using [`FixedHashState`] by default.
///
/// Construct it with `HashMap::with_hasher(fixed_hash_state())`.
pub type HashMap<K, V, S = FixedHashState> = hashbrown::HashMap<K, V, S>;
