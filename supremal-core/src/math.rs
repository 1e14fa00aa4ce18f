//! Aliases for the set and map types used throughout the workspace, so the
//! concrete hash implementations stay swappable in one place.

/// Type alias for unordered sets.
pub type Set<S> = indexmap::IndexSet<S>;
/// Type alias for unordered maps.
pub type Map<K, V> = indexmap::IndexMap<K, V>;

/// Type alias for sets that iterate in ascending key order.
pub type OrderedSet<S> = std::collections::BTreeSet<S>;
/// Type alias for maps that iterate in ascending key order.
pub type OrderedMap<K, V> = std::collections::BTreeMap<K, V>;
