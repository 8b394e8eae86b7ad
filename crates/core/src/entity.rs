//! Entity trait: records with a stable, strongly-typed identity.

use std::collections::HashMap;

/// Entity marker + minimal interface.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> Self::Id;
}

/// Borrowing lookup table keyed by entity id. Later duplicates win.
pub fn index_by_id<E: Entity>(entities: &[E]) -> HashMap<E::Id, &E> {
    entities.iter().map(|e| (e.id(), e)).collect()
}
