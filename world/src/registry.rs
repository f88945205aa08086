//! Ball arena keyed by stable identifiers.

use std::collections::BTreeMap;

use color_lines_core::{BallColor, BallId, CellCoord};

/// Authoritative state of a single ball stored inside the world.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct BallState {
    /// Identifier allocated by the registry.
    pub(crate) id: BallId,
    /// Cell currently occupied by the ball.
    pub(crate) cell: CellCoord,
    /// Appearance of the ball.
    pub(crate) color: BallColor,
    /// Latest visual bounce offset.
    pub(crate) bounce_offset: i32,
}

/// Registry that stores balls and manages identifier allocation.
#[derive(Clone, Debug)]
pub(crate) struct BallRegistry {
    entries: BTreeMap<BallId, BallState>,
    next_ball_id: u32,
}

impl BallRegistry {
    /// Creates an empty registry with a reset identifier counter.
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_ball_id: 0,
        }
    }

    /// Creates a registry from already-validated balls.
    pub(crate) fn from_entries(entries: BTreeMap<BallId, BallState>, next_ball_id: u32) -> Self {
        Self {
            entries,
            next_ball_id,
        }
    }

    /// Hands out the next unused identifier.
    pub(crate) fn allocate(&mut self) -> BallId {
        let id = BallId::new(self.next_ball_id);
        self.next_ball_id = self.next_ball_id.saturating_add(1);
        id
    }

    pub(crate) fn insert(&mut self, state: BallState) {
        let _ = self.entries.insert(state.id, state);
    }

    pub(crate) fn remove(&mut self, id: BallId) -> Option<BallState> {
        self.entries.remove(&id)
    }

    pub(crate) fn get(&self, id: BallId) -> Option<&BallState> {
        self.entries.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: BallId) -> Option<&mut BallState> {
        self.entries.get_mut(&id)
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &BallState> {
        self.entries.values()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn next_ball_id(&self) -> u32 {
        self.next_ball_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_starts_empty_with_zero_identifier() {
        let registry = BallRegistry::new();
        assert_eq!(registry.len(), 0);
        assert_eq!(registry.next_ball_id(), 0);
    }

    #[test]
    fn allocation_is_monotonic_across_removals() {
        let mut registry = BallRegistry::new();
        let first = registry.allocate();
        registry.insert(BallState {
            id: first,
            cell: CellCoord::new(0, 0),
            color: BallColor::RED,
            bounce_offset: 0,
        });
        let _ = registry.remove(first);
        let second = registry.allocate();

        assert_eq!(first, BallId::new(0));
        assert_eq!(second, BallId::new(1));
    }
}
