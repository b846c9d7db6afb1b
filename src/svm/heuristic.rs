//! Nesting counter for speculative analysis that must not leave records behind.

use std::ops::{Deref, DerefMut};

use crate::runtime::ObjectModel;

use super::manager::SymbolValidationManager;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HeuristicRegion {
    depth: u32,
}

impl HeuristicRegion {
    pub fn depth(self) -> u32 {
        self.depth
    }

    pub fn is_active(self) -> bool {
        self.depth > 0
    }

    pub fn enter(&mut self) {
        self.depth += 1;
    }

    /// Leaves the innermost region. Returns `false` if no region was open.
    #[must_use]
    pub fn exit(&mut self) -> bool {
        match self.depth.checked_sub(1) {
            Some(depth) => {
                self.depth = depth;
                true
            }
            None => false,
        }
    }
}

/// Keeps a heuristic region open for as long as it lives.
///
/// The guard dereferences to the manager, so speculative queries go through it directly.
pub struct HeuristicRegionGuard<'s, 'm, M: ObjectModel + ?Sized> {
    manager: &'s mut SymbolValidationManager<'m, M>,
    /// Depth of the region this guard opened.
    depth: u32,
}

impl<'s, 'm, M: ObjectModel + ?Sized> HeuristicRegionGuard<'s, 'm, M> {
    pub(crate) fn new(manager: &'s mut SymbolValidationManager<'m, M>) -> Self {
        let region = manager.heuristic_mut();
        region.enter();
        let depth = region.depth;
        Self { manager, depth }
    }
}

impl<'m, M: ObjectModel + ?Sized> Deref for HeuristicRegionGuard<'_, 'm, M> {
    type Target = SymbolValidationManager<'m, M>;

    fn deref(&self) -> &Self::Target {
        self.manager
    }
}

impl<M: ObjectModel + ?Sized> DerefMut for HeuristicRegionGuard<'_, '_, M> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.manager
    }
}

impl<M: ObjectModel + ?Sized> Drop for HeuristicRegionGuard<'_, '_, M> {
    fn drop(&mut self) {
        let found = self.manager.heuristic_mut().depth;
        // Outer regions stay open even after an unbalanced exit inside the guard.
        self.manager.heuristic_mut().depth = self.depth - 1;
        if found != self.depth && !std::thread::panicking() {
            let _ = self.manager.invariant(format!(
                "heuristic region guard opened at depth {} closed at depth {found}",
                self.depth
            ));
        }
    }
}
