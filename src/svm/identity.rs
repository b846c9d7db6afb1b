//! Bidirectional symbol <-> ID mapping for one compilation or load attempt.

use ahash::AHashMap;

use crate::runtime::{Symbol, SymbolCategory};

use super::id::SymbolId;

/// Result of binding an ID to a freshly resolved symbol during replay.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Binding {
    /// The ID was unbound and now names the symbol.
    Bound,
    /// The ID already named this very symbol.
    Confirmed,
    /// The ID names a different symbol, or the symbol already has a different ID.
    Conflict,
}

pub struct SymbolIdentityTable {
    ids: AHashMap<Symbol, SymbolId>,
    symbols: Vec<Option<Symbol>>,
    next_id: Option<SymbolId>,
}

impl Default for SymbolIdentityTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolIdentityTable {
    pub fn new() -> Self {
        Self {
            ids: AHashMap::new(),
            // Slot 0 stands for the reserved sentinel and stays empty.
            symbols: vec![None],
            next_id: Some(SymbolId::FIRST),
        }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn try_get_id(&self, symbol: Symbol) -> Option<SymbolId> {
        self.ids.get(&symbol).copied()
    }

    pub fn symbol_of(&self, id: SymbolId) -> Option<Symbol> {
        self.symbols.get(id.index()).copied().flatten()
    }

    pub fn category_of(&self, id: SymbolId) -> Option<SymbolCategory> {
        self.symbol_of(id).map(Symbol::category)
    }

    /// Hands out the next ID, or `None` once the 16-bit space is used up.
    pub fn new_symbol_id(&mut self) -> Option<SymbolId> {
        let id = self.next_id?;
        self.next_id = id.next();
        Some(id)
    }

    /// Associates a compile-time symbol with an ID obtained from [`Self::new_symbol_id`].
    pub fn assign(&mut self, symbol: Symbol, id: SymbolId) {
        self.ids.insert(symbol, id);
        self.store_symbol(id, symbol);
    }

    /// Gives a well-known symbol the next ID without any record backing it. Both phases seed the
    /// same symbols in the same order so the IDs line up.
    pub fn define_guaranteed_id(&mut self, symbol: Symbol) -> Option<SymbolId> {
        if let Some(existing) = self.try_get_id(symbol) {
            return Some(existing);
        }
        let id = self.new_symbol_id()?;
        self.assign(symbol, id);
        Some(id)
    }

    /// Binds `id` to a symbol recomputed during replay.
    pub fn set_symbol_of_id(&mut self, id: SymbolId, symbol: Symbol) -> Binding {
        match (self.symbol_of(id), self.try_get_id(symbol)) {
            (Some(bound), _) if bound == symbol => Binding::Confirmed,
            (Some(_), _) => Binding::Conflict,
            (None, Some(_)) => Binding::Conflict,
            (None, None) => {
                self.assign(symbol, id);
                Binding::Bound
            }
        }
    }

    /// Forgets every binding so a rejected load exposes no partial mapping.
    pub fn clear(&mut self) {
        self.ids.clear();
        self.symbols.clear();
        self.symbols.push(None);
    }

    fn store_symbol(&mut self, id: SymbolId, symbol: Symbol) {
        let index = id.index();
        if self.symbols.len() <= index {
            self.symbols.resize(index + 1, None);
        }
        self.symbols[index] = Some(symbol);
    }
}
