//! Insertion-ordered, bounded set of observed symbols.

use std::collections::HashMap;

use crate::config::DEFAULT_MAX_ITEMS;

/// A discrete integer-valued event.
pub type Symbol = i64;

/// Ordered, duplicate-free sequence of symbols with a capacity bound.
///
/// A symbol's position in the registry is its row and column index in the
/// transition matrix.
///
/// ## Invariants
/// - `len() <= capacity()` whenever a symbol is admitted
/// - `index` maps every symbol in `symbols` to its position, and nothing else
///
/// Lowering the capacity below `len()` keeps every registered symbol, so
/// `len()` may then exceed `capacity()` until the next `clear`; the bound
/// only governs admission of new symbols.
#[derive(Debug, Clone)]
pub struct SymbolRegistry {
    symbols: Vec<Symbol>,
    index: HashMap<Symbol, usize>,
    max_items: usize,
}

impl SymbolRegistry {
    /// Creates an empty registry holding at most `max_items` symbols.
    pub fn new(max_items: usize) -> Self {
        Self {
            symbols: Vec::new(),
            index: HashMap::new(),
            max_items,
        }
    }

    /// Returns the index of `symbol`, admitting it if there is room.
    ///
    /// The boolean is `true` when the symbol was newly added. Returns `None`
    /// when the symbol is unseen and the registry is full.
    pub fn admit(&mut self, symbol: Symbol) -> Option<(usize, bool)> {
        if let Some(&i) = self.index.get(&symbol) {
            return Some((i, false));
        }
        if self.symbols.len() >= self.max_items {
            return None;
        }
        let i = self.symbols.len();
        self.symbols.push(symbol);
        self.index.insert(symbol, i);
        Some((i, true))
    }

    /// Returns the index of `symbol` if it has been registered.
    pub fn index_of(&self, symbol: Symbol) -> Option<usize> {
        self.index.get(&symbol).copied()
    }

    /// Returns the registered symbols in insertion order.
    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    /// Number of registered symbols.
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Returns `true` when nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Maximum number of symbols.
    pub fn capacity(&self) -> usize {
        self.max_items
    }

    /// Changes the capacity. Symbols already registered are kept.
    pub(crate) fn set_capacity(&mut self, max_items: usize) {
        self.max_items = max_items;
    }

    /// Removes every symbol, keeping the capacity.
    pub fn clear(&mut self) {
        self.symbols.clear();
        self.index.clear();
    }
}

impl Default for SymbolRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ITEMS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insertion_order_and_dedup() {
        let mut reg = SymbolRegistry::default();
        for s in [7, 3, 7, 9, 3] {
            reg.admit(s);
        }
        assert_eq!(reg.symbols(), &[7, 3, 9]);
        assert_eq!(reg.index_of(9), Some(2));
        assert_eq!(reg.index_of(4), None);
    }

    #[test]
    fn admit_reports_new_and_known() {
        let mut reg = SymbolRegistry::new(4);
        assert_eq!(reg.admit(-1), Some((0, true)));
        assert_eq!(reg.admit(5), Some((1, true)));
        assert_eq!(reg.admit(-1), Some((0, false)));
    }

    #[test]
    fn full_registry_drops_unseen() {
        let mut reg = SymbolRegistry::new(2);
        reg.admit(1);
        reg.admit(2);
        assert_eq!(reg.admit(3), None);
        // Known symbols still resolve when full.
        assert_eq!(reg.admit(2), Some((1, false)));
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn clear_keeps_capacity() {
        let mut reg = SymbolRegistry::new(3);
        reg.admit(1);
        reg.clear();
        assert!(reg.is_empty());
        assert_eq!(reg.capacity(), 3);
        assert_eq!(reg.admit(8), Some((0, true)));
    }

    #[test]
    fn lowered_capacity_only_gates_admission() {
        let mut reg = SymbolRegistry::new(3);
        for s in [1, 2, 3] {
            reg.admit(s);
        }
        reg.set_capacity(1);
        assert_eq!(reg.len(), 3);
        assert!(reg.len() > reg.capacity());
        assert_eq!(reg.admit(3), Some((2, false)));
        assert_eq!(reg.admit(4), None);
    }
}
