//! Lock-free, read-mostly cache of the symbols this process tracks.
//!
//! Readers call [`is_available`] against an `Arc` snapshot; [`refresh_symbols`]
//! swaps in a new one after the config is (re)loaded. Until the first refresh
//! every lookup returns `false`.

use std::sync::Arc;

use arc_swap::ArcSwap;
use indexmap::IndexMap;
use once_cell::sync::Lazy;

/// Logo -> display name, in config order.
type SymbolMap = IndexMap<String, String>;

static SYMBOLS: Lazy<ArcSwap<SymbolMap>> = Lazy::new(|| ArcSwap::from_pointee(SymbolMap::new()));

/// `logo` is matched case-insensitively.
pub fn is_available(logo: &str) -> bool {
    SYMBOLS.load().contains_key(logo.trim().to_uppercase().as_str())
}

pub fn refresh_symbols(symbols: &SymbolMap) {
    SYMBOLS.store(Arc::new(symbols.clone()));
    tracing::debug!(count = symbols.len(), "symbol cache refreshed");
}

pub fn clear_symbols() {
    SYMBOLS.store(Arc::new(SymbolMap::new()));
}

pub fn snapshot() -> Arc<SymbolMap> {
    SYMBOLS.load_full()
}

#[cfg(test)]
mod tests {
    use serial_test::serial;

    use super::*;

    #[test]
    #[serial(symbol_cache)]
    fn refresh_swaps_snapshot() {
        clear_symbols();
        assert!(!is_available("BTC"));

        let mut map = SymbolMap::new();
        map.insert("BTC".into(), "Bitcoin".into());
        refresh_symbols(&map);
        assert!(is_available("btc "));
        assert!(!is_available("ETH"));

        let before = snapshot();
        map.insert("ETH".into(), "Ethereum".into());
        refresh_symbols(&map);
        assert_eq!(before.len(), 1);
        assert_eq!(snapshot().len(), 2);

        clear_symbols();
        assert!(snapshot().is_empty());
    }
}
