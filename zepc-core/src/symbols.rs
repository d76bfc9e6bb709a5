//! Local variable bindings of one function, method or closure body.

use std::collections::HashMap;

use crate::error::{CoreError, Location};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    pub writes: usize,
    pub declared_at: Location,
}

#[derive(Debug, Default)]
pub struct SymbolTable {
    symbols: HashMap<String, Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a name that exists before any assignment: `this`,
    /// parameters, declared locals, loop and catch variables.
    pub fn declare(&mut self, name: &str, location: Location) {
        self.symbols
            .entry(name.to_string())
            .or_insert_with(|| Symbol {
                name: name.to_string(),
                writes: 0,
                declared_at: location,
            });
    }

    /// Binds `name` for a whole-value write, creating it when needed.
    pub fn variable_for_write(&mut self, name: &str, location: &Location) -> &Symbol {
        let symbol = self
            .symbols
            .entry(name.to_string())
            .or_insert_with(|| Symbol {
                name: name.to_string(),
                writes: 0,
                declared_at: location.clone(),
            });
        symbol.writes += 1;
        symbol
    }

    /// Binds `name` for an in-place mutation. The variable must already exist.
    pub fn variable_for_update(
        &mut self,
        name: &str,
        location: &Location,
    ) -> Result<&Symbol, CoreError> {
        match self.symbols.get_mut(name) {
            Some(symbol) => {
                symbol.writes += 1;
                Ok(symbol)
            }
            None => Err(CoreError::UndeclaredVariable {
                name: name.to_string(),
                location: location.clone(),
            }),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.symbols.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_creates_and_counts() {
        let mut table = SymbolTable::new();
        let loc = Location::default();
        table.variable_for_write("a", &loc);
        table.variable_for_write("a", &loc);
        assert_eq!(table.get("a").map(|s| s.writes), Some(2));
    }

    #[test]
    fn update_requires_existing_binding() {
        let mut table = SymbolTable::new();
        let loc = Location {
            file: Some("t.zep".into()),
            line: Some(3),
            column: None,
        };
        let err = table.variable_for_update("items", &loc).unwrap_err();
        assert!(matches!(err, CoreError::UndeclaredVariable { ref name, .. } if name == "items"));

        table.declare("items", Location::default());
        assert!(table.variable_for_update("items", &loc).is_ok());
        assert_eq!(table.get("items").map(|s| s.writes), Some(1));
    }
}
