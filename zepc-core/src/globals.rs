//! Extension globals: named settings a Zephir extension declares up front
//! and reads through `globals_get` / `globals_set`.

use std::collections::BTreeMap;

use crate::error::{CoreError, Location};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtensionGlobals {
    values: Option<BTreeMap<String, String>>,
}

impl ExtensionGlobals {
    /// Globals in the uninitialized state.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn initialized<I, K, V>(settings: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut globals = Self::new();
        globals.init(settings);
        globals
    }

    /// Merges `settings` into the table and marks it ready. Calling it again
    /// adds to, and overrides, what is already there.
    pub fn init<I, K, V>(&mut self, settings: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let values = self.values.get_or_insert_with(BTreeMap::new);
        for (name, value) in settings {
            values.insert(name.into(), value.into());
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.values.is_some()
    }

    fn ready(&self) -> Result<&BTreeMap<String, String>, CoreError> {
        self.values.as_ref().ok_or(CoreError::GlobalsNotInitialized)
    }

    pub fn contains(&self, name: &str) -> Result<bool, CoreError> {
        Ok(self.ready()?.contains_key(name))
    }

    pub fn get(&self, name: &str) -> Result<&str, CoreError> {
        self.ready()?
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| CoreError::UnknownGlobal {
                name: name.to_string(),
                location: Location::default(),
            })
    }

    pub fn set(&mut self, name: &str, value: impl Into<String>) -> Result<(), CoreError> {
        let values = self.values.as_mut().ok_or(CoreError::GlobalsNotInitialized)?;
        values.insert(name.to_string(), value.into());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_before_init_fails() {
        let mut globals = ExtensionGlobals::new();
        assert!(matches!(globals.get("db.host"), Err(CoreError::GlobalsNotInitialized)));
        assert!(matches!(
            globals.set("db.host", "localhost"),
            Err(CoreError::GlobalsNotInitialized)
        ));
        assert!(!globals.is_initialized());
    }

    #[test]
    fn init_merges_settings() {
        let mut globals = ExtensionGlobals::initialized([("orm.cache", "1")]);
        globals.init([("orm.cache", "0"), ("db.port", "5432")]);
        assert_eq!(globals.get("orm.cache").unwrap(), "0");
        assert_eq!(globals.get("db.port").unwrap(), "5432");
        globals.set("db.port", "6543").unwrap();
        assert_eq!(globals.get("db.port").unwrap(), "6543");
        assert!(matches!(globals.get("missing"), Err(CoreError::UnknownGlobal { .. })));
    }
}
