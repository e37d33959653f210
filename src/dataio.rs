use std::fmt;
use std::fs;

use camino::Utf8Path;
use serde_json::Value;

use crate::error::ShelfError;

/// Semantic class of the payload a driver handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataKind {
    Array,
    Table,
    Dict,
    Binary,
}

impl fmt::Display for DataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataKind::Array => write!(f, "array"),
            DataKind::Table => write!(f, "table"),
            DataKind::Dict => write!(f, "dict"),
            DataKind::Binary => write!(f, "binary"),
        }
    }
}

/// A content codec. The resolution engine only ever hands a driver a
/// resolved single-file path; the payload is opaque to it.
pub trait DataDriver {
    fn name(&self) -> &str;
    fn kind(&self) -> DataKind;
    fn suffixes(&self) -> &[&str];
    fn load(&self, path: &Utf8Path) -> Result<Value, ShelfError>;
    fn save(&self, path: &Utf8Path, data: &Value) -> Result<(), ShelfError>;
}

/// Driver lookup keyed by name, kind and suffix. Owned by the caller and
/// passed by reference; never a process-wide mutable list.
#[derive(Default)]
pub struct DriverRegistry {
    drivers: Vec<Box<dyn DataDriver>>,
}

impl DriverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The base registry: a JSON codec for `.json` dict data.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(JsonDriver));
        registry
    }

    pub fn register(&mut self, driver: Box<dyn DataDriver>) {
        self.drivers.push(driver);
    }

    /// Later registrations take precedence for the same suffix.
    pub fn for_suffix(&self, suffix: &str) -> Option<&dyn DataDriver> {
        self.drivers
            .iter()
            .rev()
            .find(|driver| driver.suffixes().contains(&suffix))
            .map(Box::as_ref)
    }

    pub fn for_name(&self, name: &str) -> Option<&dyn DataDriver> {
        self.drivers
            .iter()
            .rev()
            .find(|driver| driver.name() == name)
            .map(Box::as_ref)
    }

    pub fn for_kind(&self, kind: DataKind) -> Option<&dyn DataDriver> {
        self.drivers
            .iter()
            .rev()
            .find(|driver| driver.kind() == kind)
            .map(Box::as_ref)
    }
}

impl fmt::Debug for DriverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = self
            .drivers
            .iter()
            .map(|driver| driver.name())
            .collect::<Vec<_>>();
        f.debug_struct("DriverRegistry")
            .field("drivers", &names)
            .finish()
    }
}

pub struct JsonDriver;

impl DataDriver for JsonDriver {
    fn name(&self) -> &str {
        "json"
    }

    fn kind(&self) -> DataKind {
        DataKind::Dict
    }

    fn suffixes(&self) -> &[&str] {
        &[".json"]
    }

    fn load(&self, path: &Utf8Path) -> Result<Value, ShelfError> {
        let content = fs::read_to_string(path.as_std_path())
            .map_err(|err| ShelfError::DriverIo(format!("read {path}: {err}")))?;
        serde_json::from_str(&content)
            .map_err(|err| ShelfError::DriverIo(format!("parse {path}: {err}")))
    }

    fn save(&self, path: &Utf8Path, data: &Value) -> Result<(), ShelfError> {
        let content = serde_json::to_string_pretty(data)
            .map_err(|err| ShelfError::DriverIo(err.to_string()))?;
        fs::write(path.as_std_path(), content)
            .map_err(|err| ShelfError::DriverIo(format!("write {path}: {err}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeDriver {
        name: &'static str,
        kind: DataKind,
        suffixes: &'static [&'static str],
    }

    impl DataDriver for FakeDriver {
        fn name(&self) -> &str {
            self.name
        }

        fn kind(&self) -> DataKind {
            self.kind
        }

        fn suffixes(&self) -> &[&str] {
            self.suffixes
        }

        fn load(&self, _path: &Utf8Path) -> Result<Value, ShelfError> {
            Ok(Value::Null)
        }

        fn save(&self, _path: &Utf8Path, _data: &Value) -> Result<(), ShelfError> {
            Ok(())
        }
    }

    #[test]
    fn default_registry_resolves_json() {
        let registry = DriverRegistry::with_defaults();
        let driver = registry.for_suffix(".json").unwrap();
        assert_eq!(driver.name(), "json");
        assert_eq!(driver.kind(), DataKind::Dict);
        assert!(registry.for_suffix(".dat").is_none());
    }

    #[test]
    fn later_registration_wins() {
        let mut registry = DriverRegistry::with_defaults();
        registry.register(Box::new(FakeDriver {
            name: "fake-json",
            kind: DataKind::Dict,
            suffixes: &[".json"],
        }));
        assert_eq!(registry.for_suffix(".json").unwrap().name(), "fake-json");
        assert_eq!(registry.for_name("json").unwrap().name(), "json");
    }

    #[test]
    fn lookup_by_kind() {
        let mut registry = DriverRegistry::new();
        registry.register(Box::new(FakeDriver {
            name: "bin",
            kind: DataKind::Binary,
            suffixes: &[".bin"],
        }));
        assert_eq!(registry.for_kind(DataKind::Binary).unwrap().name(), "bin");
        assert!(registry.for_kind(DataKind::Table).is_none());
    }
}
