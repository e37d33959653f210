use std::fs;

use camino::Utf8Path;
use serde::{Deserialize, Serialize};

use crate::error::ShelfError;

pub const CONFIG_FILE_NAME: &str = "datashelf.json";

pub const SESSION_INDEX_WIDTH: usize = 3;
pub const FILE_INDEX_WIDTH: usize = 5;
pub const ANY_PLACEHOLDER: &str = "<any>";
pub const ANY_DATE_PLACEHOLDER: &str = "<any-date>";

/// Naming defaults: zero-pad widths used when formatting names, and the
/// placeholders substituted for unconstrained fields in display strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Naming {
    #[serde(default = "default_session_index_width")]
    pub session_index_width: usize,
    #[serde(default = "default_file_index_width")]
    pub file_index_width: usize,
    #[serde(default = "default_any_placeholder")]
    pub any_placeholder: String,
    #[serde(default = "default_any_date_placeholder")]
    pub any_date_placeholder: String,
}

fn default_session_index_width() -> usize {
    SESSION_INDEX_WIDTH
}

fn default_file_index_width() -> usize {
    FILE_INDEX_WIDTH
}

fn default_any_placeholder() -> String {
    ANY_PLACEHOLDER.to_string()
}

fn default_any_date_placeholder() -> String {
    ANY_DATE_PLACEHOLDER.to_string()
}

impl Default for Naming {
    fn default() -> Self {
        Self {
            session_index_width: SESSION_INDEX_WIDTH,
            file_index_width: FILE_INDEX_WIDTH,
            any_placeholder: default_any_placeholder(),
            any_date_placeholder: default_any_date_placeholder(),
        }
    }
}

impl Naming {
    pub fn load(path: &Utf8Path) -> Result<Self, ShelfError> {
        let content = fs::read_to_string(path.as_std_path())
            .map_err(|_| ShelfError::ConfigRead(path.to_owned()))?;
        serde_json::from_str(&content).map_err(|err| ShelfError::ConfigParse(err.to_string()))
    }

    /// Resolves the naming defaults for a data root: reads
    /// `<root>/datashelf.json` when present, defaults otherwise.
    pub fn for_root(root: &Utf8Path) -> Result<Self, ShelfError> {
        let config_path = root.join(CONFIG_FILE_NAME);
        if config_path.as_std_path().exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }
}
